//! CLI entry point: loads configuration, wires up logging, and drives one
//! scrape + XMLTV merge/export pass over whatever pages the acquisition
//! side has already deposited in the page database.

use std::path::Path;

use clap::Parser;

use ttxepg::config::{self, Args, Settings};
use ttxepg::db::PageDb;
use ttxepg::logging;
use ttxepg::scrape::date::Lang;
use ttxepg::scrape::scrape_channel;
use ttxepg::xmltv::{self, ChannelSource};
use ttxepg_types::ParseResultCode;

fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init_logging(args.log_dir.as_deref(), args.verbose) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };
    let settings = Settings::merge(&args, &file_config);

    std::process::exit(run(&args, &settings));
}

fn run(args: &Args, settings: &Settings) -> i32 {
    let db = PageDb::new();
    let now = chrono::Local::now().naive_local();

    let ov_start = ttxepg_types::page::PageNumber(settings.start_page);
    let ov_end = ttxepg_types::page::PageNumber(settings.stop_page);

    let programmes = scrape_channel(&db, ov_start, ov_end, Lang::German, now, settings.expire_min);

    let channel_name = args.channel_name.clone().unwrap_or_else(|| "Unknown".to_string());
    let source = match &args.channel_id {
        Some(id) => ChannelSource::Analog { name: id.clone() },
        None => ChannelSource::Analog { name: channel_name.clone() },
    };
    let channel_id = args.channel_id.clone().unwrap_or_else(|| xmltv::channel_id(&source));

    let merged = match &args.merge_input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => {
                let (old, warnings) = xmltv::import(&text);
                for w in &warnings {
                    tracing::warn!("xmltv import: {w}");
                }
                xmltv::merge(programmes, old, now, settings.expire_min)
            }
            Err(e) => {
                tracing::warn!("could not read merge input {}: {e}", path.display());
                programmes
            }
        },
        None => programmes,
    };

    if merged.iter().all(|p| p.skip) || merged.is_empty() {
        tracing::info!("no programmes produced for {channel_name}");
        return u16::from(ParseResultCode::NoProgrammesFound) as i32;
    }

    let document = xmltv::export(&channel_name, &channel_id, &merged);
    if let Err(e) = write_atomically(&args.output, &document) {
        tracing::error!("failed to write {}: {e}", args.output.display());
        return 1;
    }

    tracing::info!("wrote {} programmes to {}", merged.len(), args.output.display());
    u16::from(ParseResultCode::Success) as i32
}

fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("xml.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
