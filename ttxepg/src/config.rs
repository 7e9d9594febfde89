//! CLI surface and persisted defaults, grounded in
//! `recisdb-proxy/src/main.rs`'s `Args`/`ConfigFile` split: command-line
//! flags override a TOML file's defaults, which override hard-coded
//! defaults.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Command-line surface for the `tv_grab_ttx`-style tool.
#[derive(Debug, Parser)]
#[command(name = "ttxepg", about = "Teletext EPG acquisition and XMLTV export")]
pub struct Args {
    /// Path to a TOML config file with persisted defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbosity: repeat for more detail (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory to write rotated log files into; console-only if omitted.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Drop programmes whose stop-time (or inferred stop) is this many
    /// minutes in the past.
    #[arg(long)]
    pub expire_min: Option<i64>,

    /// First overview page to scrape (e.g. 0x300).
    #[arg(long, value_parser = parse_hex_page)]
    pub start_page: Option<u16>,

    /// Last overview page to scrape, inclusive (e.g. 0x399).
    #[arg(long, value_parser = parse_hex_page)]
    pub stop_page: Option<u16>,

    /// Override the broadcaster's channel display name.
    #[arg(long)]
    pub channel_name: Option<String>,

    /// Override the broadcaster's channel id (default derived from the
    /// channel source: DVB service id or sanitized analog name).
    #[arg(long)]
    pub channel_id: Option<String>,

    /// Prior XMLTV file to merge new programmes into.
    #[arg(long)]
    pub merge_input: Option<PathBuf>,

    /// Output XMLTV file path.
    #[arg(long)]
    pub output: PathBuf,

    /// Re-import the just-written output and diff it against in-memory
    /// state as a consistency check.
    #[arg(long, default_value_t = false)]
    pub verify: bool,
}

fn parse_hex_page(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).map_err(|e| e.to_string())
}

/// Persisted defaults, merged beneath CLI flags.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub generator_info_name: Option<String>,
    pub generator_info_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeConfig {
    pub expire_min: Option<i64>,
    pub start_page: Option<u16>,
    pub stop_page: Option<u16>,
}

/// Effective settings after merging CLI > file > hard-coded default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub expire_min: i64,
    pub start_page: u16,
    pub stop_page: u16,
    pub generator_info_name: String,
    pub generator_info_url: String,
}

impl Settings {
    pub fn merge(args: &Args, file: &ConfigFile) -> Settings {
        Settings {
            expire_min: args
                .expire_min
                .or(file.scrape.expire_min)
                .unwrap_or(120),
            start_page: args.start_page.or(file.scrape.start_page).unwrap_or(0x300),
            stop_page: args.stop_page.or(file.scrape.stop_page).unwrap_or(0x399),
            generator_info_name: file
                .output
                .generator_info_name
                .clone()
                .unwrap_or_else(|| "ttxepg".to_string()),
            generator_info_url: file
                .output
                .generator_info_url
                .clone()
                .unwrap_or_else(|| "https://example.invalid/ttxepg".to_string()),
        }
    }
}

pub fn load_config(path: Option<&std::path::Path>) -> Result<ConfigFile, crate::error::AcqError> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            toml::from_str(&text).map_err(|e| crate::error::AcqError::Config(e.to_string()))
        }
        None => Ok(ConfigFile::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_file_default() {
        let args = Args {
            config: None,
            verbose: 0,
            log_dir: None,
            expire_min: Some(30),
            start_page: None,
            stop_page: None,
            channel_name: None,
            channel_id: None,
            merge_input: None,
            output: PathBuf::from("out.xml"),
            verify: false,
        };
        let mut file = ConfigFile::default();
        file.scrape.expire_min = Some(90);
        let settings = Settings::merge(&args, &file);
        assert_eq!(settings.expire_min, 30);
    }

    #[test]
    fn file_default_wins_over_hardcoded() {
        let args = Args {
            config: None,
            verbose: 0,
            log_dir: None,
            expire_min: None,
            start_page: None,
            stop_page: None,
            channel_name: None,
            channel_id: None,
            merge_input: None,
            output: PathBuf::from("out.xml"),
            verify: false,
        };
        let mut file = ConfigFile::default();
        file.scrape.expire_min = Some(90);
        let settings = Settings::merge(&args, &file);
        assert_eq!(settings.expire_min, 90);
    }
}
