//! XMLTV export and merge, grounded in `epgttx/xmltv.cc`'s
//! `ExportTitle`/`MergeSlotDesc`/`XMLTV::ExportXmltv`/`XMLTv::SetExpireTime`.

use chrono::NaiveDateTime;

use crate::scrape::description::str_cmp_alnum;
use crate::scrape::feat::Features;
use crate::scrape::Programme;

/// Which tuner family a channel came from, driving the channel-id policy.
#[derive(Debug, Clone)]
pub enum ChannelSource {
    Dvb { service_id: u32 },
    Analog { name: String },
}

pub fn channel_id(source: &ChannelSource) -> String {
    match source {
        ChannelSource::Dvb { service_id } => format!("SID_{service_id}"),
        ChannelSource::Analog { name } => name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

fn fmt_timestamp(ts: NaiveDateTime) -> String {
    format!("{} +0000", ts.format("%Y%m%d%H%M%S"))
}

/// Renders the full XMLTV document body for one channel.
pub fn export(channel_name: &str, channel_id: &str, programmes: &[Programme]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n");
    out.push_str("<!DOCTYPE tv SYSTEM \"xmltv.dtd\">\n");
    out.push_str(
        "<tv generator-info-name=\"ttxepg\" generator-info-url=\"https://example.invalid/ttxepg\" source-info-name=\"teletext\">\n",
    );
    out.push_str(&format!(
        "  <channel id=\"{}\"><display-name>{}</display-name></channel>\n",
        escape(channel_id),
        escape(channel_name)
    ));

    for p in programmes {
        if p.skip {
            continue;
        }
        out.push_str(&format!("  <programme start=\"{}\"", fmt_timestamp(p.start)));
        if let Some(stop) = p.stop {
            out.push_str(&format!(" stop=\"{}\"", fmt_timestamp(stop)));
        }
        if let Some(vps) = p.vps {
            out.push_str(&format!(" pdc-start=\"{}\"", fmt_timestamp(vps)));
        }
        out.push_str(&format!(" channel=\"{}\">\n", escape(channel_id)));
        out.push_str(&format!("    <title>{}</title>\n", escape(&p.title)));
        if let Some(sub) = &p.subtitle {
            out.push_str(&format!("    <sub-title>{}</sub-title>\n", escape(sub)));
        }
        if let Some(desc) = &p.description {
            out.push_str(&format!("    <desc>{}</desc>\n", escape(desc)));
        }
        if p.features.contains(Features::BW) {
            out.push_str("    <video><colour>no</colour></video>\n");
        }
        if p.features.contains(Features::ASPECT_16_9) {
            out.push_str("    <video><aspect>16:9</aspect></video>\n");
        }
        if p.features.contains(Features::STEREO) || p.features.contains(Features::DOLBY) {
            out.push_str("    <audio><stereo>stereo</stereo></audio>\n");
        } else if p.features.contains(Features::MONO) {
            out.push_str("    <audio><stereo>mono</stereo></audio>\n");
        }
        if p.features.contains(Features::SUBTITLES) {
            out.push_str("    <subtitles type=\"teletext\"/>\n");
        }
        out.push_str("  </programme>\n");
    }

    out.push_str("</tv>\n");
    out
}

/// One programme parsed back out of an existing XMLTV file, keyed by
/// `"{epoch_start};{channel_id}"` as the original's merge step does.
#[derive(Debug, Clone)]
pub struct ImportedProgramme {
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
    pub channel_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub features: Features,
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let digits = s.split_whitespace().next()?;
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok()
}

/// Line-scans an existing XMLTV file for `<programme>` blocks. Malformed
/// blocks are skipped with a warning collected for the caller; unlike a
/// real XML parser, this never aborts on the first error.
pub fn import(xml: &str) -> (Vec<ImportedProgramme>, Vec<crate::error::XmltvImportError>) {
    use crate::error::XmltvImportError;

    let mut out = Vec::new();
    let mut warnings = Vec::new();
    let mut lines = xml.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("<programme ") {
            continue;
        }

        let start = extract_attr(trimmed, "start");
        let stop = extract_attr(trimmed, "stop");
        let channel = extract_attr(trimmed, "channel").unwrap_or_default();

        let Some(start_raw) = start else {
            warnings.push(XmltvImportError::MissingStart);
            continue;
        };
        let Some(start_ts) = parse_timestamp(&start_raw) else {
            warnings.push(XmltvImportError::BadTimestamp(start_raw));
            continue;
        };
        let stop_ts = stop.and_then(|s| parse_timestamp(&s));

        let mut title = String::new();
        let mut subtitle = None;
        let mut description = None;
        let mut terminated = false;
        for body_line in lines.by_ref() {
            let t = body_line.trim();
            if t.starts_with("</programme>") {
                terminated = true;
                break;
            }
            if let Some(v) = extract_tag(t, "title") {
                title = unescape(&v);
            } else if let Some(v) = extract_tag(t, "sub-title") {
                subtitle = Some(unescape(&v));
            } else if let Some(v) = extract_tag(t, "desc") {
                description = Some(unescape(&v));
            }
        }
        if !terminated {
            warnings.push(XmltvImportError::UnterminatedProgramme(out.len()));
            continue;
        }

        out.push(ImportedProgramme {
            start: start_ts,
            stop: stop_ts,
            channel_id: channel,
            title,
            subtitle,
            description,
            features: Features::empty(),
        });
    }

    (out, warnings)
}

fn extract_attr(line: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

fn extract_tag(line: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = line.find(&open)? + open.len();
    let end = line.find(&close)?;
    if end < start {
        return None;
    }
    Some(line[start..end].to_string())
}

/// Merges freshly scraped `new_programmes` with whatever survives expiry
/// in `old`, preferring new data but carrying over an old description,
/// subtitle, and feature bits when the titles are alnum-equivalent and the
/// new title is no longer than the old one.
pub fn merge(new_programmes: Vec<Programme>, old: Vec<ImportedProgramme>, now: NaiveDateTime, expire_min: i64) -> Vec<Programme> {
    let mut old: Vec<ImportedProgramme> = old
        .into_iter()
        .filter(|p| !crate::scrape::expire::is_expired(p.start, p.stop, now, expire_min))
        .collect();
    old.sort_by_key(|p| p.start);

    let mut new_sorted = new_programmes;
    new_sorted.sort_by_key(|p| p.start);

    let mut out = Vec::new();
    let mut oi = 0usize;

    for mut new in new_sorted {
        while oi < old.len() && old[oi].start < new.start {
            out.push(old_as_programme(&old[oi]));
            oi += 1;
        }

        while oi < old.len() && overlaps(&new, &old[oi]) {
            if str_cmp_alnum(&old[oi].title, &new.title) && old[oi].title.len() >= new.title.len() {
                new.subtitle = new.subtitle.or_else(|| old[oi].subtitle.clone());
                new.description = new.description.or_else(|| old[oi].description.clone());
                new.features |= old[oi].features;
            }
            oi += 1;
        }

        out.push(new);
    }
    out.extend(old[oi..].iter().map(old_as_programme));

    out
}

fn overlaps(new: &Programme, old: &ImportedProgramme) -> bool {
    let new_stop = new.stop.unwrap_or(new.start);
    let old_stop = old.stop.unwrap_or(old.start);
    old.start < new_stop && new.start < old_stop
}

fn old_as_programme(p: &ImportedProgramme) -> Programme {
    Programme {
        start: p.start,
        stop: p.stop,
        vps: None,
        title: p.title.clone(),
        subtitle: p.subtitle.clone(),
        description: p.description.clone(),
        features: p.features,
        ttx_ref: None,
        skip: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn programme(start: &str, title: &str) -> Programme {
        Programme {
            start: NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap(),
            stop: None,
            vps: None,
            title: title.to_string(),
            subtitle: None,
            description: None,
            features: Features::empty(),
            ttx_ref: None,
            skip: false,
        }
    }

    #[test]
    fn dvb_channel_id_uses_service_id() {
        assert_eq!(channel_id(&ChannelSource::Dvb { service_id: 4711 }), "SID_4711");
    }

    #[test]
    fn analog_channel_id_sanitizes_name() {
        assert_eq!(channel_id(&ChannelSource::Analog { name: "Das Erste!".to_string() }), "Das_Erste_");
    }

    #[test]
    fn export_then_import_round_trips_core_fields() {
        let mut p = programme("2024-05-01 20:15:00", "Film X & Y");
        p.description = Some("A <great> film".to_string());
        let xml = export("Demo", "SID_1", std::slice::from_ref(&p));
        let (imported, warnings) = import(&xml);
        assert!(warnings.is_empty());
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].title, "Film X & Y");
        assert_eq!(imported[0].description.as_deref(), Some("A <great> film"));
    }

    #[test]
    fn merge_keeps_old_description_when_new_has_none() {
        let now = NaiveDateTime::parse_from_str("2024-05-01 18:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let old = vec![ImportedProgramme {
            start: NaiveDateTime::parse_from_str("2024-05-01 20:15:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            stop: Some(NaiveDateTime::parse_from_str("2024-05-01 21:00:00", "%Y-%m-%d %H:%M:%S").unwrap()),
            channel_id: "SID_1".to_string(),
            title: "Film X".to_string(),
            subtitle: None,
            description: Some("old description".to_string()),
            features: Features::HD,
        }];
        let mut new = programme("2024-05-01 20:15:00", "Film X");
        new.stop = Some(NaiveDateTime::parse_from_str("2024-05-01 21:00:00", "%Y-%m-%d %H:%M:%S").unwrap());
        new.features = Features::SUBTITLES;

        let merged = merge(vec![new], old, now, 600);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].description.as_deref(), Some("old description"));
        assert!(merged[0].features.contains(Features::HD));
        assert!(merged[0].features.contains(Features::SUBTITLES));
    }
}
