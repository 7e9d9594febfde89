//! Programme slot extraction from a page's decoded text lines, grounded in
//! `epgttx/ttx_ov.cc`'s `T_OV_PAGE::ParseOvList` main scan loop.

use once_cell::sync::Lazy;
use regex::Regex;

use super::format::LineFormat;

#[derive(Debug, Clone, Default)]
pub struct RawSlot {
    pub start: (u32, u32),
    pub stop: Option<(u32, u32)>,
    pub vps: Option<(u32, u32)>,
    pub title_lines: Vec<String>,
    pub tip: bool,
    pub skip: bool,
}

static END_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:bis|-)\s*(\d{1,2})[.:](\d{2})\s*(?:uhr)?\s*$").unwrap());
static START_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})[.:](\d{2})").unwrap());

/// Footer detection (method a): scanning bottom-up, the footer begins at
/// the first line from the top of that scan that is a separator run, a
/// blank, or a teletext-page cross-reference. Lines below that boundary
/// are not slot candidates.
fn footer_start(lines: &[&str]) -> usize {
    static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{3,}\s*$").unwrap());
    static PAGE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d{3}\s*$").unwrap());

    let scan_from = lines.len().min(23);
    for row in (0..scan_from).rev() {
        let line = lines[row].trim_end();
        if SEPARATOR.is_match(line) || line.trim().is_empty() || PAGE_REF.is_match(line) {
            continue;
        }
        return row + 1;
    }
    scan_from
}

pub fn extract_slots(lines: &[&str], format: &LineFormat) -> Vec<RawSlot> {
    let mut slots: Vec<RawSlot> = Vec::new();
    let limit = footer_start(lines);

    for (i, &raw_line) in lines.iter().enumerate().take(limit) {
        let prefix_len = format.time_off.min(raw_line.len());
        let tip = raw_line[..prefix_len].trim_start().starts_with('!');
        let line = if raw_line.len() > format.time_off { &raw_line[format.time_off..] } else { "" };

        if let Some(caps) = START_TIME.captures(line) {
            let hour: u32 = caps[1].parse().unwrap_or(0);
            let minute: u32 = caps[2].parse().unwrap_or(0);
            let title_start = (format.title_off.saturating_sub(format.time_off)).min(line.len());
            let rest = line[title_start..].trim();

            let mut slot = RawSlot { start: (hour, minute), tip, ..Default::default() };
            let (title, stop) = strip_end_time(rest);
            slot.stop = stop;
            if !title.is_empty() {
                slot.title_lines.push(title);
            }
            slots.push(slot);
            continue;
        }

        if let Some(slot) = slots.last_mut() {
            if slot.stop.is_none() {
                let cont_start = format.cont_off.min(raw_line.len());
                let cont = raw_line[cont_start..].trim();
                if !cont.is_empty() && cont.chars().next().is_some_and(|c| c.is_alphabetic()) {
                    let (title, stop) = strip_end_time(cont);
                    if !title.is_empty() {
                        slot.title_lines.push(title);
                    }
                    if stop.is_some() {
                        slot.stop = stop;
                    }
                    continue;
                }
            }
            if slot.stop.is_none() {
                if let Some((_, stop)) = Some(strip_end_time(line.trim())) {
                    if let Some(s) = stop {
                        slot.stop = Some(s);
                    }
                }
            }
        }
        let _ = i;
    }

    dedup_adjacent_subpages(slots)
}

fn strip_end_time(text: &str) -> (String, Option<(u32, u32)>) {
    if let Some(caps) = END_TIME.captures(text) {
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps[2].parse().unwrap_or(0);
        let m = caps.get(0).unwrap();
        (text[..m.start()].trim().to_string(), Some((hour, minute)))
    } else {
        (text.to_string(), None)
    }
}

/// Cross-sub-page duplicate collapsing happens one level up, in
/// `scrape_channel`, which compares each sub-page's full (hour, minute)
/// sequence against its predecessor's; a single sub-page's own slot list
/// never contains (hour, minute) repeats to collapse.
fn dedup_adjacent_subpages(slots: Vec<RawSlot>) -> Vec<RawSlot> {
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::format::detect_format;

    #[test]
    fn extracts_title_and_explicit_stop_time() {
        let lines = vec!["11.15 - 12.00 Uhr In aller Freundschaft 16:9/UT"];
        let fmt = detect_format(&lines).unwrap();
        let slots = extract_slots(&lines, &fmt);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, (11, 15));
        assert_eq!(slots[0].stop, Some((12, 0)));
        assert!(slots[0].title_lines[0].contains("In aller Freundschaft"));
    }

    #[test]
    fn extracts_slot_with_no_stop_time() {
        let lines = vec!["15.35 Sports Live"];
        let fmt = detect_format(&lines).unwrap();
        let slots = extract_slots(&lines, &fmt);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, (15, 35));
        assert!(slots[0].stop.is_none());
    }
}
