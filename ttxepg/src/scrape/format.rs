//! Overview-page line-format autodetection, grounded in `epgttx/ttx_ov.cc`'s
//! per-page format-record histogram (`T_OV_PAGE::ParseOvList`'s first pass).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// One page's autodetected column layout for overview lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    pub time_off: usize,
    pub title_off: usize,
    pub cont_off: usize,
    pub sep: char,
}

static TIME_LEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})([.:])(\d{2})(?:\s*-\s*\d{1,2}[.:]\d{2})?\s*(?:Uhr)?\s*").unwrap());
static LETTER_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)\S").unwrap());

struct Candidate {
    time_off: usize,
    title_off: usize,
    sep: char,
}

/// Scans `lines` (typically the first few sub-pages of an overview range)
/// and returns the most frequently occurring (time_off, sep) pair together
/// with the most frequent title_off among lines sharing it, and a
/// continuation-line indent learned from the line following each match.
pub fn detect_format(lines: &[&str]) -> Option<LineFormat> {
    let mut candidates = Vec::new();
    let mut cont_offs = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(m) = TIME_LEAD.find(line) else { continue };
        let caps = TIME_LEAD.captures(line).unwrap();
        let sep = caps.get(2).unwrap().as_str().chars().next().unwrap();
        let title_off = m.end();
        candidates.push(Candidate { time_off: m.start(), title_off, sep });

        if let Some(next) = lines.get(i + 1) {
            if let Some(caps) = LETTER_START.captures(next) {
                if next.as_bytes().get(caps[1].len()).is_some_and(|b| b.is_ascii_alphabetic()) {
                    cont_offs.push(caps[1].len());
                }
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }

    let mut by_time_sep: HashMap<(usize, char), usize> = HashMap::new();
    for c in &candidates {
        *by_time_sep.entry((c.time_off, c.sep)).or_insert(0) += 1;
    }
    let &(time_off, sep) = by_time_sep
        .iter()
        .max_by_key(|(_, &count)| count)
        .map(|(k, _)| k)
        .unwrap();

    let mut by_title_off: HashMap<usize, usize> = HashMap::new();
    for c in candidates.iter().filter(|c| c.time_off == time_off && c.sep == sep) {
        *by_title_off.entry(c.title_off).or_insert(0) += 1;
    }
    let title_off = *by_title_off.iter().max_by_key(|(_, &count)| count).map(|(k, _)| k).unwrap();

    let cont_off = if cont_offs.is_empty() {
        title_off
    } else {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for off in cont_offs {
            *counts.entry(off).or_insert(0) += 1;
        }
        *counts.iter().max_by_key(|(_, &count)| count).map(|(k, _)| k).unwrap()
    };

    Some(LineFormat { time_off, title_off, cont_off, sep })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_frequent_time_offset_and_separator() {
        let lines = vec![
            "11.15 Uhr  In aller Freundschaft",
            "12.00 Uhr  Tagesschau",
            "  13:00 Sonderformat",
        ];
        let fmt = detect_format(&lines).unwrap();
        assert_eq!(fmt.sep, '.');
        assert_eq!(fmt.time_off, 0);
    }
}
