//! Overview-page date parsing across English/German/French name tables,
//! grounded in `epgttx/ttx_date.cc`'s `MonthNames`/`WDayNames`/
//! `RelDateNames`/`T_PG_DATE::ParseOvDate`.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    English,
    German,
    French,
}

struct NameEntry {
    name: &'static str,
    lang: Lang,
    idx: u32,
}

const MONTH_NAMES: &[NameEntry] = &[
    NameEntry { name: "january", lang: Lang::English, idx: 1 },
    NameEntry { name: "february", lang: Lang::English, idx: 2 },
    NameEntry { name: "march", lang: Lang::English, idx: 3 },
    NameEntry { name: "april", lang: Lang::English, idx: 4 },
    NameEntry { name: "may", lang: Lang::English, idx: 5 },
    NameEntry { name: "june", lang: Lang::English, idx: 6 },
    NameEntry { name: "july", lang: Lang::English, idx: 7 },
    NameEntry { name: "august", lang: Lang::English, idx: 8 },
    NameEntry { name: "september", lang: Lang::English, idx: 9 },
    NameEntry { name: "october", lang: Lang::English, idx: 10 },
    NameEntry { name: "november", lang: Lang::English, idx: 11 },
    NameEntry { name: "december", lang: Lang::English, idx: 12 },
    NameEntry { name: "januar", lang: Lang::German, idx: 1 },
    NameEntry { name: "februar", lang: Lang::German, idx: 2 },
    NameEntry { name: "märz", lang: Lang::German, idx: 3 },
    NameEntry { name: "april", lang: Lang::German, idx: 4 },
    NameEntry { name: "mai", lang: Lang::German, idx: 5 },
    NameEntry { name: "juni", lang: Lang::German, idx: 6 },
    NameEntry { name: "juli", lang: Lang::German, idx: 7 },
    NameEntry { name: "august", lang: Lang::German, idx: 8 },
    NameEntry { name: "september", lang: Lang::German, idx: 9 },
    NameEntry { name: "oktober", lang: Lang::German, idx: 10 },
    NameEntry { name: "november", lang: Lang::German, idx: 11 },
    NameEntry { name: "dezember", lang: Lang::German, idx: 12 },
    NameEntry { name: "janvier", lang: Lang::French, idx: 1 },
    NameEntry { name: "février", lang: Lang::French, idx: 2 },
    NameEntry { name: "mars", lang: Lang::French, idx: 3 },
    NameEntry { name: "avril", lang: Lang::French, idx: 4 },
    NameEntry { name: "mai", lang: Lang::French, idx: 5 },
    NameEntry { name: "juin", lang: Lang::French, idx: 6 },
    NameEntry { name: "juillet", lang: Lang::French, idx: 7 },
    NameEntry { name: "août", lang: Lang::French, idx: 8 },
    NameEntry { name: "septembre", lang: Lang::French, idx: 9 },
    NameEntry { name: "octobre", lang: Lang::French, idx: 10 },
    NameEntry { name: "novembre", lang: Lang::French, idx: 11 },
    NameEntry { name: "décembre", lang: Lang::French, idx: 12 },
];

/// Weekday index 0=Sunday, matching `struct tm::tm_wday`.
const WDAY_NAMES: &[NameEntry] = &[
    NameEntry { name: "sun", lang: Lang::English, idx: 0 },
    NameEntry { name: "sunday", lang: Lang::English, idx: 0 },
    NameEntry { name: "mon", lang: Lang::English, idx: 1 },
    NameEntry { name: "monday", lang: Lang::English, idx: 1 },
    NameEntry { name: "tue", lang: Lang::English, idx: 2 },
    NameEntry { name: "tuesday", lang: Lang::English, idx: 2 },
    NameEntry { name: "wed", lang: Lang::English, idx: 3 },
    NameEntry { name: "wednesday", lang: Lang::English, idx: 3 },
    NameEntry { name: "thu", lang: Lang::English, idx: 4 },
    NameEntry { name: "thursday", lang: Lang::English, idx: 4 },
    NameEntry { name: "fri", lang: Lang::English, idx: 5 },
    NameEntry { name: "friday", lang: Lang::English, idx: 5 },
    NameEntry { name: "sat", lang: Lang::English, idx: 6 },
    NameEntry { name: "saturday", lang: Lang::English, idx: 6 },
    NameEntry { name: "so", lang: Lang::German, idx: 0 },
    NameEntry { name: "sonntag", lang: Lang::German, idx: 0 },
    NameEntry { name: "mo", lang: Lang::German, idx: 1 },
    NameEntry { name: "montag", lang: Lang::German, idx: 1 },
    NameEntry { name: "di", lang: Lang::German, idx: 2 },
    NameEntry { name: "dienstag", lang: Lang::German, idx: 2 },
    NameEntry { name: "mi", lang: Lang::German, idx: 3 },
    NameEntry { name: "mittwoch", lang: Lang::German, idx: 3 },
    NameEntry { name: "do", lang: Lang::German, idx: 4 },
    NameEntry { name: "donnerstag", lang: Lang::German, idx: 4 },
    NameEntry { name: "fr", lang: Lang::German, idx: 5 },
    NameEntry { name: "freitag", lang: Lang::German, idx: 5 },
    NameEntry { name: "sa", lang: Lang::German, idx: 6 },
    NameEntry { name: "samstag", lang: Lang::German, idx: 6 },
];

const REL_DAY_NAMES: &[NameEntry] = &[
    NameEntry { name: "today", lang: Lang::English, idx: 0 },
    NameEntry { name: "tomorrow", lang: Lang::English, idx: 1 },
    NameEntry { name: "heute", lang: Lang::German, idx: 0 },
    NameEntry { name: "morgen", lang: Lang::German, idx: 1 },
    NameEntry { name: "übermorgen", lang: Lang::German, idx: 2 },
    NameEntry { name: "aujourd'hui", lang: Lang::French, idx: 0 },
    NameEntry { name: "demain", lang: Lang::French, idx: 1 },
];

fn map_name<'a>(list: &'a [NameEntry], lang: Lang, word: &str) -> Option<&'a NameEntry> {
    let lower = word.to_lowercase();
    list.iter().find(|e| e.lang == lang && e.name == lower)
}

static DAY_MONTH_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\.(\d{1,2})\.(\d{2,4})?\b").unwrap());
static DAY_MONTHNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\.\s*([A-Za-zÀ-ÿ]+)(?:\s+(\d{2,4}))?\b").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-zÀ-ÿ'’]+").unwrap());

fn expand_year(year: i32, reference: NaiveDate) -> i32 {
    if year >= 100 {
        year
    } else {
        let cur_century = reference.year() - reference.year() % 100;
        cur_century + year
    }
}

/// Result of `parse_overview_date`: an absolute date, or a day offset to
/// resolve against the page's acquisition timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Absolute(NaiveDate),
    Relative(i64),
}

/// Tries every header line in priority order (absolute numeric date >
/// weekday+time range > bare weekday > relative-day word), returning the
/// highest-priority match across all lines. `reference` is the page's
/// acquisition timestamp, used to resolve weekday/relative references and
/// two-digit years.
pub fn parse_overview_date(lines: &[&str], lang: Lang, reference: NaiveDate) -> Option<ParsedDate> {
    let mut best: Option<(u8, ParsedDate)> = None;

    for &line in lines {
        if let Some(caps) = DAY_MONTHNAME.captures(line) {
            let day: u32 = caps[1].parse().ok()?;
            if let Some(entry) = map_name(MONTH_NAMES, lang, &caps[2]) {
                let year = caps
                    .get(3)
                    .and_then(|m| m.as_str().parse::<i32>().ok())
                    .map(|y| expand_year(y, reference))
                    .unwrap_or_else(|| reference.year());
                if let Some(date) = NaiveDate::from_ymd_opt(year, entry.idx, day) {
                    update_best(&mut best, 3, ParsedDate::Absolute(date));
                    continue;
                }
            }
        }

        if let Some(caps) = DAY_MONTH_NUMERIC.captures(line) {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let year = caps
                .get(3)
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .map(|y| expand_year(y, reference))
                .unwrap_or_else(|| reference.year());
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                update_best(&mut best, 3, ParsedDate::Absolute(date));
                continue;
            }
        }

        for word in WORD.find_iter(line) {
            if let Some(entry) = map_name(WDAY_NAMES, lang, word.as_str()) {
                let cur_wday = reference.weekday().num_days_from_sunday() as u32;
                let offset = if entry.idx >= cur_wday {
                    entry.idx - cur_wday
                } else {
                    (7 - cur_wday) + entry.idx
                };
                update_best(&mut best, 1, ParsedDate::Relative(offset as i64));
            }
            if let Some(entry) = map_name(REL_DAY_NAMES, lang, word.as_str()) {
                update_best(&mut best, 0, ParsedDate::Relative(entry.idx as i64));
            }
        }
    }

    best.map(|(_, date)| date)
}

fn update_best(best: &mut Option<(u8, ParsedDate)>, prio: u8, date: ParsedDate) {
    if best.is_none_or(|(p, _)| prio > p) {
        *best = Some((prio, date));
    }
}

/// Resolves a parsed date to an absolute calendar date against `reference`.
pub fn resolve(parsed: ParsedDate, reference: NaiveDate) -> NaiveDate {
    match parsed {
        ParsedDate::Absolute(d) => d,
        ParsedDate::Relative(offset) => reference + Duration::days(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2006, 4, 1).unwrap()
    }

    #[test]
    fn short_weekday_and_numeric_date_resolves() {
        let parsed = parse_overview_date(&["Mo 13.04.06 Das Erste"], Lang::German, ref_date()).unwrap();
        assert_eq!(resolve(parsed, ref_date()), NaiveDate::from_ymd_opt(2006, 4, 13).unwrap());
    }

    #[test]
    fn day_month_name_year_resolves_identically() {
        let parsed = parse_overview_date(&["13. April 2006"], Lang::German, ref_date()).unwrap();
        assert_eq!(resolve(parsed, ref_date()), NaiveDate::from_ymd_opt(2006, 4, 13).unwrap());
    }

    #[test]
    fn heute_resolves_to_acquisition_day() {
        let reference = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let parsed = parse_overview_date(&["heute im Ersten"], Lang::German, reference).unwrap();
        assert_eq!(parsed, ParsedDate::Relative(0));
        assert_eq!(resolve(parsed, reference), reference);
    }

    #[test]
    fn abbreviated_weekday_with_comma_and_short_date() {
        let reference = NaiveDate::from_ymd_opt(2006, 4, 1).unwrap();
        let parsed = parse_overview_date(&["Sa, 15.4."], Lang::German, reference).unwrap();
        let resolved = resolve(parsed, reference);
        assert_eq!(resolved.month(), 4);
        assert_eq!(resolved.day(), 15);
    }
}
