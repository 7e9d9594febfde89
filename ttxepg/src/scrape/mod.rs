//! EPG scraper: turns a teletext overview page range into a list of
//! programme slots. Pipeline stages mirror `epgttx/ttx_ov.cc`'s
//! `T_OV_PAGE` processing: format autodetection, date parsing, slot
//! extraction, reference/feature stripping, description retrieval and
//! stop-time derivation, with expiration applied last.

pub mod date;
pub mod description;
pub mod expire;
pub mod feat;
pub mod format;
pub mod reference;
pub mod slot;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use ttxepg_types::page::PageNumber;

use crate::db::PageDb;
use date::Lang;
use feat::Features;
use format::detect_format;
use reference::{detect_ref_format, strip_ref};
use slot::extract_slots;

/// One scraped programme, ready for XMLTV export.
#[derive(Debug, Clone)]
pub struct Programme {
    pub start: NaiveDateTime,
    pub stop: Option<NaiveDateTime>,
    pub vps: Option<NaiveDateTime>,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub features: Features,
    pub ttx_ref: Option<PageNumber>,
    pub skip: bool,
}

/// Scrapes every decimal sub-page in `[ov_start, ov_end]`, returning the
/// merged, expiration-filtered programme list for one broadcaster.
pub fn scrape_channel(
    db: &PageDb,
    ov_start: PageNumber,
    ov_end: PageNumber,
    lang: Lang,
    acquisition_time: NaiveDateTime,
    expire_min: i64,
) -> Vec<Programme> {
    let mut programmes = Vec::new();
    let mut prev_date: Option<NaiveDate> = None;
    let mut prev_first_hour: Option<u32> = None;

    let mut page = ov_start;
    loop {
        let subs: Vec<u16> = db.sub_pages(page).collect();
        if !subs.is_empty() {
            let mut sorted_subs = subs.clone();
            sorted_subs.sort_unstable();

            let mut page_programmes: Vec<Programme> = Vec::new();
            let mut page_date = prev_date;
            let mut prev_sub_sequence: Option<Vec<(u32, u32)>> = None;
            let mut sub_page_skip_count = 0u32;

            for &sub in &sorted_subs {
                let Some(entry) = db.get(page, sub) else { continue };
                let header_text = PageDb::get_text(&entry.header);
                let mut body_rows: Vec<String> = Vec::new();
                for row in entry.rows.iter().flatten() {
                    body_rows.push(PageDb::get_text(row));
                }
                let body_refs: Vec<&str> = body_rows.iter().map(|s| s.as_str()).collect();

                let reference_date = page_date.unwrap_or(acquisition_time.date());
                let date_lines = std::iter::once(header_text.as_str()).chain(body_refs.iter().copied()).collect::<Vec<_>>();
                if let Some(parsed) = date::parse_overview_date(&date_lines, lang, reference_date) {
                    page_date = Some(date::resolve(parsed, reference_date));
                }
                let effective_date = page_date.unwrap_or(acquisition_time.date());

                let Some(fmt) = detect_format(&body_refs) else { continue };
                let raw_slots = extract_slots(&body_refs, &fmt);
                if raw_slots.is_empty() {
                    continue;
                }

                if let Some(first_hour) = prev_first_hour {
                    if let Some(slot0) = raw_slots.first() {
                        if slot0.start.0 < first_hour && page_date == prev_date {
                            page_date = page_date.map(|d| d + chrono::Duration::days(1));
                        }
                    }
                }

                let title_lines: Vec<&str> = raw_slots
                    .iter()
                    .filter_map(|s| s.title_lines.last())
                    .map(|s| s.as_str())
                    .collect();
                let ref_fmt = detect_ref_format(&title_lines);

                // Two adjacent sub-pages carrying the same (hour, minute)
                // slot sequence differ only in ad filler; keep the first
                // sub-page's slots and mark this repeat's slots skipped.
                let this_sequence: Vec<(u32, u32)> = raw_slots.iter().map(|s| s.start).collect();
                let is_duplicate_subpage =
                    prev_sub_sequence.as_ref() == Some(&this_sequence) && !this_sequence.is_empty();
                if is_duplicate_subpage {
                    sub_page_skip_count += 1;
                }
                prev_sub_sequence = Some(this_sequence);

                let mut date_offset_days = 0i64;
                let mut last_hm: Option<(u32, u32)> = None;
                for raw in raw_slots {
                    if let Some((ph, pm)) = last_hm {
                        if (raw.start.0, raw.start.1) < (ph, pm) {
                            date_offset_days += 1;
                        }
                    }
                    last_hm = Some(raw.start);

                    let joined_title = raw.title_lines.join(" ");
                    let (title_no_ref, ttx_ref) = match &ref_fmt {
                        Some(fmt) => strip_ref(&joined_title, fmt),
                        None => (joined_title, None),
                    };
                    let (title, features) = feat::parse_trailing_features(&title_no_ref, raw.tip);

                    let slot_date = effective_date + chrono::Duration::days(date_offset_days);
                    let start = NaiveDateTime::new(
                        slot_date,
                        NaiveTime::from_hms_opt(raw.start.0, raw.start.1, 0).unwrap_or_default(),
                    );
                    let stop = raw.stop.map(|(h, m)| {
                        let mut d = slot_date;
                        if (h, m) < raw.start {
                            d += chrono::Duration::days(1);
                        }
                        NaiveDateTime::new(d, NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default())
                    });
                    let vps = raw.vps.map(|(h, m)| {
                        NaiveDateTime::new(slot_date, NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default())
                    });

                    page_programmes.push(Programme {
                        start,
                        stop,
                        vps,
                        title,
                        subtitle: None,
                        description: None,
                        features,
                        ttx_ref: ttx_ref.map(PageNumber),
                        skip: raw.skip || is_duplicate_subpage,
                    });
                }
            }

            if sub_page_skip_count > 0 {
                tracing::debug!(page = ?page, sub_page_skip_count, "collapsed duplicate overview sub-pages");
            }
            derive_stop_times(&mut page_programmes);

            if let Some(first) = page_programmes.first() {
                prev_first_hour = Some(first.start.time().hour());
            }
            prev_date = page_date;
            programmes.extend(page_programmes);
        }

        if page == ov_end {
            break;
        }
        page = page.next();
    }

    // Cross-page stop-time derivation: a page's last slot with no stop
    // borrows the following page's first slot start, if within 9 hours.
    for i in 0..programmes.len().saturating_sub(1) {
        if programmes[i].stop.is_none() {
            let next_start = programmes[i + 1].start;
            if next_start > programmes[i].start && next_start - programmes[i].start < chrono::Duration::hours(9) {
                programmes[i].stop = Some(next_start);
            }
        }
    }

    programmes.retain(|p| !expire::is_expired(p.start, p.stop, acquisition_time, expire_min));
    programmes
}

use chrono::Timelike;

/// Within one page, a slot missing a stop-time borrows the next slot's
/// start-time.
fn derive_stop_times(programmes: &mut [Programme]) {
    for i in 0..programmes.len().saturating_sub(1) {
        if programmes[i].stop.is_none() {
            programmes[i].stop = Some(programmes[i + 1].start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttxepg_types::page::PageControl;

    fn ctrl() -> PageControl {
        PageControl { ctrl_lo: 0, ctrl_hi: 0 }
    }

    fn row(text: &str) -> [u8; 40] {
        let mut r = [b' '; 40];
        for (i, b) in text.bytes().enumerate().take(40) {
            let parity = (b.count_ones() % 2 == 0) as u8;
            r[i] = b | (parity << 7);
        }
        r
    }

    #[test]
    fn single_page_with_explicit_date_and_stop_time() {
        let mut db = PageDb::new();
        db.add_page(PageNumber(0x301), 0, ctrl(), row("Mi 12.04.06 Das Erste"), 1000);
        db.add_page_data(PageNumber(0x301), 0, 1, row("11.15 - 12.00 Uhr In aller Freundschaft 16:9/UT 313"));

        let now = NaiveDateTime::parse_from_str("2006-04-12 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let programmes = scrape_channel(&db, PageNumber(0x301), PageNumber(0x301), Lang::German, now, 600);

        assert_eq!(programmes.len(), 1);
        let p = &programmes[0];
        assert_eq!(p.start, NaiveDateTime::parse_from_str("2006-04-12 11:15:00", "%Y-%m-%d %H:%M:%S").unwrap());
        assert_eq!(p.stop, Some(NaiveDateTime::parse_from_str("2006-04-12 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()));
        assert!(p.title.contains("In aller Freundschaft"));
        assert!(p.features.contains(Features::ASPECT_16_9));
        assert!(p.features.contains(Features::SUBTITLES));
    }

    #[test]
    fn identical_subpages_collapse_to_one_slot() {
        let mut db = PageDb::new();
        // Sub-pages 1 and 2 carry the same start-time column; in a real
        // broadcast they'd differ only in filler ad text, which this
        // dedup rule deliberately ignores (it compares (hour, minute)
        // sequences only, not title content).
        db.add_page(PageNumber(0x303), 1, ctrl(), row("Mi 12.04.06 Das Erste"), 1000);
        db.add_page_data(PageNumber(0x303), 1, 1, row("15.35 Sports Live"));
        db.add_page(PageNumber(0x303), 2, ctrl(), row("Mi 12.04.06 Das Erste"), 1000);
        db.add_page_data(PageNumber(0x303), 2, 1, row("15.35 Sports Live"));

        let now = NaiveDateTime::parse_from_str("2006-04-12 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let programmes = scrape_channel(&db, PageNumber(0x303), PageNumber(0x303), Lang::German, now, 600);

        let visible: Vec<_> = programmes.iter().filter(|p| !p.skip).collect();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].title.contains("Sports Live"));
        assert_eq!(programmes.len(), 2);
        assert!(programmes[1].skip);
    }
}
