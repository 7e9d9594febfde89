//! Teletext cross-reference detection at the end of a slot's title,
//! grounded in `epgttx/ttx_ov.cc`'s `T_OV_PAGE::ParseOvTtxRef`.

use once_cell::sync::OnceCell;
use regex::Regex;

/// A cross-reference like "...Details 316" or "...>312": separator, an
/// optional doubled separator, leading/trailing blanks, and a 3-digit page
/// number 1XX..8XX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefFormat {
    pub sep: char,
    pub sep_run: usize,
    pub lead_blanks: usize,
    pub trail_blanks: usize,
}

fn build_regex(fmt: &RefFormat) -> Regex {
    let sep = regex::escape(&fmt.sep.to_string());
    let pattern = format!(
        r"{sep}{{{run}}}\s{{{lead}}}([1-8][0-9]{{2}})\s{{{trail}}}$",
        run = fmt.sep_run,
        lead = fmt.lead_blanks,
        trail = fmt.trail_blanks,
    );
    Regex::new(&pattern).unwrap()
}

/// Scans raw trailing text of several titles for candidate formats and
/// returns the most frequent one, along with a ready-to-use matcher.
pub fn detect_ref_format(samples: &[&str]) -> Option<RefFormat> {
    static CANDIDATE: OnceCell<Regex> = OnceCell::new();
    let candidate = CANDIDATE.get_or_init(|| Regex::new(r"([.>])(\1*)\s*([1-8][0-9]{2})\s*$").unwrap());

    use std::collections::HashMap;
    let mut counts: HashMap<(char, usize), usize> = HashMap::new();
    for s in samples {
        if let Some(caps) = candidate.captures(s) {
            let sep = caps[1].chars().next().unwrap();
            let run = 1 + caps[2].len();
            *counts.entry((sep, run)).or_insert(0) += 1;
        }
    }
    let (&(sep, sep_run), _) = counts.iter().max_by_key(|(_, &c)| c)?;
    Some(RefFormat { sep, sep_run, lead_blanks: 1, trail_blanks: 0 })
}

/// Applies `fmt` to `title`, returning the stripped title and the
/// referenced page number if the format matched at end-of-line.
pub fn strip_ref(title: &str, fmt: &RefFormat) -> (String, Option<u16>) {
    let re = build_regex(fmt);
    match re.captures(title) {
        Some(caps) => {
            let m = caps.get(0).unwrap();
            let page_no: u16 = caps[1].parse().unwrap();
            let hex_page = ((page_no / 100) << 8) | (((page_no / 10) % 10) << 4) | (page_no % 10);
            (title[..m.start()].trim_end().to_string(), Some(hex_page))
        }
        None => (title.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_dot_and_gt_reference_format() {
        let samples = vec!["Tagesschau......>312", "Wetter..........>450"];
        let fmt = detect_ref_format(&samples).unwrap();
        assert_eq!(fmt.sep, '.');
        let (title, page) = strip_ref("Tagesschau......>312", &fmt);
        assert_eq!(title, "Tagesschau");
        assert_eq!(page, Some(0x312));
    }
}
