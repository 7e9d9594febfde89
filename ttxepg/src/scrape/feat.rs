//! Trailing feature-tag extraction, grounded in `epgttx/ttx_feat.cc`'s
//! `FeatToFlagMap` / `ParseTrailingFeat`.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Features: u32 {
        const SUBTITLES = 1 << 0;
        const OMU       = 1 << 1;
        const BW        = 1 << 2;
        const HD        = 1 << 3;
        const ASPECT_16_9 = 1 << 4;
        const TWO_CHANNEL = 1 << 5;
        const STEREO    = 1 << 6;
        const DOLBY     = 1 << 7;
        const MONO      = 1 << 8;
        const TIP       = 1 << 9;
        const REPEAT    = 1 << 10;
    }
}

/// One recognized trailing keyword and the flag it sets. Order matters:
/// the original source's linear scan takes the first case-insensitive
/// prefix match, so `ut` must stay ahead of longer look-alikes.
const FEAT_TABLE: &[(&str, Features)] = &[
    ("untertitel", Features::SUBTITLES),
    ("ut", Features::SUBTITLES),
    ("omu", Features::OMU),
    ("s/w", Features::BW),
    ("sw", Features::BW),
    ("hd", Features::HD),
    ("breitbild", Features::ASPECT_16_9),
    ("16:9", Features::ASPECT_16_9),
    ("oo", Features::STEREO),
    ("stereo", Features::STEREO),
    ("ad", Features::TWO_CHANNEL),
    ("hörfilm", Features::TWO_CHANNEL),
    ("hf", Features::TWO_CHANNEL),
    ("2k-ton", Features::TWO_CHANNEL),
    ("2k", Features::TWO_CHANNEL),
    ("dolby", Features::DOLBY),
    ("surround", Features::DOLBY),
    ("mono", Features::MONO),
    ("tipp!", Features::TIP),
    ("tipp", Features::TIP),
    ("ds", Features::DOLBY),
    ("ss", Features::DOLBY),
    ("dd", Features::DOLBY),
    ("zs", Features::TWO_CHANNEL),
    ("wh.", Features::REPEAT),
    ("wdh.", Features::REPEAT),
];

fn map_token(token: &str) -> Option<Features> {
    let lower = token.to_lowercase();
    FEAT_TABLE
        .iter()
        .find(|(name, _)| lower == *name)
        .map(|(_, flag)| *flag)
}

static TRAILING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:[ ,/]+|^)(untertitel|ut|omu|s/w|sw|hd|breitbild|16:9|oo|stereo|ad|hörfilm|hf|2k-ton|2k|dolby|surround|mono|tipp!|tipp|ds|ss|dd|zs|wh\.|wdh\.)\s*$").unwrap()
});

/// Repeatedly strips one recognized trailing keyword at a time (optionally
/// parenthesized, comma/slash/space separated) from `title`, accumulating
/// flags, until no further match anchors at end-of-line. A leading `!` in
/// the title marks the broadcaster-specific "tip" convention some
/// overviews use instead of a trailing keyword.
pub fn parse_trailing_features(title: &str, leading_tip_marker: bool) -> (String, Features) {
    let mut flags = Features::empty();
    if leading_tip_marker {
        flags |= Features::TIP;
    }

    let mut work = title.trim_end().to_string();
    if let Some(stripped) = work.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            let inner = &stripped[open + 1..];
            let mut any = false;
            for token in inner.split(|c| c == '/' || c == ',' || c == ' ').filter(|t| !t.is_empty()) {
                if let Some(flag) = map_token(token) {
                    flags |= flag;
                    any = true;
                }
            }
            if any {
                work.truncate(open);
                work = work.trim_end().to_string();
            }
        }
    }

    loop {
        let Some(caps) = TRAILING_TOKEN.captures(&work) else { break };
        let m = caps.get(0).unwrap();
        let token = caps.get(1).unwrap().as_str();
        match map_token(token) {
            Some(flag) => {
                flags |= flag;
                work.truncate(m.start());
                work = work.trim_end_matches([' ', ',', '/']).to_string();
            }
            None => break,
        }
    }

    (work.trim().to_string(), flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_trailing_keyword() {
        let (title, flags) = parse_trailing_features("In aller Freundschaft UT", false);
        assert_eq!(title, "In aller Freundschaft");
        assert!(flags.contains(Features::SUBTITLES));
    }

    #[test]
    fn strips_slash_separated_keywords_from_spec_example() {
        let (title, flags) = parse_trailing_features("In aller Freundschaft 16:9/UT", false);
        assert_eq!(title, "In aller Freundschaft");
        assert!(flags.contains(Features::ASPECT_16_9));
        assert!(flags.contains(Features::SUBTITLES));
    }

    #[test]
    fn strips_parenthesized_keyword_group() {
        let (title, flags) = parse_trailing_features("Spielfilm (oo, 2K)", false);
        assert_eq!(title, "Spielfilm");
        assert!(flags.contains(Features::STEREO));
        assert!(flags.contains(Features::TWO_CHANNEL));
    }

    #[test]
    fn leading_tip_marker_sets_flag_without_touching_title() {
        let (title, flags) = parse_trailing_features("Tagesschau", true);
        assert_eq!(title, "Tagesschau");
        assert!(flags.contains(Features::TIP));
    }

    #[test]
    fn untouched_title_has_no_flags() {
        let (title, flags) = parse_trailing_features("Tagesschau", false);
        assert_eq!(title, "Tagesschau");
        assert_eq!(flags, Features::empty());
    }
}
