//! Description-page text cleanup: cast-table reformatting, hyphenation
//! undo, and blank-line collapsing. Grounded in `epgttx/ttx_ov.cc`'s
//! `T_OV_PAGE::ParseDescCast` and the surrounding description cleaner.

use once_cell::sync::Lazy;
use regex::Regex;

static CAST_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\.{3,}\s*(.+)$").unwrap());
static HYPHEN_WRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-\s*$").unwrap());

/// Ignores whitespace and punctuation when comparing two strings for
/// equality, the way the original `str_cmp_alnum` does when matching an
/// overview title against a description page's first lines.
pub fn str_cmp_alnum(a: &str, b: &str) -> bool {
    let norm = |s: &str| s.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect::<String>();
    norm(a) == norm(b)
}

/// Reformats consecutive "Role.....Actor" lines into one comma-separated,
/// period-terminated sentence ("Role: Actor, Role: Actor.").
fn reformat_cast_block(lines: &[String]) -> Option<String> {
    let rows: Vec<(&str, &str)> = lines
        .iter()
        .filter_map(|l| CAST_ROW.captures(l).map(|c| (c.get(1).unwrap().as_str(), c.get(2).unwrap().as_str())))
        .collect();
    if rows.len() < lines.len() || rows.is_empty() {
        return None;
    }
    let joined = rows
        .iter()
        .map(|(role, actor)| format!("{}: {}", role.trim(), actor.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("{joined}."))
}

/// Cleans raw description-page body lines: drops blank-collapsed
/// paragraphs, undoes in-word hyphenation across a line break, and
/// reformats cast-table blocks when a contiguous run of lines all match the
/// `Role....Actor` shape.
pub fn clean_description(lines: &[String]) -> String {
    let mut paragraphs: Vec<Vec<String>> = vec![Vec::new()];
    for line in lines {
        if line.trim().is_empty() {
            if !paragraphs.last().unwrap().is_empty() {
                paragraphs.push(Vec::new());
            }
        } else {
            paragraphs.last_mut().unwrap().push(line.clone());
        }
    }

    let mut out = Vec::new();
    for para in paragraphs.into_iter().filter(|p| !p.is_empty()) {
        if let Some(cast) = reformat_cast_block(&para) {
            out.push(cast);
            continue;
        }

        let mut joined = String::new();
        for line in &para {
            if HYPHEN_WRAP.is_match(&joined) {
                let trimmed = joined.trim_end_matches('-');
                joined = format!("{trimmed}{}", line.trim_start());
            } else if joined.is_empty() {
                joined.push_str(line.trim());
            } else {
                joined.push(' ');
                joined.push_str(line.trim());
            }
        }
        out.push(joined);
    }

    out.join("\n\n")
}

/// Given lines from several sub-pages at the same row index, lines that
/// agree character-for-character across ≥90% of sub-pages are treated as
/// static header/footer chrome and excluded from the description body.
pub fn static_row_mask(rows_by_subpage: &[Vec<String>]) -> Vec<bool> {
    let Some(row_count) = rows_by_subpage.iter().map(|p| p.len()).max() else { return Vec::new() };
    let sub_count = rows_by_subpage.len();
    (0..row_count)
        .map(|row| {
            let mut counts = std::collections::HashMap::new();
            for page in rows_by_subpage {
                if let Some(text) = page.get(row) {
                    *counts.entry(text.clone()).or_insert(0usize) += 1;
                }
            }
            counts.values().any(|&c| c as f64 / sub_count as f64 >= 0.9 && sub_count > 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reformats_cast_table_into_sentence() {
        let lines = vec!["Director..........Jane Doe".to_string(), "Producer.........John Roe".to_string()];
        let cleaned = clean_description(&lines);
        assert_eq!(cleaned, "Director: Jane Doe, Producer: John Roe.");
    }

    #[test]
    fn undoes_in_word_hyphenation_across_lines() {
        let lines = vec!["Ein Wort-".to_string(), "bruch tritt auf.".to_string()];
        let cleaned = clean_description(&lines);
        assert_eq!(cleaned, "Ein Wortbruch tritt auf.");
    }

    #[test]
    fn alnum_compare_ignores_case_and_punctuation() {
        assert!(str_cmp_alnum("In aller Freundschaft!", "in aller freundschaft"));
        assert!(!str_cmp_alnum("Tagesschau", "Sportschau"));
    }
}
