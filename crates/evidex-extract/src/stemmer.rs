//! Light English suffix stripping, used only to conflate inflected forms
//! ("graph"/"graphs", "network"/"networks"/"networking") before counting.
//!
//! The stem is a grouping key, never shown: output keeps a surface form.

/// Inflectional suffixes, longest first: (suffix, replacement).
const SUFFIXES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ies", "y"),
    ("ing", ""),
    ("ed", ""),
    ("es", "e"),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
];

/// Conflation key for an English word.
pub fn stem_key(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }

    for &(suffix, replacement) in SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            // Keep at least three chars of stem so "sing"/"bed" survive.
            if stem.chars().count() < 3 {
                continue;
            }
            let mut key = format!("{}{}", stem, replacement);
            // "running" → "runn" → "run"
            if replacement.is_empty() && (suffix == "ing" || suffix == "ed") {
                undouble(&mut key);
            }
            return key;
        }
    }

    word.to_string()
}

fn undouble(key: &mut String) {
    let mut chars = key.chars().rev();
    if let (Some(a), Some(b)) = (chars.next(), chars.next()) {
        if a == b && !matches!(a, 'l' | 's' | 'z') && a.is_alphabetic() {
            key.pop();
        }
    }
}
