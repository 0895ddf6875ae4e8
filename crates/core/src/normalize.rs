use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Matching surface for every rule: lowercase, diacritics stripped, whitespace
/// runs (including OCR line breaks) collapsed to a single space.
pub fn normalize_label_text(input: &str) -> String {
    let stripped = input
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}
