use crate::source::ExtractionErrorKind;
use regex::Regex;
use std::sync::OnceLock;

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$([\d,]+)$").expect("price pattern"))
}

fn beds_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\d,]+) beds?$").expect("beds pattern"))
}

fn reviews_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+) reviews?").expect("reviews pattern"))
}

fn whole_number(digits: &str) -> Option<u32> {
    digits.replace(',', "").parse().ok()
}

/// `$1,250` -> 1250. Only a bare dollar amount matches.
pub fn extract_price(text: &str) -> Option<u32> {
    let captures = price_regex().captures(text.trim())?;
    whole_number(captures.get(1)?.as_str())
}

/// `3 beds` / `1 bed` -> bed count.
pub fn extract_beds(text: &str) -> Option<u32> {
    let captures = beds_regex().captures(text.trim())?;
    whole_number(captures.get(1)?.as_str())
}

/// `27 reviews` -> 27.
pub fn extract_review_count(text: &str) -> Option<u32> {
    let captures = reviews_regex().captures(text.trim())?;
    captures.get(1)?.as_str().parse().ok()
}

/// Rating from an aria label such as `Rated 4.85 out of 5 stars`.
pub fn extract_rating(label: &str) -> Option<f32> {
    label.split_whitespace().nth(1)?.parse().ok()
}

/// Splits `title - type - city`. Extra ` - ` separators belong to the title.
pub fn split_name_type_city(content: &str) -> Result<(String, String, String), ExtractionErrorKind> {
    let parts: Vec<&str> = content.split(" - ").collect();
    if parts.len() < 3 {
        return Err(ExtractionErrorKind::MalformedName);
    }
    let city = parts[parts.len() - 1];
    let property_type = parts[parts.len() - 2];
    let name = parts[..parts.len() - 2].join(" - ");
    Ok((name, property_type.to_string(), city.to_string()))
}
