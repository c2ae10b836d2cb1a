use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating slugs
    /// Must be lowercase alphanumeric with single hyphens between segments
    /// - Valid: "home-garden", "tv2", "kitchen"
    /// - Invalid: "-tv", "tv-", "home--garden", "Home", "home_garden"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Regex for validating phone numbers (loose: digits, spaces, parentheses, dashes, optional leading +)
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()\-]{6,20}$").unwrap();

    /// Regex for validating postal codes across countries
    /// - Valid: "12345", "12345-6789", "SW1A 1AA", "K1A-0B1"
    /// - Invalid: "", "-123", "1"
    pub static ref POSTAL_CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{1,9}$").unwrap();

    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Derive a slug from free text: lowercase ASCII alphanumerics joined by single hyphens
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Escape LIKE/ILIKE wildcards so a keyword matches literally
pub fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Normalize tags: trimmed, lowercase, non-empty, deduplicated, first occurrence wins
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
