use std::sync::OnceLock;

use regex::Regex;

/// Deprecated airport codes and city codes, rewritten to a canonical airport.
pub const CODE_ALIASES: &[(&str, &str)] = &[
    // Berlin Tegel and Schönefeld closed when Brandenburg opened
    ("TXL", "BER"),
    ("SXF", "BER"),
    // City code
    ("NYC", "JFK"),
];

pub fn canonical_code(code: &str) -> &str {
    CODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map_or(code, |&(_, target)| target)
}

/// Extracts a three-letter airport code from a free-text location.
///
/// Accepts `"LHR"` or `"LHR (CDG)"` outright (the parenthesized code wins),
/// otherwise the last parenthesized code anywhere in the text. Plain words
/// such as `"Berlin Hbf"` never match.
pub fn extract_code(raw: Option<&str>) -> Option<String> {
    static STRICT_RE: OnceLock<Regex> = OnceLock::new();
    static PAREN_RE: OnceLock<Regex> = OnceLock::new();

    let raw = raw?.trim().to_uppercase();
    if raw.is_empty() {
        return None;
    }

    let strict = STRICT_RE.get_or_init(|| {
        Regex::new(r"^(?P<c1>[A-Z]{3})(?:\s*\((?P<c2>[A-Z]{3})\))?$").expect("valid regex")
    });
    let code = if let Some(caps) = strict.captures(&raw) {
        caps.name("c2").or_else(|| caps.name("c1"))?.as_str().to_owned()
    } else {
        let paren = PAREN_RE.get_or_init(|| Regex::new(r"\(([A-Z]{3})\)").expect("valid regex"));
        paren
            .captures_iter(&raw)
            .last()?
            .get(1)?
            .as_str()
            .to_owned()
    };

    Some(canonical_code(&code).to_owned())
}
