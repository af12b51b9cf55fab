use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks.
/// Used for the editor API key and one-time edit tokens.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a presented editor API key against the configured one.
/// A missing presented key never matches.
pub fn verify_api_key(configured: &str, presented: Option<&str>) -> bool {
    match presented {
        Some(key) => constant_time_compare(configured, key),
        None => false,
    }
}
