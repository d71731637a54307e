const BYTE_ORDER_MARK: char = '\u{feff}';

/// Strips one leading byte-order mark, then surrounding whitespace.
///
/// The BOM counts as whitespace when trimming, so a mark that only becomes
/// leading after the first strip is removed too. That keeps the function
/// idempotent.
pub fn preprocess(raw: &str) -> String {
    let without_bom = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    without_bom.trim_matches(is_trimmable).to_string()
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || c == BYTE_ORDER_MARK
}
