//! Shared cursor helpers for the character-driven evaluators.

/// Parse a numeric literal starting at `i`; returns the value and the index
/// just past the consumed digits.
pub(crate) fn scan_number(bytes: &[u8], i: usize) -> (f64, usize) {
    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    if j < bytes.len() && bytes[j] == b'.' {
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
    }
    let v = std::str::from_utf8(&bytes[i..j])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::NAN);
    (v, j)
}

/// Parse an unsigned decimal, skipping leading whitespace; returns the
/// value (0 when no digits follow) and the index past the digits.
pub(crate) fn scan_usize(bytes: &[u8], i: usize) -> (usize, usize) {
    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    let mut v = 0usize;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        v = v.saturating_mul(10).saturating_add((bytes[j] - b'0') as usize);
        j += 1;
    }
    (v, j)
}

/// Capture a lambda body starting at the `{` at `i`, brace-nesting aware;
/// returns the body text and the index of the closing brace (or the end of
/// input when unterminated).
pub(crate) fn scan_lambda(expr: &str, bytes: &[u8], i: usize) -> (String, usize) {
    let start = i + 1;
    let mut j = start;
    let mut depth = 1usize;
    while j < bytes.len() {
        match bytes[j] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        j += 1;
    }
    let body = expr.get(start..j).unwrap_or_default().to_string();
    (body, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_scanning() {
        assert_eq!(scan_number(b"42 ", 0), (42.0, 2));
        assert_eq!(scan_number(b"3.25+", 0), (3.25, 4));
        assert_eq!(scan_number(b"7", 0), (7.0, 1));
    }

    #[test]
    fn usize_scanning_skips_leading_space() {
        assert_eq!(scan_usize(b"  12,", 0), (12, 4));
        assert_eq!(scan_usize(b"x", 0), (0, 0));
    }

    #[test]
    fn lambda_capture_is_nesting_aware() {
        let src = "{5 {$1 2 *}! 3 +} 4";
        let (body, close) = scan_lambda(src, src.as_bytes(), 0);
        assert_eq!(body, "5 {$1 2 *}! 3 +");
        assert_eq!(&src[close..close + 1], "}");
    }

    #[test]
    fn unterminated_lambda_captures_rest() {
        let src = "{1 2 +";
        let (body, close) = scan_lambda(src, src.as_bytes(), 0);
        assert_eq!(body, "1 2 +");
        assert_eq!(close, src.len());
    }
}
