//! JSON string escaping.
//!
//! Produces the same escaping as a general-purpose JSON encoder running in
//! HTML-safe mode:
//!
//! - `"` and `\` are backslash-escaped, as are `\n`, `\r` and `\t`
//! - All other control characters, plus `<`, `>` and `&`, become `\u00XX`
//! - U+2028 and U+2029 become `\u2028` / `\u2029`
//! - Invalid UTF-8 bytes become `\ufffd`, one per offending byte
//!
//! Every other character is copied through verbatim.
//!
//! ## Examples
//!
//! ```rust
//! use jsonslog::escape::append_quoted_json_string;
//!
//! let mut buf = Vec::new();
//! append_quoted_json_string(&mut buf, "<a href=\"x\">&</a>");
//! assert_eq!(buf, br#""\u003ca href=\"x\"\u003e\u0026\u003c/a\u003e""#);
//! ```

const HEX: &[u8; 16] = b"0123456789abcdef";

/// `HTML_SAFE_SET[b]` is true if the ASCII byte `b` can be represented inside
/// a JSON string embedded in an HTML `<script>` tag without escaping.
///
/// All values are true except for the ASCII control characters (0-31), the
/// double quote, the backslash, `<`, `>` and `&`.
pub static HTML_SAFE_SET: [bool; 128] = build_html_safe_set();

const fn build_html_safe_set() -> [bool; 128] {
    let mut set = [false; 128];
    let mut b = 0x20;
    while b < 128 {
        set[b] = !matches!(b as u8, b'"' | b'\\' | b'<' | b'>' | b'&');
        b += 1;
    }
    set
}

/// Appends the JSON string encoding of `s` to `buf`, without surrounding quotes.
#[inline]
pub fn append_json_string(buf: &mut Vec<u8>, s: &str) {
    append_json_bytes(buf, s.as_bytes());
}

/// Appends `s` to `buf` as a quoted JSON string.
#[inline]
pub fn append_quoted_json_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    append_json_bytes(buf, s.as_bytes());
    buf.push(b'"');
}

/// Appends the JSON string encoding of `s` to `buf`, without surrounding quotes.
///
/// `s` is interpreted as UTF-8 but may contain invalid sequences; each byte
/// that does not start a valid sequence is replaced with `\ufffd`.
pub fn append_json_bytes(buf: &mut Vec<u8>, s: &[u8]) {
    let mut start = 0;
    let mut i = 0;
    while i < s.len() {
        let b = s[i];
        if b < 0x80 {
            if HTML_SAFE_SET[b as usize] {
                i += 1;
                continue;
            }
            buf.extend_from_slice(&s[start..i]);
            buf.push(b'\\');
            match b {
                b'\\' | b'"' => buf.push(b),
                b'\n' => buf.push(b'n'),
                b'\r' => buf.push(b'r'),
                b'\t' => buf.push(b't'),
                // Remaining control characters, plus <, > and &.
                _ => {
                    buf.extend_from_slice(b"u00");
                    buf.push(HEX[(b >> 4) as usize]);
                    buf.push(HEX[(b & 0xF) as usize]);
                }
            }
            i += 1;
            start = i;
            continue;
        }

        let Some((c, size)) = decode_char(&s[i..]) else {
            buf.extend_from_slice(&s[start..i]);
            buf.extend_from_slice(b"\\ufffd");
            i += 1;
            start = i;
            continue;
        };

        // LINE SEPARATOR and PARAGRAPH SEPARATOR are valid JSON but not valid
        // JavaScript string literals.
        if c == '\u{2028}' || c == '\u{2029}' {
            buf.extend_from_slice(&s[start..i]);
            buf.extend_from_slice(b"\\u202");
            buf.push(HEX[(c as u32 & 0xF) as usize]);
            i += size;
            start = i;
            continue;
        }
        i += size;
    }
    buf.extend_from_slice(&s[start..]);
}

/// Decodes the non-ASCII character at the start of `s`.
///
/// Returns `None` when `s` does not start with a complete, valid UTF-8 sequence.
fn decode_char(s: &[u8]) -> Option<(char, usize)> {
    let width = match s[0] {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    let encoded = s.get(..width)?;
    let c = std::str::from_utf8(encoded).ok()?.chars().next()?;
    Some((c, width))
}
