use aho_corasick::AhoCorasick;
use memchr::memchr;
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use quince::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Unescape XML entities.
///
/// Replaces the five predefined entities as well as decimal (`&#65;`) and
/// hexadecimal (`&#x41;`) character references in a single left-to-right pass,
/// so an escaped ampersand never starts a second entity.
/// Unknown or malformed entities are left unchanged.
///
/// # Examples
///
/// ```
/// use quince::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&quot;hello&apos;"), "\"hello'");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
/// assert_eq!(unescape_xml("a & b"), "a & b"); // unchanged
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;"); // unknown entity
/// assert_eq!(unescape_xml("&amp"), "&amp"); // incomplete, no semicolon
/// ```
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut pos = first;

    while pos < s.len() {
        let rest = &s[pos..];
        if !rest.starts_with('&') {
            let next = memchr(b'&', rest.as_bytes()).unwrap_or(rest.len());
            out.push_str(&rest[..next]);
            pos += next;
            continue;
        }

        // Entity names are short; bound the search for the terminator
        let window = &rest.as_bytes()[..rest.len().min(12)];
        match memchr(b';', window).and_then(|end| decode_entity(&rest[1..end]).map(|c| (end, c))) {
            Some((end, c)) => {
                out.push(c);
                pos += end + 1;
            },
            None => {
                out.push('&');
                pos += 1;
            },
        }
    }

    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()?,
            };
            char::from_u32(code)
        },
    }
}

/// Whether `c` may appear in an XML 1.0 document.
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Remove characters that XML 1.0 does not allow (control characters, U+FFFE, U+FFFF).
///
/// # Examples
///
/// ```
/// use quince::common::xml::strip_invalid_xml_chars;
/// assert_eq!(strip_invalid_xml_chars("a\u{1}b\u{FFFF}c"), "abc");
/// assert_eq!(strip_invalid_xml_chars("tab\tok"), "tab\tok");
/// ```
pub fn strip_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
    }
}
