use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

// Printable ASCII outside the URI unreserved and reserved sets. `%` is left
// out so existing escapes survive; a bare `%` is escaped before encoding.
const URL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn is_escape(bytes: &[u8], i: usize) -> bool {
    i + 2 < bytes.len()
        && bytes[i + 1].is_ascii_hexdigit()
        && bytes[i + 2].is_ascii_hexdigit()
}

fn escape_bare_percent(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut escaped = String::with_capacity(raw.len());
    for (i, c) in raw.char_indices() {
        if c == '%' && !is_escape(bytes, i) {
            escaped.push_str("%25");
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Percent-encodes everything outside the URI unreserved and reserved sets.
///
/// Existing `%XX` escapes pass through so already-encoded URLs stay intact.
pub fn encode(raw: &str) -> String {
    utf8_percent_encode(&escape_bare_percent(raw), URL_ENCODE_SET).to_string()
}

pub fn is_relative(url: &str) -> bool {
    url.starts_with('/')
}

/// Joins a relative URL (`/path`) onto a profile host.
pub fn with_host(url: &str, host: Option<&str>) -> String {
    match host {
        Some(host) if is_relative(url) => {
            format!("{}/{}", host.trim_end_matches('/'), url.trim_start_matches('/'))
        }
        _ => url.to_string(),
    }
}
