use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(https?://)?",
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|",
        r"((\d{1,3}\.){3}\d{1,3}))",
        r"(:\d+)?(/[-a-z\d%_.~+]*)*",
        r"(\?[;&a-z\d%_.~+=-]*)?",
        r"(#[-a-z\d_]*)?$",
    ))
    .expect("url pattern is a valid regex")
});

/// Checks a string against the accepted URL grammar: optional http(s)
/// scheme, a domain name or IPv4 address, then optional port, path, query
/// and fragment.
pub fn is_valid_url(candidate: &str) -> bool {
    URL_PATTERN.is_match(candidate)
}

/// Percent-decodes once. Returns `None` when the decoded bytes are not UTF-8,
/// in which case the input is treated as not encoded.
fn decode_once(uri: &str) -> Option<String> {
    percent_decode_str(uri)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

pub fn is_encoded(uri: &str) -> bool {
    decode_once(uri).is_some_and(|decoded| decoded != uri)
}

/// Decodes repeatedly until the value stops changing, so double encoded
/// input ends up plain.
pub fn fully_decode(uri: &str) -> String {
    let mut current = uri.to_string();
    while let Some(decoded) = decode_once(&current) {
        if decoded == current {
            break;
        }
        debug!("Decoded url '{}' to '{}'", current, decoded);
        current = decoded;
    }
    current
}

/// Playlist detection is informational only and never changes processing.
pub fn is_possible_playlist(url: &str) -> bool {
    url.contains("playlist") && url.contains("list=")
}
