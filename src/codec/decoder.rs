use std::borrow::Cow;

use tracing::trace;

use super::Fields;
use super::TelemetryValue;
use crate::constants::FIELD_SEPARATOR;
use crate::constants::KEY_VALUE_SEPARATOR;

/// Decodes one raw datagram into its fields.
///
/// Never fails: an empty line or a line made only of malformed tokens yields
/// an empty mapping.
pub fn decode(raw: &[u8]) -> Fields {
    decode_line(&decode_permissive(raw))
}

/// Same as [`decode`], removing a known framing prefix (e.g. `Received:`)
/// from the trimmed line first.
pub fn decode_framed(
    raw: &[u8],
    frame_prefix: Option<&str>,
) -> Fields {
    let text = decode_permissive(raw);
    match frame_prefix {
        Some(prefix) => decode_line(strip_frame_prefix(&text, prefix)),
        None => decode_line(&text),
    }
}

/// Splits a text line into `key:value` tokens.
///
/// Keys and values are trimmed; only the first `:` of a token separates key
/// from value. When a key repeats, the last value wins.
pub fn decode_line(line: &str) -> Fields {
    let mut fields = Fields::new();

    for token in line.trim().split(FIELD_SEPARATOR) {
        let Some((key, value)) = token.split_once(KEY_VALUE_SEPARATOR) else {
            if !token.trim().is_empty() {
                trace!(token, "skipping token without separator");
            }
            continue;
        };
        fields.insert(key.trim().to_string(), TelemetryValue::parse(value.trim()));
    }

    fields
}

/// Removes `prefix` from the trimmed line when present.
pub fn strip_frame_prefix<'a>(
    line: &'a str,
    prefix: &str,
) -> &'a str {
    let line = line.trim();
    match line.strip_prefix(prefix) {
        Some(rest) => rest.trim(),
        None => line,
    }
}

/// UTF-8 decoding that drops invalid byte sequences instead of failing.
pub(crate) fn decode_permissive(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(raw.utf8_chunks().map(|chunk| chunk.valid()).collect()),
    }
}
