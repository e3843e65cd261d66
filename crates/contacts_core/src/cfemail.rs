use thiserror::Error;

/// Path segment Cloudflare uses for email-protection links.
const PROTECTION_PATH: &str = "/cdn-cgi/l/email-protection";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token has no key byte")]
    MissingKey,
    #[error("token has an odd number of hex digits ({len})")]
    OddLength { len: usize },
    #[error("invalid hex digit {found:?} at position {position}")]
    InvalidHex { position: usize, found: char },
}

/// Decode a Cloudflare email-protection token (`data-cfemail`).
///
/// The first byte of the hex string is an XOR key; every following byte,
/// XOR-ed with the key, is one character of the address. Bytes outside
/// printable ASCII are passed through as the char with that code point.
pub fn decode_cfemail(token: &str) -> Result<String, DecodeError> {
    if let Some((position, found)) = token.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex { position, found });
    }
    if token.len() < 2 {
        return Err(DecodeError::MissingKey);
    }
    if token.len() % 2 != 0 {
        return Err(DecodeError::OddLength { len: token.len() });
    }

    let bytes = hex_bytes(token);
    let (key, body) = match bytes.split_first() {
        Some(split) => split,
        None => return Err(DecodeError::MissingKey),
    };
    Ok(body.iter().map(|b| char::from(b ^ key)).collect())
}

/// Token carried in the fragment of an email-protection link, if any.
///
/// `/cdn-cgi/l/email-protection#6a0b2a1e0f191e440905` yields
/// `6a0b2a1e0f191e440905`.
pub fn cfemail_token_from_href(href: &str) -> Option<&str> {
    let (path, fragment) = href.trim().split_once('#')?;
    if !path.ends_with(PROTECTION_PATH) {
        return None;
    }
    let fragment = fragment.trim();
    if fragment.is_empty() {
        None
    } else {
        Some(fragment)
    }
}

// Callers validate that every digit is ASCII hex and the length is even.
fn hex_bytes(token: &str) -> Vec<u8> {
    token
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
        .collect()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::hex_bytes;

    #[test]
    fn hex_bytes_accepts_mixed_case() {
        assert_eq!(hex_bytes("0aFf"), vec![0x0a, 0xff]);
    }
}
