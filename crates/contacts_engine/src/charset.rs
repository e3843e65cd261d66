use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// How far into the document a `<meta charset>` declaration is looked for.
const META_PRESCAN_BYTES: usize = 1024;

/// Page text plus what was learned while decoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub text: String,
    /// Name of the encoding actually used.
    pub encoding: &'static str,
    /// Some bytes were malformed and replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode a fetched page into text.
///
/// The encoding is taken from, in order: a byte order mark, the
/// `Content-Type` charset parameter, a `<meta charset>` in the first
/// kilobyte, and finally `chardetng` detection. Malformed sequences are
/// replaced rather than rejected; `had_errors` reports it.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| content_type.and_then(header_charset))
        .or_else(|| meta_charset(bytes))
        .unwrap_or_else(|| detect(bytes));

    // `decode` strips a matching BOM itself.
    let (text, used, had_errors) = encoding.decode(bytes);
    DecodedPage {
        text: text.into_owned(),
        encoding: used.name(),
        had_errors,
    }
}

fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(&['"', '\''][..]).as_bytes())
    })
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(&['"', '\''][..])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    let encoding = Encoding::for_label(label.as_bytes())?;
    // A meta tag claiming UTF-16 is necessarily wrong for an ASCII-readable prescan.
    if encoding.is_single_byte() || encoding == UTF_8 {
        Some(encoding.output_encoding())
    } else {
        None
    }
}

fn detect(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}
