// data_uri.rs: `data:` URI codec (RFC 2397).
//
// Parsing accepts base64 and percent-encoded payloads. Encoding always
// produces `data:{media_type};base64,{payload}`, so equal media type and
// bytes give the same string however the input was written.

use base64::Engine;

use crate::error::Error;

const SCHEME: &str = "data:";
const BASE64_SUFFIX: &str = ";base64";

/// Media types accepted without running the full grammar.
const KNOWN_MEDIA_TYPES: &[&str] = &[
    "application/json",
    "application/octet-stream",
    "application/pdf",
    "application/xml",
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/webp",
    "text/html",
    "text/markdown",
    "text/plain",
    "video/mp4",
];

/// The decoded contents of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type embedded in the URI (parameters included), if any.
    pub media_type: Option<String>,
    pub data: Vec<u8>,
    /// Whether the payload was written in base64.
    pub is_base64: bool,
}

/// Parse a `data:` URI into its media type and raw bytes.
pub fn parse(uri: &str) -> Result<DataUri, Error> {
    let has_scheme = uri
        .get(..SCHEME.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(SCHEME));
    if !has_scheme {
        return Err(Error::malformed_uri("URI must start with 'data:'"));
    }
    let rest = &uri[SCHEME.len()..];

    let (mut metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::malformed_uri("data URI is missing the ',' separator"))?;

    let suffix_start = metadata.len().saturating_sub(BASE64_SUFFIX.len());
    let is_base64 = metadata
        .get(suffix_start..)
        .is_some_and(|s| s.eq_ignore_ascii_case(BASE64_SUFFIX));
    if is_base64 {
        metadata = &metadata[..suffix_start];
    }

    if is_base64 && !is_valid_base64(payload) {
        return Err(Error::malformed_uri("data URI payload is not valid base64"));
    }

    let media_type = if metadata.is_empty() {
        None
    } else if is_valid_media_type(metadata) {
        Some(metadata.to_string())
    } else {
        return Err(Error::invalid_media_type(metadata));
    };

    let data = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::malformed_uri("data URI payload is not valid base64").with_source(e))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUri {
        media_type,
        data,
        is_base64,
    })
}

/// Encode bytes into the canonical base64 `data:` URI.
pub fn encode(media_type: &str, data: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(data);
    format!("{SCHEME}{media_type}{BASE64_SUFFIX},{payload}")
}

/// Syntactic base64 check: standard alphabet, correct padding, no whitespace.
pub fn is_valid_base64(payload: &str) -> bool {
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        return false;
    }
    if payload.len() % 4 != 0 {
        return false;
    }
    let body = payload.trim_end_matches('=');
    if payload.len() - body.len() > 2 {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        && base64::engine::general_purpose::STANDARD
            .decode(payload)
            .is_ok()
}

/// Validate `type/subtype[;name=value]*` per the HTTP media-type grammar.
pub fn is_valid_media_type(media_type: &str) -> bool {
    if KNOWN_MEDIA_TYPES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(media_type))
    {
        return true;
    }
    MediaTypeParser::new(media_type).parse()
}

/// Compare only the top-level type (the part before the first `/`),
/// case-insensitively, ignoring any subtype or parameters.
pub fn has_top_level_media_type(media_type: &str, top_level: &str) -> bool {
    let top = media_type.split('/').next().unwrap_or_default();
    top.trim().eq_ignore_ascii_case(top_level.trim())
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

struct MediaTypeParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> MediaTypeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn token(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_tchar) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn skip_ows(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn quoted_string(&mut self) -> bool {
        if !self.expect(b'"') {
            return false;
        }
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'"' => return true,
                b'\\' => match self.peek() {
                    Some(b'\t' | b' ' | 0x21..=0x7e | 0x80..=0xff) => self.pos += 1,
                    _ => return false,
                },
                b'\t' | b' ' | 0x21 | 0x23..=0x5b | 0x5d..=0x7e | 0x80..=0xff => {}
                _ => return false,
            }
        }
        false
    }

    fn parse(mut self) -> bool {
        if !self.token() || !self.expect(b'/') || !self.token() {
            return false;
        }
        loop {
            self.skip_ows();
            if self.peek().is_none() {
                return true;
            }
            if !self.expect(b';') {
                return false;
            }
            self.skip_ows();
            if !self.token() || !self.expect(b'=') {
                return false;
            }
            let value_ok = if self.peek() == Some(b'"') {
                self.quoted_string()
            } else {
                self.token()
            };
            if !value_ok {
                return false;
            }
        }
    }
}
