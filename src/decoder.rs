use crate::error::{Error, Result};

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use flate2::read::{DeflateDecoder, GzDecoder};
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
    Zstd,
}

impl ContentEncoding {
    /// Reads a `content-encoding` header value. Only the first coding of a
    /// list is honored; unknown codings are passed through untouched.
    pub fn from_header(value: Option<&str>) -> Self {
        let first = value
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match first.as_str() {
            "gzip" | "x-gzip" => ContentEncoding::Gzip,
            "deflate" => ContentEncoding::Deflate,
            "zstd" => ContentEncoding::Zstd,
            _ => ContentEncoding::Identity,
        }
    }
}

pub fn decode_gzip(data: &[u8]) -> Result<Bytes> {
    let mut decoder = GzDecoder::new(data);
    let mut decoded_data = Vec::new();
    decoder
        .read_to_end(&mut decoded_data)
        .map_err(|e| Error::Decode(format!("gzip: {e}")))?;
    Ok(Bytes::from(decoded_data))
}

pub fn decode_deflate(data: &[u8]) -> Result<Bytes> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decoded_data = Vec::new();
    decoder
        .read_to_end(&mut decoded_data)
        .map_err(|e| Error::Decode(format!("deflate: {e}")))?;
    Ok(Bytes::from(decoded_data))
}

pub fn decode_zstd(data: &[u8]) -> Result<Bytes> {
    let decoded_data = zstd::decode_all(data).map_err(|e| Error::Decode(format!("zstd: {e}")))?;
    Ok(Bytes::from(decoded_data))
}

pub fn decompress(data: Bytes, encoding: ContentEncoding) -> Result<Bytes> {
    match encoding {
        ContentEncoding::Identity => Ok(data),
        ContentEncoding::Gzip => decode_gzip(&data),
        ContentEncoding::Deflate => decode_deflate(&data),
        ContentEncoding::Zstd => decode_zstd(&data),
    }
}

fn charset_of(content_type: Option<&str>) -> Option<&'static Encoding> {
    content_type?
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
}

/// Turns body bytes into text using the declared charset, UTF-8 otherwise.
/// Undecodable sequences become U+FFFD.
pub fn decode_text(data: &[u8], content_type: Option<&str>) -> String {
    let encoding = charset_of(content_type).unwrap_or(UTF_8);
    let (text, _, had_errors) = encoding.decode(data);
    if had_errors {
        tracing::warn!(charset = encoding.name(), "response body has invalid sequences");
    }
    text.into_owned()
}
