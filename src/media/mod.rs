//! Media types, quality weights and content negotiation.
//!
//! Accept-direction capabilities announce themselves on a request, then
//! compete to recognize what the server actually sent back; the first
//! candidate to recognize the response wins. Content-direction capabilities
//! declare and serialize an outgoing representation. Shared pieces (quality
//! formatting, header matching, charset handling) live here as free
//! functions so individual codecs stay small.

pub mod accept;
pub mod charset;
pub mod media_type;
pub mod quality;

pub use accept::{AcceptMedia, AcceptSet, ContentMedia, MediaCodec, Variants};
pub use charset::Charset;
pub use media_type::MediaType;
pub use quality::Quality;

use crate::error::Error;
use crate::header::standard;
use crate::message::HttpMessage;
use crate::transport::{Content, ResponseHead};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaTypeError {
    #[error("malformed media type `{0}`")]
    Malformed(String),
    #[error("quality {0} is outside (0, 1]")]
    QualityOutOfRange(f64),
    #[error("no accepted media type matches `{content_type}`")]
    NoMatchingRepresentation { content_type: String },
    #[error("unknown charset `{0}`")]
    UnknownCharset(String),
    #[error("text is not representable in {0}")]
    Unrepresentable(&'static str),
    #[error("body is not valid {0}")]
    Undecodable(&'static str),
}

/// Appends `media` with its quality weight to the Accept header. List-append
/// semantics: prior values are merged with, never overwritten.
pub fn apply_accept(message: &mut dyn HttpMessage, media: &MediaType, quality: Quality) {
    message.add_header_value(standard::accept().name(), format!("{media};q={quality}"));
}

/// True when the response declares a Content-Type that `media` matches.
pub fn content_type_matches(head: &ResponseHead, media: &MediaType) -> bool {
    match head.get(&standard::content_type()) {
        Ok(Some(declared)) => media.matches(&declared),
        _ => false,
    }
}

/// The charset the response declares, or `default` when it declares none.
pub fn response_charset(head: &ResponseHead, default: Charset) -> Result<Charset, MediaTypeError> {
    match head.get(&standard::content_type()) {
        Ok(Some(declared)) => match declared.param("charset") {
            Some(label) => Charset::from_label(label)
                .ok_or_else(|| MediaTypeError::UnknownCharset(label.to_string())),
            None => Ok(default),
        },
        _ => Ok(default),
    }
}

/// Collects the remaining body and decodes it with the response charset.
pub async fn read_text(
    content: &mut Content,
    head: &ResponseHead,
    default: Charset,
) -> Result<String, Error> {
    let charset = response_charset(head, default)?;
    let raw = content.bytes().await?;
    Ok(charset.decode(&raw)?)
}
