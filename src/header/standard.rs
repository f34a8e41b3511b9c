//! The standard header registry.
//!
//! Every header the crate understands by name, each with its typed codec.
//! Codecs are cheap value objects; call sites build them on demand.

use crate::media::MediaType;
use crate::transport::Method;

use super::{EntityTag, Header, HeaderError, HttpDate, ListHeader};

fn decode_string(_name: &'static str, value: &str) -> Result<String, HeaderError> {
    Ok(value.to_string())
}

fn encode_string(value: &String) -> String {
    value.clone()
}

fn decode_u64(name: &'static str, value: &str) -> Result<u64, HeaderError> {
    value
        .parse()
        .map_err(|_| HeaderError::malformed(name, value, "not an unsigned integer"))
}

fn encode_u64(value: &u64) -> String {
    value.to_string()
}

fn decode_media_type(name: &'static str, value: &str) -> Result<MediaType, HeaderError> {
    MediaType::parse(value).map_err(|e| HeaderError::malformed(name, value, e.to_string()))
}

fn encode_media_type(value: &MediaType) -> String {
    value.to_string()
}

fn decode_method(name: &'static str, value: &str) -> Result<Method, HeaderError> {
    Method::from_str(value).ok_or_else(|| HeaderError::malformed(name, value, "unknown method"))
}

fn encode_method(value: &Method) -> String {
    value.as_str().to_string()
}

fn encode_date(value: &HttpDate) -> String {
    value.to_string()
}

fn encode_entity_tag(value: &EntityTag) -> String {
    value.to_string()
}

pub fn date() -> Header<HttpDate> {
    Header::new("Date", HttpDate::decode, encode_date)
}

pub fn last_modified() -> Header<HttpDate> {
    Header::new("Last-Modified", HttpDate::decode, encode_date)
}

pub fn if_modified_since() -> Header<HttpDate> {
    Header::new("If-Modified-Since", HttpDate::decode, encode_date)
}

pub fn if_unmodified_since() -> Header<HttpDate> {
    Header::new("If-Unmodified-Since", HttpDate::decode, encode_date)
}

pub fn etag() -> Header<EntityTag> {
    Header::new("ETag", EntityTag::decode, encode_entity_tag)
}

pub fn if_match() -> Header<EntityTag> {
    Header::new("If-Match", EntityTag::decode, encode_entity_tag)
}

pub fn if_none_match() -> Header<EntityTag> {
    Header::new("If-None-Match", EntityTag::decode, encode_entity_tag)
}

pub fn content_type() -> Header<MediaType> {
    Header::new("Content-Type", decode_media_type, encode_media_type)
}

pub fn accept() -> ListHeader<MediaType> {
    ListHeader::new("Accept", decode_media_type, encode_media_type)
}

pub fn content_length() -> Header<u64> {
    Header::new("Content-Length", decode_u64, encode_u64)
}

pub fn location() -> Header<String> {
    Header::new("Location", decode_string, encode_string)
}

pub fn authorization() -> Header<String> {
    Header::new("Authorization", decode_string, encode_string)
}

pub fn user_agent() -> Header<String> {
    Header::new("User-Agent", decode_string, encode_string)
}

pub fn allow() -> ListHeader<Method> {
    ListHeader::new("Allow", decode_method, encode_method)
}

pub fn cache_control() -> ListHeader<String> {
    ListHeader::new("Cache-Control", decode_string, encode_string)
}
