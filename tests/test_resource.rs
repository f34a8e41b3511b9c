//! Tests for the request lifecycle: dispatch, error buffering, derivations

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use common::{reference, PlainText, RecordedCall, Script, ScriptedTransport};
use waypoint::channel::ByteStream;
use waypoint::config::ClientConfig;
use waypoint::context::{Hypermedia, MediaContext};
use waypoint::error::Error;
use waypoint::media::{self, AcceptMedia, AcceptSet, MediaType, MediaTypeError};
use waypoint::message::{MessageError, MessageParts, RequestChange};
use waypoint::resource::ResourceReference;
use waypoint::transport::{Content, HttpClient, Method, ResponseHead, StatusCode};

fn reference_with_config(
    transport: &Arc<ScriptedTransport>,
    uri: &str,
    config: ClientConfig,
) -> ResourceReference {
    let client: Arc<dyn HttpClient> = transport.clone();
    ResourceReference::with_config(Url::parse(uri).unwrap(), client, config)
}

fn header_values(call: &RecordedCall, name: &str) -> Option<Vec<String>> {
    call.headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, values)| values.clone())
}

#[tokio::test]
async fn test_get_deserializes_success() {
    common::init_tracing();
    let transport = ScriptedTransport::single(
        Script::new(200)
            .header("Content-Type", "text/plain")
            .chunk("hello ")
            .chunk("resource"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let response = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.into_content(), "hello resource");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Get);
    assert_eq!(calls[0].uri.as_str(), "http://api.test/doc");
}

#[tokio::test]
async fn test_error_status_buffers_whole_body() {
    let transport = ScriptedTransport::single(
        Script::new(409)
            .header("Content-Type", "text/plain")
            .chunk("CON")
            .chunk("TENT"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let err = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap_err();
    match err {
        Error::Protocol { response } => {
            assert_eq!(response.status(), StatusCode::CONFLICT);
            assert_eq!(response.body().as_ref(), b"CONTENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Codec that abandons the body after one pull.
struct FirstChunkThenFail {
    media: MediaType,
}

impl FirstChunkThenFail {
    fn new() -> Self {
        Self {
            media: MediaType::new("text/plain"),
        }
    }
}

#[async_trait]
impl AcceptMedia<String> for FirstChunkThenFail {
    fn offered(&self) -> &MediaType {
        &self.media
    }

    async fn deserialize(
        &self,
        content: &mut Content,
        _head: &ResponseHead,
        _ctx: &MediaContext,
    ) -> Result<String, Error> {
        let _first = content.pull().await?;
        Err(Error::Media(MediaTypeError::Malformed(
            "gave up after one chunk".to_string(),
        )))
    }
}

#[tokio::test]
async fn test_decode_failure_still_buffers_whole_body() {
    let transport = ScriptedTransport::single(
        Script::new(200)
            .header("Content-Type", "text/plain")
            .chunk("CON")
            .chunk("TENT"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let err = resource
        .get()
        .send(&AcceptSet::of(FirstChunkThenFail::new()))
        .await
        .unwrap_err();
    match err {
        Error::Decode { response, .. } => {
            // The codec only pulled "CON"; the error must carry all of it.
            assert_eq!(response.body().as_ref(), b"CONTENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_failure_is_not_a_protocol_error() {
    let transport = ScriptedTransport::new(vec![]);
    let resource = reference(&transport, "http://api.test/doc");

    let err = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_conflicting_changes_fail_before_dispatch() {
    let transport = ScriptedTransport::new(vec![]);
    let resource = reference(&transport, "http://api.test/doc");

    let err = resource
        .get()
        .with(RequestChange::set_header("X-One", "a"))
        .with(RequestChange::set_header("X-One", "b"))
        .send_parts()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Message(MessageError::HeaderAlreadySet(_))
    ));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_head_verb_dispatch() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/doc");

    let parts = resource.head().send_parts().await.unwrap();
    assert_eq!(parts.status(), StatusCode::OK);
    assert_eq!(transport.calls()[0].method, Method::Head);
}

#[tokio::test]
async fn test_allow_surfaces_methods() {
    let transport = ScriptedTransport::single(Script::new(200).header("Allow", "GET, HEAD"));
    let resource = reference(&transport, "http://api.test/doc");

    let parts = resource.options().send_parts().await.unwrap();
    assert_eq!(transport.calls()[0].method, Method::Options);
    assert_eq!(parts.allow().unwrap(), Some(vec![Method::Get, Method::Head]));
}

#[tokio::test]
async fn test_validator_changes_derive_from_etag() {
    let transport = ScriptedTransport::new(vec![
        Script::new(200)
            .header("Content-Type", "text/plain")
            .header("ETag", "\"v7\"")
            .body("doc"),
        Script::new(204),
    ]);
    let resource = reference(&transport, "http://api.test/doc");

    let response = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap();
    let guard = response.parts().if_match().unwrap().expect("etag present");

    resource
        .put(&PlainText::new(), &"updated".to_string())
        .unwrap()
        .with(guard)
        .send_parts()
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(header_values(&calls[1], "If-Match"), Some(vec!["v7".to_string()]));
}

#[tokio::test]
async fn test_derived_validator_refuses_overwrite() {
    let transport = ScriptedTransport::new(vec![
        Script::new(200)
            .header("Content-Type", "text/plain")
            .header("ETag", "\"v7\"")
            .body("doc"),
    ]);
    let resource = reference(&transport, "http://api.test/doc");

    let response = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap();
    let guard = response.parts().if_none_match().unwrap().expect("etag present");

    // One If-None-Match already set by hand; the derived change must not
    // silently overwrite it.
    let err = resource
        .get()
        .with(RequestChange::set_header("If-None-Match", "W/\"stale\""))
        .with(guard)
        .send_parts()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Message(MessageError::HeaderAlreadySet(_))
    ));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_if_modified_since_falls_back_to_date() {
    let transport = ScriptedTransport::single(
        Script::new(200).header("Date", "Sun, 06 Nov 1994 08:49:37 GMT"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let parts = resource.head().send_parts().await.unwrap();
    let change = parts.if_modified_since().unwrap().expect("date present");

    let mut probe = MessageParts::new();
    change.apply(&mut probe).unwrap();
    assert_eq!(
        probe.headers().first("If-Modified-Since"),
        Some("Sun, 06 Nov 1994 08:49:37 GMT")
    );
}

#[tokio::test]
async fn test_last_modified_preferred_over_date() {
    let transport = ScriptedTransport::single(
        Script::new(200)
            .header("Date", "Sun, 06 Nov 1994 08:49:37 GMT")
            .header("Last-Modified", "Tue, 29 Feb 2000 12:00:00 GMT"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let parts = resource.head().send_parts().await.unwrap();
    let change = parts.if_unmodified_since().unwrap().unwrap();

    let mut probe = MessageParts::new();
    change.apply(&mut probe).unwrap();
    assert_eq!(
        probe.headers().first("If-Unmodified-Since"),
        Some("Tue, 29 Feb 2000 12:00:00 GMT")
    );
}

#[tokio::test]
async fn test_location_resolves_against_request_uri() {
    let transport = ScriptedTransport::single(Script::new(201).header("Location", "/items/9"));
    let resource = reference(&transport, "http://api.test/items");

    let parts = resource
        .post(&PlainText::new(), &"new item".to_string())
        .unwrap()
        .send_parts()
        .await
        .unwrap();
    assert_eq!(parts.status(), StatusCode::CREATED);

    let created = parts.location().unwrap().expect("location present");
    assert_eq!(created.uri().as_str(), "http://api.test/items/9");
}

#[tokio::test]
async fn test_user_agent_from_config() {
    let transport = ScriptedTransport::single(Script::new(200));
    let config = ClientConfig {
        user_agent: Some("waypoint-test/1".to_string()),
        ..ClientConfig::default()
    };
    let resource = reference_with_config(&transport, "http://api.test/doc", config);

    resource.head().send_parts().await.unwrap();
    assert_eq!(
        header_values(&transport.calls()[0], "User-Agent"),
        Some(vec!["waypoint-test/1".to_string()])
    );
}

#[tokio::test]
async fn test_explicit_user_agent_wins() {
    let transport = ScriptedTransport::single(Script::new(200));
    let config = ClientConfig {
        user_agent: Some("waypoint-test/1".to_string()),
        ..ClientConfig::default()
    };
    let resource = reference_with_config(&transport, "http://api.test/doc", config);

    resource
        .head()
        .with(RequestChange::set_header("User-Agent", "custom/2"))
        .send_parts()
        .await
        .unwrap();
    assert_eq!(
        header_values(&transport.calls()[0], "User-Agent"),
        Some(vec!["custom/2".to_string()])
    );
}

#[tokio::test]
async fn test_follow_resolves_relative_reference() {
    let transport = ScriptedTransport::new(vec![]);
    let resource = reference(&transport, "http://api.test/a/b");

    let sibling = resource.follow("c").unwrap();
    assert_eq!(sibling.uri().as_str(), "http://api.test/a/c");

    let rooted = resource.follow("/root").unwrap();
    assert_eq!(rooted.uri().as_str(), "http://api.test/root");
}

#[tokio::test]
async fn test_error_body_decodes_after_the_fact() {
    let transport = ScriptedTransport::single(
        Script::new(409)
            .header("Content-Type", "text/plain")
            .body("already exists"),
    );
    let resource = reference(&transport, "http://api.test/doc");

    let err = resource
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap_err();
    match err {
        Error::Protocol { response } => {
            let text = response.deserialize_as(&PlainText::new()).await.unwrap();
            assert_eq!(text, "already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Payload carrying one URI reference that resolves on deserialization.
struct Linked {
    raw: String,
    target: Option<ResourceReference>,
}

impl Hypermedia for Linked {
    fn on_deserialized(&mut self, ctx: &MediaContext) -> Result<(), Error> {
        self.target = Some(ctx.resolve(self.raw.trim())?);
        Ok(())
    }
}

struct LinkCodec {
    media: MediaType,
}

impl LinkCodec {
    fn new() -> Self {
        Self {
            media: MediaType::new("text/uri-list"),
        }
    }
}

#[async_trait]
impl AcceptMedia<Linked> for LinkCodec {
    fn offered(&self) -> &MediaType {
        &self.media
    }

    async fn deserialize(
        &self,
        content: &mut Content,
        head: &ResponseHead,
        ctx: &MediaContext,
    ) -> Result<Linked, Error> {
        let raw = media::read_text(content, head, ctx.default_charset()).await?;
        let mut value = Linked { raw, target: None };
        value.on_deserialized(ctx)?;
        Ok(value)
    }
}

#[tokio::test]
async fn test_payload_links_resolve_to_live_references() {
    let transport = ScriptedTransport::new(vec![
        Script::new(200)
            .header("Content-Type", "text/uri-list")
            .body("2\n"),
        Script::new(200)
            .header("Content-Type", "text/plain")
            .body("second doc"),
    ]);
    let resource = reference(&transport, "http://api.test/docs/1");

    let linked = resource
        .get()
        .send(&AcceptSet::of(LinkCodec::new()))
        .await
        .unwrap()
        .into_content();
    let target = linked.target.expect("link resolved");
    assert_eq!(target.uri().as_str(), "http://api.test/docs/2");

    // The resolved reference is live against the same transport.
    let doc = target
        .get()
        .send(&AcceptSet::of(PlainText::new()))
        .await
        .unwrap();
    assert_eq!(doc.into_content(), "second doc");
    assert_eq!(transport.calls()[1].uri.as_str(), "http://api.test/docs/2");
}
