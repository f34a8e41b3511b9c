//! Tests for form submission

mod common;

use common::{reference, Script, ScriptedTransport};
use waypoint::form::{Form, FORM_MEDIA_TYPE};
use waypoint::transport::Method;

#[tokio::test]
async fn test_get_form_appends_query() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/");

    Form::get("search")
        .field("q", "nini")
        .submit(&resource)
        .unwrap()
        .send_parts()
        .await
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.method, Method::Get);
    assert_eq!(call.uri.as_str(), "http://api.test/search?q=nini");
    assert_eq!(call.body, None);
}

#[tokio::test]
async fn test_get_form_preserves_existing_query() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/");

    Form::get("search?x=1")
        .field("q", "nini")
        .submit(&resource)
        .unwrap()
        .send_parts()
        .await
        .unwrap();

    assert_eq!(
        transport.calls()[0].uri.as_str(),
        "http://api.test/search?x=1&q=nini"
    );
}

#[tokio::test]
async fn test_post_form_encodes_body() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/");

    Form::post("search")
        .field("q", "search")
        .field("lang", "en")
        .submit(&resource)
        .unwrap()
        .send_parts()
        .await
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.method, Method::Post);
    assert_eq!(call.uri.as_str(), "http://api.test/search");
    assert_eq!(
        call.headers
            .iter()
            .find(|(name, _)| name == "Content-Type")
            .map(|(_, values)| values.clone()),
        Some(vec![FORM_MEDIA_TYPE.to_string()])
    );
    assert_eq!(call.body.as_deref(), Some(b"q=search&lang=en".as_ref()));
}

#[tokio::test]
async fn test_form_escapes_values() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/");

    Form::get("search")
        .field("q", "a b&c")
        .submit(&resource)
        .unwrap()
        .send_parts()
        .await
        .unwrap();

    assert_eq!(
        transport.calls()[0].uri.query(),
        Some("q=a+b%26c")
    );
}

#[test]
fn test_form_is_a_persistent_template() {
    let base = Form::get("search");
    let one = base.field("q", "one");
    let two = base.field("q", "two").field("page", "2");

    assert!(base.fields().is_empty());
    assert_eq!(one.fields(), &[("q".to_string(), "one".to_string())]);
    assert_eq!(
        two.fields(),
        &[
            ("q".to_string(), "two".to_string()),
            ("page".to_string(), "2".to_string())
        ]
    );
    assert_eq!(base.method(), Method::Get);
    assert_eq!(Form::post("submit").method(), Method::Post);
}

#[tokio::test]
async fn test_form_target_resolves_relative() {
    let transport = ScriptedTransport::single(Script::new(200));
    let resource = reference(&transport, "http://api.test/apps/page");

    Form::get("../lookup")
        .field("id", "7")
        .submit(&resource)
        .unwrap()
        .send_parts()
        .await
        .unwrap();

    assert_eq!(
        transport.calls()[0].uri.as_str(),
        "http://api.test/lookup?id=7"
    );
}
