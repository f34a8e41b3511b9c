//! Hypermedia forms: parameterized affordances a representation hands out.

use bytes::Bytes;
use url::form_urlencoded;

use crate::error::Error;
use crate::message::{BodySource, RequestChange};
use crate::resource::{Request, ResourceReference};
use crate::transport::Method;

pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Query,
    Body,
}

/// A fillable form: a target, a submission style and named fields.
///
/// Forms are persistent templates. [`field`](Self::field) returns a new form
/// with the field appended, so one parsed form can be filled out several
/// ways without the fills interfering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    kind: FormKind,
    target: String,
    fields: Vec<(String, String)>,
}

impl Form {
    /// A form that submits as a GET with the fields in the query string.
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            kind: FormKind::Query,
            target: target.into(),
            fields: Vec::new(),
        }
    }

    /// A form that submits as a POST with an urlencoded body.
    pub fn post(target: impl Into<String>) -> Self {
        Self {
            kind: FormKind::Body,
            target: target.into(),
            fields: Vec::new(),
        }
    }

    /// This form plus one filled field. Repeated names are kept in fill
    /// order.
    pub fn field(&self, name: impl Into<String>, value: impl Into<String>) -> Form {
        let mut filled = self.clone();
        filled.fields.push((name.into(), value.into()));
        filled
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> Method {
        match self.kind {
            FormKind::Query => Method::Get,
            FormKind::Body => Method::Post,
        }
    }

    /// Realizes the submission against `reference`, which typically points
    /// at the representation the form came from.
    pub fn submit(&self, reference: &ResourceReference) -> Result<Request, Error> {
        let target = reference.follow(&self.target)?;
        match self.kind {
            FormKind::Query => {
                let mut uri = target.uri().clone();
                // query_pairs_mut would leave a dangling `?` on a fieldless
                // form, so only touch the query when there is something to
                // append.
                if !self.fields.is_empty() {
                    let mut pairs = uri.query_pairs_mut();
                    for (name, value) in &self.fields {
                        pairs.append_pair(name, value);
                    }
                }
                Ok(target.at(uri).get())
            }
            FormKind::Body => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (name, value) in &self.fields {
                    serializer.append_pair(name, value);
                }
                let body = serializer.finish();
                let change = RequestChange::set_header("Content-Type", FORM_MEDIA_TYPE).and(
                    RequestChange::body(BodySource::from_bytes(Bytes::from(body.into_bytes()))),
                );
                Ok(Request::new(Method::Post, target, change))
            }
        }
    }
}
