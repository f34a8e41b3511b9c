//! The crate-level error taxonomy.
//!
//! `Protocol`, `NoMatch` and `Decode` carry an [`ErrorResponse`] with the
//! complete body already buffered, so the caller never has to deal with a
//! half-consumed stream while handling a failure.

use crate::channel::ChannelError;
use crate::config::ConfigError;
use crate::header::HeaderError;
use crate::media::MediaTypeError;
use crate::message::MessageError;
use crate::resource::ErrorResponse;
use crate::suspend::SuspendError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport failed before a response head arrived.
    #[error("transport failure")]
    Transport(#[from] TransportError),

    /// The server answered with an error-class status.
    #[error("request failed with status {}", .response.status())]
    Protocol { response: ErrorResponse },

    /// No accept candidate recognized what the server sent back.
    #[error("no matching representation for the response")]
    NoMatch { response: ErrorResponse },

    /// A candidate matched but its decode failed partway through.
    #[error("response body failed to decode")]
    Decode {
        source: Box<Error>,
        response: ErrorResponse,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Media(#[from] MediaTypeError),

    #[error(transparent)]
    Suspend(#[from] SuspendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A relative reference did not resolve against its base.
    #[error("invalid uri reference `{reference}`")]
    Uri {
        reference: String,
        #[source]
        source: url::ParseError,
    },
}
