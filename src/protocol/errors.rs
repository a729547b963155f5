use std::error::Error;
use std::fmt;

/// ErrorKind is the wire-level enumeration of application errors a server can
/// attach to a session response.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    NoLeader,
    QueryFailure,
    CommandFailure,
    ApplicationError,
    IllegalMemberState,
    UnknownClient,
    UnknownSession,
    UnknownService,
    ProtocolError,
    ConfigurationError,
    Unavailable,
}

impl ErrorKind {
    /// `is_terminal()` returns true for the error kinds a client must not
    /// retry on another member. This set is frozen; everything else is
    /// treated as a transient cluster condition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorKind::CommandFailure
                | ErrorKind::QueryFailure
                | ErrorKind::ApplicationError
                | ErrorKind::UnknownClient
                | ErrorKind::UnknownSession
                | ErrorKind::UnknownService
                | ErrorKind::ProtocolError
        )
    }
}

/// SessionError is an application error carried inside a response frame.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct SessionError {
    kind: ErrorKind,
    message: String,
}

impl SessionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        SessionError {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// SendError is a local failure to deliver a request to a member or to
/// receive its response. The first three variants are the transport set: the
/// connection recovers from them by rotating to the next member. Anything
/// else surfaces to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to connect to member")]
    ConnectFailed,

    #[error("request timed out")]
    Timeout,

    #[error("channel closed before a response arrived")]
    ChannelClosed,

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
}

impl SendError {
    pub fn other(message: impl Into<String>, source: Option<Box<dyn Error + Send + Sync>>) -> Self {
        SendError::Other {
            message: message.into(),
            source,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SendError::ConnectFailed | SendError::Timeout | SendError::ChannelClosed
        )
    }
}

/// ConnectionError is what a `ClientConnection` operation fails with when it
/// cannot produce a response at all. Application errors are not in here:
/// those complete the operation with the error-carrying response so the
/// caller sees the server's verdict verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    // Every known member was tried without an answer. Callers decide backoff.
    #[error("no route to cluster: all known members exhausted")]
    NoRouteToCluster,

    #[error(transparent)]
    Send(SendError),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
