use crate::protocol::errors::SessionError;
use crate::protocol::types::{MemberId, ReadConsistency, ServiceType, SessionId};
use bytes::Bytes;

/// ResponseStatus is the outcome a server attaches to every session
/// response frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResponseStatus {
    Ok,
    Error(SessionError),
}

/// SessionResponse is the one thing the request dispatcher needs from every
/// response type: a uniform view of its status for terminal-vs-retryable
/// classification.
pub trait SessionResponse {
    fn status(&self) -> &ResponseStatus;

    fn error(&self) -> Option<&SessionError> {
        match self.status() {
            ResponseStatus::Ok => None,
            ResponseStatus::Error(error) => Some(error),
        }
    }

    fn is_ok(&self) -> bool {
        matches!(self.status(), ResponseStatus::Ok)
    }
}

#[derive(Clone, Debug)]
pub struct OpenSessionRequest {
    pub service_type: ServiceType,
    pub service_name: String,
    pub read_consistency: ReadConsistency,
    pub timeout_millis: u64,
}

#[derive(Clone, Debug)]
pub struct OpenSessionResponse {
    pub status: ResponseStatus,
    pub session_id: SessionId,
    pub timeout_millis: u64,
}

#[derive(Clone, Debug)]
pub struct CloseSessionRequest {
    pub session_id: SessionId,
}

#[derive(Clone, Debug)]
pub struct CloseSessionResponse {
    pub status: ResponseStatus,
}

/// KeepAliveRequest both refreshes the session timeout and acknowledges
/// progress: `command_sequence` releases memoized command results and
/// `event_index` advances the server's complete-index watermark.
#[derive(Clone, Debug)]
pub struct KeepAliveRequest {
    pub session_id: SessionId,
    pub command_sequence: u64,
    pub event_index: u64,
}

#[derive(Clone, Debug)]
pub struct KeepAliveResponse {
    pub status: ResponseStatus,
    pub leader: Option<MemberId>,
    pub members: Vec<MemberId>,
}

#[derive(Clone, Debug)]
pub struct CommandRequest {
    pub session_id: SessionId,
    pub sequence: u64,
    pub operation: Bytes,
}

#[derive(Clone, Debug)]
pub struct CommandResponse {
    pub status: ResponseStatus,
    pub index: u64,
    pub event_index: u64,
    pub result: Option<Bytes>,
}

#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub session_id: SessionId,
    pub sequence: u64,
    pub index: u64,
    pub consistency: ReadConsistency,
    pub operation: Bytes,
}

#[derive(Clone, Debug)]
pub struct QueryResponse {
    pub status: ResponseStatus,
    pub index: u64,
    pub event_index: u64,
    pub result: Option<Bytes>,
}

#[derive(Clone, Debug)]
pub struct MetadataRequest {
    pub service_type: Option<ServiceType>,
}

#[derive(Clone, Debug)]
pub struct MetadataResponse {
    pub status: ResponseStatus,
    pub sessions: Vec<SessionMetadata>,
}

#[derive(Clone, Debug)]
pub struct SessionMetadata {
    pub session_id: SessionId,
    pub service_name: String,
    pub service_type: ServiceType,
}

/// Event is a single server-to-client notification produced while a command
/// was executing against the replicated service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    pub name: String,
    pub value: Bytes,
}

/// PublishRequest pushes a batch of events to a client. Field set is fixed
/// for wire compatibility.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishRequest {
    pub session_id: SessionId,
    pub event_index: u64,
    pub previous_index: u64,
    pub events: Vec<Event>,
}

/// ResetRequest is sent by a client to report the highest event index it has
/// fully received; the server discards up to it and replays the rest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResetRequest {
    pub session_id: SessionId,
    pub index: u64,
}

impl SessionResponse for OpenSessionResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}

impl SessionResponse for CloseSessionResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}

impl SessionResponse for KeepAliveResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}

impl SessionResponse for CommandResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}

impl SessionResponse for QueryResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}

impl SessionResponse for MetadataResponse {
    fn status(&self) -> &ResponseStatus {
        &self.status
    }
}
