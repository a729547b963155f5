mod client;
mod protocol;
mod service;
mod session;

pub use client::ClientConnection;
pub use client::MemberSelector;
pub use protocol::ClientProtocol;
pub use protocol::CloseSessionRequest;
pub use protocol::CloseSessionResponse;
pub use protocol::CommandRequest;
pub use protocol::CommandResponse;
pub use protocol::ConnectionError;
pub use protocol::ErrorKind;
pub use protocol::Event;
pub use protocol::KeepAliveRequest;
pub use protocol::KeepAliveResponse;
pub use protocol::MemberId;
pub use protocol::MetadataRequest;
pub use protocol::MetadataResponse;
pub use protocol::OpenSessionRequest;
pub use protocol::OpenSessionResponse;
pub use protocol::PublishRequest;
pub use protocol::QueryRequest;
pub use protocol::QueryResponse;
pub use protocol::ReadConsistency;
pub use protocol::ResetListener;
pub use protocol::ResetRequest;
pub use protocol::ResponseStatus;
pub use protocol::SendError;
pub use protocol::ServerProtocol;
pub use protocol::ServiceType;
pub use protocol::SessionError;
pub use protocol::SessionId;
pub use protocol::SessionMetadata;
pub use protocol::SessionResponse;
pub use service::OperationType;
pub use service::ServerContext;
pub use service::ServiceContext;
pub use session::Callback;
pub use session::OperationResult;
pub use session::PendingCommand;
pub use session::SessionConfig;
pub use session::SessionContext;
pub use session::SessionEvent;
pub use session::SessionEventKind;
pub use session::SessionEventListener;
pub use session::SessionHandle;
pub use session::SessionState;
