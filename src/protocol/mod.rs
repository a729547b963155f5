mod client;
mod errors;
mod messages;
mod server;
mod types;

pub use client::ClientProtocol;
pub use errors::ConnectionError;
pub use errors::ErrorKind;
pub use errors::SendError;
pub use errors::SessionError;
pub use messages::CloseSessionRequest;
pub use messages::CloseSessionResponse;
pub use messages::CommandRequest;
pub use messages::CommandResponse;
pub use messages::Event;
pub use messages::KeepAliveRequest;
pub use messages::KeepAliveResponse;
pub use messages::MetadataRequest;
pub use messages::MetadataResponse;
pub use messages::OpenSessionRequest;
pub use messages::OpenSessionResponse;
pub use messages::PublishRequest;
pub use messages::QueryRequest;
pub use messages::QueryResponse;
pub use messages::ResetRequest;
pub use messages::ResponseStatus;
pub use messages::SessionMetadata;
pub use messages::SessionResponse;
pub use server::ResetListener;
pub use server::ServerProtocol;
pub use types::MemberId;
pub use types::ReadConsistency;
pub use types::ServiceType;
pub use types::SessionId;
