use crate::protocol::errors::SendError;
use crate::protocol::messages::{
    CloseSessionRequest, CloseSessionResponse, CommandRequest, CommandResponse, KeepAliveRequest, KeepAliveResponse,
    MetadataRequest, MetadataResponse, OpenSessionRequest, OpenSessionResponse, QueryRequest, QueryResponse,
};
use crate::protocol::types::MemberId;

/// ClientProtocol is the transport seam on the client side: one send function
/// per session RPC kind. Implementations own connection management, framing,
/// and timeouts; this crate only interprets the outcomes.
///
/// A send may resolve with `Ok(None)`: the request was accepted but produced
/// no response (a quiesced no-op). The dispatcher passes that through without
/// retrying.
#[async_trait::async_trait]
pub trait ClientProtocol: Send + Sync {
    async fn open_session(
        &self,
        member: MemberId,
        request: OpenSessionRequest,
    ) -> Result<Option<OpenSessionResponse>, SendError>;

    async fn close_session(
        &self,
        member: MemberId,
        request: CloseSessionRequest,
    ) -> Result<Option<CloseSessionResponse>, SendError>;

    async fn keep_alive(
        &self,
        member: MemberId,
        request: KeepAliveRequest,
    ) -> Result<Option<KeepAliveResponse>, SendError>;

    async fn command(&self, member: MemberId, request: CommandRequest)
        -> Result<Option<CommandResponse>, SendError>;

    async fn query(&self, member: MemberId, request: QueryRequest) -> Result<Option<QueryResponse>, SendError>;

    async fn metadata(
        &self,
        member: MemberId,
        request: MetadataRequest,
    ) -> Result<Option<MetadataResponse>, SendError>;
}
