use crate::protocol::messages::{PublishRequest, ResetRequest};
use crate::protocol::types::{MemberId, SessionId};
use tokio::sync::mpsc;

/// ResetListener is the receiving half a session registers with the server
/// protocol. The protocol pushes client reset requests into it; the service
/// executor drains it and drives the session's event replay, so all session
/// mutation stays on one thread.
#[derive(Clone)]
pub struct ResetListener {
    sender: mpsc::UnboundedSender<ResetRequest>,
}

impl ResetListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ResetRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ResetListener { sender }, receiver)
    }

    /// `notify()` hands a reset request to the session's executor. A closed
    /// receiver means the session is gone; the request is dropped, which is
    /// fine because an expired or closed session has nothing left to replay.
    pub fn notify(&self, request: ResetRequest) {
        let _ = self.sender.send(request);
    }
}

/// ServerProtocol is the transport seam on the server side.
///
/// `publish` is fire-and-forget: delivery failures are tolerated because the
/// client detects the gap through `previous_index` linkage and requests a
/// reset.
pub trait ServerProtocol: Send + Sync {
    fn publish(&self, member: &MemberId, request: PublishRequest);

    fn register_reset_listener(&self, session_id: SessionId, listener: ResetListener);

    fn unregister_reset_listener(&self, session_id: SessionId);
}
