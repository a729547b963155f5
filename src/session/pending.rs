use crate::protocol::{CommandRequest, SessionError};
use crate::session::context::OperationResult;
use std::fmt;
use std::fmt::{Debug, Formatter};
use tokio::sync::oneshot;

/// Callback is the one-shot completion side of a parked operation.
pub struct Callback<O: Debug, E: Debug>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Debug> Callback<O, E> {
    pub fn new() -> (Self, oneshot::Receiver<Result<O, E>>) {
        let (tx, rx) = oneshot::channel();
        (Callback(tx), rx)
    }

    /// `send()` completes the callback. A dropped receiver means the waiter
    /// gave up; the result is discarded.
    pub fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

impl<O: Debug, E: Debug> Debug for Callback<O, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish()
    }
}

/// PendingCommand parks a command that arrived ahead of its turn. The
/// service layer registers it under its request sequence and takes it back
/// out once every earlier command has been applied, so outputs reach the
/// client in request-sequence order.
#[derive(Debug)]
pub struct PendingCommand {
    request: CommandRequest,
    callback: Callback<OperationResult, SessionError>,
}

impl PendingCommand {
    pub fn new(request: CommandRequest, callback: Callback<OperationResult, SessionError>) -> Self {
        PendingCommand { request, callback }
    }

    pub fn request(&self) -> &CommandRequest {
        &self.request
    }

    pub fn sequence(&self) -> u64 {
        self.request.sequence
    }

    /// `complete()` resolves the parked command, consuming it.
    pub fn complete(self, result: Result<OperationResult, SessionError>) {
        self.callback.send(result);
    }
}
