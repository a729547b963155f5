use crate::client::selector::MemberSelector;
use crate::protocol::{
    ClientProtocol, CloseSessionRequest, CloseSessionResponse, CommandRequest, CommandResponse, ConnectionError,
    KeepAliveRequest, KeepAliveResponse, MemberId, MetadataRequest, MetadataResponse, OpenSessionRequest,
    OpenSessionResponse, QueryRequest, QueryResponse, SendError, SessionResponse,
};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// ClientConnection multiplexes one session's RPCs over the cluster
/// membership. It walks candidate servers through a `MemberSelector`, pins
/// the member that answers, retries transient failures on the next
/// candidate, and surfaces terminal outcomes to the caller.
///
/// The pin is the currently believed leader or usable follower. It is
/// cleared only when a retry abandons the member, never on success; a
/// successful completion additionally resets the selector so a later
/// transient failure starts over from the leader hint.
pub struct ClientConnection {
    logger: slog::Logger,
    protocol: Arc<dyn ClientProtocol>,
    dispatch: Arc<Mutex<DispatchState>>,
}

/// The mutable dispatch state shared by in-flight operations. Locked only
/// between suspension points, never across a protocol send.
struct DispatchState {
    selector: MemberSelector,
    member: Option<MemberId>,
}

impl ClientConnection {
    pub fn new(logger: slog::Logger, protocol: Arc<dyn ClientProtocol>, selector: MemberSelector) -> Self {
        ClientConnection {
            logger,
            protocol,
            dispatch: Arc::new(Mutex::new(DispatchState { selector, member: None })),
        }
    }

    /// Returns the current selector leader hint.
    pub fn leader(&self) -> Option<MemberId> {
        self.lock_dispatch().selector.leader().cloned()
    }

    /// Returns the current membership view.
    pub fn servers(&self) -> Vec<MemberId> {
        self.lock_dispatch().selector.servers().to_vec()
    }

    /// `reset()` restarts member iteration from the leader hint.
    pub fn reset(&self) {
        self.lock_dispatch().selector.reset();
    }

    /// `reset_view()` adopts a new membership view and leader hint.
    pub fn reset_view(&self, leader: Option<MemberId>, members: Vec<MemberId>) {
        self.lock_dispatch().selector.reset_view(leader, members);
    }

    pub async fn open_session(
        &self,
        request: OpenSessionRequest,
    ) -> Result<Option<OpenSessionResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.open_session(member, request).await
        })
        .await
    }

    pub async fn close_session(
        &self,
        request: CloseSessionRequest,
    ) -> Result<Option<CloseSessionResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.close_session(member, request).await
        })
        .await
    }

    pub async fn keep_alive(&self, request: KeepAliveRequest) -> Result<Option<KeepAliveResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.keep_alive(member, request).await
        })
        .await
    }

    pub async fn command(&self, request: CommandRequest) -> Result<Option<CommandResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.command(member, request).await
        })
        .await
    }

    pub async fn query(&self, request: QueryRequest) -> Result<Option<QueryResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.query(member, request).await
        })
        .await
    }

    pub async fn metadata(&self, request: MetadataRequest) -> Result<Option<MetadataResponse>, ConnectionError> {
        self.execute(request, |protocol, member, request| async move {
            protocol.metadata(member, request).await
        })
        .await
    }

    /// The dispatch loop every operation runs through. Each iteration
    /// resolves a target member, sends, and classifies the outcome:
    ///
    /// - transport failure: drop the pin if it still points at the failed
    ///   member, retry the same request on the next candidate;
    /// - OK response or terminal application error: complete with the
    ///   response and reset the selector;
    /// - retryable application error: retry on the next candidate;
    /// - no response and no error: complete with `None` (quiesced no-op);
    /// - any other local failure: surface it unchanged.
    async fn execute<R, Resp, S, Fut>(&self, request: R, send: S) -> Result<Option<Resp>, ConnectionError>
    where
        R: Clone + fmt::Debug,
        Resp: SessionResponse + fmt::Debug,
        S: Fn(Arc<dyn ClientProtocol>, MemberId, R) -> Fut,
        Fut: Future<Output = Result<Option<Resp>, SendError>>,
    {
        loop {
            let member = match self.next_member() {
                Some(member) => member,
                None => {
                    slog::debug!(self.logger, "Failed to connect to the cluster");
                    self.reset();
                    return Err(ConnectionError::NoRouteToCluster);
                }
            };

            slog::trace!(self.logger, "Sending {:?} to {:?}", request, member);
            match send(Arc::clone(&self.protocol), member.clone(), request.clone()).await {
                Ok(Some(response)) => match response.error() {
                    Some(error) if !error.kind().is_terminal() => {
                        self.abandon_member(&member, error);
                    }
                    _ => {
                        slog::trace!(self.logger, "Received {:?} from {:?}", response, member);
                        self.reset();
                        return Ok(Some(response));
                    }
                },
                Ok(None) => {
                    return Ok(None);
                }
                Err(error) if error.is_retryable() => {
                    slog::debug!(self.logger, "{:?} failed: {}", request, error);
                    self.abandon_member(&member, &error);
                }
                Err(error) => {
                    slog::debug!(self.logger, "{:?} failed: {}", request, error);
                    return Err(ConnectionError::Send(error));
                }
            }
        }
    }

    /// Resolves the member to target: the sticky pin when present, otherwise
    /// the next selector candidate, which becomes the new pin. `None` means
    /// the view is exhausted.
    fn next_member(&self) -> Option<MemberId> {
        let mut dispatch = self.lock_dispatch();
        if let Some(member) = &dispatch.member {
            return Some(member.clone());
        }

        let next = dispatch.selector.next()?;
        dispatch.member = Some(next.clone());
        Some(next)
    }

    /// Drops the pin before a retry, unless a concurrent operation already
    /// moved it to a different member.
    fn abandon_member(&self, failed: &MemberId, reason: &dyn fmt::Display) {
        let mut dispatch = self.lock_dispatch();
        if dispatch.member.as_ref() == Some(failed) {
            slog::trace!(self.logger, "Abandoning {:?}. Reason: {}", failed, reason);
            dispatch.member = None;
        }
    }

    fn lock_dispatch(&self) -> std::sync::MutexGuard<'_, DispatchState> {
        self.dispatch.lock().expect("ClientConnection dispatch mutex guard poison")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorKind, ResponseStatus, SessionError, SessionId};
    use bytes::Bytes;
    use std::collections::VecDeque;

    /// Plays back a scripted sequence of command outcomes and records which
    /// member each attempt was sent to, plus the request it carried.
    struct ScriptedProtocol {
        outcomes: Mutex<VecDeque<Result<Option<CommandResponse>, SendError>>>,
        sent: Mutex<Vec<(MemberId, CommandRequest)>>,
    }

    impl ScriptedProtocol {
        fn new(outcomes: Vec<Result<Option<CommandResponse>, SendError>>) -> Arc<Self> {
            Arc::new(ScriptedProtocol {
                outcomes: Mutex::new(outcomes.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(MemberId, CommandRequest)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ClientProtocol for ScriptedProtocol {
        async fn open_session(
            &self,
            _member: MemberId,
            _request: OpenSessionRequest,
        ) -> Result<Option<OpenSessionResponse>, SendError> {
            unimplemented!("not scripted")
        }

        async fn close_session(
            &self,
            _member: MemberId,
            _request: CloseSessionRequest,
        ) -> Result<Option<CloseSessionResponse>, SendError> {
            unimplemented!("not scripted")
        }

        async fn keep_alive(
            &self,
            _member: MemberId,
            _request: KeepAliveRequest,
        ) -> Result<Option<KeepAliveResponse>, SendError> {
            unimplemented!("not scripted")
        }

        async fn command(
            &self,
            member: MemberId,
            request: CommandRequest,
        ) -> Result<Option<CommandResponse>, SendError> {
            self.sent.lock().unwrap().push((member, request));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("test script ran out of outcomes")
        }

        async fn query(&self, _member: MemberId, _request: QueryRequest) -> Result<Option<QueryResponse>, SendError> {
            unimplemented!("not scripted")
        }

        async fn metadata(
            &self,
            _member: MemberId,
            _request: MetadataRequest,
        ) -> Result<Option<MetadataResponse>, SendError> {
            unimplemented!("not scripted")
        }
    }

    fn member(name: &str) -> MemberId {
        MemberId::new(name)
    }

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn connection(protocol: Arc<ScriptedProtocol>, members: Vec<MemberId>) -> ClientConnection {
        ClientConnection::new(test_logger(), protocol, MemberSelector::new(None, members))
    }

    fn command_request(sequence: u64) -> CommandRequest {
        CommandRequest {
            session_id: SessionId::new(7),
            sequence,
            operation: Bytes::from_static(b"put"),
        }
    }

    fn ok_response() -> CommandResponse {
        CommandResponse {
            status: ResponseStatus::Ok,
            index: 20,
            event_index: 7,
            result: Some(Bytes::from_static(b"A")),
        }
    }

    fn error_response(kind: ErrorKind) -> CommandResponse {
        CommandResponse {
            status: ResponseStatus::Error(SessionError::new(kind, "rejected")),
            index: 0,
            event_index: 0,
            result: None,
        }
    }

    #[tokio::test]
    async fn transport_failure_retries_same_request_on_next_member() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![Err(SendError::Timeout), Ok(Some(ok_response()))]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1"), member("m2")]);

        // -- execute --
        let response = connection.command(command_request(1)).await.unwrap().unwrap();

        // -- verify --
        assert!(response.is_ok());
        let sent = protocol.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, member("m1"));
        assert_eq!(sent[1].0, member("m2"));
        // The retransmission carries the same payload.
        assert_eq!(sent[0].1.sequence, sent[1].1.sequence);
        assert_eq!(sent[0].1.operation, sent[1].1.operation);
    }

    #[tokio::test]
    async fn pin_survives_success_and_selector_resets() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![
            Err(SendError::ConnectFailed),
            Ok(Some(ok_response())),
            Ok(Some(ok_response())),
        ]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1"), member("m2")]);

        // -- execute --
        connection.command(command_request(1)).await.unwrap();
        connection.command(command_request(2)).await.unwrap();

        // -- verify --
        // The second request reuses the pinned m2; no rotation back to m1.
        let targets: Vec<MemberId> = protocol.sent().into_iter().map(|(m, _)| m).collect();
        assert_eq!(targets, vec![member("m1"), member("m2"), member("m2")]);
    }

    #[tokio::test]
    async fn terminal_error_completes_without_retry() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![Ok(Some(error_response(ErrorKind::UnknownSession)))]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1"), member("m2")]);

        // -- execute --
        let response = connection.command(command_request(1)).await.unwrap().unwrap();

        // -- verify --
        let error = response.error().expect("response must carry the error");
        assert_eq!(error.kind(), ErrorKind::UnknownSession);
        assert_eq!(protocol.sent().len(), 1);
    }

    #[tokio::test]
    async fn retryable_application_error_rotates_members() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![
            Ok(Some(error_response(ErrorKind::NoLeader))),
            Ok(Some(ok_response())),
        ]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1"), member("m2")]);

        // -- execute --
        let response = connection.command(command_request(1)).await.unwrap().unwrap();

        // -- verify --
        assert!(response.is_ok());
        let targets: Vec<MemberId> = protocol.sent().into_iter().map(|(m, _)| m).collect();
        assert_eq!(targets, vec![member("m1"), member("m2")]);
    }

    #[tokio::test]
    async fn exhaustion_fails_with_no_route_and_resets_selector() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![Err(SendError::Timeout), Ok(Some(ok_response()))]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1")]);

        // -- execute --
        let result = connection.command(command_request(1)).await;

        // -- verify --
        assert!(matches!(result, Err(ConnectionError::NoRouteToCluster)));

        // The selector was reset on exhaustion, so a later attempt starts
        // over from the front of the view.
        let response = connection.command(command_request(1)).await.unwrap().unwrap();
        assert!(response.is_ok());
        let targets: Vec<MemberId> = protocol.sent().into_iter().map(|(m, _)| m).collect();
        assert_eq!(targets, vec![member("m1"), member("m1")]);
    }

    #[tokio::test]
    async fn quiesced_no_op_completes_with_none() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![Ok(None)]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1")]);

        // -- execute --
        let response = connection.command(command_request(1)).await.unwrap();

        // -- verify --
        assert!(response.is_none());
        assert_eq!(protocol.sent().len(), 1);
    }

    #[tokio::test]
    async fn non_retryable_local_error_surfaces() {
        // -- setup --
        let protocol = ScriptedProtocol::new(vec![Err(SendError::other("request decode failure", None))]);
        let connection = connection(Arc::clone(&protocol), vec![member("m1"), member("m2")]);

        // -- execute --
        let result = connection.command(command_request(1)).await;

        // -- verify --
        match result {
            Err(ConnectionError::Send(SendError::Other { message, .. })) => {
                assert_eq!(message, "request decode failure");
            }
            other => panic!("expected surfaced local error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(protocol.sent().len(), 1);
    }
}
