use crate::protocol::{
    Event, MemberId, PublishRequest, ReadConsistency, ResetListener, ResetRequest, ServerProtocol, ServiceType,
    SessionError, SessionId,
};
use crate::service::{OperationType, ServerContext, ServiceContext};
use crate::session::event_queue::{EventBatch, EventQueue};
use crate::session::gates::QueryGates;
use crate::session::listener::{ListenerSet, SessionEvent, SessionEventKind, SessionEventListener};
use crate::session::pending::PendingCommand;
use crate::session::state::{SessionHandle, SessionState, SharedState};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// OperationResult is the memoized output of one applied command. It is kept
/// until the client acknowledges the sequence so a retransmission returns
/// the original output instead of re-applying.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationResult {
    pub index: u64,
    pub event_index: u64,
    pub output: Result<Option<Bytes>, SessionError>,
}

pub struct SessionConfig {
    pub logger: slog::Logger,
    pub session_id: SessionId,
    pub member: MemberId,
    pub service_name: String,
    pub service_type: ServiceType,
    pub read_consistency: ReadConsistency,
    pub timeout: Duration,
    pub service: Arc<dyn ServiceContext>,
    pub server: Arc<dyn ServerContext>,
}

/// SessionContext is the server-side half of one client session: the
/// replicated bookkeeping that turns an ordered log into linearizable
/// command execution, gated queries, and ordered replayable events.
///
/// All mutation happens through `&mut self` on the owning service's
/// executor. Cross-thread observers read through the [`SessionHandle`]
/// returned by `handle()`.
pub struct SessionContext {
    logger: slog::Logger,
    session_id: SessionId,
    member: MemberId,
    service_name: String,
    service_type: ServiceType,
    read_consistency: ReadConsistency,
    timeout: Duration,
    service: Arc<dyn ServiceContext>,
    server: Arc<dyn ServerContext>,
    protocol: Arc<dyn ServerProtocol>,
    shared: Arc<SharedState>,
    request_sequence: u64,
    command_low_water_mark: u64,
    sequence_gates: QueryGates,
    index_gates: QueryGates,
    pending_commands: BTreeMap<u64, PendingCommand>,
    results: HashMap<u64, OperationResult>,
    events: EventQueue,
    current_batch: Option<EventBatch>,
    listeners: ListenerSet,
}

impl SessionContext {
    /// Creates the session and registers its reset listener with the server
    /// protocol. The returned receiver carries client reset requests; the
    /// service executor drains it into [`SessionContext::resend_events`] so
    /// replay runs on the session's owning thread.
    pub fn new(config: SessionConfig) -> (Self, mpsc::UnboundedReceiver<ResetRequest>) {
        let logger = config.logger.new(slog::o!(
            "SessionId" => config.session_id.as_u64(),
            "ServiceName" => config.service_name.clone(),
            "ServiceType" => config.service_type.as_str().to_string(),
        ));

        let protocol = config.server.protocol();
        let (reset_listener, reset_requests) = ResetListener::new();
        protocol.register_reset_listener(config.session_id, reset_listener);

        let session = SessionContext {
            logger,
            session_id: config.session_id,
            member: config.member,
            service_name: config.service_name,
            service_type: config.service_type,
            read_consistency: config.read_consistency,
            timeout: config.timeout,
            service: config.service,
            server: config.server,
            protocol,
            shared: Arc::new(SharedState::new(config.session_id.as_u64())),
            request_sequence: 0,
            command_low_water_mark: 0,
            sequence_gates: QueryGates::new(),
            index_gates: QueryGates::new(),
            pending_commands: BTreeMap::new(),
            results: HashMap::new(),
            events: EventQueue::new(),
            current_batch: None,
            listeners: ListenerSet::new(),
        };

        (session, reset_requests)
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn member_id(&self) -> &MemberId {
        &self.member
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    pub fn read_consistency(&self) -> ReadConsistency {
        self.read_consistency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// `handle()` returns a cheap cloneable read-only view of this session's
    /// observable state, safe to hold on any thread.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.session_id, Arc::clone(&self.shared))
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionEventListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn SessionEventListener>) {
        self.listeners.remove(listener);
    }

    pub fn timestamp(&self) -> u64 {
        self.shared.timestamp()
    }

    /// Updates the last-observed wall-clock timestamp. Stale observations
    /// (from re-applied log entries) never move it backwards.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.shared.store_timestamp(self.shared.timestamp().max(timestamp));
    }

    // ---- request/command sequencing ----

    pub fn request_sequence(&self) -> u64 {
        self.request_sequence
    }

    pub fn next_request_sequence(&self) -> u64 {
        self.request_sequence + 1
    }

    /// Records the highest request number the client has submitted. Advances
    /// via max: out-of-order arrivals and leader-changeover gaps are normal.
    pub fn set_request_sequence(&mut self, sequence: u64) {
        self.request_sequence = self.request_sequence.max(sequence);
    }

    /// Seeds the request mark from applied state. A follower elected leader
    /// runs this so its sequencing stays consistent with commands already in
    /// the log.
    pub fn reset_request_sequence(&mut self, sequence: u64) {
        if sequence > self.request_sequence {
            self.request_sequence = sequence;
        }
    }

    pub fn command_sequence(&self) -> u64 {
        self.shared.command_sequence()
    }

    pub fn next_command_sequence(&self) -> u64 {
        self.shared.command_sequence() + 1
    }

    /// Advances the sequence of applied commands. Every occupied sequence
    /// gate in the crossed range releases in ascending order, with the
    /// visible sequence stepped to the gate's point before its queries run.
    pub fn set_command_sequence(&mut self, sequence: u64) {
        while let Some(gate) = self.sequence_gates.next_point_within(self.shared.command_sequence(), sequence) {
            self.shared.store_command_sequence(gate);
            for query in self.sequence_gates.take(gate) {
                query();
            }
        }
        if sequence > self.shared.command_sequence() {
            self.shared.store_command_sequence(sequence);
        }
    }

    // ---- index gating ----

    pub fn last_applied(&self) -> u64 {
        self.shared.last_applied()
    }

    /// Advances the highest log index applied to this session's service,
    /// releasing index gates the same way `set_command_sequence` releases
    /// sequence gates.
    pub fn set_last_applied(&mut self, index: u64) {
        while let Some(gate) = self.index_gates.next_point_within(self.shared.last_applied(), index) {
            self.shared.store_last_applied(gate);
            for query in self.index_gates.take(gate) {
                query();
            }
        }
        if index > self.shared.last_applied() {
            self.shared.store_last_applied(index);
        }
    }

    /// Parks a query until the session's command sequence reaches
    /// `sequence`. Releases queries with sequential consistency.
    pub fn register_sequence_query(&mut self, sequence: u64, query: impl FnOnce() + Send + 'static) {
        self.sequence_gates.register(sequence, Box::new(query));
    }

    /// Parks a query until the session's applied index reaches `index`.
    /// Releases queries with linearizable consistency.
    pub fn register_index_query(&mut self, index: u64, query: impl FnOnce() + Send + 'static) {
        self.index_gates.register(index, Box::new(query));
    }

    // ---- pending commands ----

    pub fn register_command(&mut self, sequence: u64, command: PendingCommand) {
        self.pending_commands.insert(sequence, command);
    }

    pub fn command(&self, sequence: u64) -> Option<&PendingCommand> {
        self.pending_commands.get(&sequence)
    }

    pub fn take_command(&mut self, sequence: u64) -> Option<PendingCommand> {
        self.pending_commands.remove(&sequence)
    }

    /// Removes and returns all parked commands in sequence order.
    pub fn clear_commands(&mut self) -> Vec<PendingCommand> {
        std::mem::take(&mut self.pending_commands).into_values().collect()
    }

    // ---- result memoization ----

    /// Memoizes a command's output under its sequence so a retransmission
    /// returns the same output without re-applying.
    pub fn register_result(&mut self, sequence: u64, result: OperationResult) {
        self.results.insert(sequence, result);
    }

    pub fn result(&self, sequence: u64) -> Option<&OperationResult> {
        self.results.get(&sequence)
    }

    /// Drops memoized outputs at and below `sequence`. The client has acked
    /// receipt through this point; a command at or below the new low-water
    /// mark is no longer retryable.
    pub fn clear_results(&mut self, sequence: u64) {
        if sequence > self.command_low_water_mark {
            for i in self.command_low_water_mark + 1..=sequence {
                self.results.remove(&i);
                self.command_low_water_mark = i;
            }
        }
    }

    pub fn command_low_water_mark(&self) -> u64 {
        self.command_low_water_mark
    }

    pub fn result_cache_size(&self) -> usize {
        self.results.len()
    }

    /// Number of queries currently parked behind sequence or index gates.
    pub fn pending_query_count(&self) -> usize {
        self.sequence_gates.len() + self.index_gates.len()
    }

    // ---- event pipeline ----

    pub fn event_index(&self) -> u64 {
        self.shared.event_index()
    }

    pub fn complete_index(&self) -> u64 {
        self.shared.complete_index()
    }

    /// Number of committed event batches awaiting client acknowledgement.
    pub fn queued_event_batches(&self) -> usize {
        self.events.len()
    }

    /// Queues an event for the client, batched under the log index of the
    /// command currently executing.
    ///
    /// An event the client has already acknowledged through another server
    /// (a follower re-applying after a leadership change) is dropped
    /// silently.
    ///
    /// # Panics
    ///
    /// Panics if the session is expired or closed, or if no command is
    /// currently executing: events exist only as output of command
    /// application.
    pub fn publish(&mut self, event: Event) {
        let state = self.state();
        assert!(
            state != SessionState::Expired,
            "session {:?} is expired",
            self.session_id
        );
        assert!(state != SessionState::Closed, "session {:?} is closed", self.session_id);
        assert!(
            self.service.current_operation() == OperationType::Command,
            "session events can only be published during command execution"
        );

        let current_index = self.service.current_index();
        if self.complete_index() > current_index {
            return;
        }

        match &mut self.current_batch {
            Some(batch) if batch.event_index == current_index => {
                batch.events.push(event);
            }
            _ => {
                let previous_index = self.shared.event_index();
                self.shared.store_event_index(current_index);
                let mut batch = EventBatch::new(current_index, previous_index);
                batch.events.push(event);
                self.current_batch = Some(batch);
            }
        }
    }

    /// Seals and transmits the event batch for a committed command, then
    /// advances the applied index. An open batch for a different index means
    /// that command never committed; it stays parked.
    pub fn commit(&mut self, index: u64) {
        match self.current_batch.take() {
            Some(batch) if batch.event_index == index => {
                self.send_events(&batch);
                self.events.push(batch);
            }
            other => self.current_batch = other,
        }
        self.set_last_applied(index);
    }

    /// The compaction horizon this session allows: one short of the oldest
    /// unacknowledged batch, or the applied index when nothing is queued.
    pub fn last_completed(&self) -> u64 {
        match self.events.front() {
            Some(batch) if batch.event_index > self.complete_index() => batch.event_index - 1,
            _ => self.last_applied(),
        }
    }

    /// Handles a client reset: discard batches the client reports received
    /// (through `index`), then replay everything still queued. This covers
    /// both post-reconnect catch-up and a detected gap.
    pub fn resend_events(&mut self, index: u64) {
        self.clear_events(index);
        for batch in self.events.iter() {
            self.send_events(batch);
        }
    }

    fn clear_events(&mut self, index: u64) {
        if index > self.complete_index() {
            self.events.clear_through(index);
            self.shared.store_complete_index(index);
        }
    }

    fn send_events(&self, batch: &EventBatch) {
        // Only the leader owns the client transport; on a follower the batch
        // just stays queued for a later resend.
        if !self.server.is_leader() {
            return;
        }

        let request = PublishRequest {
            session_id: self.session_id,
            event_index: batch.event_index,
            // A client whose state advanced past this batch's nominal
            // predecessor must still accept it.
            previous_index: batch.previous_index.max(self.complete_index()),
            events: batch.events.clone(),
        };

        slog::trace!(self.logger, "Sending {:?}", request);
        self.protocol.publish(&self.member, request);
    }

    // ---- lifecycle ----

    /// Marks the session expired: the cluster declared it timed out.
    pub fn expire(&mut self) {
        self.set_state(SessionState::Expired);
        self.protocol.unregister_reset_listener(self.session_id);
    }

    /// Marks the session closed by an orderly client request.
    pub fn close(&mut self) {
        self.set_state(SessionState::Closed);
        self.protocol.unregister_reset_listener(self.session_id);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state() == state {
            return;
        }

        self.shared.store_state(state);
        slog::debug!(self.logger, "State changed: {:?}", state);

        let kind = match state {
            SessionState::Open => Some(SessionEventKind::Open),
            SessionState::Expired => Some(SessionEventKind::Expire),
            SessionState::Closed => Some(SessionEventKind::Close),
            // Suspension is a client-side inference; the server core never
            // transitions into it.
            SessionState::Suspended => None,
        };
        if let Some(kind) = kind {
            self.listeners.notify(&SessionEvent {
                kind,
                session_id: self.session_id,
                timestamp: self.timestamp(),
            });
        }
    }
}

// A session's identity is its id: equality and hashing never consider the
// rest of the bookkeeping.
impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id
    }
}

impl Eq for SessionContext {}

impl Hash for SessionContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.session_id.hash(state);
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.session_id)
            .field("service", &self.service_name)
            .field("state", &self.state())
            .finish()
    }
}
