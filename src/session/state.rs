use crate::protocol::SessionId;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// SessionState is the lifecycle of a session. Servers only ever emit
/// `Open`, `Expired`, and `Closed`; `Suspended` exists for clients, which
/// infer it when the connection cannot make progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Open,
    Suspended,
    Expired,
    Closed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Expired | SessionState::Closed)
    }

    fn as_u8(self) -> u8 {
        match self {
            SessionState::Open => 0,
            SessionState::Suspended => 1,
            SessionState::Expired => 2,
            SessionState::Closed => 3,
        }
    }

    fn from_u8(value: u8) -> SessionState {
        match value {
            0 => SessionState::Open,
            1 => SessionState::Suspended,
            2 => SessionState::Expired,
            3 => SessionState::Closed,
            _ => unreachable!("invalid session state discriminant"),
        }
    }
}

/// SharedState holds the session fields observable across threads. Only the
/// session's owning executor stores into it; any thread may load.
pub(crate) struct SharedState {
    state: AtomicU8,
    timestamp: AtomicU64,
    command_sequence: AtomicU64,
    last_applied: AtomicU64,
    event_index: AtomicU64,
    complete_index: AtomicU64,
}

impl SharedState {
    /// A fresh session is anchored in log time at its session id: event
    /// index, complete index, and applied index all start there.
    pub(crate) fn new(anchor: u64) -> Self {
        SharedState {
            state: AtomicU8::new(SessionState::Open.as_u8()),
            timestamp: AtomicU64::new(0),
            command_sequence: AtomicU64::new(0),
            last_applied: AtomicU64::new(anchor),
            event_index: AtomicU64::new(anchor),
            complete_index: AtomicU64::new(anchor),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn store_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    pub(crate) fn timestamp(&self) -> u64 {
        self.timestamp.load(Ordering::SeqCst)
    }

    pub(crate) fn store_timestamp(&self, timestamp: u64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    pub(crate) fn command_sequence(&self) -> u64 {
        self.command_sequence.load(Ordering::SeqCst)
    }

    pub(crate) fn store_command_sequence(&self, sequence: u64) {
        self.command_sequence.store(sequence, Ordering::SeqCst);
    }

    pub(crate) fn last_applied(&self) -> u64 {
        self.last_applied.load(Ordering::SeqCst)
    }

    pub(crate) fn store_last_applied(&self, index: u64) {
        self.last_applied.store(index, Ordering::SeqCst);
    }

    pub(crate) fn event_index(&self) -> u64 {
        self.event_index.load(Ordering::SeqCst)
    }

    pub(crate) fn store_event_index(&self, index: u64) {
        self.event_index.store(index, Ordering::SeqCst);
    }

    pub(crate) fn complete_index(&self) -> u64 {
        self.complete_index.load(Ordering::SeqCst)
    }

    pub(crate) fn store_complete_index(&self, index: u64) {
        self.complete_index.store(index, Ordering::SeqCst);
    }
}

/// SessionHandle is a cheap cloneable read-only view of a session's
/// observable state, safe to hold on any thread.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    shared: Arc<SharedState>,
}

impl SessionHandle {
    pub(crate) fn new(session_id: SessionId, shared: Arc<SharedState>) -> Self {
        SessionHandle { session_id, shared }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn timestamp(&self) -> u64 {
        self.shared.timestamp()
    }

    pub fn command_sequence(&self) -> u64 {
        self.shared.command_sequence()
    }

    pub fn last_applied(&self) -> u64 {
        self.shared.last_applied()
    }

    pub fn event_index(&self) -> u64 {
        self.shared.event_index()
    }

    pub fn complete_index(&self) -> u64 {
        self.shared.complete_index()
    }
}
