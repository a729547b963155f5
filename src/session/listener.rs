use crate::protocol::SessionId;
use std::sync::{Arc, Mutex};

/// SessionEvent notifies listeners of a session lifecycle transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session_id: SessionId,
    pub timestamp: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionEventKind {
    Open,
    Expire,
    Close,
}

pub trait SessionEventListener: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

/// ListenerSet allows listeners to be added and removed while a state
/// transition is notifying: iteration works on a snapshot taken under the
/// lock, mutation takes the lock.
pub(crate) struct ListenerSet {
    listeners: Mutex<Vec<Arc<dyn SessionEventListener>>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        ListenerSet {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn SessionEventListener>) {
        self.lock().push(listener);
    }

    pub(crate) fn remove(&self, listener: &Arc<dyn SessionEventListener>) {
        self.lock().retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    pub(crate) fn notify(&self, event: &SessionEvent) {
        let snapshot: Vec<Arc<dyn SessionEventListener>> = self.lock().clone();
        for listener in snapshot {
            listener.on_event(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn SessionEventListener>>> {
        self.listeners.lock().expect("ListenerSet mutex guard poison")
    }
}
