use std::fmt;

/// MemberId is the stable identifier of a node participating in the
/// replication cluster, as seen by clients.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(member_id: impl Into<String>) -> Self {
        MemberId(member_id.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SessionId is assigned by the cluster when a session opens. It doubles as
/// the session's anchor in log time: a fresh session's event index, complete
/// index, and applied index all start at the id's value.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        SessionId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ServiceType names the kind of replicated service a session talks to.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct ServiceType(String);

impl ServiceType {
    pub fn new(service_type: impl Into<String>) -> Self {
        ServiceType(service_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ReadConsistency selects how a query is released for execution.
///
/// Sequential queries wait for the command sequence they depend on;
/// linearizable queries wait for a specific log index.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadConsistency {
    Sequential,
    LinearizableLease,
    Linearizable,
}
