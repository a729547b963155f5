use crate::protocol::{ServerProtocol, ServiceType};
use std::sync::Arc;

/// OperationType is the kind of log entry the service is currently applying.
/// Events may only be published while a `Command` is executing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperationType {
    Command,
    Query,
    Snapshot,
    None,
}

/// ServiceContext is the session core's window into the replicated service
/// that owns it: which log entry is being applied right now, and what kind
/// of operation it is. The service layer implements this; sessions only read
/// from it while executing on the service's executor.
pub trait ServiceContext: Send + Sync {
    fn current_index(&self) -> u64;

    fn current_operation(&self) -> OperationType;

    fn service_type(&self) -> ServiceType;

    fn service_name(&self) -> String;
}

/// ServerContext is the session core's window into the server that hosts
/// it: whether this server currently owns the client transport, and the
/// protocol used to reach clients.
pub trait ServerContext: Send + Sync {
    fn is_leader(&self) -> bool;

    fn protocol(&self) -> Arc<dyn ServerProtocol>;
}
