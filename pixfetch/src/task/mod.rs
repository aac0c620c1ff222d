//! Request records, their handles and the state machine they follow.

mod handle;
mod pool;
mod record;
mod state;

pub use handle::RequestHandle;
pub use pool::{RecordPool, DEFAULT_RECORD_POOL_CAPACITY};
pub use record::Record;
pub use state::{FailureKind, RequestState, TaskEvent, TaskPhase, TransitionError};
