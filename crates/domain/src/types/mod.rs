//! Common data types used throughout the application

pub mod capacity;
pub mod session;
pub mod sync;

pub use capacity::{CapacityReference, READ_WRITE_SUFFIX};
pub use session::Session;
pub use sync::{
    ClusterResolution, CorrelationContext, DatabaseSyncResult, ServerTrace, SyncOutcome, SyncState,
};
