//! HTTP adapters for the synchronization pipeline ports

pub mod poller;
pub mod resolver;
pub mod submitter;

pub use poller::{HttpStatusPoller, PollingPolicy};
pub use resolver::ClusterResolveClient;
pub use submitter::HttpSyncSubmitter;
