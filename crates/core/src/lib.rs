//! # CapSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the synchronization pipeline
//! - The sync orchestrator service
//!
//! ## Architecture Principles
//! - Only depends on `capsync-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

// Re-export specific items to avoid ambiguity
pub use sync::ports::{
    AccessTokenProvider, ClusterResolver, PollTarget, StatusPoller, SubmitDisposition,
    SubmitResponse, SyncSubmitter,
};
pub use sync::SyncService;
