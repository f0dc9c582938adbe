/// Lock Manager
///
/// Advisory, timeout-based editing locks, one record per workflow id.
/// Mutations follow a read-decide-write discipline over a CAS keyed-record
/// store; writes that lose a race fall back to the passive-read outcome
/// instead of erroring. Two concurrent first readers may transiently both
/// believe they hold the lock; the contract tolerates this.

// Lock record and status types
pub mod types;

// CAS keyed-record store trait with memory and SQLite implementations
pub mod store;

// The per-workflow lock state machine
pub mod manager;

// Re-export main types
pub use manager::LockManager;
pub use store::{LockStore, MemoryLockStore, SqliteLockStore};
pub use types::{LockRecord, LockStatus, PendingRequest, RequestOutcome, ResolveAction};
