//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired entries from the in-memory writer

mod cleanup;

pub use cleanup::spawn_cleanup_task;
