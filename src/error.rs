//! Crate-level error type composing every subsystem's error.

use thiserror::Error;

use crate::compactor::CompactorError;
use crate::disk::DiskError;
use crate::placement_init::PlacementInitError;
use crate::placer::PlacerError;
use crate::protocol::ProtocolError;
use crate::readqueue::ReadQueueError;

/// Top-level error returned by [`crate::dispatcher::Dispatcher`] and the binary entry point.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A disk-level operation failed (e.g. no free cells).
    #[error("disk error: {0}")]
    Disk(#[from] DiskError),

    /// The write placer could not find three distinct replica disks.
    #[error("placement error: {0}")]
    Placer(#[from] PlacerError),

    /// Startup placement construction failed.
    #[error("placement init error: {0}")]
    PlacementInit(#[from] PlacementInitError),

    /// The compactor observed an invariant violation.
    #[error("compactor error: {0}")]
    Compactor(#[from] CompactorError),

    /// Wire protocol framing failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A read queue swap collided with an already-queued address.
    #[error("read queue error: {0}")]
    ReadQueue(#[from] ReadQueueError),

    /// Internal invariant violation that should never happen given a
    /// well-formed workload.
    #[error("internal error: {0}")]
    Internal(String),
}
