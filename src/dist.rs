//! Distributed-training facts consumed by the batching strategy selector
//!
//! Rank and replica count are externally supplied; this crate never talks to
//! the process group itself. `DistMode` encodes which distributed flavor is
//! active, with fully-sharded taking precedence over plain data parallel.

use crate::error::{Error, Result};

/// Which distributed-training flavor is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistMode {
    /// Parameters and optimizer state sharded across processes
    FullySharded,
    /// Model replicated across processes
    Ddp,
}

impl DistMode {
    /// Derive the active mode from the training configuration flags.
    /// Fully-sharded wins when both flags are set.
    pub fn from_flags(enable_fsdp: bool, enable_ddp: bool) -> Option<Self> {
        if enable_fsdp {
            Some(Self::FullySharded)
        } else if enable_ddp {
            Some(Self::Ddp)
        } else {
            None
        }
    }
}

/// Rank and replica count of the current process, stable for the duration of
/// a resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistContext {
    /// Rank of this process
    pub rank: usize,
    /// Total number of replicas
    pub world_size: usize,
}

impl Default for DistContext {
    fn default() -> Self {
        Self { rank: 0, world_size: 1 }
    }
}

impl DistContext {
    /// Create a context, validating that the rank is inside the replica group
    pub fn new(rank: usize, world_size: usize) -> Result<Self> {
        if world_size == 0 {
            return Err(Error::invalid_input("world_size must be greater than 0"));
        }
        if rank >= world_size {
            return Err(Error::invalid_input(format!(
                "rank {rank} is out of range for world_size {world_size}"
            )));
        }
        Ok(Self { rank, world_size })
    }

    /// Read rank and world size from the `RANK` / `WORLD_SIZE` environment
    /// variables set by the launcher, falling back to a single-process
    /// context when they are absent.
    pub fn from_env() -> Result<Self> {
        let rank = match std::env::var("RANK") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|_| Error::invalid_input(format!("RANK is not an integer: {value}")))?,
            Err(_) => 0,
        };
        let world_size = match std::env::var("WORLD_SIZE") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                Error::invalid_input(format!("WORLD_SIZE is not an integer: {value}"))
            })?,
            Err(_) => 1,
        };
        Self::new(rank, world_size)
    }
}
