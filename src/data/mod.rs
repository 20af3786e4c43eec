//! Data-loading building blocks
//!
//! Samplers, collators and the batching-strategy selector that wires them
//! together from a resolved training configuration.

pub mod collate;
pub mod loader;
pub mod sampler;

pub use collate::{
    BatchCollator, DefaultCollator, EncodedSample, PadTokenLookup, Seq2SeqCollator, TextBatch,
};
pub use loader::{derive_loader_kwargs, LoaderKwargs, Mode};
pub use sampler::{
    BatchSampler, DistributedLengthBatchSampler, DistributedSampler, LengthBatchSampler,
};

/// Minimal view of a tokenized dataset, enough to drive sampling
pub trait Dataset: Send + Sync {
    /// Get the number of samples in the dataset
    fn len(&self) -> usize;

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token length of the sample at `index`, used for length bucketing
    fn sequence_length(&self, index: usize) -> usize;
}
