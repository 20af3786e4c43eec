//! Index samplers for batch construction
//!
//! The length-based samplers bucket samples of similar token length into the
//! same batch so padding waste stays low; the distributed variants partition
//! work across replicas. Shuffling is seeded and re-seedable per epoch so
//! every replica draws the same permutation.

use crate::data::Dataset;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Either flavor of length-aware batch sampler produced by the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSampler {
    /// Local sampler over the whole dataset
    Length(LengthBatchSampler),
    /// Rank-scoped sampler for fully-sharded training
    DistributedLength(DistributedLengthBatchSampler),
}

impl BatchSampler {
    /// Materialize the batches of sample indices for this process
    pub fn batches(&self) -> Vec<Vec<usize>> {
        match self {
            Self::Length(sampler) => sampler.batches(),
            Self::DistributedLength(sampler) => sampler.batches(),
        }
    }
}

/// Groups samples of similar length into batches of indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthBatchSampler {
    /// Number of samples per batch
    pub batch_size: usize,
    /// Drop the trailing partial batch
    pub drop_last: bool,
    /// Shuffle the order of batches
    pub shuffle: bool,
    lengths: Vec<usize>,
    seed: u64,
}

impl LengthBatchSampler {
    /// Create a sampler over `dataset` with the given batching policy
    pub fn new(
        dataset: &dyn Dataset,
        batch_size: usize,
        drop_last: bool,
        shuffle: bool,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_input("batch_size must be greater than 0"));
        }
        let lengths = (0..dataset.len())
            .map(|i| dataset.sequence_length(i))
            .collect();
        Ok(Self {
            batch_size,
            drop_last,
            shuffle,
            lengths,
            seed: 0,
        })
    }

    /// Re-seed shuffling for a new epoch
    pub fn set_epoch(&mut self, epoch: u64) {
        self.seed = epoch;
    }

    /// Number of batches this sampler yields
    pub fn len(&self) -> usize {
        if self.drop_last {
            self.lengths.len() / self.batch_size
        } else {
            self.lengths.len().div_ceil(self.batch_size)
        }
    }

    /// Whether the sampler yields no batches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the batches of sample indices
    pub fn batches(&self) -> Vec<Vec<usize>> {
        // Stable argsort by length keeps similar-length samples together.
        let mut ids: Vec<usize> = (0..self.lengths.len()).collect();
        ids.sort_by_key(|&i| self.lengths[i]);

        let mut batches: Vec<Vec<usize>> = ids
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        if self.drop_last {
            batches.retain(|batch| batch.len() == self.batch_size);
        }

        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            batches.shuffle(&mut rng);
        }

        batches
    }
}

/// Length-based batch sampler that deals batches out across replicas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedLengthBatchSampler {
    /// Rank of this process
    pub rank: usize,
    /// Total number of replicas
    pub num_replicas: usize,
    inner: LengthBatchSampler,
}

impl DistributedLengthBatchSampler {
    /// Create a sampler scoped to `rank` out of `num_replicas`
    pub fn new(
        dataset: &dyn Dataset,
        batch_size: usize,
        rank: usize,
        num_replicas: usize,
        shuffle: bool,
    ) -> Result<Self> {
        if num_replicas == 0 {
            return Err(Error::invalid_input("num_replicas must be greater than 0"));
        }
        if rank >= num_replicas {
            return Err(Error::invalid_input(format!(
                "rank {rank} is out of range for num_replicas {num_replicas}"
            )));
        }
        // Trailing partial batches are always dropped so every replica sees
        // the same number of full batches.
        let inner = LengthBatchSampler::new(dataset, batch_size, true, shuffle)?;
        Ok(Self { rank, num_replicas, inner })
    }

    /// Shuffle policy of the underlying sampler
    pub fn shuffle(&self) -> bool {
        self.inner.shuffle
    }

    /// Batch size of the underlying sampler
    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    /// Re-seed shuffling for a new epoch
    pub fn set_epoch(&mut self, epoch: u64) {
        self.inner.set_epoch(epoch);
    }

    /// Number of batches this rank yields
    pub fn len(&self) -> usize {
        let total = self.inner.len();
        (total / self.num_replicas) + usize::from(self.rank < total % self.num_replicas)
    }

    /// Whether this rank yields no batches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize this rank's batches: every `num_replicas`-th batch of the
    /// global batch order, starting at `rank`
    pub fn batches(&self) -> Vec<Vec<usize>> {
        self.inner
            .batches()
            .into_iter()
            .skip(self.rank)
            .step_by(self.num_replicas)
            .collect()
    }
}

/// Plain strided distributed sampler over sample indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedSampler {
    /// Rank of this process
    pub rank: usize,
    /// Total number of replicas
    pub num_replicas: usize,
    /// Shuffle indices before partitioning
    pub shuffle: bool,
    /// Drop samples that do not divide evenly across replicas
    pub drop_last: bool,
    dataset_len: usize,
    seed: u64,
}

impl DistributedSampler {
    /// Create a sampler over a dataset of `dataset_len` samples
    pub fn new(
        dataset_len: usize,
        rank: usize,
        num_replicas: usize,
        shuffle: bool,
        drop_last: bool,
    ) -> Result<Self> {
        if num_replicas == 0 {
            return Err(Error::invalid_input("num_replicas must be greater than 0"));
        }
        if rank >= num_replicas {
            return Err(Error::invalid_input(format!(
                "rank {rank} is out of range for num_replicas {num_replicas}"
            )));
        }
        Ok(Self {
            rank,
            num_replicas,
            shuffle,
            drop_last,
            dataset_len,
            seed: 0,
        })
    }

    /// Re-seed shuffling for a new epoch
    pub fn set_epoch(&mut self, epoch: u64) {
        self.seed = epoch;
    }

    /// Number of samples this rank yields
    pub fn len(&self) -> usize {
        if self.drop_last {
            self.dataset_len / self.num_replicas
        } else {
            self.dataset_len.div_ceil(self.num_replicas)
        }
    }

    /// Whether this rank yields no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize this rank's sample indices
    pub fn local_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.dataset_len).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        if self.drop_last {
            indices.truncate(self.len() * self.num_replicas);
        } else {
            // Pad by wrapping around so every replica gets the same count.
            let target = self.len() * self.num_replicas;
            for i in 0..(target - indices.len()) {
                let filler = indices[i % self.dataset_len.max(1)];
                indices.push(filler);
            }
        }

        indices
            .into_iter()
            .skip(self.rank)
            .step_by(self.num_replicas)
            .collect()
    }
}
