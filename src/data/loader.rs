//! Batching strategy selection
//!
//! Turns a resolved training configuration into the arguments a data loader
//! is built from. Two orthogonal axes drive the branching: the batching
//! strategy (`padding` vs `packing`) and the distributed mode (fully-sharded
//! before plain data parallel). Under padding the batch sampler owns both
//! bucketing and sharding, so no independent batch size is emitted; under
//! packing the examples are already uniform length and plain sampling
//! suffices.

use crate::config::TrainConfig;
use crate::data::collate::{BatchCollator, DefaultCollator, PadTokenLookup, Seq2SeqCollator};
use crate::data::sampler::{
    BatchSampler, DistributedLengthBatchSampler, DistributedSampler, LengthBatchSampler,
};
use crate::data::Dataset;
use crate::dist::{DistContext, DistMode};
use crate::error::{Error, Result};
use tracing::debug;

/// Which split a loader is being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Training split
    Train,
    /// Validation split
    Val,
}

impl Mode {
    /// Whether this is the training split
    pub fn is_train(self) -> bool {
        matches!(self, Self::Train)
    }
}

/// Construction arguments for a data loader
///
/// Exactly one of `batch_sampler` / (`sampler` + `batch_size`) is populated,
/// matching which component owns batch formation.
#[derive(Debug)]
pub struct LoaderKwargs {
    /// Batch sampler that owns batching entirely (padding strategy)
    pub batch_sampler: Option<BatchSampler>,
    /// Per-sample sampler (packing strategy under distributed training)
    pub sampler: Option<DistributedSampler>,
    /// Loader-level batch size, absent when the batch sampler owns it
    pub batch_size: Option<usize>,
    /// Loader-level drop-last policy, absent when the batch sampler owns it
    pub drop_last: Option<bool>,
    /// Collate function for the loader
    pub collate_fn: BatchCollator,
}

/// Derive loader construction arguments from the training configuration.
///
/// `padding`: a length-aware batch sampler (rank-scoped under fully-sharded
/// training, local otherwise) plus a seq2seq collator bound to the tokenizer.
/// `packing`: a plain distributed sampler when either distributed flag is
/// set, loader-level batch size and drop-last, and the default collator.
/// Anything else fails with [`Error::UnknownBatchingStrategy`].
pub fn derive_loader_kwargs(
    train_config: &TrainConfig,
    dataset: &dyn Dataset,
    tokenizer: &dyn PadTokenLookup,
    mode: Mode,
    dist: &DistContext,
) -> Result<LoaderKwargs> {
    let batch_size = if mode.is_train() {
        train_config.batch_size_training
    } else {
        train_config.val_batch_size
    };
    let shuffle = mode.is_train();
    let dist_mode = DistMode::from_flags(train_config.enable_fsdp, train_config.enable_ddp);
    debug!(
        "Deriving loader kwargs: strategy={}, mode={mode:?}, dist={dist_mode:?}",
        train_config.batching_strategy
    );

    match train_config.batching_strategy.as_str() {
        "padding" => {
            let batch_sampler = if matches!(dist_mode, Some(DistMode::FullySharded)) {
                BatchSampler::DistributedLength(DistributedLengthBatchSampler::new(
                    dataset,
                    batch_size,
                    dist.rank,
                    dist.world_size,
                    shuffle,
                )?)
            } else {
                BatchSampler::Length(LengthBatchSampler::new(dataset, batch_size, true, shuffle)?)
            };

            Ok(LoaderKwargs {
                batch_sampler: Some(batch_sampler),
                sampler: None,
                batch_size: None,
                drop_last: None,
                collate_fn: BatchCollator::Seq2Seq(Seq2SeqCollator::new(tokenizer)),
            })
        }
        "packing" => {
            let sampler = match dist_mode {
                Some(_) => Some(DistributedSampler::new(
                    dataset.len(),
                    dist.rank,
                    dist.world_size,
                    shuffle,
                    true,
                )?),
                None => None,
            };

            Ok(LoaderKwargs {
                batch_sampler: None,
                sampler,
                batch_size: Some(batch_size),
                drop_last: Some(true),
                collate_fn: BatchCollator::Default(DefaultCollator::new()),
            })
        }
        other => Err(Error::UnknownBatchingStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct FakeDataset {
        lengths: Vec<usize>,
    }

    impl Dataset for FakeDataset {
        fn len(&self) -> usize {
            self.lengths.len()
        }

        fn sequence_length(&self, index: usize) -> usize {
            self.lengths[index]
        }
    }

    struct FakeTokenizer;

    impl PadTokenLookup for FakeTokenizer {
        fn pad_token_id(&self) -> u32 {
            0
        }
    }

    fn dataset() -> FakeDataset {
        FakeDataset {
            lengths: (1..=32).collect(),
        }
    }

    fn config(strategy: &str, fsdp: bool, ddp: bool) -> TrainConfig {
        let mut config = TrainConfig::default();
        config.batching_strategy = strategy.to_string();
        config.enable_fsdp = fsdp;
        config.enable_ddp = ddp;
        config.batch_size_training = 8;
        config.val_batch_size = 4;
        config
    }

    #[test]
    fn test_padding_local_train() {
        let kwargs = derive_loader_kwargs(
            &config("padding", false, false),
            &dataset(),
            &FakeTokenizer,
            Mode::Train,
            &DistContext::default(),
        )
        .unwrap();

        match kwargs.batch_sampler {
            Some(BatchSampler::Length(sampler)) => {
                assert_eq!(sampler.batch_size, 8);
                assert!(sampler.drop_last);
                assert!(sampler.shuffle);
            }
            other => panic!("expected local length sampler, got {other:?}"),
        }
        // The sampler owns batching, so no loader-level keys are emitted.
        assert!(kwargs.batch_size.is_none());
        assert!(kwargs.drop_last.is_none());
        assert!(kwargs.sampler.is_none());
        assert!(matches!(kwargs.collate_fn, BatchCollator::Seq2Seq(_)));
    }

    #[test]
    fn test_padding_local_val_does_not_shuffle() {
        let kwargs = derive_loader_kwargs(
            &config("padding", false, false),
            &dataset(),
            &FakeTokenizer,
            Mode::Val,
            &DistContext::default(),
        )
        .unwrap();

        match kwargs.batch_sampler {
            Some(BatchSampler::Length(sampler)) => {
                assert_eq!(sampler.batch_size, 4);
                assert!(!sampler.shuffle);
            }
            other => panic!("expected local length sampler, got {other:?}"),
        }
    }

    #[test]
    fn test_padding_fsdp_uses_rank_scoped_sampler() {
        let dist = DistContext::new(1, 4).unwrap();
        let kwargs = derive_loader_kwargs(
            &config("padding", true, false),
            &dataset(),
            &FakeTokenizer,
            Mode::Train,
            &dist,
        )
        .unwrap();

        match kwargs.batch_sampler {
            Some(BatchSampler::DistributedLength(sampler)) => {
                assert_eq!(sampler.rank, 1);
                assert_eq!(sampler.num_replicas, 4);
                assert_eq!(sampler.batch_size(), 8);
                assert!(sampler.shuffle());
            }
            other => panic!("expected distributed length sampler, got {other:?}"),
        }
        assert!(kwargs.batch_size.is_none());
        assert!(kwargs.drop_last.is_none());
        assert!(matches!(kwargs.collate_fn, BatchCollator::Seq2Seq(_)));
    }

    #[test]
    fn test_padding_ddp_without_fsdp_stays_local() {
        // Only the fully-sharded flag promotes the padding sampler to the
        // distributed variant.
        let dist = DistContext::new(1, 4).unwrap();
        let kwargs = derive_loader_kwargs(
            &config("padding", false, true),
            &dataset(),
            &FakeTokenizer,
            Mode::Train,
            &dist,
        )
        .unwrap();

        assert!(matches!(kwargs.batch_sampler, Some(BatchSampler::Length(_))));
    }

    #[test]
    fn test_packing_local_val() {
        let kwargs = derive_loader_kwargs(
            &config("packing", false, false),
            &dataset(),
            &FakeTokenizer,
            Mode::Val,
            &DistContext::default(),
        )
        .unwrap();

        assert!(kwargs.sampler.is_none());
        assert!(kwargs.batch_sampler.is_none());
        assert_eq!(kwargs.batch_size, Some(4));
        assert_eq!(kwargs.drop_last, Some(true));
        assert!(matches!(kwargs.collate_fn, BatchCollator::Default(_)));
    }

    #[test_case(true, false ; "fully sharded")]
    #[test_case(false, true ; "ddp")]
    #[test_case(true, true ; "both flags")]
    fn test_packing_distributed_gets_sampler(fsdp: bool, ddp: bool) {
        let dist = DistContext::new(2, 4).unwrap();
        let kwargs = derive_loader_kwargs(
            &config("packing", fsdp, ddp),
            &dataset(),
            &FakeTokenizer,
            Mode::Train,
            &dist,
        )
        .unwrap();

        let sampler = kwargs.sampler.expect("expected a distributed sampler");
        assert_eq!(sampler.rank, 2);
        assert_eq!(sampler.num_replicas, 4);
        assert!(sampler.shuffle);
        assert!(sampler.drop_last);
        assert_eq!(kwargs.batch_size, Some(8));
        assert_eq!(kwargs.drop_last, Some(true));
    }

    #[test]
    fn test_packing_val_does_not_shuffle_sampler() {
        let dist = DistContext::new(0, 2).unwrap();
        let kwargs = derive_loader_kwargs(
            &config("packing", true, false),
            &dataset(),
            &FakeTokenizer,
            Mode::Val,
            &dist,
        )
        .unwrap();

        assert!(!kwargs.sampler.unwrap().shuffle);
    }

    #[test_case("unknown_strategy", false, false, Mode::Train)]
    #[test_case("unknown_strategy", true, false, Mode::Val)]
    #[test_case("unknown_strategy", false, true, Mode::Train)]
    #[test_case("", false, false, Mode::Val)]
    fn test_unknown_strategy_fails(strategy: &str, fsdp: bool, ddp: bool, mode: Mode) {
        let err = derive_loader_kwargs(
            &config(strategy, fsdp, ddp),
            &dataset(),
            &FakeTokenizer,
            mode,
            &DistContext::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::UnknownBatchingStrategy(s) if s == strategy));
    }
}
