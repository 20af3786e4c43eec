//! llamatune - configuration plumbing for parameter-efficient fine-tuning
//!
//! This crate reconciles user-supplied overrides with typed fine-tuning
//! configurations, resolves peft-method and dataset selections against
//! static registries, and derives the sampler/collator arguments a data
//! loader is built from.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod adapter;
pub mod config;
pub mod data;
pub mod dist;
pub mod error;
pub mod overrides;
pub mod registry;
pub mod resolve;

// Re-exports
pub use adapter::AdapterConfig;
pub use config::{DatasetConfig, DistillConfig, TrainConfig};
pub use data::{derive_loader_kwargs, BatchCollator, Dataset, LoaderKwargs, Mode};
pub use dist::{DistContext, DistMode};
pub use error::{Error, Result};
pub use overrides::{reconcile, reconcile_one, Overridable, OverrideSet, OverrideWarning};
pub use resolve::{resolve_dataset, resolve_peft};
