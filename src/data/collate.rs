//! Batch collation
//!
//! Two collators: the seq2seq collator pads variable-length examples to the
//! longest sequence in the batch using the tokenizer's pad token, and the
//! default collator stacks examples that are already uniform length (the
//! packing pipeline guarantees this). Both produce candle tensors.

use crate::error::{Error, Result};
use candle_core::{Device, Tensor};
use tracing::debug;

/// Label value ignored by the loss function on padded positions
pub const LABEL_IGNORE_ID: i64 = -100;

/// Narrow view of a tokenizer: just the pad token id the collator needs
pub trait PadTokenLookup {
    /// Id of the padding token
    fn pad_token_id(&self) -> u32;
}

impl PadTokenLookup for tokenizers::Tokenizer {
    fn pad_token_id(&self) -> u32 {
        self.get_padding().map(|params| params.pad_id).unwrap_or(0)
    }
}

/// A single tokenized training example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSample {
    /// Token ids
    pub input_ids: Vec<u32>,
    /// Attention mask, 1 for real tokens
    pub attention_mask: Vec<u32>,
    /// Label ids, `LABEL_IGNORE_ID` on masked positions
    pub labels: Vec<i64>,
}

impl EncodedSample {
    /// Build a fully attended sample whose labels equal its inputs
    pub fn from_input_ids(input_ids: Vec<u32>) -> Self {
        let attention_mask = vec![1; input_ids.len()];
        let labels = input_ids.iter().map(|&id| id as i64).collect();
        Self { input_ids, attention_mask, labels }
    }
}

/// A collated batch of token tensors
#[derive(Debug)]
pub struct TextBatch {
    /// Token ids `[batch_size, seq_len]`
    pub input_ids: Tensor,
    /// Attention mask `[batch_size, seq_len]`
    pub attention_mask: Tensor,
    /// Labels `[batch_size, seq_len]`
    pub labels: Tensor,
    /// Number of samples in the batch
    pub batch_size: usize,
    /// Common sequence length after collation
    pub seq_len: usize,
}

/// Pads variable-length examples to a common per-batch length
#[derive(Debug, Clone)]
pub struct Seq2SeqCollator {
    pad_token_id: u32,
    device: Device,
}

impl Seq2SeqCollator {
    /// Create a collator bound to a tokenizer's pad token
    pub fn new(tokenizer: &dyn PadTokenLookup) -> Self {
        Self {
            pad_token_id: tokenizer.pad_token_id(),
            device: Device::Cpu,
        }
    }

    /// Place collated tensors on `device`
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Pad token id this collator fills with
    pub fn pad_token_id(&self) -> u32 {
        self.pad_token_id
    }

    /// Pad every sample to the longest sequence in the batch and stack
    pub fn collate(&self, samples: &[EncodedSample]) -> Result<TextBatch> {
        if samples.is_empty() {
            return Err(Error::collation("empty batch"));
        }

        let batch_size = samples.len();
        let seq_len = samples
            .iter()
            .map(|s| s.input_ids.len())
            .max()
            .unwrap_or(0);
        debug!("Collating seq2seq batch of {batch_size} samples to length {seq_len}");

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        let mut labels = Vec::with_capacity(batch_size * seq_len);

        for sample in samples {
            let pad = seq_len - sample.input_ids.len();
            input_ids.extend_from_slice(&sample.input_ids);
            input_ids.extend(std::iter::repeat(self.pad_token_id).take(pad));
            attention_mask.extend_from_slice(&sample.attention_mask);
            attention_mask.extend(std::iter::repeat(0u32).take(pad));
            labels.extend_from_slice(&sample.labels);
            labels.extend(std::iter::repeat(LABEL_IGNORE_ID).take(pad));
        }

        Ok(TextBatch {
            input_ids: Tensor::from_vec(input_ids, (batch_size, seq_len), &self.device)?,
            attention_mask: Tensor::from_vec(attention_mask, (batch_size, seq_len), &self.device)?,
            labels: Tensor::from_vec(labels, (batch_size, seq_len), &self.device)?,
            batch_size,
            seq_len,
        })
    }
}

/// Stacks examples that are already uniform length
#[derive(Debug, Clone)]
pub struct DefaultCollator {
    device: Device,
}

impl Default for DefaultCollator {
    fn default() -> Self {
        Self { device: Device::Cpu }
    }
}

impl DefaultCollator {
    /// Create a collator placing tensors on the CPU
    pub fn new() -> Self {
        Self::default()
    }

    /// Place collated tensors on `device`
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Stack the samples, failing on ragged lengths
    pub fn collate(&self, samples: &[EncodedSample]) -> Result<TextBatch> {
        if samples.is_empty() {
            return Err(Error::collation("empty batch"));
        }

        let batch_size = samples.len();
        let seq_len = samples[0].input_ids.len();
        for (i, sample) in samples.iter().enumerate() {
            if sample.input_ids.len() != seq_len {
                return Err(Error::collation(format!(
                    "sample {i} has length {} but the batch expects {seq_len}; \
                     use the padding strategy for variable-length data",
                    sample.input_ids.len()
                )));
            }
        }
        debug!("Collating packed batch of {batch_size} samples of length {seq_len}");

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        let mut labels = Vec::with_capacity(batch_size * seq_len);
        for sample in samples {
            input_ids.extend_from_slice(&sample.input_ids);
            attention_mask.extend_from_slice(&sample.attention_mask);
            labels.extend_from_slice(&sample.labels);
        }

        Ok(TextBatch {
            input_ids: Tensor::from_vec(input_ids, (batch_size, seq_len), &self.device)?,
            attention_mask: Tensor::from_vec(attention_mask, (batch_size, seq_len), &self.device)?,
            labels: Tensor::from_vec(labels, (batch_size, seq_len), &self.device)?,
            batch_size,
            seq_len,
        })
    }
}

/// The collate function attached to a derived loader configuration
#[derive(Debug, Clone)]
pub enum BatchCollator {
    /// Pad-to-longest collation for the padding strategy
    Seq2Seq(Seq2SeqCollator),
    /// Plain stacking for the packing strategy
    Default(DefaultCollator),
}

impl BatchCollator {
    /// Collate a batch with whichever collator this is
    pub fn collate(&self, samples: &[EncodedSample]) -> Result<TextBatch> {
        match self {
            Self::Seq2Seq(collator) => collator.collate(samples),
            Self::Default(collator) => collator.collate(samples),
        }
    }
}
