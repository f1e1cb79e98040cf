use crate::error::{Result, VectorStoreError};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

const MAX_PROBES: usize = 8;
const BIGRAM_WEIGHT: f32 = 0.5;

/// Maps text to fixed-dimension vectors for similarity scoring
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Whether one-time setup has completed
    fn is_ready(&self) -> bool;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorizerConfig {
    /// Number of coordinates per vector
    pub dimension: usize,

    /// Coordinates each feature is hashed into
    pub probes: usize,

    /// Also hash adjacent-token pairs (half weight)
    pub include_bigrams: bool,

    /// Mixed into every probe seed; changing it changes every vector
    pub seed: u64,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            probes: 2,
            include_bigrams: true,
            seed: 0x5EED_D0C5_EA2C_4001,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(VectorStoreError::InvalidConfig(
                "dimension must be > 0".to_string(),
            ));
        }
        if self.probes == 0 || self.probes > MAX_PROBES {
            return Err(VectorStoreError::InvalidConfig(format!(
                "probes must be in 1..={MAX_PROBES}, got {}",
                self.probes
            )));
        }
        Ok(())
    }
}

/// Feature-hashing vectorizer.
///
/// Lower-cased Unicode words (and optionally word pairs) are counted,
/// hashed into `probes` signed coordinates each, dampened with `1 + ln(tf)`
/// and L2-normalized. Pure and deterministic: no model, no I/O.
#[derive(Debug)]
pub struct HashingEmbedder {
    config: VectorizerConfig,
    probe_seeds: OnceCell<Vec<u64>>,
}

impl HashingEmbedder {
    /// Create an embedder; [`Embedder::is_ready`] stays false until
    /// [`HashingEmbedder::initialize`] runs.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            probe_seeds: OnceCell::new(),
        })
    }

    /// Create and initialize in one step
    pub fn ready(config: VectorizerConfig) -> Result<Self> {
        let embedder = Self::new(config)?;
        embedder.initialize();
        Ok(embedder)
    }

    /// Build the probe seed table. Idempotent and thread-safe.
    pub fn initialize(&self) {
        self.probe_seeds.get_or_init(|| {
            let mut state = self.config.seed ^ (self.config.dimension as u64);
            let seeds: Vec<u64> = (0..self.config.probes)
                .map(|_| splitmix64(&mut state))
                .collect();
            log::debug!(
                "Hashing embedder ready (dimension={}, probes={})",
                self.config.dimension,
                self.config.probes
            );
            seeds
        });
    }

    #[must_use]
    pub const fn config(&self) -> &VectorizerConfig {
        &self.config
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn is_ready(&self) -> bool {
        self.probe_seeds.get().is_some()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let seeds = self.probe_seeds.get().ok_or(VectorStoreError::NotReady)?;
        let tokens = tokenize(text);

        // BTreeMap keeps accumulation order (and so float rounding) stable.
        let mut unigrams: BTreeMap<&str, u32> = BTreeMap::new();
        for token in &tokens {
            *unigrams.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut bigrams: BTreeMap<String, u32> = BTreeMap::new();
        if self.config.include_bigrams {
            for pair in tokens.windows(2) {
                *bigrams.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
            }
        }

        let mut vec = vec![0.0f32; self.config.dimension];
        for (token, tf) in &unigrams {
            accumulate(&mut vec, token, dampen(*tf), seeds);
        }
        for (pair, tf) in &bigrams {
            accumulate(&mut vec, pair, BIGRAM_WEIGHT * dampen(*tf), seeds);
        }

        normalize(&mut vec);
        Ok(vec)
    }
}

/// Lower-cased Unicode words of `text`, in order
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Cosine similarity of two equal-length vectors.
///
/// A zero vector has similarity 0 with everything. Length mismatch is an
/// error, never silently truncated.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VectorStoreError::InvalidDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

fn accumulate(vec: &mut [f32], feature: &str, weight: f32, seeds: &[u64]) {
    let base = fnv1a_64(feature.as_bytes());
    let dimension = vec.len() as u64;
    for seed in seeds {
        let mut state = base ^ seed;
        let bits = splitmix64(&mut state);
        #[allow(clippy::cast_possible_truncation)]
        let idx = (bits % dimension) as usize;
        let sign = if bits >> 63 == 0 { 1.0 } else { -1.0 };
        vec[idx] += sign * weight;
    }
}

#[allow(clippy::cast_precision_loss)]
fn dampen(tf: u32) -> f32 {
    1.0 + (tf as f32).ln()
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
