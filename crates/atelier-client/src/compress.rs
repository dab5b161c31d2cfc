//! Image compression seam.
//!
//! Compression runs before upload and is CPU-bound, so the default
//! implementation ships the work to tokio's blocking pool. If the pool
//! rejects or loses the task (runtime shutdown, cancelled join), the same
//! encoder runs inline on the calling task instead; only the encoder's own
//! error fails the row.
//!
//! The encoder itself is pluggable. The default encoder is a pass-through:
//! the extraction service accepts original payloads, and deployments that
//! need real re-encoding install their own [`EncodeFn`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::{defaults, Error, Result};

/// Synchronous encoding function used by [`BlockingCompressor`].
pub type EncodeFn = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Compresses image payloads before upload.
#[async_trait]
pub trait ImageCompressor: Send + Sync {
    /// Compress one image. Inputs at or below the skip threshold are
    /// returned unchanged.
    async fn compress(&self, image: &[u8]) -> Result<Vec<u8>>;

    /// Release the compressor. Subsequent calls fail.
    fn destroy(&self);
}

/// Default compressor: blocking-pool delegation with an inline fallback.
#[derive(Clone)]
pub struct BlockingCompressor {
    encode: EncodeFn,
    skip_bytes: usize,
    destroyed: Arc<AtomicBool>,
}

impl BlockingCompressor {
    pub fn new() -> Self {
        Self {
            encode: Arc::new(|image| Ok(image.to_vec())),
            skip_bytes: defaults::COMPRESS_SKIP_BYTES,
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Install a real encoder.
    pub fn with_encoder(mut self, encode: EncodeFn) -> Self {
        self.encode = encode;
        self
    }

    pub fn with_skip_bytes(mut self, skip_bytes: usize) -> Self {
        self.skip_bytes = skip_bytes;
        self
    }
}

impl Default for BlockingCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCompressor for BlockingCompressor {
    async fn compress(&self, image: &[u8]) -> Result<Vec<u8>> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(Error::Compression("compressor has been destroyed".into()));
        }
        if image.len() <= self.skip_bytes {
            return Ok(image.to_vec());
        }

        let encode = Arc::clone(&self.encode);
        let owned = image.to_vec();
        match tokio::task::spawn_blocking(move || encode(&owned)).await {
            Ok(result) => result,
            Err(join_err) => {
                // Pool failure, not encoder failure: encode inline instead.
                tracing::warn!(
                    error = %join_err,
                    "blocking pool unavailable, compressing inline"
                );
                (self.encode)(image)
            }
        }
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}
