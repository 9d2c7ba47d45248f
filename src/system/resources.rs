//! System resource detection
//!
//! Sizes the inference thread pool from the host's CPU count.

use std::num::NonZeroUsize;

/// Number of threads llama.cpp should use for generation
///
/// Falls back to a single thread when the core count cannot be determined.
pub fn available_threads() -> i32 {
    let cores = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or_else(|e| {
            tracing::warn!("Could not detect CPU count, using 1 thread: {}", e);
            1
        });

    i32::try_from(cores).unwrap_or(i32::MAX)
}
