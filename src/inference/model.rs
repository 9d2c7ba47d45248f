//! GGUF model file checks
//!
//! Reads the fixed GGUF header so an obviously wrong file is rejected with a clear
//! message before llama.cpp is asked to load it.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Magic bytes every GGUF file starts with
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

/// GGUF format versions llama.cpp can still load
pub const SUPPORTED_GGUF_VERSIONS: [u32; 2] = [2, 3];

// magic + version + tensor count + metadata kv count
const HEADER_LEN: usize = 4 + 4 + 8 + 8;

/// Header fields of a GGUF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GgufMetadata {
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_kv_count: u64,
    pub file_size: u64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File too small to be a GGUF model ({0} bytes)")]
    Truncated(u64),
    #[error("Not a GGUF file (magic bytes {0:02x?})")]
    InvalidMagic([u8; 4]),
    #[error("Unsupported GGUF version {0}")]
    UnsupportedVersion(u32),
}

/// Validate the GGUF header of `path` and return its metadata
pub fn validate_gguf(path: &Path) -> Result<GgufMetadata, ModelError> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size < HEADER_LEN as u64 {
        return Err(ModelError::Truncated(file_size));
    }

    let mut header = [0u8; HEADER_LEN];
    file.read_exact(&mut header)?;

    parse_header(&header, file_size)
}

fn parse_header(header: &[u8; HEADER_LEN], file_size: u64) -> Result<GgufMetadata, ModelError> {
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&header[0..4]);
    if magic != GGUF_MAGIC {
        return Err(ModelError::InvalidMagic(magic));
    }

    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if !SUPPORTED_GGUF_VERSIONS.contains(&version) {
        return Err(ModelError::UnsupportedVersion(version));
    }

    let mut word = [0u8; 8];
    word.copy_from_slice(&header[8..16]);
    let tensor_count = u64::from_le_bytes(word);
    word.copy_from_slice(&header[16..24]);
    let metadata_kv_count = u64::from_le_bytes(word);

    Ok(GgufMetadata {
        version,
        tensor_count,
        metadata_kv_count,
        file_size,
    })
}
