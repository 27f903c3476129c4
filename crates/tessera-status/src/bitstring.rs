//! StatusList2021 bitstring.
//!
//! Bits are addressed left to right: index 0 is the most significant bit of
//! the first byte. The wire form is base64url (no padding) of the gzipped
//! bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::StatusError;

/// Upper bound on a decompressed list, in bytes.
const MAX_LIST_BYTES: u64 = 16 * 1024 * 1024;

/// A fixed-length bitstring, one bit per credential index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    bytes: Vec<u8>,
}

impl StatusList {
    /// An all-zero list of at least `length` bits, rounded up to whole bytes.
    pub fn new(length: usize) -> Self {
        Self {
            bytes: vec![0u8; length.div_ceil(8)],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of addressable indices.
    pub fn len(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<bool, StatusError> {
        let (byte, mask) = self.locate(index)?;
        Ok(self.bytes[byte] & mask != 0)
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<(), StatusError> {
        let (byte, mask) = self.locate(index)?;
        if value {
            self.bytes[byte] |= mask;
        } else {
            self.bytes[byte] &= !mask;
        }
        Ok(())
    }

    /// Fail with `IndexOutOfRange` unless `index` is addressable.
    pub fn check_index(&self, index: usize) -> Result<(), StatusError> {
        self.locate(index).map(|_| ())
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn locate(&self, index: usize) -> Result<(usize, u8), StatusError> {
        if index >= self.len() {
            return Err(StatusError::IndexOutOfRange {
                index,
                length: self.len(),
            });
        }
        Ok((index / 8, 0x80 >> (index % 8)))
    }

    /// gzip, then base64url without padding.
    pub fn encode(&self) -> Result<String, StatusError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.bytes)
            .map_err(|e| StatusError::Encoding(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| StatusError::Encoding(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(compressed))
    }

    /// Inverse of [`encode`](Self::encode). Padding and a multibase `u`
    /// prefix are tolerated.
    pub fn decode(encoded: &str) -> Result<Self, StatusError> {
        let body = encoded.strip_prefix('u').unwrap_or(encoded);
        let compressed = URL_SAFE_NO_PAD
            .decode(body.trim_end_matches('='))
            .map_err(|e| StatusError::Encoding(format!("invalid base64url: {}", e)))?;

        let mut bytes = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .take(MAX_LIST_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| StatusError::Encoding(format!("invalid gzip data: {}", e)))?;
        if bytes.len() as u64 > MAX_LIST_BYTES {
            return Err(StatusError::Encoding("status list too large".into()));
        }
        Ok(Self { bytes })
    }
}
