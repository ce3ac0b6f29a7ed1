// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed views over packed binary message fields.
//!
//! Servers pack arrays in little-endian order; these helpers assume a
//! little-endian host, which is every platform the viewer ships on.

use bytemuck::Pod;
use thiserror::Error;

/// A packed buffer whose length does not fit its element stride.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{what}: {len} bytes is not a multiple of {stride}")]
pub struct BufferError {
    /// Field being viewed.
    pub what: &'static str,
    /// Buffer length in bytes.
    pub len: usize,
    /// Element size in bytes.
    pub stride: usize,
}

fn collect<T: Pod>(what: &'static str, bytes: &[u8]) -> Result<Vec<T>, BufferError> {
    let stride = std::mem::size_of::<T>();
    if bytes.len() % stride != 0 {
        return Err(BufferError {
            what,
            len: bytes.len(),
            stride,
        });
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

/// Points, vertices or bone positions.
pub fn f32x3(what: &'static str, bytes: &[u8]) -> Result<Vec<[f32; 3]>, BufferError> {
    collect(what, bytes)
}

/// Skin weights.
pub fn f32x4(what: &'static str, bytes: &[u8]) -> Result<Vec<[f32; 4]>, BufferError> {
    collect(what, bytes)
}

/// Triangle indices.
pub fn u32x3(what: &'static str, bytes: &[u8]) -> Result<Vec<[u32; 3]>, BufferError> {
    collect(what, bytes)
}

/// Per-point colors.
pub fn u8x3(what: &'static str, bytes: &[u8]) -> Result<Vec<[u8; 3]>, BufferError> {
    collect(what, bytes)
}

/// Skin bone indices.
pub fn u16x4(what: &'static str, bytes: &[u8]) -> Result<Vec<[u16; 4]>, BufferError> {
    collect(what, bytes)
}

/// Raw 32-bit words, e.g. Gaussian splat records.
pub fn u32s(what: &'static str, bytes: &[u8]) -> Result<Vec<u32>, BufferError> {
    collect(what, bytes)
}
