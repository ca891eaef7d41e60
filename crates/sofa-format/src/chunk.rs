//! Chunk types, the chunk table and the variable chunk descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::axis::Axis;

/// The type of a chunk within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChunkType {
    /// JSON map of axis name to size
    Dimensions = 0x01,
    /// JSON map of global attributes
    Attributes = 0x02,
    /// One variable: descriptor plus values
    Variable = 0x03,
}

impl ChunkType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Dimensions),
            0x02 => Some(Self::Attributes),
            0x03 => Some(Self::Variable),
            _ => None,
        }
    }
}

/// An entry in the chunk table describing a single chunk.
///
/// Layout (57 bytes, little-endian):
/// - `[0]`      chunk_type: u8
/// - `[1..9]`   offset: u64
/// - `[9..17]`  size: u64
/// - `[17..49]` blake3_hash: [u8; 32]
/// - `[49..57]` reserved: [u8; 8]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub chunk_type: ChunkType,
    pub offset: u64,
    pub size: u64,
    /// BLAKE3 hash of the chunk data for integrity verification
    pub blake3_hash: [u8; 32],
}

/// Size of a single chunk table entry in bytes
pub const CHUNK_ENTRY_SIZE: usize = 57;

impl ChunkEntry {
    pub fn new(chunk_type: ChunkType, offset: u64, data: &[u8]) -> Self {
        Self {
            chunk_type,
            offset,
            size: data.len() as u64,
            blake3_hash: *blake3::hash(data).as_bytes(),
        }
    }
}

/// JSON header of a `Variable` chunk.
///
/// The chunk is laid out as a `u32` descriptor length, the descriptor, then
/// `shape.iter().product()` little-endian `f64` values in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    pub dimensions: Vec<Axis>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub shape: Vec<usize>,
}

impl VariableDescriptor {
    /// Number of values that follow the descriptor.
    pub fn value_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, len| acc.checked_mul(*len))
    }
}
