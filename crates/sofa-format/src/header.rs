//! Container header, the first 32 bytes of every `.sofa` file written here.

use serde::{Deserialize, Serialize};

/// Magic bytes identifying the container: `SOFA` (0x534F4641)
pub const SOFA_MAGIC: [u8; 4] = [0x53, 0x4F, 0x46, 0x41];

/// Current container version
pub const CONTAINER_VERSION: u16 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 32;

/// The fixed-size header at the beginning of every container.
///
/// Layout (32 bytes, little-endian):
/// - `[0..4]`   magic: `SOFA`
/// - `[4..6]`   version: u16
/// - `[6..8]`   flags: u16 (reserved, zero)
/// - `[8..16]`  chunk_table_offset: u64
/// - `[16..24]` chunk_count: u64
/// - `[24..32]` reserved: [u8; 8]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SofaHeader {
    pub version: u16,
    pub flags: u16,
    /// Byte offset of the chunk table from file start
    pub chunk_table_offset: u64,
    pub chunk_count: u64,
}

impl SofaHeader {
    pub fn new() -> Self {
        Self {
            version: CONTAINER_VERSION,
            flags: 0,
            chunk_table_offset: 0,
            chunk_count: 0,
        }
    }
}

impl Default for SofaHeader {
    fn default() -> Self {
        Self::new()
    }
}
