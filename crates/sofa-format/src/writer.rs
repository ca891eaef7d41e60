//! Container writer: serializes a [`Dataset`] into the chunked `.sofa` layout.
//!
//! # Binary Layout
//!
//! - **Header** (32 bytes): magic, version, flags, chunk table offset, chunk count
//! - **Chunk data**: one `Dimensions` chunk, one `Attributes` chunk, then one
//!   `Variable` chunk per variable in name order
//! - **Chunk table**: type, offset, size and BLAKE3 hash per chunk (57 bytes each)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sofa_format::{Axis, Dataset, SofaWriter};
//!
//! let mut dataset = Dataset::new();
//! dataset.create_dimension(Axis::I, 1).unwrap();
//! dataset.create_dimension(Axis::C, 3).unwrap();
//! dataset.create_variable("ListenerPosition", &[Axis::I, Axis::C]).unwrap();
//! SofaWriter::write(&dataset, Path::new("out.sofa")).unwrap();
//! ```

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::chunk::{ChunkEntry, ChunkType, VariableDescriptor, CHUNK_ENTRY_SIZE};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::header::{SofaHeader, HEADER_SIZE, SOFA_MAGIC};
use crate::variable::Variable;

/// A chunk ready to be written.
#[derive(Debug, Clone)]
struct PendingChunk {
    chunk_type: ChunkType,
    data: Vec<u8>,
}

/// Writer for `.sofa` containers.
pub struct SofaWriter;

impl SofaWriter {
    /// Writes `dataset` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormatError::Io`] if any file operation fails and
    /// [`crate::FormatError::Json`] if a JSON chunk cannot be encoded.
    pub fn write(dataset: &Dataset, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Writing SOFA container");
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let size = Self::write_to(dataset, &mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), file_size = size, "SOFA container written");
        Ok(())
    }

    /// Writes `dataset` to any seekable sink, returning the number of bytes
    /// written.
    pub fn write_to<W: Write + Seek>(dataset: &Dataset, writer: &mut W) -> Result<u64> {
        let pending = Self::build_pending_chunks(dataset)?;
        let mut header = SofaHeader::new();

        // Placeholder header, rewritten once the table offset is known.
        Self::write_header(writer, &header)?;

        let mut entries = Vec::with_capacity(pending.len());
        let mut offset = HEADER_SIZE as u64;
        for chunk in &pending {
            let entry = ChunkEntry::new(chunk.chunk_type, offset, &chunk.data);
            tracing::debug!(
                chunk_type = ?chunk.chunk_type,
                offset,
                size = entry.size,
                "Writing chunk"
            );
            writer.write_all(&chunk.data)?;
            offset += entry.size;
            entries.push(entry);
        }

        header.chunk_table_offset = offset;
        header.chunk_count = entries.len() as u64;
        for entry in &entries {
            Self::write_chunk_entry(writer, entry)?;
        }

        writer.seek(SeekFrom::Start(0))?;
        Self::write_header(writer, &header)?;
        writer.seek(SeekFrom::End(0))?;

        Ok(offset + (entries.len() * CHUNK_ENTRY_SIZE) as u64)
    }

    fn write_header<W: Write>(writer: &mut W, header: &SofaHeader) -> Result<()> {
        writer.write_all(&SOFA_MAGIC)?;
        writer.write_u16::<LittleEndian>(header.version)?;
        writer.write_u16::<LittleEndian>(header.flags)?;
        writer.write_u64::<LittleEndian>(header.chunk_table_offset)?;
        writer.write_u64::<LittleEndian>(header.chunk_count)?;
        writer.write_all(&[0u8; 8])?;
        Ok(())
    }

    fn write_chunk_entry<W: Write>(writer: &mut W, entry: &ChunkEntry) -> Result<()> {
        writer.write_u8(entry.chunk_type as u8)?;
        writer.write_u64::<LittleEndian>(entry.offset)?;
        writer.write_u64::<LittleEndian>(entry.size)?;
        writer.write_all(&entry.blake3_hash)?;
        writer.write_all(&[0u8; 8])?;
        Ok(())
    }

    fn build_pending_chunks(dataset: &Dataset) -> Result<Vec<PendingChunk>> {
        let mut pending = vec![
            PendingChunk {
                chunk_type: ChunkType::Dimensions,
                data: serde_json::to_vec(dataset.dimensions())?,
            },
            PendingChunk {
                chunk_type: ChunkType::Attributes,
                data: serde_json::to_vec(dataset.metadata())?,
            },
        ];
        for variable in dataset.variables() {
            pending.push(PendingChunk {
                chunk_type: ChunkType::Variable,
                data: Self::serialize_variable(variable)?,
            });
        }
        Ok(pending)
    }

    fn serialize_variable(variable: &Variable) -> Result<Vec<u8>> {
        let descriptor = VariableDescriptor {
            name: variable.name().to_string(),
            dimensions: variable.dims().to_vec(),
            attributes: variable.attributes().clone(),
            shape: variable.shape().to_vec(),
        };
        let json = serde_json::to_vec(&descriptor)?;
        let mut data = Vec::with_capacity(4 + json.len() + variable.data().len() * 8);
        data.write_u32::<LittleEndian>(json.len() as u32)?;
        data.write_all(&json)?;
        // Logical (row-major) order, independent of the array's memory layout.
        for value in variable.data().iter() {
            data.write_f64::<LittleEndian>(*value)?;
        }
        Ok(data)
    }
}
