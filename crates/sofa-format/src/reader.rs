//! Container reader: parses and verifies a `.sofa` file into a [`Dataset`].
//!
//! The reader validates the magic bytes, container version, chunk table
//! bounds and the BLAKE3 checksum of every chunk before decoding the
//! dimensions, global attributes and variables.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sofa_format::SofaReader;
//!
//! let reader = SofaReader::open(Path::new("hrtf.sofa")).unwrap();
//! println!("{} chunks", reader.chunks().len());
//! let dataset = reader.into_dataset();
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use ndarray::{ArrayD, IxDyn};

use crate::chunk::{ChunkEntry, ChunkType, VariableDescriptor, CHUNK_ENTRY_SIZE};
use crate::dataset::Dataset;
use crate::dimension::Dimensions;
use crate::error::{FormatError, Result};
use crate::header::{SofaHeader, CONTAINER_VERSION, SOFA_MAGIC};
use crate::metadata::Metadata;
use crate::variable::Variable;

/// Maximum number of chunks allowed per file.
const MAX_CHUNK_COUNT: u64 = 4096;

/// Default per-chunk memory limit (1 GiB).
const DEFAULT_ALLOCATION_LIMIT: u64 = 1024 * 1024 * 1024;

/// A parsed and verified container.
#[derive(Debug)]
pub struct SofaReader {
    header: SofaHeader,
    chunks: Vec<ChunkEntry>,
    dataset: Dataset,
}

impl SofaReader {
    /// Opens and fully decodes the container at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the file is missing, corrupt, fails a
    /// checksum, or holds variables inconsistent with its dimensions.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!("Opening SOFA container: {}", path.display());
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        Self::from_reader(&mut reader, file_size, DEFAULT_ALLOCATION_LIMIT)
    }

    /// Decodes a container from any seekable source of `file_size` bytes,
    /// refusing single chunks larger than `allocation_limit`.
    pub fn from_reader<R: Read + Seek>(
        reader: &mut R,
        file_size: u64,
        allocation_limit: u64,
    ) -> Result<Self> {
        let header = Self::read_header(reader)?;
        tracing::debug!(
            version = header.version,
            chunk_count = header.chunk_count,
            chunk_table_offset = header.chunk_table_offset,
            "Parsed container header"
        );

        let chunks = Self::read_chunk_table(reader, &header, file_size)?;
        if let Some(entry) = chunks.iter().find(|c| c.size > allocation_limit) {
            return Err(FormatError::AllocationTooLarge {
                requested: entry.size,
                limit: allocation_limit,
            });
        }

        let mut payloads = Vec::with_capacity(chunks.len());
        for entry in &chunks {
            let data = Self::read_verified(reader, entry)?;
            payloads.push((entry.chunk_type, data));
        }
        tracing::debug!("All chunk checksums verified");

        let dataset = Self::decode(&payloads)?;
        tracing::info!(
            dimensions = dataset.dimensions().len(),
            variables = dataset.variable_names().len(),
            attributes = dataset.metadata().len(),
            "Decoded SOFA dataset"
        );

        Ok(Self {
            header,
            chunks,
            dataset,
        })
    }

    pub fn header(&self) -> &SofaHeader {
        &self.header
    }

    pub fn chunks(&self) -> &[ChunkEntry] {
        &self.chunks
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<SofaHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != SOFA_MAGIC {
            return Err(FormatError::InvalidMagic);
        }
        let version = reader.read_u16::<LittleEndian>()?;
        if version == 0 || version > CONTAINER_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let flags = reader.read_u16::<LittleEndian>()?;
        let chunk_table_offset = reader.read_u64::<LittleEndian>()?;
        let chunk_count = reader.read_u64::<LittleEndian>()?;
        let mut reserved = [0u8; 8];
        reader.read_exact(&mut reserved)?;
        Ok(SofaHeader {
            version,
            flags,
            chunk_table_offset,
            chunk_count,
        })
    }

    fn read_chunk_table<R: Read + Seek>(
        reader: &mut R,
        header: &SofaHeader,
        file_size: u64,
    ) -> Result<Vec<ChunkEntry>> {
        if header.chunk_count > MAX_CHUNK_COUNT {
            return Err(FormatError::ChunkCountExceeded {
                max: MAX_CHUNK_COUNT,
                got: header.chunk_count,
            });
        }
        let table_start = header.chunk_table_offset;
        let table_size = header.chunk_count * CHUNK_ENTRY_SIZE as u64;
        if table_start
            .checked_add(table_size)
            .is_none_or(|end| end > file_size)
        {
            return Err(FormatError::InvalidOffset {
                offset: table_start,
                file_size,
            });
        }

        reader.seek(SeekFrom::Start(table_start))?;
        let mut chunks = Vec::with_capacity(header.chunk_count as usize);
        for _ in 0..header.chunk_count {
            let type_byte = reader.read_u8()?;
            let offset = reader.read_u64::<LittleEndian>()?;
            let size = reader.read_u64::<LittleEndian>()?;
            let mut blake3_hash = [0u8; 32];
            reader.read_exact(&mut blake3_hash)?;
            let mut reserved = [0u8; 8];
            reader.read_exact(&mut reserved)?;

            let chunk_type =
                ChunkType::from_u8(type_byte).ok_or(FormatError::InvalidChunkType(type_byte))?;
            if offset.checked_add(size).is_none_or(|end| end > file_size) {
                return Err(FormatError::InvalidOffset { offset, file_size });
            }
            chunks.push(ChunkEntry {
                chunk_type,
                offset,
                size,
                blake3_hash,
            });
        }
        Ok(chunks)
    }

    fn read_verified<R: Read + Seek>(reader: &mut R, entry: &ChunkEntry) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; entry.size as usize];
        reader.read_exact(&mut data)?;
        let computed = blake3::hash(&data);
        if computed.as_bytes() != &entry.blake3_hash {
            return Err(FormatError::ChecksumMismatch {
                expected: hex_encode(&entry.blake3_hash),
                actual: hex_encode(computed.as_bytes()),
            });
        }
        Ok(data)
    }

    fn decode(payloads: &[(ChunkType, Vec<u8>)]) -> Result<Dataset> {
        let find = |ty: ChunkType| {
            payloads
                .iter()
                .find(|(t, _)| *t == ty)
                .map(|(_, d)| d.as_slice())
                .ok_or(FormatError::MissingChunk(ty))
        };
        let dimensions: Dimensions = serde_json::from_slice(find(ChunkType::Dimensions)?)?;
        let metadata: Metadata = serde_json::from_slice(find(ChunkType::Attributes)?)?;

        let mut dataset = Dataset::new();
        for (axis, size) in dimensions.iter() {
            dataset.create_dimension(axis, size)?;
        }
        *dataset.metadata_mut() = metadata;

        for (_, data) in payloads.iter().filter(|(t, _)| *t == ChunkType::Variable) {
            dataset.insert_variable(Self::parse_variable(data)?)?;
        }
        Ok(dataset)
    }

    fn parse_variable(data: &[u8]) -> Result<Variable> {
        let mut cursor = data;
        let json_len = cursor.read_u32::<LittleEndian>()? as usize;
        if json_len > cursor.len() {
            return Err(FormatError::MalformedVariable {
                name: String::from("?"),
                details: format!("descriptor length {json_len} exceeds chunk"),
            });
        }
        let (json, mut values) = cursor.split_at(json_len);
        let descriptor: VariableDescriptor = serde_json::from_slice(json)?;
        let malformed = |details: String| FormatError::MalformedVariable {
            name: descriptor.name.clone(),
            details,
        };

        let count = descriptor
            .value_count()
            .ok_or_else(|| malformed(format!("shape {:?} overflows", descriptor.shape)))?;
        if values.len() != count * 8 {
            return Err(malformed(format!(
                "expected {count} values, found {} bytes",
                values.len()
            )));
        }
        let mut buf = vec![0f64; count];
        values.read_f64_into::<LittleEndian>(&mut buf)?;
        let array = ArrayD::from_shape_vec(IxDyn(&descriptor.shape), buf)
            .map_err(|e| malformed(e.to_string()))?;

        tracing::debug!(name = %descriptor.name, shape = ?descriptor.shape, "Parsed variable chunk");
        Variable::from_parts(
            &descriptor.name,
            descriptor.dimensions.clone(),
            array,
            descriptor.attributes.clone(),
        )
    }
}

/// Encode a byte slice as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
