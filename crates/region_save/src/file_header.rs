// ---------------------------------------------------------------------------
// file_header – weather save header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "RWTH"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4 compressed)
//   [12..20] Timestamp (Unix epoch seconds, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the stored payload (everything after the header)

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

pub const MAGIC: [u8; 4] = *b"RWTH";

pub const HEADER_SIZE: usize = 28;

pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Payload is an lz4 block with its size prepended.
pub const FLAG_COMPRESSED: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        out[8..12].copy_from_slice(&self.flags.to_le_bytes());
        out[12..20].copy_from_slice(&self.timestamp.to_le_bytes());
        out[20..24].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        out[24..28].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Prepend a header to `data`, optionally lz4-compressing it first.
pub fn wrap_with_header(data: &[u8], compress: bool) -> Vec<u8> {
    let stored = if compress {
        lz4_flex::compress_prepend_size(data)
    } else {
        data.to_vec()
    };
    let header = FileHeader {
        format_version: HEADER_FORMAT_VERSION,
        flags: if compress { FLAG_COMPRESSED } else { 0 },
        timestamp: unix_now(),
        uncompressed_size: data.len() as u32,
        checksum: xxh32(&stored, XXHASH_SEED),
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + stored.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&stored);
    out
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parse and validate the header, returning it with the stored payload.
///
/// # Errors
///
/// - the magic is missing or the file is shorter than a header
/// - the header format version is from a newer build
/// - the checksum does not match
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(SaveError::NotASave("missing RWTH magic bytes".into()));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::NotASave(format!(
            "file is too short ({} bytes, need at least {} for header)",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[12..20]);
    let header = FileHeader {
        format_version: read_u32(bytes, 4),
        flags: read_u32(bytes, 8),
        timestamp: u64::from_le_bytes(ts),
        uncompressed_size: read_u32(bytes, 20),
        checksum: read_u32(bytes, 24),
    };

    if header.format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: header.format_version,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(SaveError::Checksum {
            expected: header.checksum,
            found: computed,
        });
    }

    Ok((header, payload))
}

/// Undo the optional compression of a validated payload.
pub fn decode_payload(header: &FileHeader, payload: &[u8]) -> Result<Vec<u8>, SaveError> {
    let data = if header.is_compressed() {
        lz4_flex::decompress_size_prepended(payload)?
    } else {
        payload.to_vec()
    };
    if data.len() != header.uncompressed_size as usize {
        return Err(SaveError::Decode(format!(
            "payload is {} bytes, header says {}",
            data.len(),
            header.uncompressed_size
        )));
    }
    Ok(data)
}
