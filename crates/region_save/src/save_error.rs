use std::fmt;

/// Errors that can occur while reading or writing a weather save file.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Payload could not be compressed or encoded.
    Encode(String),
    /// Payload could not be decompressed or decoded.
    Decode(String),
    /// File was written by a newer build.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Header checksum does not match the payload.
    Checksum { expected: u32, found: u32 },
    /// File is not a weather save (missing magic or truncated header).
    NotASave(String),
    /// Nothing to save, or nothing to load.
    NoData,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            SaveError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: save is v{found}, \
                 but this build only supports up to v{expected_max}"
            ),
            SaveError::Checksum { expected, found } => write!(
                f,
                "Checksum mismatch: expected {expected:#010X}, got {found:#010X}"
            ),
            SaveError::NotASave(msg) => write!(f, "Not a weather save: {msg}"),
            SaveError::NoData => write!(f, "No weather data to save or load"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

impl From<lz4_flex::block::DecompressError> for SaveError {
    fn from(e: lz4_flex::block::DecompressError) -> Self {
        SaveError::Decode(format!("lz4: {e}"))
    }
}
