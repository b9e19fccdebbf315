use std::collections::BTreeMap;

use bitcode::{Decode, Encode};

use crate::file_header::{decode_payload, unwrap_header, wrap_with_header};
use crate::save_error::SaveError;

/// Schema version of [`WeatherSaveData`], distinct from the header layout version.
pub const SAVE_DATA_VERSION: u32 = 1;

/// Payloads at least this large are lz4-compressed.
pub const COMPRESSION_THRESHOLD: usize = 4 * 1024;

/// Everything a weather save file holds: the saveable registry's extension map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct WeatherSaveData {
    pub version: u32,
    pub extensions: BTreeMap<String, Vec<u8>>,
}

/// Encode an extension map into file bytes (header + payload).
pub fn encode_save(extensions: BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, SaveError> {
    if extensions.is_empty() {
        return Err(SaveError::NoData);
    }
    let data = WeatherSaveData {
        version: SAVE_DATA_VERSION,
        extensions,
    };
    let encoded = bitcode::encode(&data);
    if encoded.len() > u32::MAX as usize {
        return Err(SaveError::Encode(format!(
            "payload of {} bytes does not fit the header",
            encoded.len()
        )));
    }
    Ok(wrap_with_header(
        &encoded,
        encoded.len() >= COMPRESSION_THRESHOLD,
    ))
}

/// Validate and decode file bytes back into an extension map.
pub fn decode_save(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, SaveError> {
    let (header, payload) = unwrap_header(bytes)?;
    let raw = decode_payload(&header, payload)?;
    let data: WeatherSaveData = bitcode::decode(&raw)?;
    if data.version > SAVE_DATA_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: SAVE_DATA_VERSION,
            found: data.version,
        });
    }
    Ok(data.extensions)
}
