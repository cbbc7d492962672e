//! # Base64 Encoding/Decoding
//!
//! Standard padded alphabet.

use base64::{engine::general_purpose, Engine as _};

/// Encode bytes with the standard padded alphabet.
pub fn b64_encode(content: impl AsRef<[u8]>) -> String {
    general_purpose::STANDARD.encode(content)
}

/// Decode a standard padded base64 string to bytes.
pub fn b64_decode(b64: &str) -> Result<Vec<u8>, Error> {
    general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| Error::FailToB64Decode)
}

/// Decode a standard padded base64 string to a UTF-8 string.
pub fn b64_decode_to_string(b64: &str) -> Result<String, Error> {
    b64_decode(b64).and_then(|bytes| String::from_utf8(bytes).map_err(|_| Error::FailToB64Decode))
}

// region:    --- Error
#[derive(Debug)]
pub enum Error {
    FailToB64Decode,
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error
