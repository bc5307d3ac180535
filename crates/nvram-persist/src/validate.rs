use log::error;

use crate::backend::Framing;
use nvram_core::{declared_length, NvramError, NvramResult, HEADER_SIZE};

/// Checks a freshly read image against its header.
/// Returns the number of valid bytes, i.e. the `declared_length`.
///
/// The length field is the sole trust anchor: an image is accepted iff
/// `read_len >= HEADER_SIZE` and `declared_length` equals `read_len`
/// (`Exact`) or lies within `HEADER_SIZE..=read_len` (`Region`).
pub fn validate_image(buf: &[u8], read_len: usize, framing: Framing) -> NvramResult<usize> {
    if read_len > buf.len() {
        error!("Medium reported {} bytes into a {} byte buffer", read_len, buf.len());
        return Err(NvramError::MediumIo);
    }
    if read_len < HEADER_SIZE {
        error!("No valid store: read {} bytes, header needs {}", read_len, HEADER_SIZE);
        return Err(NvramError::FormatInvalid);
    }

    let declared = declared_length(&buf[..read_len]).ok_or(NvramError::FormatInvalid)?;
    let valid = match framing {
        Framing::Exact => declared == read_len,
        Framing::Region => (HEADER_SIZE..=read_len).contains(&declared),
    };
    if !valid {
        error!("Invalid store: header declares {} bytes, read {}", declared, read_len);
        return Err(NvramError::FormatInvalid);
    }
    Ok(declared)
}
