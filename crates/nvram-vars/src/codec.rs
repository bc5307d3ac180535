//! Store image layout.
//!
//! ```text
//! [StoreHeader: 16B] [entry] [entry] ...
//! entry: [attributes:u32][name_len:u16][reserved:u16][data_len:u32][vendor:16B]
//!        [name][data][zero pad to 8B]
//! ```
//!
//! All integers little-endian. The header CRC-32C covers every byte after the header.

use crc32c::crc32c;
use log::error;

use crate::{Guid, Variable, MAX_NAME_LEN};
use nvram_core::{Attributes, NvramError, NvramResult, StoreHeader, HEADER_SIZE, STORE_MAGIC};
use nvram_mem::StoreBuffer;

const ENTRY_FIXED: usize = 28;
const ALIGN: usize = 8;

fn align_up(n: usize) -> usize {
    (n + ALIGN - 1) & !(ALIGN - 1)
}

fn entry_len(var: &Variable) -> usize {
    align_up(ENTRY_FIXED + var.name.len() + var.data.len())
}

/// Serializes `vars` into a buffer whose length equals its `declared_length`.
pub fn encode<'a, I>(vars: I) -> NvramResult<StoreBuffer>
where
    I: Iterator<Item = &'a Variable> + Clone,
{
    let total = HEADER_SIZE + vars.clone().map(entry_len).sum::<usize>();
    let declared = u32::try_from(total).map_err(|_| NvramError::ResourceExhaustion)?;

    let mut buf = StoreBuffer::with_capacity(total)?;
    buf.extend_from_slice(&[0u8; HEADER_SIZE])?;

    for var in vars {
        let name_len = u16::try_from(var.name.len()).map_err(|_| NvramError::InvalidParameter)?;
        let data_len = u32::try_from(var.data.len()).map_err(|_| NvramError::InvalidParameter)?;

        let mut fixed = [0u8; ENTRY_FIXED];
        fixed[0..4].copy_from_slice(&var.attributes.bits().to_le_bytes());
        fixed[4..6].copy_from_slice(&name_len.to_le_bytes());
        fixed[8..12].copy_from_slice(&data_len.to_le_bytes());
        fixed[12..28].copy_from_slice(&var.vendor.0);

        buf.extend_from_slice(&fixed)?;
        buf.extend_from_slice(var.name.as_bytes())?;
        buf.extend_from_slice(&var.data)?;

        let unpadded = ENTRY_FIXED + var.name.len() + var.data.len();
        let pad = align_up(unpadded) - unpadded;
        buf.extend_from_slice(&[0u8; ALIGN][..pad])?;
    }

    let crc = crc32c(&buf[HEADER_SIZE..]);
    StoreHeader::new(declared, crc).to_bytes(&mut buf[..HEADER_SIZE])?;
    Ok(buf)
}

/// Parses a complete image. Any inconsistency is `FormatInvalid`.
pub fn decode(image: &[u8]) -> NvramResult<Vec<Variable>> {
    let hdr = StoreHeader::from_bytes(image)?;
    if hdr.length as usize != image.len() {
        error!("Store header declares {} bytes, image holds {}", hdr.length, image.len());
        return Err(NvramError::FormatInvalid);
    }
    if hdr.magic != STORE_MAGIC {
        error!("Bad store magic {:#010x}", hdr.magic);
        return Err(NvramError::FormatInvalid);
    }
    let body = &image[HEADER_SIZE..];
    let crc = crc32c(body);
    if crc != hdr.crc32 {
        error!("Store CRC mismatch: header {:#010x}, computed {:#010x}", hdr.crc32, crc);
        return Err(NvramError::FormatInvalid);
    }

    let mut vars = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        let (var, used) = decode_entry(&body[pos..]).map_err(|e| {
            error!("Malformed entry at offset {}", HEADER_SIZE + pos);
            e
        })?;
        vars.push(var);
        pos += used;
    }
    Ok(vars)
}

fn decode_entry(raw: &[u8]) -> NvramResult<(Variable, usize)> {
    if raw.len() < ENTRY_FIXED {
        return Err(NvramError::FormatInvalid);
    }
    let u32_at = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);

    let attributes = Attributes::from_bits(u32_at(0)).ok_or(NvramError::FormatInvalid)?;
    let name_len = u16::from_le_bytes([raw[4], raw[5]]) as usize;
    let data_len = u32_at(8) as usize;
    let mut vendor = [0u8; 16];
    vendor.copy_from_slice(&raw[12..28]);

    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(NvramError::FormatInvalid);
    }
    let end = ENTRY_FIXED
        .checked_add(name_len)
        .and_then(|n| n.checked_add(data_len))
        .ok_or(NvramError::FormatInvalid)?;
    let used = align_up(end);
    if used > raw.len() {
        return Err(NvramError::FormatInvalid);
    }

    let name_end = ENTRY_FIXED + name_len;
    let name = std::str::from_utf8(&raw[ENTRY_FIXED..name_end])
        .map_err(|_| NvramError::FormatInvalid)?
        .to_string();

    Ok((
        Variable { vendor: Guid(vendor), name, attributes, data: raw[name_end..end].to_vec() },
        used,
    ))
}
