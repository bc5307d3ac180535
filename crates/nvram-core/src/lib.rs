#![no_std]
#[cfg(feature = "std")]
extern crate std;

/// "NVAR", little-endian.
pub const STORE_MAGIC: u32 = 0x5241_564E;

/// Largest store image a save may produce or a load may read back.
pub const MAX_BUFFER_SIZE: usize = 0x2_0000;

pub const HEADER_SIZE: usize = StoreHeader::SIZE;

/// Variable attribute bits. Values match the firmware variable services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attributes(u32);

impl Attributes {
    pub const NONE: Self = Self(0);
    pub const NON_VOLATILE: Self = Self(0x1);
    pub const BOOTSERVICE_ACCESS: Self = Self(0x2);
    pub const RUNTIME_ACCESS: Self = Self(0x4);

    const KNOWN: u32 = 0x7;

    pub const fn bits(self) -> u32 { self.0 }

    /// Rejects unknown bits.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::KNOWN != 0 { None } else { Some(Self(bits)) }
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }
}

impl core::ops::BitOr for Attributes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

/// Fixed header at the start of every store image.
/// `length` counts header + payload and is the only field the
/// persistence layer trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHeader {
    pub length: u32,
    pub magic: u32,
    pub crc32: u32,
    pub reserved: u32,
}

impl StoreHeader {
    pub const SIZE: usize = 16;

    pub fn new(length: u32, crc32: u32) -> Self {
        Self { length, magic: STORE_MAGIC, crc32, reserved: 0 }
    }

    pub fn to_bytes(&self, buf: &mut [u8]) -> NvramResult<()> {
        if buf.len() < Self::SIZE { return Err(NvramError::InvalidParameter); }
        buf[0..4].copy_from_slice(&self.length.to_le_bytes());
        buf[4..8].copy_from_slice(&self.magic.to_le_bytes());
        buf[8..12].copy_from_slice(&self.crc32.to_le_bytes());
        buf[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        Ok(())
    }

    /// Parses the raw fields. Magic and CRC are left for the codec to judge.
    pub fn from_bytes(buf: &[u8]) -> NvramResult<Self> {
        if buf.len() < Self::SIZE { return Err(NvramError::FormatInvalid); }
        Ok(Self {
            length: read_u32(buf, 0),
            magic: read_u32(buf, 4),
            crc32: read_u32(buf, 8),
            reserved: read_u32(buf, 12),
        })
    }
}

/// Reads the `declared_length` field without parsing the rest of the header.
pub fn declared_length(buf: &[u8]) -> Option<usize> {
    if buf.len() < 4 { return None; }
    Some(read_u32(buf, 0) as usize)
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(raw)
}

/// Caller-visible result of a save or load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Load failed; boot proceeds with the defaults already in memory.
    Recoverable,
    /// The caller must surface this as an error.
    Fatal,
}

impl Outcome {
    pub fn is_fatal(self) -> bool { self == Outcome::Fatal }
}

pub type NvramResult<T> = Result<T, NvramError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvramError {
    /// Allocation failed. Never swallowed.
    ResourceExhaustion,
    /// Target device or partition could not be resolved.
    DeviceUnavailable,
    /// Read, write or erase failed, or transferred fewer bytes than asked.
    MediumIo,
    /// Store image is undersized, length-mismatched or otherwise corrupt.
    FormatInvalid,
    NotFound,
    InvalidParameter,
}

impl NvramError {
    pub fn save_outcome(self) -> Outcome {
        Outcome::Fatal
    }

    pub fn load_outcome(self) -> Outcome {
        match self {
            NvramError::ResourceExhaustion => Outcome::Fatal,
            _ => Outcome::Recoverable,
        }
    }
}

impl core::fmt::Display for NvramError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            NvramError::ResourceExhaustion => "out of resources",
            NvramError::DeviceUnavailable => "device unavailable",
            NvramError::MediumIo => "medium I/O error",
            NvramError::FormatInvalid => "invalid store format",
            NvramError::NotFound => "not found",
            NvramError::InvalidParameter => "invalid parameter",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NvramError {}
