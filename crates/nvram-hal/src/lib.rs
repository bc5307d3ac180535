#![no_std]
#![forbid(unsafe_code)]

use nvram_core::{Attributes, NvramResult};
use nvram_mem::StoreBuffer;

/// Block device classes a system partition may live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceClass {
    Mmc,
    Scsi,
    Nvme,
    Usb,
    Virtio,
    Host,
}

impl DeviceClass {
    pub fn name(self) -> &'static str {
        match self {
            DeviceClass::Mmc => "mmc",
            DeviceClass::Scsi => "scsi",
            DeviceClass::Nvme => "nvme",
            DeviceClass::Usb => "usb",
            DeviceClass::Virtio => "virtio",
            DeviceClass::Host => "host",
        }
    }
}

/// A partition on a block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionId {
    pub class: DeviceClass,
    pub devnum: u32,
    pub part: u32,
}

/// Filesystem access on block devices.
/// INVARIANT: `select` must succeed before any file call.
pub trait BlockFilesystem {
    /// Make `class` + `"devnum:part"` (hex) the target of later file calls.
    fn select(&mut self, class: DeviceClass, part: &str) -> NvramResult<()>;

    /// Reads up to `buf.len()` bytes. Returns bytes read.
    /// A missing file is `NotFound`.
    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> NvramResult<usize>;

    /// Creates or replaces `name`. Returns bytes committed.
    fn write_file(&mut self, name: &str, data: &[u8]) -> NvramResult<usize>;
}

/// Erase-before-write flash (SPI NOR and friends).
pub trait FlashDevice {
    /// Total size in bytes.
    fn size(&self) -> usize;

    /// Smallest erasable unit.
    fn erase_size(&self) -> usize;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> NvramResult<()>;

    /// Only clears bits; the range must have been erased.
    fn write(&mut self, offset: usize, data: &[u8]) -> NvramResult<()>;

    /// All-or-nothing from the caller's point of view.
    fn erase(&mut self, offset: usize, len: usize) -> NvramResult<()>;
}

/// Device model lookup.
pub trait DeviceRegistry {
    /// The flash device at `index`, if probed.
    fn flash(&mut self, index: u32) -> Option<&mut dyn FlashDevice>;
}

/// Translates between the live variable set and a store image.
pub trait VariableCodec {
    /// Serializes every variable carrying all bits of `filter`.
    /// The returned buffer's length is its `declared_length`.
    fn collect(&self, filter: Attributes) -> NvramResult<StoreBuffer>;

    /// Replays `image` into the live set. Without `force`, variables
    /// already present in memory keep their current value.
    /// On error the live set must be unchanged.
    fn restore(&mut self, image: &[u8], force: bool) -> NvramResult<()>;
}
