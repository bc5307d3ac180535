extern crate alloc;
use alloc::boxed::Box;
use log::{debug, error};

use crate::backend::{Backend, BackendKind, Framing, Medium};
use crate::config::RegionConfig;
use nvram_core::{NvramError, NvramResult};
use nvram_hal::{DeviceRegistry, FlashDevice};

/// Store kept in a fixed window of raw flash.
/// The window has no length marker of its own; the image header is the only one.
pub struct RawRegionBackend<R> {
    registry: R,
    config: RegionConfig,
}

impl<R: DeviceRegistry> RawRegionBackend<R> {
    pub fn new(registry: R, config: RegionConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &R { &self.registry }
    pub fn into_inner(self) -> R { self.registry }
}

impl<R: DeviceRegistry> Backend for RawRegionBackend<R> {
    fn kind(&self) -> BackendKind { BackendKind::RawRegion }

    fn capacity(&self) -> Option<usize> { Some(self.config.size) }

    fn requires_erase(&self) -> bool { true }

    fn framing(&self) -> Framing { Framing::Region }

    fn locate(&mut self) -> NvramResult<Box<dyn Medium + '_>> {
        let RegionConfig { device_index, offset, size } = self.config;

        let Some(dev) = self.registry.flash(device_index) else {
            error!("No flash device at index {}", device_index);
            return Err(NvramError::DeviceUnavailable);
        };

        let fits = offset.checked_add(size).map_or(false, |end| end <= dev.size());
        if !fits {
            error!(
                "Region {:#x}+{:#x} outside flash device {} ({:#x} bytes)",
                offset, size, device_index, dev.size()
            );
            return Err(NvramError::DeviceUnavailable);
        }

        // Erase works on whole sectors only
        let sector = dev.erase_size();
        if sector == 0 || offset % sector != 0 || size % sector != 0 {
            error!(
                "Region {:#x}+{:#x} not aligned to {:#x} byte erase sectors of flash device {}",
                offset, size, sector, device_index
            );
            return Err(NvramError::DeviceUnavailable);
        }
        debug!("Located flash device {} region {:#x}+{:#x}", device_index, offset, size);

        Ok(Box::new(RegionMedium { dev, offset, size }))
    }
}

struct RegionMedium<'a> {
    dev: &'a mut dyn FlashDevice,
    offset: usize,
    size: usize,
}

impl Medium for RegionMedium<'_> {
    /// Always returns the whole window (bounded by `buf`), whatever was last written.
    fn read(&mut self, buf: &mut [u8]) -> NvramResult<usize> {
        let n = buf.len().min(self.size);
        self.dev.read(self.offset, &mut buf[..n]).map_err(|e| {
            error!("Flash read at {:#x} ({} bytes) failed: {}", self.offset, n, e);
            NvramError::MediumIo
        })?;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> NvramResult<usize> {
        if data.len() > self.size {
            error!("{} bytes do not fit region of {} bytes", data.len(), self.size);
            return Err(NvramError::MediumIo);
        }
        self.dev.write(self.offset, data).map_err(|e| {
            error!("Flash write at {:#x} ({} bytes) failed: {}", self.offset, data.len(), e);
            NvramError::MediumIo
        })?;
        Ok(data.len())
    }

    fn erase(&mut self) -> NvramResult<()> {
        self.dev.erase(self.offset, self.size).map_err(|e| {
            error!("Flash erase at {:#x} ({} bytes) failed: {}", self.offset, self.size, e);
            NvramError::MediumIo
        })?;
        debug!("Erased flash {:#x}+{:#x}", self.offset, self.size);
        Ok(())
    }
}
