//! Host provisioning for the boot harness.

use std::fs;
use std::path::Path;

use log::info;
use nvram_hal::{DeviceClass, PartitionId};
use nvram_persist::{FileBackend, FileConfig, RawRegionBackend, RegionConfig};

use crate::{HostFlash, HostFs, HostRegistry};

pub const FLASH_IMAGE: &str = "spi-flash.img";
pub const FLASH_SIZE: usize = 0x80_0000;
pub const FLASH_ERASE_SIZE: usize = 0x1000;

pub const SYSTEM_PARTITION: PartitionId = PartitionId { class: DeviceClass::Host, devnum: 0, part: 1 };

/// File backend on a system partition under `root`, created if missing.
pub fn file_backend(root: &Path) -> anyhow::Result<FileBackend<HostFs>> {
    let fs = HostFs::new(root)?;
    let dir = fs.add_partition(SYSTEM_PARTITION)?;
    info!("System partition at {}", dir.display());
    Ok(FileBackend::new(fs, FileConfig::on(SYSTEM_PARTITION)))
}

/// Raw-region backend on a flash image under `root`, created erased if missing.
pub fn flash_backend(root: &Path) -> anyhow::Result<RawRegionBackend<HostRegistry>> {
    fs::create_dir_all(root)?;
    let image = root.join(FLASH_IMAGE);
    let flash = HostFlash::open(&image, FLASH_SIZE, FLASH_ERASE_SIZE)?;
    info!("SPI flash image at {} ({:#x} bytes)", image.display(), FLASH_SIZE);

    let mut registry = HostRegistry::new();
    let device_index = registry.add_flash(flash);
    Ok(RawRegionBackend::new(registry, RegionConfig { device_index, ..RegionConfig::default() }))
}
