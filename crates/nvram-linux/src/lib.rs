use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, error};
use nvram_core::{NvramError, NvramResult};
use nvram_hal::{BlockFilesystem, DeviceClass, DeviceRegistry, FlashDevice, PartitionId};

pub mod setup;

fn part_dir_name(part: &str) -> String {
    part.replace(':', "_")
}

/// Partitions as directories: `root/<class>/<devnum>_<part>`.
pub struct HostFs {
    root: PathBuf,
    selected: Option<PathBuf>,
}

impl HostFs {
    pub fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self { root: root.as_ref().to_path_buf(), selected: None })
    }

    /// Creates the directory that backs `part`.
    pub fn add_partition(&self, part: PartitionId) -> anyhow::Result<PathBuf> {
        let dir = self.partition_dir(part.class, &format!("{:x}:{:x}", part.devnum, part.part));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn partition_dir(&self, class: DeviceClass, part: &str) -> PathBuf {
        self.root.join(class.name()).join(part_dir_name(part))
    }

    fn selected(&self) -> NvramResult<&Path> {
        self.selected.as_deref().ok_or(NvramError::DeviceUnavailable)
    }
}

impl BlockFilesystem for HostFs {
    fn select(&mut self, class: DeviceClass, part: &str) -> NvramResult<()> {
        let dir = self.partition_dir(class, part);
        if !dir.is_dir() {
            self.selected = None;
            return Err(NvramError::DeviceUnavailable);
        }
        self.selected = Some(dir);
        Ok(())
    }

    fn read_file(&mut self, name: &str, buf: &mut [u8]) -> NvramResult<usize> {
        let path = self.selected()?.join(name);
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(NvramError::NotFound),
            Err(e) => {
                error!("open {}: {}", path.display(), e);
                return Err(NvramError::MediumIo);
            }
        };

        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("read {}: {}", path.display(), e);
                    return Err(NvramError::MediumIo);
                }
            }
        }
        Ok(total)
    }

    fn write_file(&mut self, name: &str, data: &[u8]) -> NvramResult<usize> {
        let dir = self.selected()?.to_path_buf();
        let path = dir.join(name);
        let tmp_path = path.with_extension("tmp");

        // Leaves no .tmp behind on failure
        let fail = |step: &str, e: io::Error| {
            error!("{} {}: {}", step, path.display(), e);
            let _ = fs::remove_file(&tmp_path);
            NvramError::MediumIo
        };

        // 1. Write .tmp
        {
            let mut file = OpenOptions::new()
                .write(true).create(true).truncate(true)
                .open(&tmp_path).map_err(|e| fail("create", e))?;

            file.write_all(data).map_err(|e| fail("write", e))?;

            // 2. FSYNC
            file.sync_all().map_err(|e| fail("sync", e))?;
        }

        // 3. Rename (Atomic)
        fs::rename(&tmp_path, &path).map_err(|e| fail("rename", e))?;

        // 4. Sync Parent Dir
        if let Ok(f) = File::open(&dir) { let _ = f.sync_all(); }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(data.len())
    }
}

/// NOR flash emulated in an image file.
/// Erased bytes read 0xFF; writes can only clear bits.
pub struct HostFlash {
    file: File,
    size: usize,
    erase_size: usize,
}

impl HostFlash {
    /// Opens `path`, creating a fully erased image of `size` bytes if it is new.
    pub fn open(path: impl AsRef<Path>, size: usize, erase_size: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(erase_size.is_power_of_two(), "erase size {} is not a power of two", erase_size);
        anyhow::ensure!(size % erase_size == 0, "flash size {} is not a multiple of {}", size, erase_size);

        let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path.as_ref())?;
        let len = file.metadata()?.len();
        if len == 0 {
            let block = vec![0xFFu8; erase_size];
            for _ in 0..size / erase_size {
                file.write_all(&block)?;
            }
            file.sync_all()?;
        } else {
            anyhow::ensure!(len == size as u64, "{} holds {} bytes, expected {}", path.as_ref().display(), len, size);
        }
        Ok(Self { file, size, erase_size })
    }

    fn check(&self, offset: usize, len: usize) -> NvramResult<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => {
                error!("flash access {:#x}+{:#x} beyond {:#x}", offset, len, self.size);
                Err(NvramError::MediumIo)
            }
        }
    }

    fn read_raw(&mut self, offset: usize, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(buf)
    }

    fn write_raw(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        self.file.sync_data()
    }
}

impl FlashDevice for HostFlash {
    fn size(&self) -> usize { self.size }

    fn erase_size(&self) -> usize { self.erase_size }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> NvramResult<()> {
        self.check(offset, buf.len())?;
        self.read_raw(offset, buf).map_err(|_| NvramError::MediumIo)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> NvramResult<()> {
        self.check(offset, data.len())?;
        let mut cells = vec![0u8; data.len()];
        self.read_raw(offset, &mut cells).map_err(|_| NvramError::MediumIo)?;
        for (cell, bits) in cells.iter_mut().zip(data) {
            *cell &= *bits;
        }
        self.write_raw(offset, &cells).map_err(|_| NvramError::MediumIo)
    }

    fn erase(&mut self, offset: usize, len: usize) -> NvramResult<()> {
        self.check(offset, len)?;
        if offset % self.erase_size != 0 || len % self.erase_size != 0 {
            error!("erase {:#x}+{:#x} not aligned to {:#x}", offset, len, self.erase_size);
            return Err(NvramError::InvalidParameter);
        }
        self.write_raw(offset, &vec![0xFFu8; len]).map_err(|_| NvramError::MediumIo)
    }
}

/// Probed flash devices, indexed in probe order.
#[derive(Default)]
pub struct HostRegistry {
    flashes: Vec<HostFlash>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new device's index.
    pub fn add_flash(&mut self, flash: HostFlash) -> u32 {
        self.flashes.push(flash);
        (self.flashes.len() - 1) as u32
    }
}

impl DeviceRegistry for HostRegistry {
    fn flash(&mut self, index: u32) -> Option<&mut dyn FlashDevice> {
        self.flashes.get_mut(index as usize).map(|f| f as &mut dyn FlashDevice)
    }
}
