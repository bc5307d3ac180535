extern crate alloc;
use alloc::boxed::Box;
use alloc::format;
use log::{debug, error};

use crate::backend::{Backend, BackendKind, Medium};
use crate::config::FileConfig;
use nvram_core::{NvramError, NvramResult};
use nvram_hal::BlockFilesystem;

/// Store kept as a named file on the system partition.
pub struct FileBackend<F> {
    fs: F,
    config: FileConfig,
}

impl<F: BlockFilesystem> FileBackend<F> {
    pub fn new(fs: F, config: FileConfig) -> Self {
        Self { fs, config }
    }

    pub fn filesystem(&self) -> &F { &self.fs }
    pub fn filesystem_mut(&mut self) -> &mut F { &mut self.fs }
    pub fn into_inner(self) -> F { self.fs }
}

impl<F: BlockFilesystem> Backend for FileBackend<F> {
    fn kind(&self) -> BackendKind { BackendKind::File }

    fn locate(&mut self) -> NvramResult<Box<dyn Medium + '_>> {
        let Some(part) = self.config.partition else {
            error!("No system partition");
            return Err(NvramError::DeviceUnavailable);
        };

        let part_str = format!("{:x}:{:x}", part.devnum, part.part);
        if let Err(e) = self.fs.select(part.class, &part_str) {
            error!("Cannot read system partition {} {}: {}", part.class.name(), part_str, e);
            return Err(NvramError::DeviceUnavailable);
        }
        debug!("Selected system partition {} {}", part.class.name(), part_str);

        Ok(Box::new(FileMedium { fs: &mut self.fs, name: self.config.file_name }))
    }
}

struct FileMedium<'a, F> {
    fs: &'a mut F,
    name: &'static str,
}

impl<F: BlockFilesystem> Medium for FileMedium<'_, F> {
    fn read(&mut self, buf: &mut [u8]) -> NvramResult<usize> {
        match self.fs.read_file(self.name, buf) {
            Ok(n) => Ok(n),
            // No store yet. The controller sees an undersized read.
            Err(NvramError::NotFound) => {
                debug!("{} not present", self.name);
                Ok(0)
            }
            Err(e) => {
                error!("Reading {} failed: {}", self.name, e);
                Err(NvramError::MediumIo)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> NvramResult<usize> {
        self.fs.write_file(self.name, data).map_err(|e| {
            error!("Writing {} ({} bytes) failed: {}", self.name, data.len(), e);
            NvramError::MediumIo
        })
    }
}
