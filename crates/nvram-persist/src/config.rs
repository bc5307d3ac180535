//! Build-time target selection.

use nvram_core::MAX_BUFFER_SIZE;
use nvram_hal::PartitionId;

/// Store file on the system partition.
pub const VAR_FILE_NAME: &str = "nvram.var";

/// Flash device index in the device registry.
pub const SF_DEVICE_INDEX: u32 = 0;

/// Start of the variable region on flash. Must be erase-block aligned.
pub const SF_OFFSET: usize = 0x7D_0000;

/// Size of the variable region on flash.
pub const SF_REGION_SIZE: usize = MAX_BUFFER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileConfig {
    /// `None` when this build has no system partition.
    pub partition: Option<PartitionId>,
    pub file_name: &'static str,
}

impl FileConfig {
    pub fn on(partition: PartitionId) -> Self {
        Self { partition: Some(partition), ..Self::default() }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self { partition: None, file_name: VAR_FILE_NAME }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionConfig {
    pub device_index: u32,
    pub offset: usize,
    pub size: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self { device_index: SF_DEVICE_INDEX, offset: SF_OFFSET, size: SF_REGION_SIZE }
    }
}
