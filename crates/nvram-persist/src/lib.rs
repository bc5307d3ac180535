#![no_std]
#[cfg(feature = "std")]
extern crate std;
extern crate alloc;

pub mod backend;
pub mod config;
pub mod fs_backend;
pub mod sf_backend;
pub mod validate;

pub use backend::{Backend, BackendKind, Framing, Medium};
pub use config::{FileConfig, RegionConfig};
pub use fs_backend::FileBackend;
pub use sf_backend::RawRegionBackend;
pub use validate::validate_image;

use log::{debug, error, info, warn};
use nvram_core::{Attributes, NvramError, NvramResult, Outcome, MAX_BUFFER_SIZE};
use nvram_hal::VariableCodec;
use nvram_mem::StoreBuffer;

/// Saves the non-volatile variables to a backend and replays them at boot.
///
/// Every call owns a fresh buffer that is wiped and freed on return.
/// Nothing survives between calls except the backend configuration.
pub struct VarPersistence<B> {
    backend: B,
    max_buffer: usize,
}

impl<B: Backend> VarPersistence<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, max_buffer: MAX_BUFFER_SIZE }
    }

    /// Overrides `MAX_BUFFER_SIZE` for this controller.
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    pub fn backend(&self) -> &B { &self.backend }
    pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }

    /// Largest image `save` accepts: what both the target and `load` can hold.
    pub fn save_limit(&self) -> usize {
        self.backend.capacity().map_or(self.max_buffer, |cap| cap.min(self.max_buffer))
    }

    /// Persists every `NON_VOLATILE` variable. Anything but `Success` is `Fatal`.
    pub fn save(&mut self, codec: &dyn VariableCodec) -> Outcome {
        match self.try_save(codec) {
            Ok(len) => {
                info!("Persisted {} byte variable store to {}", len, self.backend.kind());
                Outcome::Success
            }
            Err(e) => {
                error!("Failed to persist variables to {}: {}", self.backend.kind(), e);
                e.save_outcome()
            }
        }
    }

    /// Replays the stored variables into `codec` without overwriting values
    /// already set. A missing, corrupt or unreachable store is `Recoverable`;
    /// only an allocation failure is `Fatal`.
    pub fn load(&mut self, codec: &mut dyn VariableCodec) -> Outcome {
        match self.try_load(codec) {
            Ok(len) => {
                info!("Loaded {} byte variable store from {}", len, self.backend.kind());
                Outcome::Success
            }
            Err(e) => {
                let outcome = e.load_outcome();
                if outcome.is_fatal() {
                    error!("Failed to load variables from {}: {}", self.backend.kind(), e);
                } else {
                    warn!("No usable variable store on {} ({}), keeping defaults", self.backend.kind(), e);
                }
                outcome
            }
        }
    }

    fn try_save(&mut self, codec: &dyn VariableCodec) -> NvramResult<usize> {
        let kind = self.backend.kind();
        let limit = self.save_limit();
        let erase_first = self.backend.requires_erase();

        // 1. Collect
        let buf = codec.collect(Attributes::NON_VOLATILE).map_err(|e| {
            error!("Collecting variables failed: {}", e);
            e
        })?;
        let len = buf.len();
        if buf.declared_length() != Some(len) {
            error!("Collected image declares {:?} bytes but holds {}", buf.declared_length(), len);
            return Err(NvramError::FormatInvalid);
        }
        debug!("Collected {} bytes for {}", len, kind);

        // 2. Capacity guard. No backend call yet.
        if len > limit {
            error!("Variable store of {} bytes exceeds {} capacity of {}", len, kind, limit);
            return Err(NvramError::ResourceExhaustion);
        }

        // 3. Locate
        let mut medium = self.backend.locate()?;

        // 4. Erase
        if erase_first {
            medium.erase()?;
        }

        // 5. Write
        let committed = medium.write(&buf)?;
        if committed != len {
            error!("Short write to {}: {} of {} bytes", kind, committed, len);
            return Err(NvramError::MediumIo);
        }
        Ok(len)
    }

    fn try_load(&mut self, codec: &mut dyn VariableCodec) -> NvramResult<usize> {
        let kind = self.backend.kind();
        let framing = self.backend.framing();

        // 1. Allocate
        let mut buf = StoreBuffer::zeroed(self.max_buffer).map_err(|e| {
            error!("Out of memory for {} byte load buffer", self.max_buffer);
            e
        })?;

        // 2. Locate
        let mut medium = self.backend.locate()?;

        // 3. Read
        let read_len = medium.read(&mut buf)?;
        drop(medium);
        debug!("Read {} bytes from {}", read_len, kind);

        // 4. Validate
        let len = validate_image(&buf, read_len, framing)?;
        buf.truncate(len);

        // 5. Restore. Whatever the codec reports, boot continues.
        if let Err(e) = codec.restore(&buf, false) {
            error!("Invalid variable store: {}", e);
            return Err(NvramError::FormatInvalid);
        }
        Ok(len)
    }
}
