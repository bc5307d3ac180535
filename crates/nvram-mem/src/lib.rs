#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};
use nvram_core::{NvramError, NvramResult};
use zeroize::Zeroize;

/// Store image owned by exactly one save or load call.
/// Variables may carry secrets, so the bytes are wiped when the buffer drops.
pub struct StoreBuffer {
    data: Vec<u8>,
}

impl StoreBuffer {
    /// Allocates `capacity` zeroed bytes.
    /// Fails with `ResourceExhaustion` instead of aborting on OOM.
    pub fn zeroed(capacity: usize) -> NvramResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|_| NvramError::ResourceExhaustion)?;
        data.resize(capacity, 0);
        Ok(Self { data })
    }

    /// Empty buffer with room for `capacity` bytes, for producers that append.
    pub fn with_capacity(capacity: usize) -> NvramResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|_| NvramError::ResourceExhaustion)?;
        Ok(Self { data })
    }

    /// Appends without reallocating past the reserved capacity.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> NvramResult<()> {
        if self.data.capacity() - self.data.len() < bytes.len() {
            return Err(NvramError::ResourceExhaustion);
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Shrinks the valid window. Dropped bytes are wiped first.
    pub fn truncate(&mut self, len: usize) {
        if len < self.data.len() {
            self.data[len..].zeroize();
            self.data.truncate(len);
        }
    }

    /// The header's `declared_length`, if the buffer holds a header at all.
    pub fn declared_length(&self) -> Option<usize> {
        nvram_core::declared_length(&self.data)
    }
}

impl Deref for StoreBuffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] { &self.data }
}

impl DerefMut for StoreBuffer {
    fn deref_mut(&mut self) -> &mut [u8] { &mut self.data }
}

impl Drop for StoreBuffer {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl core::fmt::Debug for StoreBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // never print variable contents
        f.debug_struct("StoreBuffer").field("len", &self.data.len()).finish()
    }
}
