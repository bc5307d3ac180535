#![forbid(unsafe_code)]
extern crate alloc;
use alloc::boxed::Box;
use nvram_core::NvramResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    RawRegion,
}

impl core::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::RawRegion => f.write_str("raw-region"),
        }
    }
}

/// How the medium reports the size of what it returns on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The medium knows the stored length (a file). A valid image fills
    /// the read exactly.
    Exact,
    /// The medium returns its whole window (raw flash). A valid image is
    /// a prefix of the read; bytes past it are stale.
    Region,
}

/// A located target. Only lives for one save or load.
pub trait Medium {
    /// Reads up to `buf.len()` bytes. Returns bytes read.
    fn read(&mut self, buf: &mut [u8]) -> NvramResult<usize>;

    /// Returns bytes committed. May be short.
    fn write(&mut self, data: &[u8]) -> NvramResult<usize>;

    /// Erases the whole target. Media without `requires_erase` have nothing to do.
    fn erase(&mut self) -> NvramResult<()> { Ok(()) }
}

/// Where the store image physically lands.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Fixed byte capacity of the target, if it has one.
    fn capacity(&self) -> Option<usize> { None }

    /// Whether `Medium::erase` must precede every write.
    fn requires_erase(&self) -> bool { false }

    fn framing(&self) -> Framing { Framing::Exact }

    /// Resolves the target. Must not touch the media contents.
    fn locate(&mut self) -> NvramResult<Box<dyn Medium + '_>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn kind(&self) -> BackendKind { (**self).kind() }
    fn capacity(&self) -> Option<usize> { (**self).capacity() }
    fn requires_erase(&self) -> bool { (**self).requires_erase() }
    fn framing(&self) -> Framing { (**self).framing() }
    fn locate(&mut self) -> NvramResult<Box<dyn Medium + '_>> { (**self).locate() }
}
