//! In-memory variable set and its store image codec.

pub mod codec;

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use nvram_core::{Attributes, NvramError, NvramResult};
use nvram_hal::VariableCodec;
use nvram_mem::StoreBuffer;

/// Longest variable name, in UTF-8 bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Vendor namespace of a variable, stored in firmware (mixed-endian) byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// 8be4df61-93ca-11d2-aa0d-00e098032b8c
    pub const GLOBAL: Guid = Guid([
        0x61, 0xdf, 0xe4, 0x8b, 0xca, 0x93, 0xd2, 0x11,
        0xaa, 0x0d, 0x00, 0xe0, 0x98, 0x03, 0x2b, 0x8c,
    ]);
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-",
            b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9]
        )?;
        for x in &b[10..] {
            write!(f, "{:02x}", x)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub vendor: Guid,
    pub name: String,
    pub attributes: Attributes,
    pub data: Vec<u8>,
}

/// The live variable set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarStore {
    vars: BTreeMap<(Guid, String), Variable>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces. Empty `data` deletes.
    pub fn set(&mut self, vendor: Guid, name: &str, attributes: Attributes, data: &[u8]) -> NvramResult<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(NvramError::InvalidParameter);
        }
        let key = (vendor, name.to_string());
        if data.is_empty() {
            return self.vars.remove(&key).map(|_| ()).ok_or(NvramError::NotFound);
        }
        self.vars.insert(key, Variable {
            vendor,
            name: name.to_string(),
            attributes,
            data: data.to_vec(),
        });
        Ok(())
    }

    pub fn get(&self, vendor: Guid, name: &str) -> Option<&Variable> {
        self.vars.get(&(vendor, name.to_string()))
    }

    pub fn remove(&mut self, vendor: Guid, name: &str) -> NvramResult<Variable> {
        self.vars.remove(&(vendor, name.to_string())).ok_or(NvramError::NotFound)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> + Clone {
        self.vars.values()
    }

    /// Variables carrying all bits of `filter`.
    pub fn filtered(&self, filter: Attributes) -> impl Iterator<Item = &Variable> + Clone {
        self.vars.values().filter(move |v| v.attributes.contains(filter))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VariableCodec for VarStore {
    fn collect(&self, filter: Attributes) -> NvramResult<StoreBuffer> {
        codec::encode(self.filtered(filter))
    }

    fn restore(&mut self, image: &[u8], force: bool) -> NvramResult<()> {
        // Parse everything first so a bad image leaves the set untouched
        let parsed = codec::decode(image)?;

        let mut restored = 0;
        for var in parsed {
            if !var.attributes.contains(Attributes::NON_VOLATILE) || var.data.is_empty() {
                debug!("Skipping {}: not a persistent variable", var.name);
                continue;
            }
            let key = (var.vendor, var.name.clone());
            if !force && self.vars.contains_key(&key) {
                debug!("Keeping in-memory value of {}", var.name);
                continue;
            }
            self.vars.insert(key, var);
            restored += 1;
        }
        debug!("Restored {} variables", restored);
        Ok(())
    }
}
