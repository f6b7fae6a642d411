//! Store configuration.
//!
//! [`StoreConfig`] fixes the geometry of every block a store allocates and the
//! identity written into each block header. It is plain data: build it with
//! [`StoreConfig::default`] and the chained `with_*` setters, then hand it to
//! [`crate::engine::store::EnclosureStore::new`], which calls
//! [`StoreConfig::validate`].

use crate::engine::component::EnclosureType;
use crate::engine::error::{CapacityError, ConfigError, EdalError};
use crate::engine::types::{
    block_overhead,
    BlockSize,
    DEFAULT_BLOCK_SIZE,
    DEFAULT_MAX_BLOCKS,
    DEFAULT_MAX_COMPONENT_TYPES,
};


/// Geometry and identity of an enclosure store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Size of every block in bytes.
    pub block_size: BlockSize,
    /// Descriptor-table capacity of every block.
    pub max_component_types: u8,
    /// Upper bound on the number of blocks the chain may grow to.
    pub max_blocks: usize,
    /// Enclosure type recorded in every block header.
    pub enclosure_type: EnclosureType,
    /// Enclosure side recorded in every block header.
    pub side_id: u8,
    /// Locale byte recorded in the head block.
    pub locale: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            max_component_types: DEFAULT_MAX_COMPONENT_TYPES,
            max_blocks: DEFAULT_MAX_BLOCKS,
            enclosure_type: EnclosureType::Base,
            side_id: 0,
            locale: 0,
        }
    }
}

impl StoreConfig {
    /// Default configuration for `enclosure_type`.
    pub fn for_enclosure(enclosure_type: EnclosureType) -> Self {
        StoreConfig { enclosure_type, ..StoreConfig::default() }
    }

    /// Sets the block size.
    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the descriptor-table capacity.
    pub fn with_max_component_types(mut self, max_component_types: u8) -> Self {
        self.max_component_types = max_component_types;
        self
    }

    /// Sets the block limit.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Sets the enclosure type.
    pub fn with_enclosure_type(mut self, enclosure_type: EnclosureType) -> Self {
        self.enclosure_type = enclosure_type;
        self
    }

    /// Sets the enclosure side.
    pub fn with_side_id(mut self, side_id: u8) -> Self {
        self.side_id = side_id;
        self
    }

    /// Sets the locale byte.
    pub fn with_locale(mut self, locale: u8) -> Self {
        self.locale = locale;
        self
    }

    /// Bytes left for records in a fresh block.
    pub fn usable_block_bytes(&self) -> u64 {
        (self.block_size as u64).saturating_sub(block_overhead(self.max_component_types))
    }

    /// Checks that the configuration describes a usable store.
    ///
    /// # Errors
    /// - [`EdalError::Config`] for a zero descriptor table or block limit.
    /// - [`EdalError::InsufficientResource`] when a block cannot hold its header
    ///   and descriptor table.
    /// - [`EdalError::UnsupportedEnclosure`] for enclosure types the store does
    ///   not serve.
    pub fn validate(&self) -> Result<(), EdalError> {
        if self.max_component_types == 0 {
            return Err(ConfigError { reason: "descriptor table needs at least one slot" }.into());
        }
        if self.max_blocks == 0 {
            return Err(ConfigError { reason: "chain needs at least one block" }.into());
        }
        let overhead = block_overhead(self.max_component_types);
        if overhead > self.block_size as u64 {
            return Err(CapacityError { needed: overhead, available: self.block_size as u64 }.into());
        }
        self.enclosure_type.kind()?;
        Ok(())
    }
}
