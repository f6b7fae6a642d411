//! Core identifiers, constants, and compile-time layout parameters for the store.
//!
//! This module defines the fundamental scalar types and sizing constants shared
//! by every layer of the enclosure data store: the block arena, the descriptor
//! table, the record header, and the attribute dispatcher.
//!
//! ## Identifier aliases
//!
//! Block sizes, record sizes, component indices and change counters are all
//! plain integers on disk. The aliases below give them names so signatures read
//! as what they carry rather than as raw widths.
//!
//! ## Layout constants
//!
//! The header, descriptor and record-header sizes are derived from the `Pod`
//! layouts in [`crate::engine::layout`] and checked here at compile time, so a
//! change to either side that breaks the byte format fails the build instead of
//! silently corrupting snapshots.
//!
//! ## Canaries
//!
//! [`BLOCK_CANARY`] and [`COMPONENT_CANARY`] are the fixed sentinel values
//! written into every block header and every record header at initialization.
//! Any other value at those positions is reported as corruption.
//!
//! ## Intended audience
//!
//! - block and chain management,
//! - the validation layer,
//! - the attribute dispatcher and its per-level layouts.

use std::mem::size_of;

use crate::engine::layout::{BlockHeader, ComponentDescriptor, RecordHeader};


/// Size in bytes of a block, including its header and descriptor table.
pub type BlockSize = u32;
/// Size in bytes of a single component record.
pub type RecordSize = u32;
/// Global index of a component instance within its component type.
pub type ComponentIndex = u32;
/// Number of component instances.
pub type ComponentCount = u32;
/// Monotonic change counter.
pub type ChangeCount = u32;
/// Enclosure configuration generation counter.
pub type GenerationCount = u32;
/// Position of a block within its chain (head is `0`).
pub type BlockPosition = usize;
/// Slot index inside a block's descriptor table.
pub type DescriptorSlot = usize;

/// Sentinel written into every block header (`"EDAL"`).
pub const BLOCK_CANARY: u32 = 0x4544_414C;
/// Sentinel written into every component record header (`"COMP"`).
pub const COMPONENT_CANARY: u32 = 0x434F_4D50;

/// Size in bytes of the fixed block header.
pub const BLOCK_HEADER_SIZE: u32 = size_of::<BlockHeader>() as u32;
/// Size in bytes of one descriptor table entry.
pub const DESCRIPTOR_SIZE: u32 = size_of::<ComponentDescriptor>() as u32;
/// Size in bytes of the header shared by every component record.
pub const RECORD_HEADER_SIZE: u32 = size_of::<RecordHeader>() as u32;

const _: [(); 1] = [(); (BLOCK_HEADER_SIZE == 32) as usize];
const _: [(); 1] = [(); (DESCRIPTOR_SIZE == 24) as usize];
const _: [(); 1] = [(); (RECORD_HEADER_SIZE == 12) as usize];

/// Capacity of serial-number byte strings.
pub const SERIAL_NUMBER_SIZE: usize = 16;
/// Capacity of product-identifier byte strings.
pub const PRODUCT_ID_SIZE: usize = 16;
/// Capacity of firmware-revision blocks.
pub const FW_INFO_SIZE: usize = 24;

/// Default block size used when none is configured.
pub const DEFAULT_BLOCK_SIZE: BlockSize = 4096;
/// Default descriptor-table capacity per block.
pub const DEFAULT_MAX_COMPONENT_TYPES: u8 = 16;
/// Default upper bound on the number of blocks a chain may grow to.
pub const DEFAULT_MAX_BLOCKS: usize = 4;

/// Side identifier used by midplane-mounted components.
pub const SIDE_ID_MIDPLANE: u8 = 0x1F;
/// Container index reported by components that are not housed in a FRU.
pub const CONTAINER_INDEX_SELF_CONTAINED: u8 = 0xFF;
/// Phy index stored by connector records that describe a whole connector.
pub const PHY_INDEX_INVALID: u8 = 0xFF;

/// Display mode that shows the character in the record.
pub const DISPLAY_MODE_CHARACTER: u8 = 2;
/// Display indices of the two bus-number characters, tens first.
pub const DISPLAY_BUS_INDICES: [u32; 2] = [0, 1];
/// Display index of the enclosure-position character.
pub const DISPLAY_ENCLOSURE_INDEX: u32 = 2;

/// Smallest block that can carry a header and a single-slot descriptor table.
pub const MIN_BLOCK_SIZE: BlockSize = BLOCK_HEADER_SIZE + DESCRIPTOR_SIZE;

/// Bytes consumed by the header and a descriptor table of `max_component_types` slots.
#[inline]
pub const fn block_overhead(max_component_types: u8) -> u64 {
    BLOCK_HEADER_SIZE as u64 + DESCRIPTOR_SIZE as u64 * max_component_types as u64
}
