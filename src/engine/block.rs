//! A single fixed-size block of the component store.
//!
//! # Storage model
//!
//! A [`Block`] owns a byte arena of exactly `block_size` bytes and an optional
//! link to the next block of its chain. The arena holds, in order:
//!
//! - a [`BlockHeader`] carrying the canary, the descriptor counts, the free-space
//!   counter and a handful of enclosure-wide values,
//! - a descriptor table with room for `max_component_types` [`ComponentDescriptor`]s,
//! - packed component records, growing toward the end of the block.
//!
//! Records are appended, never freed. A descriptor is written once when its
//! records are placed and afterwards only its counters, flags and status change.
//!
//! # Addressing
//!
//! A descriptor stores the offset of its first record relative to the
//! descriptor itself. Record `i` of the type lives at
//! `descriptor + records_offset + (i - first_index) * record_size`, resolved by
//! checked slicing into the arena.
//!
//! # Invariants
//!
//! - `header + max_component_types * descriptor + used records + available == block_size`
//! - descriptors `0..component_types` are initialized, the rest are zero
//! - `has_next` in the header mirrors whether `next` is populated

use std::ops::Range;

use log::debug;

use crate::engine::component::{ComponentType, EnclosureType};
use crate::engine::error::{CapacityError, ConfigError, EdalError, FitError, ValidationError};
use crate::engine::layout::{read_pod, write_pod, BlockHeader, ComponentDescriptor};
use crate::engine::record::initialize_record;
use crate::engine::types::{
    block_overhead,
    BlockSize,
    ComponentCount,
    ComponentIndex,
    DescriptorSlot,
    RecordSize,
    BLOCK_CANARY,
    BLOCK_HEADER_SIZE,
    DESCRIPTOR_SIZE,
};
use crate::engine::validation;


/// One link of the block chain.
#[derive(Debug, Clone)]
pub struct Block {
    bytes: Vec<u8>,
    next: Option<Box<Block>>,
}

impl Block {
    /// Allocates and initializes a block.
    ///
    /// The free capacity starts at
    /// `block_size - BLOCK_HEADER_SIZE - max_component_types * DESCRIPTOR_SIZE`.
    ///
    /// # Errors
    /// - [`EdalError::Config`] if `max_component_types` is zero.
    /// - [`EdalError::InsufficientResource`] if the header and descriptor table
    ///   do not fit in `block_size`.
    pub fn new(
        block_size: BlockSize,
        enclosure_type: EnclosureType,
        max_component_types: u8,
        side_id: u8,
    ) -> Result<Self, EdalError> {
        if max_component_types == 0 {
            return Err(ConfigError { reason: "descriptor table needs at least one slot" }.into());
        }
        let overhead = block_overhead(max_component_types);
        if overhead > block_size as u64 {
            return Err(CapacityError { needed: overhead, available: block_size as u64 }.into());
        }

        let header = BlockHeader {
            canary: BLOCK_CANARY,
            enclosure_type: enclosure_type.code(),
            component_types: 0,
            max_component_types,
            locale: 0,
            block_size,
            available: (block_size as u64 - overhead) as u32,
            overall_state_change_count: 0,
            generation_count: 0,
            has_next: 0,
            side_id,
            reserved: [0; 6],
        };

        let mut bytes = vec![0u8; block_size as usize];
        bytes[..BLOCK_HEADER_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&header));
        Ok(Block { bytes, next: None })
    }

    /// Wraps a raw block image without a successor.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Block { bytes, next: None }
    }

    /// Validated block header.
    pub fn header(&self) -> Result<BlockHeader, ValidationError> {
        validation::check_block(&self.bytes)
    }

    /// Applies `update` to the validated header and stores it back.
    pub(crate) fn update_header<R>(
        &mut self,
        update: impl FnOnce(&mut BlockHeader) -> R,
    ) -> Result<R, ValidationError> {
        let mut header = self.header()?;
        let result = update(&mut header);
        self.bytes[..BLOCK_HEADER_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&header));
        Ok(result)
    }

    /// Total size in bytes.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.bytes.len()
    }

    /// Free bytes left for records.
    pub fn available(&self) -> Result<u32, ValidationError> {
        Ok(self.header()?.available)
    }

    /// Byte offset of descriptor `slot` from the start of the block.
    #[inline]
    pub const fn descriptor_offset(slot: DescriptorSlot) -> usize {
        BLOCK_HEADER_SIZE as usize + slot * DESCRIPTOR_SIZE as usize
    }

    /// Descriptor in `slot`, if that slot is in use.
    pub fn descriptor(&self, slot: DescriptorSlot) -> Result<Option<ComponentDescriptor>, ValidationError> {
        let header = self.header()?;
        if slot >= header.component_types as usize {
            return Ok(None);
        }
        Ok(read_pod(&self.bytes, Self::descriptor_offset(slot)))
    }

    /// All descriptors in use, in slot order.
    pub fn descriptors(&self) -> Result<Vec<(DescriptorSlot, ComponentDescriptor)>, ValidationError> {
        let header = self.header()?;
        Ok((0..header.component_types as usize)
            .filter_map(|slot| read_pod(&self.bytes, Self::descriptor_offset(slot)).map(|d| (slot, d)))
            .collect())
    }

    /// First descriptor in this block describing `component`.
    pub fn find_descriptor(
        &self,
        component: ComponentType,
    ) -> Result<Option<(DescriptorSlot, ComponentDescriptor)>, ValidationError> {
        Ok(self
            .descriptors()?
            .into_iter()
            .find(|(_, d)| d.component_type == component.code()))
    }

    /// Applies `update` to the descriptor in `slot` and stores it back.
    ///
    /// Returns `Ok(None)` if the slot is not in use.
    pub(crate) fn update_descriptor<R>(
        &mut self,
        slot: DescriptorSlot,
        update: impl FnOnce(&mut ComponentDescriptor) -> R,
    ) -> Result<Option<R>, ValidationError> {
        let Some(mut descriptor) = self.descriptor(slot)? else {
            return Ok(None);
        };
        let result = update(&mut descriptor);
        Ok(write_pod(&mut self.bytes, Self::descriptor_offset(slot), &descriptor).map(|_| result))
    }

    /// Number of `record_size` records this block could still accept.
    ///
    /// A block whose descriptor table is full accepts none.
    pub fn capacity_for(&self, record_size: RecordSize) -> Result<ComponentCount, ValidationError> {
        let header = self.header()?;
        if header.component_types >= header.max_component_types || record_size == 0 {
            return Ok(0);
        }
        Ok(header.available / record_size)
    }

    /// Places `count` records of `component` in this block, starting at global
    /// index `first_index`, and initializes each record header.
    ///
    /// # Errors
    /// - [`FitError::DescriptorTableFull`] when no descriptor slot is free.
    /// - [`FitError::Capacity`] when the records do not fit in the free space.
    pub(crate) fn place(
        &mut self,
        component: ComponentType,
        count: ComponentCount,
        first_index: ComponentIndex,
        record_size: RecordSize,
    ) -> Result<ComponentDescriptor, FitError> {
        let header = self.header()?;
        if header.component_types >= header.max_component_types {
            return Err(FitError::DescriptorTableFull { max_component_types: header.max_component_types });
        }
        let total = count as u64 * record_size as u64;
        if total > header.available as u64 {
            return Err(CapacityError { needed: total, available: header.available as u64 }.into());
        }

        let slot = header.component_types as usize;
        let overhead = block_overhead(header.max_component_types);
        let usable = (header.block_size as u64).saturating_sub(overhead);
        let records_start = overhead + usable.saturating_sub(header.available as u64);
        let descriptor_offset = Self::descriptor_offset(slot);

        let descriptor = ComponentDescriptor {
            component_type: component.code(),
            overall_status: 0,
            flags: 0,
            record_size,
            count,
            first_index,
            records_offset: (records_start - descriptor_offset as u64) as u32,
            state_change_count: 0,
        };
        write_pod(&mut self.bytes, descriptor_offset, &descriptor)
            .ok_or(FitError::Validation(ValidationError::NullBlock))?;

        let start = records_start as usize;
        let stride = record_size as usize;
        for n in 0..count as usize {
            let offset = start + n * stride;
            if let Some(record) = self.bytes.get_mut(offset..offset + stride) {
                initialize_record(record);
            }
        }

        self.update_header(|h| {
            h.available -= total as u32;
            h.component_types += 1;
        })?;

        debug!(
            "EDAL: placed {} {} record(s) of {} bytes at slot {} (first index {})",
            count, component, record_size, slot, first_index
        );
        Ok(descriptor)
    }

    /// Byte range of record `index` described by `descriptor` in `slot`, if the
    /// descriptor's index range contains it.
    pub fn record_range(
        slot: DescriptorSlot,
        descriptor: &ComponentDescriptor,
        index: ComponentIndex,
    ) -> Option<Range<usize>> {
        let first = descriptor.first_index;
        if index < first || index - first >= descriptor.count {
            return None;
        }
        let stride = descriptor.record_size as usize;
        let start = Self::descriptor_offset(slot)
            + descriptor.records_offset as usize
            + (index - first) as usize * stride;
        Some(start..start + stride)
    }

    /// Record bytes in `range`, or an empty slice if the range leaves the block.
    pub fn record_bytes(&self, range: Range<usize>) -> &[u8] {
        self.bytes.get(range).unwrap_or(&[])
    }

    /// Mutable record bytes in `range`, or an empty slice if the range leaves the block.
    pub fn record_bytes_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        self.bytes.get_mut(range).unwrap_or(&mut [])
    }

    /// Next block of the chain.
    #[inline]
    pub fn next(&self) -> Option<&Block> {
        self.next.as_deref()
    }

    /// Next block of the chain, mutably.
    #[inline]
    pub fn next_mut(&mut self) -> Option<&mut Block> {
        self.next.as_deref_mut()
    }

    /// Links `next` after this block and updates the header marker.
    ///
    /// A corrupted header leaves the block unlinked and `next` is dropped.
    pub(crate) fn set_next(&mut self, next: Option<Box<Block>>) -> Result<(), ValidationError> {
        let linked = next.is_some();
        self.update_header(|h| h.has_next = linked as u8)?;
        self.next = next;
        Ok(())
    }

    /// Unlinks and returns the successor.
    pub(crate) fn take_next(&mut self) -> Result<Option<Box<Block>>, ValidationError> {
        self.update_header(|h| h.has_next = 0)?;
        Ok(self.next.take())
    }

    /// Raw arena, for snapshots.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw mutable arena. Bypasses every invariant; intended for diagnostics
    /// and fault injection.
    #[inline]
    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
