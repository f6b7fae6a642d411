//! Singly-linked chain of blocks: fitting, locating and tail management.
//!
//! # Fitting
//!
//! [`BlockChain::fit`] places `count` same-size records of one component type
//! across the chain in two passes:
//!
//! 1. **Dry run.** Sum each block's `available / record_size` (zero for blocks
//!    whose descriptor table is full). If the sum is short, fail with
//!    insufficient resource before touching anything.
//! 2. **Commit.** Walk the chain again and place `min(allowed, remaining)`
//!    records per block, each block receiving a new descriptor whose first index
//!    continues where the previous block's range ended.
//!
//! The result is a set of descriptors whose ranges are contiguous and together
//! cover exactly `[0, count)`, or no change at all.
//!
//! A request for no records only needs a descriptor and always lands in the
//! head block. Records smaller than a record header are rejected.
//!
//! # Locating
//!
//! [`BlockChain::locate`] walks the chain, scans each block's descriptor table
//! for the type and returns the byte range of the record whose global index
//! falls in that descriptor's range. A type seen only with non-matching ranges
//! yields [`LookupError::IndexOutOfRange`]; a type never seen yields
//! [`LookupError::ComponentTypeNotFound`].

use std::iter;
use std::ops::Range;

use log::{info, warn};

use crate::engine::block::Block;
use crate::engine::component::ComponentType;
use crate::engine::error::{CapacityError, ConfigError, EdalError, FitError, LookupError, ValidationError};
use crate::engine::types::{
    block_overhead,
    BlockPosition,
    BlockSize,
    ComponentCount,
    ComponentIndex,
    DescriptorSlot,
    RecordSize,
    RECORD_HEADER_SIZE,
};
use crate::engine::validation;


/// Where a record lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Position of the owning block in the chain.
    pub block: BlockPosition,
    /// Descriptor slot within that block.
    pub slot: DescriptorSlot,
    /// Byte range of the record within the block.
    pub range: Range<usize>,
}

/// One descriptor written by a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Block that received the records.
    pub block: BlockPosition,
    /// Global index of the first record placed there.
    pub first_index: ComponentIndex,
    /// Number of records placed there.
    pub count: ComponentCount,
}

/// Ordered chain of blocks owned by one enclosure store.
#[derive(Debug, Clone, Default)]
pub struct BlockChain {
    head: Option<Box<Block>>,
}

impl BlockChain {
    /// Chain consisting of `head` alone.
    pub fn new(head: Block) -> Self {
        BlockChain { head: Some(Box::new(head)) }
    }

    /// Reports whether one record of `record_size` can ever fit in a block
    /// with the given geometry.
    ///
    /// # Errors
    /// [`CapacityError`] carrying the bytes the record would need and the bytes
    /// an empty block offers.
    pub fn can_fit_in_block(
        block_size: BlockSize,
        max_component_types: u8,
        record_size: RecordSize,
    ) -> Result<(), CapacityError> {
        let overhead = block_overhead(max_component_types);
        let needed = overhead + record_size as u64;
        if needed > block_size as u64 {
            return Err(CapacityError {
                needed: record_size as u64,
                available: (block_size as u64).saturating_sub(overhead),
            });
        }
        Ok(())
    }

    /// Validated head block.
    pub fn head(&self) -> Result<&Block, ValidationError> {
        let head = validation::require(self.head.as_deref())?;
        head.header()?;
        Ok(head)
    }

    /// Validated head block, mutably.
    pub fn head_mut(&mut self) -> Result<&mut Block, ValidationError> {
        let head = validation::require(self.head.as_deref_mut())?;
        head.header()?;
        Ok(head)
    }

    /// Iterates over the blocks from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        iter::successors(self.head.as_deref(), |block| block.next())
    }

    /// Number of blocks in the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if the chain has no block.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Block at `position`.
    pub fn block(&self, position: BlockPosition) -> Option<&Block> {
        self.iter().nth(position)
    }

    /// Block at `position`, mutably.
    pub fn block_mut(&mut self, position: BlockPosition) -> Option<&mut Block> {
        let mut cursor = self.head.as_deref_mut();
        for _ in 0..position {
            cursor = cursor?.next_mut();
        }
        cursor
    }

    fn tail_mut(&mut self) -> Option<&mut Block> {
        let mut cursor = self.head.as_deref_mut()?;
        while cursor.next().is_some() {
            cursor = cursor.next_mut()?;
        }
        Some(cursor)
    }

    /// Links `block` after the current tail. An empty chain adopts it as head.
    ///
    /// # Errors
    /// [`ValidationError`] if the tail header fails validation. The block is
    /// not linked in that case.
    pub fn append(&mut self, block: Block) -> Result<(), ValidationError> {
        match self.tail_mut() {
            Some(tail) => tail.set_next(Some(Box::new(block)))?,
            None => self.head = Some(Box::new(block)),
        }
        info!("EDAL: appended block, chain length {}", self.len());
        Ok(())
    }

    /// Unlinks the tail block and returns it. The head is never detached.
    ///
    /// # Errors
    /// [`ValidationError`] if the chain is released or the block before the
    /// tail fails validation.
    pub fn detach_tail(&mut self) -> Result<Option<Box<Block>>, ValidationError> {
        self.head()?;
        let length = self.len();
        if length < 2 {
            warn!("EDAL: refusing to detach the head block");
            return Ok(None);
        }
        validation::require(self.block_mut(length - 2))?.take_next()
    }

    /// Links a previously detached `block` after the tail, provided each of its
    /// descriptors continues its type's index range exactly where the chain's
    /// range ends, with the same record size.
    ///
    /// # Errors
    /// - [`ValidationError`] if `block` or a chain block fails validation.
    /// - [`EdalError::Config`] if `block` still has a successor or a descriptor
    ///   would overlap or leave a gap in its type's index range.
    pub fn reattach(&mut self, block: Block) -> Result<(), EdalError> {
        block.header()?;
        if block.next().is_some() {
            return Err(ConfigError { reason: "reattached block still links a successor" }.into());
        }
        for (_, descriptor) in block.descriptors()? {
            let component = ComponentType::try_from(descriptor.component_type)
                .map_err(EdalError::UnsupportedComponent)?;
            let mut end: ComponentCount = 0;
            for existing in self.iter() {
                if let Some((_, present)) = existing.find_descriptor(component)? {
                    if present.count > 0 && present.record_size != descriptor.record_size {
                        warn!("EDAL: reattached {} records differ in size", component);
                        return Err(ConfigError { reason: "reattached records differ in size" }.into());
                    }
                    end = end.max(present.first_index.saturating_add(present.count));
                }
            }
            if descriptor.first_index != end {
                warn!(
                    "EDAL: reattached {} range starts at {}, chain range ends at {}",
                    component, descriptor.first_index, end
                );
                return Err(ConfigError { reason: "reattached index range is not contiguous" }.into());
            }
        }
        Ok(self.append(block)?)
    }

    /// Tears the whole chain down, returning the former head.
    pub fn release(&mut self) -> Option<Box<Block>> {
        self.head.take()
    }

    /// Returns `true` if any block holds a descriptor for `component`.
    pub fn contains_type(&self, component: ComponentType) -> Result<bool, ValidationError> {
        self.head()?;
        for block in self.iter() {
            if block.find_descriptor(component)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Records of `record_size` the existing chain could still accept.
    pub fn capacity_for(&self, record_size: RecordSize) -> Result<u64, ValidationError> {
        self.head()?;
        let mut total = 0u64;
        for block in self.iter() {
            total += block.capacity_for(record_size)? as u64;
        }
        Ok(total)
    }

    /// Two-pass atomic fit of `count` records of `component`.
    ///
    /// # Errors
    /// - [`FitError::DuplicateComponentType`] if the type is already present.
    /// - [`FitError::InvalidRecordSize`] if records are requested with a size
    ///   that cannot hold a record header.
    /// - [`FitError::DescriptorTableFull`] for a zero-sized request when the head
    ///   block has no free descriptor slot.
    /// - [`FitError::Capacity`] when the chain cannot hold every record.
    /// - [`FitError::Validation`] when a block fails validation.
    pub fn fit(
        &mut self,
        component: ComponentType,
        count: ComponentCount,
        record_size: RecordSize,
    ) -> Result<Vec<Placement>, FitError> {
        if self.contains_type(component)? {
            return Err(FitError::DuplicateComponentType(component));
        }

        if count > 0 && record_size < RECORD_HEADER_SIZE {
            return Err(FitError::InvalidRecordSize { component, size: record_size, minimum: RECORD_HEADER_SIZE });
        }

        if count == 0 {
            self.head_mut()?.place(component, count, 0, record_size)?;
            return Ok(vec![Placement { block: 0, first_index: 0, count }]);
        }

        let capacity = self.capacity_for(record_size)?;
        if capacity < count as u64 {
            warn!(
                "EDAL: cannot fit {} {} record(s) of {} bytes, chain holds {}",
                count, component, record_size, capacity
            );
            return Err(CapacityError { needed: count as u64, available: capacity }.into());
        }

        let mut placements = Vec::new();
        let mut remaining = count;
        let mut first_index: ComponentIndex = 0;
        let mut position: BlockPosition = 0;
        let mut cursor = self.head.as_deref_mut();
        while let Some(block) = cursor {
            let allowed = block.capacity_for(record_size)?.min(remaining);
            if allowed > 0 {
                block.place(component, allowed, first_index, record_size)?;
                placements.push(Placement { block: position, first_index, count: allowed });
                first_index += allowed;
                remaining -= allowed;
            }
            if remaining == 0 {
                break;
            }
            cursor = block.next_mut();
            position += 1;
        }

        info!(
            "EDAL: fitted {} {} record(s) of {} bytes across {} block(s)",
            count, component, record_size, placements.len()
        );
        Ok(placements)
    }

    /// Resolves `(component, index)` to its record.
    ///
    /// # Errors
    /// - [`ValidationError`] if a block on the walk is null or corrupted.
    /// - [`LookupError::ComponentTypeNotFound`] if no block describes the type.
    /// - [`LookupError::IndexOutOfRange`] if no descriptor range contains `index`.
    pub fn locate(&self, component: ComponentType, index: ComponentIndex) -> Result<Location, EdalError> {
        self.head()?;
        let mut seen = false;
        let mut total: ComponentCount = 0;
        for (position, block) in self.iter().enumerate() {
            let Some((slot, descriptor)) = block.find_descriptor(component)? else {
                continue;
            };
            seen = true;
            total = total.saturating_add(descriptor.count);
            if let Some(range) = Block::record_range(slot, &descriptor, index) {
                return Ok(Location { block: position, slot, range });
            }
        }
        if seen {
            Err(LookupError::IndexOutOfRange { component, index, count: total }.into())
        } else {
            Err(LookupError::ComponentTypeNotFound(component).into())
        }
    }

    /// Total records of `component` across every block.
    pub fn component_count(&self, component: ComponentType) -> Result<ComponentCount, ValidationError> {
        self.head()?;
        let mut total: ComponentCount = 0;
        for block in self.iter() {
            if let Some((_, descriptor)) = block.find_descriptor(component)? {
                total = total.saturating_add(descriptor.count);
            }
        }
        Ok(total)
    }

    /// Every `(block, slot)` holding a descriptor for `component`.
    pub fn descriptor_slots(
        &self,
        component: ComponentType,
    ) -> Result<Vec<(BlockPosition, DescriptorSlot)>, ValidationError> {
        self.head()?;
        let mut slots = Vec::new();
        for (position, block) in self.iter().enumerate() {
            if let Some((slot, _)) = block.find_descriptor(component)? {
                slots.push((position, slot));
            }
        }
        Ok(slots)
    }
}
