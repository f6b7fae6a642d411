//! Change tracking: setter semantics and chain-wide change bookkeeping.
//!
//! # Setters
//!
//! [`apply_bool`], [`apply_scalar`] and [`apply_string`] store a value through a
//! resolved binding and report whether it changed. Depending on the binding
//! they also
//!
//! - raise the record's state-change flag and counter,
//! - arm a hardware write (`WRITE_DATA` set, `WRITE_DATA_SENT` cleared),
//! - count a component swap when a serial number changes.
//!
//! Raising state change is recorded on the [`RecordMut`]; the store mirrors it
//! into the owning descriptor with [`note_state_change`].
//!
//! # Chain-wide operations
//!
//! Clearing state changes, scanning for pending writes, and the overall and
//! per-type counters walk every block of a [`BlockChain`].

use std::ops::Range;

use bytemuck::Pod;
use log::{debug, warn};

use crate::engine::block::Block;
use crate::engine::chain::BlockChain;
use crate::engine::component::{ComponentStatus, ComponentType};
use crate::engine::dispatch::{self, BoolBehavior, BoolBinding, ScalarBinding, StringBinding, Tracking};
use crate::engine::error::{EdalError, LookupError, SizeMismatchError, ValidationError};
use crate::engine::layout::{ComponentDescriptor, ComponentFlags, DescriptorFlags};
use crate::engine::record::{FlagBit, RecordMut, RecordRef};
use crate::engine::types::{DescriptorSlot, GenerationCount};


/// Result of a successful set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOutcome {
    /// The stored value (or a write request) changed.
    Changed,
    /// Nothing was modified.
    Unchanged,
}

impl SetOutcome {
    /// Returns `true` for [`SetOutcome::Changed`].
    #[inline]
    pub fn is_changed(self) -> bool {
        self == SetOutcome::Changed
    }
}

impl From<bool> for SetOutcome {
    fn from(changed: bool) -> Self {
        if changed { SetOutcome::Changed } else { SetOutcome::Unchanged }
    }
}

/// Arms a hardware write on `record`.
pub fn arm_write(record: &mut RecordMut<'_>) -> Result<SetOutcome, ValidationError> {
    apply_bool(record, dispatch::write_data(), true)
}

fn intent_triggered(record: &RecordMut<'_>, compare: &[FlagBit], value: bool) -> Result<bool, ValidationError> {
    for bit in compare {
        if record.flag(*bit)? != value {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Stores a boolean through `binding`.
pub fn apply_bool(
    record: &mut RecordMut<'_>,
    binding: BoolBinding,
    value: bool,
) -> Result<SetOutcome, ValidationError> {
    match binding.behavior {
        BoolBehavior::Plain => Ok(record.set_flag(binding.bit, value)?.into()),

        BoolBehavior::StateChange => {
            if record.flag(binding.bit)? == value {
                return Ok(SetOutcome::Unchanged);
            }
            record.raise_state_change()?;
            record.set_flag(binding.bit, value)?;
            Ok(SetOutcome::Changed)
        }

        BoolBehavior::Intent { compare, also } => {
            if !intent_triggered(record, compare, value)? {
                debug!("EDAL: intent already satisfied, no write armed");
                return Ok(SetOutcome::Unchanged);
            }
            if let Some(also) = also {
                record.set_flag(also, true)?;
            }
            record.set_flag(FlagBit::header(ComponentFlags::WRITE_DATA), true)?;
            record.set_flag(FlagBit::header(ComponentFlags::WRITE_DATA_SENT), false)?;
            record.set_flag(binding.bit, value)?;
            Ok(SetOutcome::Changed)
        }

        BoolBehavior::Request { sent } => {
            let changed = record.set_flag(binding.bit, value)?;
            record.set_flag(sent, false)?;
            Ok(changed.into())
        }
    }
}

/// Stores an integer through `binding`.
///
/// A write request stores the value and arms the write. The outcome reports
/// the value, whether or not a write was already pending.
pub fn apply_scalar<T: Pod + PartialEq>(
    record: &mut RecordMut<'_>,
    binding: ScalarBinding<T>,
    value: T,
) -> Result<SetOutcome, ValidationError> {
    if record.scalar(binding.field)? == value {
        return Ok(SetOutcome::Unchanged);
    }
    match binding.tracking {
        Tracking::Silent => {
            record.set_scalar(binding.field, value)?;
            Ok(SetOutcome::Changed)
        }
        Tracking::StateChange => {
            record.raise_state_change()?;
            record.set_scalar(binding.field, value)?;
            Ok(SetOutcome::Changed)
        }
        Tracking::WriteRequest => {
            record.set_scalar(binding.field, value)?;
            arm_write(record)?;
            Ok(SetOutcome::Changed)
        }
    }
}

/// Stores a byte string through `binding`.
///
/// At most the field's capacity is copied and the rest of the field is
/// zero-filled. When `value` is longer than the field, the truncated value is
/// still stored and [`EdalError::SizeMismatch`] is returned.
pub fn apply_string(
    record: &mut RecordMut<'_>,
    binding: StringBinding,
    value: &[u8],
) -> Result<SetOutcome, EdalError> {
    let capacity = binding.field.len;
    let copied = value.len().min(capacity);
    let unchanged = {
        let stored = record.bytes(binding.field)?;
        stored[..copied] == value[..copied] && stored[copied..].iter().all(|b| *b == 0)
    };

    let outcome = if unchanged {
        SetOutcome::Unchanged
    } else {
        record.set_bytes(binding.field, value)?;
        if binding.swap {
            record.record_swap()?;
        }
        SetOutcome::Changed
    };

    if value.len() > capacity {
        warn!("EDAL: {} byte string truncated to {} bytes", value.len(), capacity);
        return Err(SizeMismatchError { requested: value.len(), capacity }.into());
    }
    Ok(outcome)
}

/// Copies a byte string into `buffer` and returns the bytes copied.
///
/// A buffer smaller than the field receives the prefix that fits and the call
/// returns [`EdalError::SizeMismatch`].
pub fn read_string(record: RecordRef<'_>, binding: StringBinding, buffer: &mut [u8]) -> Result<usize, EdalError> {
    let stored = record.bytes(binding.field)?;
    let copied = buffer.len().min(stored.len());
    buffer[..copied].copy_from_slice(&stored[..copied]);
    if buffer.len() < stored.len() {
        return Err(SizeMismatchError { requested: buffer.len(), capacity: stored.len() }.into());
    }
    Ok(copied)
}

/// Mirrors a raised record state change into descriptor `slot` of `block`.
pub fn note_state_change(block: &mut Block, slot: DescriptorSlot) -> Result<(), ValidationError> {
    block.update_descriptor(slot, |d| {
        d.state_change_count = d.state_change_count.wrapping_add(1);
        d.flags |= DescriptorFlags::STATE_CHANGE.bits();
    })?;
    Ok(())
}

fn record_ranges(
    slot: DescriptorSlot,
    descriptor: &ComponentDescriptor,
) -> impl Iterator<Item = Range<usize>> + '_ {
    (0..descriptor.count).filter_map(move |n| Block::record_range(slot, descriptor, descriptor.first_index + n))
}

/// Clears the state-change flag of every record and descriptor.
///
/// A corrupted record does not stop the sweep; the first failure is returned
/// once every block was visited.
pub fn clear_state_changes(chain: &mut BlockChain) -> Result<(), EdalError> {
    let mut first_error: Option<EdalError> = None;
    let mut cursor = Some(chain.head_mut()?);
    while let Some(block) = cursor {
        for (slot, descriptor) in block.descriptors()? {
            if descriptor.record_size > 0 {
                for range in record_ranges(slot, &descriptor) {
                    let cleared = RecordMut::new(block.record_bytes_mut(range))
                        .and_then(|mut record| record.clear_state_change());
                    if let Err(e) = cleared {
                        first_error.get_or_insert(e.into());
                    }
                }
            }
            block.update_descriptor(slot, |d| d.flags &= !DescriptorFlags::STATE_CHANGE.bits())?;
        }
        cursor = block.next_mut();
    }
    first_error.map_or(Ok(()), Err)
}

/// Sets the overall status of every descriptor of `component`.
///
/// # Errors
/// [`LookupError::ComponentTypeNotFound`] if no block describes the type.
pub fn set_overall_status(
    chain: &mut BlockChain,
    component: ComponentType,
    status: ComponentStatus,
) -> Result<(), EdalError> {
    let mut found = false;
    let mut cursor = Some(chain.head_mut()?);
    while let Some(block) = cursor {
        if let Some((slot, _)) = block.find_descriptor(component)? {
            block.update_descriptor(slot, |d| d.overall_status = status as u8)?;
            found = true;
        }
        cursor = block.next_mut();
    }
    if found {
        Ok(())
    } else {
        Err(LookupError::ComponentTypeNotFound(component).into())
    }
}

/// Marks every component type holding a record with a pending write as
/// [`ComponentStatus::WriteNeeded`]. Returns `true` if any write is pending.
pub fn check_for_write_data(chain: &mut BlockChain) -> Result<bool, EdalError> {
    let write_data = FlagBit::header(ComponentFlags::WRITE_DATA);
    let mut pending: Vec<ComponentType> = Vec::new();

    for block in chain.iter() {
        for (slot, descriptor) in block.descriptors()? {
            let Ok(component) = ComponentType::try_from(descriptor.component_type) else {
                continue;
            };
            if descriptor.record_size == 0 || pending.contains(&component) {
                continue;
            }
            for range in record_ranges(slot, &descriptor) {
                let record = RecordRef::new(block.record_bytes(range))?;
                if record.flag(write_data)? {
                    debug!("EDAL: {} has data to be written", component);
                    pending.push(component);
                    break;
                }
            }
        }
    }

    for component in &pending {
        set_overall_status(chain, *component, ComponentStatus::WriteNeeded)?;
    }
    Ok(!pending.is_empty())
}

/// Increments the overall change counter of every block.
pub fn increment_overall_state_change(chain: &mut BlockChain) -> Result<(), ValidationError> {
    let mut cursor = Some(chain.head_mut()?);
    while let Some(block) = cursor {
        block.update_header(|h| h.overall_state_change_count = h.overall_state_change_count.wrapping_add(1))?;
        cursor = block.next_mut();
    }
    Ok(())
}

/// Increments the per-type change counter of every descriptor of `component`
/// and sets its state-change flag.
pub fn increment_component_state_change(chain: &mut BlockChain, component: ComponentType) -> Result<(), EdalError> {
    let mut found = false;
    let mut cursor = Some(chain.head_mut()?);
    while let Some(block) = cursor {
        if let Some((slot, _)) = block.find_descriptor(component)? {
            note_state_change(block, slot)?;
            found = true;
        }
        cursor = block.next_mut();
    }
    if found {
        Ok(())
    } else {
        Err(LookupError::ComponentTypeNotFound(component).into())
    }
}

/// Stores `generation` in every block header.
pub fn set_generation_count(chain: &mut BlockChain, generation: GenerationCount) -> Result<(), ValidationError> {
    let mut cursor = Some(chain.head_mut()?);
    while let Some(block) = cursor {
        block.update_header(|h| h.generation_count = generation)?;
        cursor = block.next_mut();
    }
    Ok(())
}
