//! Validated views over a single component record.
//!
//! A record is a slice of its block's byte arena. [`RecordRef`] and
//! [`RecordMut`] wrap that slice after the record canary has been checked, and
//! give typed access to fields located by [`FlagBit`], [`Scalar`] and
//! [`ByteField`].
//!
//! Field locations are plain offsets computed from the `Pod` layouts in
//! [`crate::engine::layout`], so the same view serves every component type and
//! every specialization level. Accesses past the end of the record are reported
//! as [`ValidationError::RecordTooShort`], never as a panic.
//!
//! [`RecordMut`] additionally remembers whether a write raised the record's
//! state-change flag, so the caller can mirror the change into the owning
//! descriptor.

use std::marker::PhantomData;
use std::mem::{offset_of, size_of};

use bytemuck::Pod;

use crate::engine::error::ValidationError;
use crate::engine::layout::{read_pod, write_pod, ComponentFlags, RecordHeader};
use crate::engine::validation;


/// Location of one boolean bit inside a record's `u16` flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagBit {
    /// Offset of the flag word from the start of the record.
    pub offset: usize,
    /// Bit mask within the word.
    pub mask: u16,
}

impl FlagBit {
    /// A bit of the shared header flag word.
    pub const fn header(flag: ComponentFlags) -> Self {
        FlagBit { offset: offset_of!(RecordHeader, flags), mask: flag.bits() }
    }

    /// A bit of a level-specific flag word at `offset`.
    pub const fn at(offset: usize, mask: u16) -> Self {
        FlagBit { offset, mask }
    }
}

/// Location of a fixed-width integer inside a record.
#[derive(Debug, PartialEq, Eq)]
pub struct Scalar<T> {
    /// Offset from the start of the record.
    pub offset: usize,
    _width: PhantomData<T>,
}

impl<T> Clone for Scalar<T> {
    fn clone(&self) -> Self { *self }
}

impl<T> Copy for Scalar<T> {}

impl<T> Scalar<T> {
    /// Integer field at `offset`.
    pub const fn at(offset: usize) -> Self {
        Scalar { offset, _width: PhantomData }
    }
}

/// Location of a fixed-capacity byte string inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteField {
    /// Offset from the start of the record.
    pub offset: usize,
    /// Capacity in bytes.
    pub len: usize,
}

impl ByteField {
    /// Byte string of `len` bytes at `offset`.
    pub const fn at(offset: usize, len: usize) -> Self {
        ByteField { offset, len }
    }
}

fn too_short(needed: usize, actual: usize) -> ValidationError {
    ValidationError::RecordTooShort { needed, actual }
}

fn read_field<T: Pod>(bytes: &[u8], offset: usize) -> Result<T, ValidationError> {
    read_pod(bytes, offset).ok_or_else(|| too_short(offset + size_of::<T>(), bytes.len()))
}

fn byte_slice(bytes: &[u8], field: ByteField) -> Result<&[u8], ValidationError> {
    let end = field.offset + field.len;
    bytes.get(field.offset..end).ok_or_else(|| too_short(end, bytes.len()))
}

/// Writes a fresh header with the record canary and clears the rest of the record.
pub fn initialize_record(bytes: &mut [u8]) {
    bytes.fill(0);
    let header = RecordHeader {
        canary: crate::engine::types::COMPONENT_CANARY,
        ..bytemuck::Zeroable::zeroed()
    };
    // A record shorter than its header stays zeroed and reads back as null.
    let _ = write_pod(bytes, 0, &header);
}

/// Read-only view of a validated record.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    bytes: &'a [u8],
}

impl<'a> RecordRef<'a> {
    /// Validates `bytes` as a record.
    ///
    /// # Errors
    /// [`ValidationError::NullRecord`] for an empty slice,
    /// [`ValidationError::RecordCorrupt`] on a canary mismatch.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ValidationError> {
        validation::check_record(bytes)?;
        Ok(RecordRef { bytes })
    }

    /// Record header.
    pub fn header(&self) -> Result<RecordHeader, ValidationError> {
        read_field(self.bytes, 0)
    }

    /// Header flags.
    pub fn flags(&self) -> Result<ComponentFlags, ValidationError> {
        Ok(ComponentFlags::from_bits_retain(self.header()?.flags))
    }

    /// Reads one flag bit.
    pub fn flag(&self, bit: FlagBit) -> Result<bool, ValidationError> {
        let word: u16 = read_field(self.bytes, bit.offset)?;
        Ok(word & bit.mask != 0)
    }

    /// Reads an integer field.
    pub fn scalar<T: Pod>(&self, field: Scalar<T>) -> Result<T, ValidationError> {
        read_field(self.bytes, field.offset)
    }

    /// Borrows a byte-string field.
    pub fn bytes(&self, field: ByteField) -> Result<&'a [u8], ValidationError> {
        byte_slice(self.bytes, field)
    }

    /// Entire record.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Mutable view of a validated record.
#[derive(Debug)]
pub struct RecordMut<'a> {
    bytes: &'a mut [u8],
    raised: bool,
}

impl<'a> RecordMut<'a> {
    /// Validates `bytes` as a record.
    ///
    /// # Errors
    /// Same as [`RecordRef::new`].
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, ValidationError> {
        validation::check_record(bytes)?;
        Ok(RecordMut { bytes, raised: false })
    }

    /// Read-only view of the same record.
    pub fn view(&self) -> RecordRef<'_> {
        RecordRef { bytes: self.bytes }
    }

    /// Returns `true` if a write through this view raised the state-change flag.
    pub fn raised_state_change(&self) -> bool {
        self.raised
    }

    /// Reads one flag bit.
    pub fn flag(&self, bit: FlagBit) -> Result<bool, ValidationError> {
        self.view().flag(bit)
    }

    /// Reads an integer field.
    pub fn scalar<T: Pod>(&self, field: Scalar<T>) -> Result<T, ValidationError> {
        self.view().scalar(field)
    }

    /// Borrows a byte-string field.
    pub fn bytes(&self, field: ByteField) -> Result<&[u8], ValidationError> {
        byte_slice(self.bytes, field)
    }

    /// Stores one flag bit. Returns `true` if the stored value changed.
    pub fn set_flag(&mut self, bit: FlagBit, value: bool) -> Result<bool, ValidationError> {
        let word: u16 = read_field(self.bytes, bit.offset)?;
        let updated = if value { word | bit.mask } else { word & !bit.mask };
        self.write(bit.offset, &updated)?;
        Ok(updated != word)
    }

    /// Stores an integer field.
    pub fn set_scalar<T: Pod>(&mut self, field: Scalar<T>, value: T) -> Result<(), ValidationError> {
        self.write(field.offset, &value)
    }

    /// Overwrites a byte-string field with `value`, zero-filling the remainder.
    ///
    /// Bytes of `value` beyond the field's capacity are dropped.
    pub fn set_bytes(&mut self, field: ByteField, value: &[u8]) -> Result<(), ValidationError> {
        let end = field.offset + field.len;
        let actual = self.bytes.len();
        let slot = self.bytes.get_mut(field.offset..end).ok_or_else(|| too_short(end, actual))?;
        let copied = value.len().min(slot.len());
        slot[..copied].copy_from_slice(&value[..copied]);
        slot[copied..].fill(0);
        Ok(())
    }

    /// Sets the state-change flag and bumps the record's change counter.
    pub fn raise_state_change(&mut self) -> Result<(), ValidationError> {
        let mut header: RecordHeader = read_field(self.bytes, 0)?;
        header.flags |= ComponentFlags::STATE_CHANGE.bits();
        header.state_change_count = header.state_change_count.wrapping_add(1);
        self.write(0, &header)?;
        self.raised = true;
        Ok(())
    }

    /// Bumps the swap counter and raises the state-change flag.
    pub fn record_swap(&mut self) -> Result<(), ValidationError> {
        let mut header: RecordHeader = read_field(self.bytes, 0)?;
        header.swap_count = header.swap_count.wrapping_add(1);
        self.write(0, &header)?;
        self.raise_state_change()
    }

    /// Clears the state-change flag without touching counters.
    pub fn clear_state_change(&mut self) -> Result<bool, ValidationError> {
        self.set_flag(FlagBit::header(ComponentFlags::STATE_CHANGE), false)
    }

    fn write<T: Pod>(&mut self, offset: usize, value: &T) -> Result<(), ValidationError> {
        let actual = self.bytes.len();
        write_pod(self.bytes, offset, value).ok_or_else(|| too_short(offset + size_of::<T>(), actual))
    }
}
