//! # Attribute dispatch
//!
//! Resolves `(enclosure kind, component type, attribute)` to a [`Binding`]: the
//! location of the field inside a record plus the semantics its setter follows.
//!
//! ## Levels
//!
//! Each specialization level implements [`AttributeLevel`] and names the next
//! broader level:
//!
//! ```text
//! EsesLevel ──► SasLevel ──► BaseLevel ──► (none)
//! ```
//!
//! Resolution starts with the attributes every record shares (the header flags
//! and the additional status byte), then enters the chain at the store's
//! [`EnclosureKind`] and walks toward [`BaseLevel`]. The first level that
//! recognizes the pair wins. If none does, the caller receives an
//! [`UnsupportedAttributeError`], which is an ordinary negative outcome and is
//! only logged at `debug`.
//!
//! ## Bindings
//!
//! A binding never touches record bytes. Applying it is the job of
//! [`crate::engine::tracking`], which owns the compare, intent and state-change
//! rules.

mod base;
mod eses;
mod sas;

use std::mem::offset_of;

use log::debug;

pub use base::BaseLevel;
pub use eses::EsesLevel;
pub use sas::SasLevel;

use crate::engine::attribute::{
    AttributeId,
    BoolAttribute,
    StringAttribute,
    U16Attribute,
    U32Attribute,
    U64Attribute,
    U8Attribute,
};
use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::error::UnsupportedAttributeError;
use crate::engine::layout::{ComponentFlags, RecordHeader};
use crate::engine::record::{ByteField, FlagBit, Scalar};


/// What a boolean setter does besides storing the bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolBehavior {
    /// Store the bit; never raises state change.
    Plain,
    /// Raise the record's state change when the bit flips.
    StateChange,
    /// Hardware request. Triggers when the new value differs from any of the
    /// `compare` bits; on trigger stores the bit, sets `also`, and arms a write.
    Intent {
        /// Status and intent bits the new value is compared against.
        compare: &'static [FlagBit],
        /// Additional bit set whenever the intent triggers.
        also: Option<FlagBit>,
    },
    /// Write-pending marker. Storing it always clears the paired `sent` bit.
    Request {
        /// Bit recording that the write was issued.
        sent: FlagBit,
    },
}

/// Resolved boolean attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolBinding {
    /// Bit holding the value.
    pub bit: FlagBit,
    /// Setter semantics.
    pub behavior: BoolBehavior,
}

impl BoolBinding {
    pub(crate) const fn plain(bit: FlagBit) -> Self {
        BoolBinding { bit, behavior: BoolBehavior::Plain }
    }

    pub(crate) const fn tracked(bit: FlagBit) -> Self {
        BoolBinding { bit, behavior: BoolBehavior::StateChange }
    }

    pub(crate) const fn intent(bit: FlagBit, compare: &'static [FlagBit], also: Option<FlagBit>) -> Self {
        BoolBinding { bit, behavior: BoolBehavior::Intent { compare, also } }
    }
}

/// What an integer setter does besides storing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Store only.
    Silent,
    /// Raise the record's state change when the value differs.
    StateChange,
    /// Store, then arm a hardware write through the write-data bit.
    WriteRequest,
}

/// Resolved integer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarBinding<T> {
    /// Field holding the value.
    pub field: Scalar<T>,
    /// Setter semantics.
    pub tracking: Tracking,
}

impl<T> ScalarBinding<T> {
    pub(crate) const fn silent(offset: usize) -> Self {
        ScalarBinding { field: Scalar::at(offset), tracking: Tracking::Silent }
    }

    pub(crate) const fn tracked(offset: usize) -> Self {
        ScalarBinding { field: Scalar::at(offset), tracking: Tracking::StateChange }
    }

    pub(crate) const fn write_request(offset: usize) -> Self {
        ScalarBinding { field: Scalar::at(offset), tracking: Tracking::WriteRequest }
    }
}

/// Resolved byte-string attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringBinding {
    /// Field holding the bytes.
    pub field: ByteField,
    /// A content change counts as a component swap.
    pub swap: bool,
}

impl StringBinding {
    pub(crate) const fn at(offset: usize, len: usize) -> Self {
        StringBinding { field: ByteField::at(offset, len), swap: false }
    }

    pub(crate) const fn serial(offset: usize, len: usize) -> Self {
        StringBinding { field: ByteField::at(offset, len), swap: true }
    }
}

/// Any resolved binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Boolean.
    Bool(BoolBinding),
    /// 8-bit.
    U8(ScalarBinding<u8>),
    /// 16-bit.
    U16(ScalarBinding<u16>),
    /// 32-bit.
    U32(ScalarBinding<u32>),
    /// 64-bit.
    U64(ScalarBinding<u64>),
    /// Byte string.
    String(StringBinding),
}

/// One tier of the attribute chain.
///
/// Every lookup receives the component type and the attribute and returns
/// `None` when this level does not know the pair; [`resolve`] then asks
/// [`AttributeLevel::broader`].
pub trait AttributeLevel {
    /// Enclosure kind served by this level.
    fn kind(&self) -> EnclosureKind;

    /// Next level consulted when this one does not recognize an attribute.
    fn broader(&self) -> Option<&'static dyn AttributeLevel>;

    /// Boolean lookup.
    fn bool_binding(&self, component: ComponentType, attribute: BoolAttribute) -> Option<BoolBinding>;

    /// 8-bit lookup.
    fn u8_binding(&self, component: ComponentType, attribute: U8Attribute) -> Option<ScalarBinding<u8>>;

    /// 16-bit lookup.
    fn u16_binding(&self, _component: ComponentType, _attribute: U16Attribute) -> Option<ScalarBinding<u16>> {
        None
    }

    /// 32-bit lookup.
    fn u32_binding(&self, _component: ComponentType, _attribute: U32Attribute) -> Option<ScalarBinding<u32>> {
        None
    }

    /// 64-bit lookup.
    fn u64_binding(&self, _component: ComponentType, _attribute: U64Attribute) -> Option<ScalarBinding<u64>> {
        None
    }

    /// Byte-string lookup.
    fn string_binding(&self, _component: ComponentType, _attribute: StringAttribute) -> Option<StringBinding> {
        None
    }
}

/// Entry level for `kind`.
pub fn level_for(kind: EnclosureKind) -> &'static dyn AttributeLevel {
    match kind {
        EnclosureKind::Base => &BaseLevel,
        EnclosureKind::Sas => &SasLevel,
        EnclosureKind::Eses => &EsesLevel,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Header attributes shared by every record
// ─────────────────────────────────────────────────────────────────────────────

const fn header(flag: ComponentFlags) -> FlagBit {
    FlagBit::header(flag)
}

const FAULT_LED_COMPARE: &[FlagBit] =
    &[header(ComponentFlags::FAULT_LED_ON), header(ComponentFlags::TURN_ON_FAULT_LED)];
const MARK_COMPARE: &[FlagBit] = &[header(ComponentFlags::MARKED)];

/// Binding of the shared header bit `attribute`, if it is one.
pub fn header_bool(attribute: BoolAttribute) -> Option<BoolBinding> {
    use BoolAttribute as A;
    use ComponentFlags as F;

    let binding = match attribute {
        A::Inserted => BoolBinding::tracked(header(F::INSERTED)),
        A::Faulted => BoolBinding::tracked(header(F::FAULTED)),
        A::PoweredOff => BoolBinding::tracked(header(F::POWERED_OFF)),
        A::FaultLedOn => BoolBinding::tracked(header(F::FAULT_LED_ON)),
        A::TurnOnFaultLed => BoolBinding::intent(header(F::TURN_ON_FAULT_LED), FAULT_LED_COMPARE, None),
        A::Marked => BoolBinding::tracked(header(F::MARKED)),
        A::MarkComponent => BoolBinding::intent(header(F::MARK_COMPONENT), MARK_COMPARE, None),
        A::StateChange => BoolBinding::plain(header(F::STATE_CHANGE)),
        A::WriteData => write_data(),
        A::WriteDataSent => BoolBinding::plain(header(F::WRITE_DATA_SENT)),
        A::EmcEnclCtrlWriteData => BoolBinding {
            bit: header(F::EMC_ENCL_CTRL_WRITE_DATA),
            behavior: BoolBehavior::Request { sent: header(F::EMC_ENCL_CTRL_WRITE_DATA_SENT) },
        },
        A::EmcEnclCtrlWriteDataSent => BoolBinding::plain(header(F::EMC_ENCL_CTRL_WRITE_DATA_SENT)),
        A::StatusValid => BoolBinding::tracked(header(F::STATUS_VALID)),
        A::InsertedPriorConfig => BoolBinding::plain(header(F::INSERTED_PRIOR_CONFIG)),
        _ => return None,
    };
    Some(binding)
}

/// Binding of the shared header byte `attribute`, if it is one.
pub fn header_u8(attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    match attribute {
        U8Attribute::AddlStatus => Some(ScalarBinding::tracked(offset_of!(RecordHeader, addl_status))),
        _ => None,
    }
}

/// The write-data binding used to arm hardware writes.
pub fn write_data() -> BoolBinding {
    BoolBinding {
        bit: header(ComponentFlags::WRITE_DATA),
        behavior: BoolBehavior::Request { sent: header(ComponentFlags::WRITE_DATA_SENT) },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

fn walk<B>(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: AttributeId,
    probe: impl Fn(&dyn AttributeLevel) -> Option<B>,
) -> Result<B, UnsupportedAttributeError> {
    let mut level = Some(level_for(kind));
    while let Some(current) = level {
        if let Some(binding) = probe(current) {
            return Ok(binding);
        }
        level = current.broader();
    }
    debug!("EDAL: {} not supported for {} on {} enclosure", attribute, component, kind);
    Err(UnsupportedAttributeError { component, attribute, kind })
}

/// Resolves a boolean attribute.
pub fn resolve_bool(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: BoolAttribute,
) -> Result<BoolBinding, UnsupportedAttributeError> {
    if let Some(binding) = header_bool(attribute) {
        return Ok(binding);
    }
    walk(kind, component, attribute.into(), |level| level.bool_binding(component, attribute))
}

/// Resolves an 8-bit attribute.
pub fn resolve_u8(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: U8Attribute,
) -> Result<ScalarBinding<u8>, UnsupportedAttributeError> {
    if let Some(binding) = header_u8(attribute) {
        return Ok(binding);
    }
    walk(kind, component, attribute.into(), |level| level.u8_binding(component, attribute))
}

/// Resolves a 16-bit attribute.
pub fn resolve_u16(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: U16Attribute,
) -> Result<ScalarBinding<u16>, UnsupportedAttributeError> {
    walk(kind, component, attribute.into(), |level| level.u16_binding(component, attribute))
}

/// Resolves a 32-bit attribute.
pub fn resolve_u32(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: U32Attribute,
) -> Result<ScalarBinding<u32>, UnsupportedAttributeError> {
    walk(kind, component, attribute.into(), |level| level.u32_binding(component, attribute))
}

/// Resolves a 64-bit attribute.
pub fn resolve_u64(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: U64Attribute,
) -> Result<ScalarBinding<u64>, UnsupportedAttributeError> {
    walk(kind, component, attribute.into(), |level| level.u64_binding(component, attribute))
}

/// Resolves a byte-string attribute.
pub fn resolve_string(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: StringAttribute,
) -> Result<StringBinding, UnsupportedAttributeError> {
    walk(kind, component, attribute.into(), |level| level.string_binding(component, attribute))
}

/// Resolves any attribute to a tagged [`Binding`].
pub fn resolve(
    kind: EnclosureKind,
    component: ComponentType,
    attribute: AttributeId,
) -> Result<Binding, UnsupportedAttributeError> {
    Ok(match attribute {
        AttributeId::Bool(a) => Binding::Bool(resolve_bool(kind, component, a)?),
        AttributeId::U8(a) => Binding::U8(resolve_u8(kind, component, a)?),
        AttributeId::U16(a) => Binding::U16(resolve_u16(kind, component, a)?),
        AttributeId::U32(a) => Binding::U32(resolve_u32(kind, component, a)?),
        AttributeId::U64(a) => Binding::U64(resolve_u64(kind, component, a)?),
        AttributeId::String(a) => Binding::String(resolve_string(kind, component, a)?),
    })
}
