//! Error types for block allocation, record addressing and attribute access.
//!
//! This module declares focused, composable error types used across the block
//! chain, the validation layer and the attribute dispatcher. Each error carries
//! enough context to make failures actionable while remaining small and cheap to
//! pass around or convert into the aggregate [`EdalError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g. a
//!   canary mismatch, an index outside a component type's range, a string field
//!   too small for the caller's data).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`EdalError`].
//! * **Distinguishability:** "never initialized" (null references) and
//!   "corrupted" (canary mismatch) are separate variants so recovery logic
//!   upstream can tell them apart.
//!
//! ## Typical flow
//! The chain walk and record validation return [`ValidationError`] or
//! [`LookupError`]; the dispatcher adds [`UnsupportedAttributeError`] and
//! [`SizeMismatchError`]; fitting adds [`FitError`]. Public store operations use
//! `?` to bubble all of them into [`EdalError`].
//!
//! ## Examples
//! Treating "not supported" as an ordinary negative answer while probing:
//! ```ignore
//! match store.get_bool(ComponentType::Drive, BoolAttribute::TracePresent, 0) {
//!     Ok(value) => { /* … */ }
//!     Err(EdalError::UnsupportedAttribute(_)) => { /* this kind of drive has no such field */ }
//!     Err(e) if e.is_corruption() => log::error!("enclosure data corrupted: {e}"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, single-line).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

use crate::engine::attribute::AttributeId;
use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::types::{ComponentCount, ComponentIndex, RecordSize};


/// Result alias used by every public store operation.
pub type EdalResult<T> = Result<T, EdalError>;

/// Returned when the chain cannot provide the space an operation needs.
///
/// Raised by fitting when the combined free space of every block (plus any
/// blocks the store may still append) cannot hold the requested records, and by
/// snapshotting when the destination buffer cannot hold the chain.
///
/// ### Fields
/// * `needed`: Bytes (or records, for fitting) the operation required.
/// * `available`: Bytes (or records) that could actually be provided.
///
/// ### Example
/// ```ignore
/// if capacity < count {
///     return Err(CapacityError { needed: count as u64, available: capacity as u64 }.into());
/// }
/// ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {

    /// Amount the operation required.
    pub needed: u64,

    /// Amount that could be provided.
    pub available: u64,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient resource ({} needed; {} available)",
            self.needed, self.available
        )
    }
}

impl std::error::Error for CapacityError {}

/// Returned when a canary field does not hold its fixed constant.
///
/// ### Fields
/// * `expected`: The constant the canary must hold.
/// * `actual`: The value found in memory.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanaryError {

    /// Expected canary value.
    pub expected: u32,

    /// Value actually stored.
    pub actual: u32,
}

impl fmt::Display for CanaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected canary {:#010x}, found {:#010x}", self.expected, self.actual)
    }
}

impl std::error::Error for CanaryError {}

/// Reference-validity and corruption failures.
///
/// ## Context
/// Produced by the validation layer before any block or record field is read.
/// A failure aborts only the access in question.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {

    /// The chain has no block (never initialized, or already released).
    NullBlock,

    /// The addressed record occupies no bytes.
    NullRecord,

    /// A block header canary was overwritten.
    BlockCorrupt(CanaryError),

    /// A record header canary was overwritten.
    RecordCorrupt(CanaryError),

    /// A field lies beyond the end of its record.
    RecordTooShort {
        /// Bytes the access needed.
        needed: usize,

        /// Bytes the record actually has.
        actual: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NullBlock => f.write_str("null block reference"),
            ValidationError::NullRecord => f.write_str("null component record"),
            ValidationError::BlockCorrupt(e) => write!(f, "invalid block canary: {e}"),
            ValidationError::RecordCorrupt(e) => write!(f, "invalid component canary: {e}"),
            ValidationError::RecordTooShort { needed, actual } => {
                write!(f, "record too short ({needed} bytes needed; {actual} present)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Record lookup failures.
///
/// "Type not present anywhere" and "index outside the type's range" are
/// distinct outcomes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {

    /// No descriptor in any block describes this component type.
    ComponentTypeNotFound(ComponentType),

    /// The type exists but no descriptor range contains the index.
    IndexOutOfRange {
        /// Component type that was addressed.
        component: ComponentType,

        /// Requested global index.
        index: ComponentIndex,

        /// Number of records of the type across the chain.
        count: ComponentCount,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::ComponentTypeNotFound(component) => {
                write!(f, "component type {component} not found")
            }
            LookupError::IndexOutOfRange { component, index, count } => {
                write!(f, "{component} index {index} out of range (count {count})")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Returned when no level of the attribute chain knows an attribute for a
/// component type.
///
/// This is an ordinary outcome of polymorphic probing, not a system fault.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedAttributeError {

    /// Component type that was addressed.
    pub component: ComponentType,

    /// Attribute that was requested.
    pub attribute: AttributeId,

    /// Level the dispatcher entered at.
    pub kind: EnclosureKind,
}

impl fmt::Display for UnsupportedAttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attribute {} not supported for {} on {} enclosure",
            self.attribute, self.component, self.kind
        )
    }
}

impl std::error::Error for UnsupportedAttributeError {}

/// Returned for enclosure type codes the store does not serve.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedEnclosureError {

    /// Offending enclosure type code.
    pub code: u8,
}

impl fmt::Display for UnsupportedEnclosureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enclosure type {} is not supported", self.code)
    }
}

impl std::error::Error for UnsupportedEnclosureError {}

/// Returned when a byte string does not fit the field or buffer it is copied into.
///
/// The bounded copy still happens; this reports that truncation occurred.
///
/// ### Fields
/// * `requested`: Length the caller supplied or asked for.
/// * `capacity`: Length that was actually available.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchError {

    /// Requested length in bytes.
    pub requested: usize,

    /// Available length in bytes.
    pub capacity: usize,
}

impl fmt::Display for SizeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size mismatch ({} requested; capacity {})", self.requested, self.capacity)
    }
}

impl std::error::Error for SizeMismatchError {}

/// Errors raised while fitting component records into the chain.
///
/// ## Notes
/// A failed fit never modifies any block.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {

    /// Not enough space across the chain.
    Capacity(CapacityError),

    /// The block that must hold a descriptor-only entry has no free slot.
    DescriptorTableFull {
        /// Descriptor-table capacity of the block.
        max_component_types: u8,
    },

    /// Record size is below the layout minimum for the enclosure kind.
    InvalidRecordSize {
        /// Component type being fitted.
        component: ComponentType,

        /// Size that was requested.
        size: RecordSize,

        /// Smallest size the layout accepts.
        minimum: RecordSize,
    },

    /// The component type was already fitted into this chain.
    DuplicateComponentType(ComponentType),

    /// A block on the chain failed validation.
    Validation(ValidationError),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::Capacity(e) => write!(f, "{e}"),
            FitError::DescriptorTableFull { max_component_types } => {
                write!(f, "descriptor table full ({max_component_types} slots)")
            }
            FitError::InvalidRecordSize { component, size, minimum } => {
                write!(f, "{component} record size {size} below layout minimum {minimum}")
            }
            FitError::DuplicateComponentType(component) => {
                write!(f, "component type {component} already fitted")
            }
            FitError::Validation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FitError {}

impl From<CapacityError> for FitError {
    fn from(e: CapacityError) -> Self { FitError::Capacity(e) }
}

impl From<ValidationError> for FitError {
    fn from(e: ValidationError) -> Self { FitError::Validation(e) }
}

/// Returned when a store configuration or snapshot header is inconsistent.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError {

    /// What was wrong.
    pub reason: &'static str,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Aggregate error for every public store operation.
///
/// ### Display
/// Human-readable, single-line messages suitable for logs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdalError {

    /// Null reference or canary corruption.
    Validation(ValidationError),

    /// Component type or index not found.
    Lookup(LookupError),

    /// Attribute unknown at every level for the component type.
    UnsupportedAttribute(UnsupportedAttributeError),

    /// Enclosure type not served by the store.
    UnsupportedEnclosure(UnsupportedEnclosureError),

    /// A stored component type code is not recognized.
    UnsupportedComponent(u8),

    /// Not enough space for the operation.
    InsufficientResource(CapacityError),

    /// Byte string truncated by a bounded copy.
    SizeMismatch(SizeMismatchError),

    /// Fitting component records failed.
    Fit(FitError),

    /// Configuration or snapshot header inconsistent.
    Config(ConfigError),

    /// A display character is not an ASCII digit.
    InvalidDisplayCharacter(u8),

    /// A numeric display value does not fit in the display's digits.
    DisplayValueOutOfRange(u32),
}

impl EdalError {
    /// Returns `true` for null-reference and canary failures.
    pub fn is_corruption(&self) -> bool {
        matches!(self, EdalError::Validation(_) | EdalError::Fit(FitError::Validation(_)))
    }

    /// Returns `true` for the ordinary negative outcomes of attribute probing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EdalError::Lookup(_) | EdalError::UnsupportedAttribute(_))
    }
}

impl fmt::Display for EdalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdalError::Validation(e) => write!(f, "{e}"),
            EdalError::Lookup(e) => write!(f, "{e}"),
            EdalError::UnsupportedAttribute(e) => write!(f, "{e}"),
            EdalError::UnsupportedEnclosure(e) => write!(f, "{e}"),
            EdalError::UnsupportedComponent(code) => write!(f, "component type code {code} is not supported"),
            EdalError::InsufficientResource(e) => write!(f, "{e}"),
            EdalError::SizeMismatch(e) => write!(f, "{e}"),
            EdalError::Fit(e) => write!(f, "fit failed: {e}"),
            EdalError::Config(e) => write!(f, "{e}"),
            EdalError::InvalidDisplayCharacter(c) => write!(f, "display character {c:#04x} is not a digit"),
            EdalError::DisplayValueOutOfRange(v) => write!(f, "display value {v} does not fit in the display"),
        }
    }
}

impl std::error::Error for EdalError {}

impl From<ValidationError> for EdalError {
    fn from(e: ValidationError) -> Self { EdalError::Validation(e) }
}

impl From<LookupError> for EdalError {
    fn from(e: LookupError) -> Self { EdalError::Lookup(e) }
}

impl From<UnsupportedAttributeError> for EdalError {
    fn from(e: UnsupportedAttributeError) -> Self { EdalError::UnsupportedAttribute(e) }
}

impl From<UnsupportedEnclosureError> for EdalError {
    fn from(e: UnsupportedEnclosureError) -> Self { EdalError::UnsupportedEnclosure(e) }
}

impl From<CapacityError> for EdalError {
    fn from(e: CapacityError) -> Self { EdalError::InsufficientResource(e) }
}

impl From<SizeMismatchError> for EdalError {
    fn from(e: SizeMismatchError) -> Self { EdalError::SizeMismatch(e) }
}

impl From<FitError> for EdalError {
    fn from(e: FitError) -> Self {
        match e {
            FitError::Validation(v) => EdalError::Validation(v),
            FitError::Capacity(c) => EdalError::InsufficientResource(c),
            other => EdalError::Fit(other),
        }
    }
}

impl From<ConfigError> for EdalError {
    fn from(e: ConfigError) -> Self { EdalError::Config(e) }
}
