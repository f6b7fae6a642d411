//! # EDAL
//!
//! Enclosure data-access layer: a block-chained store of fixed-size component
//! records with typed, layered attribute access.
//!
//! ## Design Goals
//! - Fixed-size blocks linked into a chain, each with its own descriptor table
//! - Canary-checked headers so corruption is reported, never read through
//! - Attribute dispatch from ESES to SAS to base enclosure layouts
//! - Explicit change tracking on every tracked write
//!
//! All access goes through [`EnclosureStore`].

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Store

pub use engine::store::{
    ConnectorSelector,
    DisplayType,
    DisplayValue,
    EnclosureStore,
    TempSensorScope,
};

pub use engine::config::StoreConfig;

pub use engine::chain::{
    BlockChain,
    Location,
    Placement,
};

pub use engine::block::Block;

// Identifiers

pub use engine::component::{
    ComponentStatus,
    ComponentType,
    EnclosureKind,
    EnclosureType,
};

pub use engine::attribute::{
    AttributeId,
    BoolAttribute,
    FirmwareTarget,
    StringAttribute,
    U16Attribute,
    U32Attribute,
    U64Attribute,
    U8Attribute,
};

pub use engine::tracking::SetOutcome;

pub use engine::error::{
    CanaryError,
    CapacityError,
    ConfigError,
    EdalError,
    EdalResult,
    FitError,
    LookupError,
    SizeMismatchError,
    UnsupportedAttributeError,
    UnsupportedEnclosureError,
    ValidationError,
};

pub use engine::types::{
    BlockSize,
    ComponentCount,
    ComponentIndex,
    RecordSize,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used store types.
///
/// Import with:
/// ```rust
/// use edal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoolAttribute,
        ComponentType,
        EdalError,
        EdalResult,
        EnclosureStore,
        EnclosureType,
        SetOutcome,
        StoreConfig,
        StringAttribute,
        U16Attribute,
        U32Attribute,
        U64Attribute,
        U8Attribute,
    };
}
