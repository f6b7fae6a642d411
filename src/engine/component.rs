//! Component and enclosure classification.
//!
//! Every record in the store belongs to exactly one [`ComponentType`], and every
//! store belongs to exactly one [`EnclosureType`]. The enclosure type selects an
//! [`EnclosureKind`], which in turn fixes the entry level of the attribute
//! dispatcher and the record layouts that are valid for the store.
//!
//! All three enums are stored on the wire as single bytes and convert back via
//! `TryFrom<u8>`. Unknown codes are rejected rather than mapped onto a default,
//! so a corrupted header or descriptor never masquerades as a valid type.

use std::fmt;

use crate::engine::error::{EdalError, UnsupportedEnclosureError};


/// Hardware component classes tracked by the store.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum ComponentType {
    /// Power supply.
    PowerSupply = 0,
    /// Drive slot.
    Drive = 1,
    /// Cooling module or fan.
    Cooling = 2,
    /// Temperature sensor.
    TempSensor = 3,
    /// SAS connector (whole connector or individual lane).
    Connector = 4,
    /// SAS expander.
    Expander = 5,
    /// Phy on a SAS expander.
    ExpanderPhy = 6,
    /// The enclosure chassis itself.
    Enclosure = 7,
    /// Link control card.
    Lcc = 8,
    /// Front-panel display character.
    Display = 9,
    /// Standby power supply.
    Sps = 10,
    /// System status card.
    Ssc = 11,
}

impl ComponentType {
    /// All component types in code order.
    pub const ALL: [ComponentType; 12] = [
        ComponentType::PowerSupply,
        ComponentType::Drive,
        ComponentType::Cooling,
        ComponentType::TempSensor,
        ComponentType::Connector,
        ComponentType::Expander,
        ComponentType::ExpanderPhy,
        ComponentType::Enclosure,
        ComponentType::Lcc,
        ComponentType::Display,
        ComponentType::Sps,
        ComponentType::Ssc,
    ];

    /// Wire code of this component type.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentType::PowerSupply => "power supply",
            ComponentType::Drive => "drive",
            ComponentType::Cooling => "cooling",
            ComponentType::TempSensor => "temp sensor",
            ComponentType::Connector => "connector",
            ComponentType::Expander => "expander",
            ComponentType::ExpanderPhy => "expander phy",
            ComponentType::Enclosure => "enclosure",
            ComponentType::Lcc => "lcc",
            ComponentType::Display => "display",
            ComponentType::Sps => "sps",
            ComponentType::Ssc => "ssc",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ComponentType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ComponentType::ALL
            .iter()
            .copied()
            .find(|component| component.code() == code)
            .ok_or(code)
    }
}

/// Specialization level of an enclosure.
///
/// Levels are ordered from broadest to most specific. The attribute dispatcher
/// enters at the store's own kind and falls back toward [`EnclosureKind::Base`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum EnclosureKind {
    /// Attributes every enclosure has.
    Base,
    /// Transport-generic SAS attributes.
    Sas,
    /// SCSI enclosure services dialect attributes.
    Eses,
}

impl EnclosureKind {
    /// Returns `true` if this kind includes every attribute of `other`.
    #[inline]
    pub fn includes(self, other: EnclosureKind) -> bool {
        self >= other
    }
}

impl fmt::Display for EnclosureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnclosureKind::Base => f.write_str("base"),
            EnclosureKind::Sas => f.write_str("sas"),
            EnclosureKind::Eses => f.write_str("eses"),
        }
    }
}

/// Concrete enclosure families recognized by the store.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum EnclosureType {
    /// Generic enclosure carrying base attributes only.
    Base = 1,
    /// Generic SAS enclosure without an enclosure-services dialect.
    Sas = 2,
    /// Processor enclosure. Recognized, but not served by this store.
    Processor = 3,
    /// 15-drive 3.5" DAE.
    Viper = 16,
    /// 25-drive 2.5" DAE.
    Derringer = 17,
    /// 60-drive DAE, ICM side.
    VoyagerIcm = 18,
    /// 60-drive DAE, EE side.
    VoyagerEe = 19,
    /// 120-drive DAE, IO expander.
    VikingIosxp = 20,
    /// 120-drive DAE, drive expander.
    VikingDrvsxp = 21,
    /// 60-drive DAE, IO expander.
    CayenneIosxp = 22,
    /// 60-drive DAE, drive expander.
    CayenneDrvsxp = 23,
    /// 100-drive DAE, IO expander.
    NagaIosxp = 24,
    /// 100-drive DAE, drive expander.
    NagaDrvsxp = 25,
    /// 25-drive 12G DAE.
    Tabasco = 26,
    /// DPE with embedded enclosure services.
    Citadel = 27,
    /// DPE with embedded enclosure services.
    Bunker = 28,
    /// 15-drive 12G DAE.
    Ancho = 29,
    /// 12-drive DPE.
    Pinecone = 30,
    /// 25-drive DPE.
    Steeljaw = 31,
    /// 12-drive DPE.
    Ramhorn = 32,
    /// DPE with embedded enclosure services.
    Calypso = 33,
    /// DPE with embedded enclosure services.
    Miranda = 34,
    /// DPE with embedded enclosure services.
    Rhea = 35,
    /// Degraded-mode enclosure served through the fallback dialect.
    Fallback = 36,
}

impl EnclosureType {
    const ALL: [EnclosureType; 24] = [
        EnclosureType::Base,
        EnclosureType::Sas,
        EnclosureType::Processor,
        EnclosureType::Viper,
        EnclosureType::Derringer,
        EnclosureType::VoyagerIcm,
        EnclosureType::VoyagerEe,
        EnclosureType::VikingIosxp,
        EnclosureType::VikingDrvsxp,
        EnclosureType::CayenneIosxp,
        EnclosureType::CayenneDrvsxp,
        EnclosureType::NagaIosxp,
        EnclosureType::NagaDrvsxp,
        EnclosureType::Tabasco,
        EnclosureType::Citadel,
        EnclosureType::Bunker,
        EnclosureType::Ancho,
        EnclosureType::Pinecone,
        EnclosureType::Steeljaw,
        EnclosureType::Ramhorn,
        EnclosureType::Calypso,
        EnclosureType::Miranda,
        EnclosureType::Rhea,
        EnclosureType::Fallback,
    ];

    /// Wire code of this enclosure type.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Resolves the specialization level served for this enclosure type.
    ///
    /// # Errors
    /// Returns [`EdalError::UnsupportedEnclosure`] for enclosure types this
    /// store does not serve.
    pub fn kind(self) -> Result<EnclosureKind, EdalError> {
        match self {
            EnclosureType::Base => Ok(EnclosureKind::Base),
            EnclosureType::Sas => Ok(EnclosureKind::Sas),
            EnclosureType::Processor => Err(UnsupportedEnclosureError { code: self.code() }.into()),
            _ => Ok(EnclosureKind::Eses),
        }
    }
}

impl TryFrom<u8> for EnclosureType {
    type Error = EdalError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        EnclosureType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| UnsupportedEnclosureError { code }.into())
    }
}

/// Aggregate status kept per component-type descriptor.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum ComponentStatus {
    /// Nothing outstanding.
    #[default]
    Ok = 0,
    /// At least one record of the type has an unsent hardware write.
    WriteNeeded = 1,
    /// Status processing for the type failed upstream.
    Error = 2,
}

impl ComponentStatus {
    /// Decodes a stored status byte. Unknown values decode as [`ComponentStatus::Error`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ComponentStatus::Ok,
            1 => ComponentStatus::WriteNeeded,
            _ => ComponentStatus::Error,
        }
    }
}
