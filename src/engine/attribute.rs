//! Attribute codes, one closed enum per value width.
//!
//! An attribute names a field of a component record. It is meaningful only
//! together with a [`ComponentType`]: `SideId` on a power supply and `SideId` on
//! an LCC live at different offsets, and `SideId` on a display does not exist.
//!
//! Splitting the codes by width makes width mismatches unrepresentable. A
//! `u16` read of a boolean attribute cannot be expressed, so the only negative
//! outcome left for cross-kind access is "not supported for this component".

use std::fmt;

use crate::engine::component::ComponentType;


/// Boolean attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum BoolAttribute {
    // common to every record
    /// Component is physically present.
    Inserted,
    /// Component reports a fault.
    Faulted,
    /// Component is powered off.
    PoweredOff,
    /// Fault LED is currently lit.
    FaultLedOn,
    /// Request to light the fault LED.
    TurnOnFaultLed,
    /// Component is currently marked (identify LED).
    Marked,
    /// Request to mark the component.
    MarkComponent,
    /// Record changed since last observed.
    StateChange,
    /// A hardware write reflecting local changes is pending.
    WriteData,
    /// The pending hardware write has been issued.
    WriteDataSent,
    /// A vendor enclosure-control write is pending.
    EmcEnclCtrlWriteData,
    /// The vendor enclosure-control write has been issued.
    EmcEnclCtrlWriteDataSent,
    /// Status fields of the record are valid.
    StatusValid,
    /// Component was present before the current configuration pass.
    InsertedPriorConfig,

    // base per-component
    /// Component belongs to the local side (LCC, connector).
    IsLocal,
    /// LCC faults are masked.
    FaultMasked,
    /// Power supply AC input failed.
    AcFail,
    /// Power supply DC output detected.
    DcDetected,
    /// Power supply is a supported model.
    Supported,
    /// More than one fan in the cooling module has failed.
    MultiFanFault,
    /// Temperature sensor over-temperature warning.
    OtWarning,
    /// Temperature sensor over-temperature failure.
    OtFailure,
    /// Temperature reading is valid.
    TemperatureValid,
    /// Drive is bypassed.
    Bypassed,
    /// Drive is logged in.
    LoggedIn,
    /// Insertion status is masked (drive, connector).
    InsertMasked,
    /// Request to bypass the drive.
    BypassDrive,
    /// Request to power the drive off.
    DeviceOff,
    /// Drive power control was requested by a user.
    UserReqPowerCntl,
    /// Drive power cycle requested and pending.
    PowerCyclePending,
    /// Drive power cycle finished.
    PowerCycleCompleted,
    /// Drive slot is battery backed.
    BatteryBacked,

    // sas
    /// Phy is disabled.
    PhyDisabled,
    /// Phy is ready.
    PhyReady,
    /// Phy link is ready.
    PhyLinkReady,
    /// Phy was disabled by enclosure firmware.
    PhyForceDisabled,
    /// Phy detects a carrier.
    PhyCarrierDetected,
    /// Phy spin-up is enabled.
    PhySpinupEnabled,
    /// SATA spin-up hold is asserted.
    PhySataSpinupHold,
    /// Request to disable the phy.
    PhyDisable,
    /// Connector is disabled.
    ConnectorDisabled,
    /// Connector is the primary port.
    PrimaryPort,
    /// Record describes the entire connector rather than one lane.
    IsEntireConnector,
    /// An unsupported cable is attached.
    IllegalCable,
    /// Connector is degraded.
    ConnectorDegraded,

    // eses
    /// Enclosure trace buffer present.
    TracePresent,
    /// Enclosure is in partial shutdown.
    PartialShutdown,
    /// Additional status page not supported by firmware.
    AdditionalStatusPageUnsupported,
    /// Vendor status page not supported by firmware.
    EmcSpecificStatusPageUnsupported,
    /// MODE SENSE not supported by firmware.
    ModeSenseUnsupported,
    /// MODE SELECT not supported by firmware.
    ModeSelectUnsupported,
    /// LCC ECB fault.
    EcbFault,
}

impl BoolAttribute {
    /// Every variant, in declaration order.
    pub const ALL: [BoolAttribute; 52] = [
        BoolAttribute::Inserted,
        BoolAttribute::Faulted,
        BoolAttribute::PoweredOff,
        BoolAttribute::FaultLedOn,
        BoolAttribute::TurnOnFaultLed,
        BoolAttribute::Marked,
        BoolAttribute::MarkComponent,
        BoolAttribute::StateChange,
        BoolAttribute::WriteData,
        BoolAttribute::WriteDataSent,
        BoolAttribute::EmcEnclCtrlWriteData,
        BoolAttribute::EmcEnclCtrlWriteDataSent,
        BoolAttribute::StatusValid,
        BoolAttribute::InsertedPriorConfig,
        BoolAttribute::IsLocal,
        BoolAttribute::FaultMasked,
        BoolAttribute::AcFail,
        BoolAttribute::DcDetected,
        BoolAttribute::Supported,
        BoolAttribute::MultiFanFault,
        BoolAttribute::OtWarning,
        BoolAttribute::OtFailure,
        BoolAttribute::TemperatureValid,
        BoolAttribute::Bypassed,
        BoolAttribute::LoggedIn,
        BoolAttribute::InsertMasked,
        BoolAttribute::BypassDrive,
        BoolAttribute::DeviceOff,
        BoolAttribute::UserReqPowerCntl,
        BoolAttribute::PowerCyclePending,
        BoolAttribute::PowerCycleCompleted,
        BoolAttribute::BatteryBacked,
        BoolAttribute::PhyDisabled,
        BoolAttribute::PhyReady,
        BoolAttribute::PhyLinkReady,
        BoolAttribute::PhyForceDisabled,
        BoolAttribute::PhyCarrierDetected,
        BoolAttribute::PhySpinupEnabled,
        BoolAttribute::PhySataSpinupHold,
        BoolAttribute::PhyDisable,
        BoolAttribute::ConnectorDisabled,
        BoolAttribute::PrimaryPort,
        BoolAttribute::IsEntireConnector,
        BoolAttribute::IllegalCable,
        BoolAttribute::ConnectorDegraded,
        BoolAttribute::TracePresent,
        BoolAttribute::PartialShutdown,
        BoolAttribute::AdditionalStatusPageUnsupported,
        BoolAttribute::EmcSpecificStatusPageUnsupported,
        BoolAttribute::ModeSenseUnsupported,
        BoolAttribute::ModeSelectUnsupported,
        BoolAttribute::EcbFault,
    ];
}

/// 8-bit attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum U8Attribute {
    /// Additional status byte kept in every record header.
    AddlStatus,

    // base
    /// Side (A/B) the component belongs to.
    SideId,
    /// LCC location.
    Location,
    /// Power supply input power status.
    InputPowerStatus,
    /// Power supply margin test mode.
    MarginTestMode,
    /// Requested power supply margin test mode.
    MarginTestModeControl,
    /// Power supply margin test results.
    MarginTestResults,
    /// Component subtype (cooling, temp sensor, display).
    Subtype,
    /// Drive component type.
    DriveCompType,
    /// Drive slot number.
    SlotNumber,
    /// Reason code for the last drive power-off.
    DeviceOffReason,
    /// Enclosure position on the bus.
    Position,
    /// Enclosure address.
    Address,
    /// Enclosure port number.
    PortNumber,
    /// Number of drive slots in the enclosure.
    MaxSlots,

    // sas
    /// Expander phy index used by this drive or connector.
    PhyIndex,
    /// Phy identifier on its expander.
    PhyId,
    /// Reason code for a phy disable request.
    PhyDisableReason,
    /// Connector identifier.
    ConnectorId,
    /// Connector type.
    ConnectorType,

    // eses
    /// Sub-enclosure identifier.
    SubEnclId,
    /// Element index in the enclosure-services configuration.
    ElemIndex,
    /// Element index of the expander owning this phy.
    ExpanderElemIndex,
    /// Buffer identifier of the buffer descriptor.
    BdBufferId,
    /// Buffer descriptor writeable flag.
    BufferIdWriteable,
    /// Buffer descriptor type.
    BufferType,
    /// Buffer descriptor index.
    BufferIndex,
    /// Event log buffer identifier.
    ElogBufferId,
    /// Active trace buffer identifier.
    ActTrcBufferId,
    /// Index of the FRU containing the element.
    ContainerIndex,
    /// Sub-enclosure attached through a connector.
    AttachedSubEnclId,
    /// LCC power cycle request.
    LccPowerCycleRequest,
    /// LCC power cycle duration.
    LccPowerCycleDuration,
    /// LCC power cycle delay.
    LccPowerCycleDelay,
    /// Reason code for an enclosure shutdown.
    ShutdownReason,
    /// Drive power-down counter.
    PowerDownCount,
    /// Maximum temperature reported by a sensor.
    MaxTemperature,
    /// Display mode status.
    DisplayModeStatus,
    /// Requested display mode.
    DisplayMode,
    /// Character currently shown.
    DisplayCharacterStatus,
    /// Requested display character.
    DisplayCharacter,
}

impl U8Attribute {
    /// Every variant, in declaration order.
    pub const ALL: [U8Attribute; 41] = [
        U8Attribute::AddlStatus,
        U8Attribute::SideId,
        U8Attribute::Location,
        U8Attribute::InputPowerStatus,
        U8Attribute::MarginTestMode,
        U8Attribute::MarginTestModeControl,
        U8Attribute::MarginTestResults,
        U8Attribute::Subtype,
        U8Attribute::DriveCompType,
        U8Attribute::SlotNumber,
        U8Attribute::DeviceOffReason,
        U8Attribute::Position,
        U8Attribute::Address,
        U8Attribute::PortNumber,
        U8Attribute::MaxSlots,
        U8Attribute::PhyIndex,
        U8Attribute::PhyId,
        U8Attribute::PhyDisableReason,
        U8Attribute::ConnectorId,
        U8Attribute::ConnectorType,
        U8Attribute::SubEnclId,
        U8Attribute::ElemIndex,
        U8Attribute::ExpanderElemIndex,
        U8Attribute::BdBufferId,
        U8Attribute::BufferIdWriteable,
        U8Attribute::BufferType,
        U8Attribute::BufferIndex,
        U8Attribute::ElogBufferId,
        U8Attribute::ActTrcBufferId,
        U8Attribute::ContainerIndex,
        U8Attribute::AttachedSubEnclId,
        U8Attribute::LccPowerCycleRequest,
        U8Attribute::LccPowerCycleDuration,
        U8Attribute::LccPowerCycleDelay,
        U8Attribute::ShutdownReason,
        U8Attribute::PowerDownCount,
        U8Attribute::MaxTemperature,
        U8Attribute::DisplayModeStatus,
        U8Attribute::DisplayMode,
        U8Attribute::DisplayCharacterStatus,
        U8Attribute::DisplayCharacter,
    ];
}

/// 16-bit attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum U16Attribute {
    /// Power supply input power.
    InputPower,
    /// Temperature reading.
    Temperature,
    /// SPS status word.
    SpsStatus,
    /// SPS battery run time.
    SpsBatTime,
}

impl U16Attribute {
    /// Every variant, in declaration order.
    pub const ALL: [U16Attribute; 4] = [
        U16Attribute::InputPower,
        U16Attribute::Temperature,
        U16Attribute::SpsStatus,
        U16Attribute::SpsBatTime,
    ];
}

/// 32-bit attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum U32Attribute {
    /// Enclosure reset ride-through counter.
    ResetRideThruCount,
    /// Enclosure-services configuration generation code.
    GenerationCode,
    /// Size of the buffer behind the buffer descriptor.
    BdBufferSize,
    /// SPS FRU identifier.
    SpsFfid,
    /// SPS battery FRU identifier.
    SpsBatteryFfid,
}

impl U32Attribute {
    /// Every variant, in declaration order.
    pub const ALL: [U32Attribute; 5] = [
        U32Attribute::ResetRideThruCount,
        U32Attribute::GenerationCode,
        U32Attribute::BdBufferSize,
        U32Attribute::SpsFfid,
        U32Attribute::SpsBatteryFfid,
    ];
}

/// 64-bit attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum U64Attribute {
    /// Timestamp of the first LCC fault.
    FaultStartTimestamp,
    /// Bit mask of reasons the enclosure fault LED is lit.
    FaultLedReason,
    /// SAS address of the drive.
    DriveSasAddress,
    /// SAS address of the expander.
    ExpSasAddress,
    /// SAS address attached to a connector.
    AttachedSasAddress,
    /// Time the last good status page was received.
    TimeOfLastGoodStatusPage,
}

impl U64Attribute {
    /// Every variant, in declaration order.
    pub const ALL: [U64Attribute; 6] = [
        U64Attribute::FaultStartTimestamp,
        U64Attribute::FaultLedReason,
        U64Attribute::DriveSasAddress,
        U64Attribute::ExpSasAddress,
        U64Attribute::AttachedSasAddress,
        U64Attribute::TimeOfLastGoodStatusPage,
    ];
}

/// Fixed-capacity byte-string attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum StringAttribute {
    /// Serial number. A content change counts as a component swap.
    SerialNumber,
    /// Product identifier.
    ProductId,
    /// Main firmware revision block.
    FwInfo,
    /// LCC expander firmware revision block.
    ExpFwInfo,
    /// LCC boot loader firmware revision block.
    BootFwInfo,
    /// LCC init string revision block.
    InitFwInfo,
    /// LCC FPGA firmware revision block.
    FpgaFwInfo,
    /// SPS secondary firmware revision block.
    SecondaryFwInfo,
    /// SPS battery firmware revision block.
    BatteryFwInfo,
}

impl StringAttribute {
    /// Every variant, in declaration order.
    pub const ALL: [StringAttribute; 9] = [
        StringAttribute::SerialNumber,
        StringAttribute::ProductId,
        StringAttribute::FwInfo,
        StringAttribute::ExpFwInfo,
        StringAttribute::BootFwInfo,
        StringAttribute::InitFwInfo,
        StringAttribute::FpgaFwInfo,
        StringAttribute::SecondaryFwInfo,
        StringAttribute::BatteryFwInfo,
    ];
}

/// Any attribute, tagged with its width. Used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "export", derive(serde::Serialize))]
pub enum AttributeId {
    /// Boolean attribute.
    Bool(BoolAttribute),
    /// 8-bit attribute.
    U8(U8Attribute),
    /// 16-bit attribute.
    U16(U16Attribute),
    /// 32-bit attribute.
    U32(U32Attribute),
    /// 64-bit attribute.
    U64(U64Attribute),
    /// Byte-string attribute.
    String(StringAttribute),
}

impl AttributeId {
    /// Every attribute of every width.
    pub fn all() -> impl Iterator<Item = AttributeId> {
        let bools = BoolAttribute::ALL.into_iter().map(AttributeId::Bool);
        let bytes = U8Attribute::ALL.into_iter().map(AttributeId::U8);
        let words = U16Attribute::ALL.into_iter().map(AttributeId::U16);
        let dwords = U32Attribute::ALL.into_iter().map(AttributeId::U32);
        let qwords = U64Attribute::ALL.into_iter().map(AttributeId::U64);
        let strings = StringAttribute::ALL.into_iter().map(AttributeId::String);
        bools.chain(bytes).chain(words).chain(dwords).chain(qwords).chain(strings)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeId::Bool(a) => write!(f, "{a:?}"),
            AttributeId::U8(a) => write!(f, "{a:?}"),
            AttributeId::U16(a) => write!(f, "{a:?}"),
            AttributeId::U32(a) => write!(f, "{a:?}"),
            AttributeId::U64(a) => write!(f, "{a:?}"),
            AttributeId::String(a) => write!(f, "{a:?}"),
        }
    }
}

macro_rules! impl_attribute_id {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for AttributeId {
                fn from(attribute: $ty) -> Self { AttributeId::$variant(attribute) }
            }
        )*
    };
}

impl_attribute_id!(
    BoolAttribute => Bool,
    U8Attribute => U8,
    U16Attribute => U16,
    U32Attribute => U32,
    U64Attribute => U64,
    StringAttribute => String,
);

/// Firmware upgrade targets and the record field holding their revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirmwareTarget {
    /// LCC expander firmware.
    LccExpander,
    /// LCC boot loader.
    LccBootLoader,
    /// LCC init string.
    LccInitString,
    /// LCC FPGA image.
    LccFpga,
    /// LCC main image.
    LccMain,
    /// Power supply firmware.
    PowerSupply,
    /// Cooling module firmware.
    Cooling,
    /// SPS primary firmware.
    SpsPrimary,
    /// SPS secondary firmware.
    SpsSecondary,
    /// SPS battery firmware.
    SpsBattery,
}

impl FirmwareTarget {
    /// Component type and byte-string attribute holding this target's revision.
    pub const fn component_attribute(self) -> (ComponentType, StringAttribute) {
        match self {
            FirmwareTarget::LccExpander => (ComponentType::Lcc, StringAttribute::ExpFwInfo),
            FirmwareTarget::LccBootLoader => (ComponentType::Lcc, StringAttribute::BootFwInfo),
            FirmwareTarget::LccInitString => (ComponentType::Lcc, StringAttribute::InitFwInfo),
            FirmwareTarget::LccFpga => (ComponentType::Lcc, StringAttribute::FpgaFwInfo),
            FirmwareTarget::LccMain => (ComponentType::Lcc, StringAttribute::FwInfo),
            FirmwareTarget::PowerSupply => (ComponentType::PowerSupply, StringAttribute::FwInfo),
            FirmwareTarget::Cooling => (ComponentType::Cooling, StringAttribute::FwInfo),
            FirmwareTarget::SpsPrimary => (ComponentType::Sps, StringAttribute::FwInfo),
            FirmwareTarget::SpsSecondary => (ComponentType::Sps, StringAttribute::SecondaryFwInfo),
            FirmwareTarget::SpsBattery => (ComponentType::Sps, StringAttribute::BatteryFwInfo),
        }
    }
}
