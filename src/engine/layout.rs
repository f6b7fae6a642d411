//! Byte layouts of everything stored inside a block.
//!
//! The store never materializes Rust values for blocks or records. A block is a
//! byte arena, and the structs in this module describe how those bytes are laid
//! out. All of them are [`bytemuck::Pod`], so they can be read from and written
//! to arbitrary (unaligned) offsets of the arena without `unsafe`.
//!
//! # Block
//!
//! ```text
//! +--------------+------------------------------+----------------------------+
//! | BlockHeader  | ComponentDescriptor × max    | records …          | free  |
//! +--------------+------------------------------+----------------------------+
//! ```
//!
//! # Record
//!
//! ```text
//! +--------------+-------------+------------+-------------+
//! | RecordHeader | base fields | sas fields | eses fields |
//! +--------------+-------------+------------+-------------+
//! ```
//!
//! Each specialization level appends its region after the broader level's, so a
//! record laid out for an ESES enclosure is also a valid SAS and base record.
//! Levels that add nothing for a component type have a zero-length region.
//!
//! # Flags
//!
//! Boolean attributes live in `u16` flag words: one in the record header shared
//! by every component ([`ComponentFlags`]) and one per level region where the
//! component has level-specific booleans.

use std::mem::size_of;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::types::{
    RecordSize,
    RECORD_HEADER_SIZE,
    SERIAL_NUMBER_SIZE,
    PRODUCT_ID_SIZE,
    FW_INFO_SIZE,
};


/// Fixed header at offset `0` of every block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct BlockHeader {
    /// Must equal [`crate::engine::types::BLOCK_CANARY`].
    pub canary: u32,
    /// Enclosure type code.
    pub enclosure_type: u8,
    /// Descriptor slots in use.
    pub component_types: u8,
    /// Descriptor-table capacity.
    pub max_component_types: u8,
    /// EDAL locale byte.
    pub locale: u8,
    /// Total size of the block in bytes.
    pub block_size: u32,
    /// Bytes still free for records.
    pub available: u32,
    /// Overall change counter.
    pub overall_state_change_count: u32,
    /// Enclosure configuration generation.
    pub generation_count: u32,
    /// Non-zero when another block follows in the chain.
    pub has_next: u8,
    /// Enclosure side identifier.
    pub side_id: u8,
    /// Reserved, zero.
    pub reserved: [u8; 6],
}

/// One slot of a block's descriptor table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ComponentDescriptor {
    /// Component type code.
    pub component_type: u8,
    /// Aggregate status code.
    pub overall_status: u8,
    /// [`DescriptorFlags`] bits.
    pub flags: u16,
    /// Size of each record of this type.
    pub record_size: u32,
    /// Records of this type stored in this block.
    pub count: u32,
    /// Global index of the first record in this block.
    pub first_index: u32,
    /// Offset from the start of this descriptor to the first record.
    pub records_offset: u32,
    /// Per-type change counter.
    pub state_change_count: u32,
}

/// Header shared by every component record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct RecordHeader {
    /// Must equal [`crate::engine::types::COMPONENT_CANARY`].
    pub canary: u32,
    /// [`ComponentFlags`] bits.
    pub flags: u16,
    /// Additional status byte.
    pub addl_status: u8,
    /// Reserved, zero.
    pub reserved: u8,
    /// Per-record change counter.
    pub state_change_count: u16,
    /// Replacement counter.
    pub swap_count: u16,
}

bitflags! {
    /// Boolean attributes shared by every component record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u16 {
        const INSERTED                      = 1 << 0;
        const FAULTED                       = 1 << 1;
        const POWERED_OFF                   = 1 << 2;
        const FAULT_LED_ON                  = 1 << 3;
        const TURN_ON_FAULT_LED             = 1 << 4;
        const MARKED                        = 1 << 5;
        const MARK_COMPONENT                = 1 << 6;
        const STATE_CHANGE                  = 1 << 7;
        const STATUS_VALID                  = 1 << 8;
        const INSERTED_PRIOR_CONFIG         = 1 << 9;
        const WRITE_DATA                    = 1 << 10;
        const WRITE_DATA_SENT               = 1 << 11;
        const EMC_ENCL_CTRL_WRITE_DATA      = 1 << 12;
        const EMC_ENCL_CTRL_WRITE_DATA_SENT = 1 << 13;
    }
}

bitflags! {
    /// Per-descriptor flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorFlags: u16 {
        const STATE_CHANGE = 1 << 0;
    }
}

bitflags! {
    /// Power supply base booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PowerSupplyFlags: u16 {
        const AC_FAIL     = 1 << 0;
        const DC_DETECTED = 1 << 1;
        const SUPPORTED   = 1 << 2;
    }
}

bitflags! {
    /// Drive slot base booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DriveFlags: u16 {
        const BYPASSED              = 1 << 0;
        const LOGGED_IN             = 1 << 1;
        const INSERT_MASKED         = 1 << 2;
        const BYPASS_DRIVE          = 1 << 3;
        const DEVICE_OFF            = 1 << 4;
        const USER_REQ_POWER_CNTL   = 1 << 5;
        const POWER_CYCLE_PENDING   = 1 << 6;
        const POWER_CYCLE_COMPLETED = 1 << 7;
        const BATTERY_BACKED        = 1 << 8;
    }
}

bitflags! {
    /// Cooling base booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoolingFlags: u16 {
        const MULTI_FAN_FAULT = 1 << 0;
    }
}

bitflags! {
    /// Temperature sensor base booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TempSensorFlags: u16 {
        const OT_WARNING        = 1 << 0;
        const OT_FAILURE        = 1 << 1;
        const TEMPERATURE_VALID = 1 << 2;
    }
}

bitflags! {
    /// LCC base booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LccFlags: u16 {
        const IS_LOCAL     = 1 << 0;
        const FAULT_MASKED = 1 << 1;
    }
}

bitflags! {
    /// Expander phy SAS booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhyFlags: u16 {
        const DISABLED         = 1 << 0;
        const READY            = 1 << 1;
        const LINK_READY       = 1 << 2;
        const FORCE_DISABLED   = 1 << 3;
        const CARRIER_DETECTED = 1 << 4;
        const SPINUP_ENABLED   = 1 << 5;
        const SATA_SPINUP_HOLD = 1 << 6;
        const DISABLE          = 1 << 7;
    }
}

bitflags! {
    /// Connector SAS booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConnectorFlags: u16 {
        const INSERT_MASKED       = 1 << 0;
        const DISABLED            = 1 << 1;
        const PRIMARY_PORT        = 1 << 2;
        const IS_ENTIRE_CONNECTOR = 1 << 3;
        const ILLEGAL_CABLE       = 1 << 4;
        const DEGRADED            = 1 << 5;
        const IS_LOCAL            = 1 << 6;
    }
}

bitflags! {
    /// Enclosure ESES booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EsesEnclosureFlags: u16 {
        const TRACE_PRESENT                         = 1 << 0;
        const PARTIAL_SHUTDOWN                      = 1 << 1;
        const ADDITIONAL_STATUS_PAGE_UNSUPPORTED    = 1 << 2;
        const EMC_SPECIFIC_STATUS_PAGE_UNSUPPORTED  = 1 << 3;
        const MODE_SENSE_UNSUPPORTED                = 1 << 4;
        const MODE_SELECT_UNSUPPORTED               = 1 << 5;
    }
}

bitflags! {
    /// LCC ESES booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EsesLccFlags: u16 {
        const ECB_FAULT = 1 << 0;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Base level
// ─────────────────────────────────────────────────────────────────────────────

/// Power supply base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PowerSupplyBase {
    pub flags: u16,
    pub side_id: u8,
    pub input_power_status: u8,
    pub margin_test_mode: u8,
    pub margin_test_mode_control: u8,
    pub margin_test_results: u8,
    pub input_power: u16,
}

/// Drive slot base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DriveBase {
    pub flags: u16,
    pub comp_type: u8,
    pub slot_number: u8,
    pub device_off_reason: u8,
}

/// Cooling base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CoolingBase {
    pub flags: u16,
    pub subtype: u8,
    pub side_id: u8,
}

/// Temperature sensor base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct TempSensorBase {
    pub flags: u16,
    pub subtype: u8,
    pub side_id: u8,
    pub temperature: u16,
}

/// LCC base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LccBase {
    pub flags: u16,
    pub side_id: u8,
    pub location: u8,
    pub fault_start_timestamp: u64,
}

/// Enclosure base fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct EnclosureBase {
    pub position: u8,
    pub address: u8,
    pub port_number: u8,
    pub side_id: u8,
    pub max_slots: u8,
    pub reset_ride_thru_count: u32,
    pub fault_led_reason: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// SAS level
// ─────────────────────────────────────────────────────────────────────────────

/// Drive slot SAS fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DriveSas {
    pub phy_index: u8,
    pub sas_address: u64,
}

/// Expander phy SAS fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ExpanderPhySas {
    pub flags: u16,
    pub phy_id: u8,
    pub disable_reason: u8,
}

/// Connector SAS fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ConnectorSas {
    pub flags: u16,
    pub phy_index: u8,
    pub connector_id: u8,
    pub connector_type: u8,
    pub exp_sas_address: u64,
    pub attached_sas_address: u64,
}

/// Expander SAS fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ExpanderSas {
    pub side_id: u8,
    pub sas_address: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// ESES level
// ─────────────────────────────────────────────────────────────────────────────

/// Buffer descriptor fields shared by several ESES layouts.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct BufferDescriptor {
    pub bd_buffer_id: u8,
    pub buffer_id_writeable: u8,
    pub buffer_type: u8,
    pub buffer_index: u8,
    pub elog_buffer_id: u8,
    pub act_trc_buffer_id: u8,
}

/// Enclosure ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct EnclosureEses {
    pub flags: u16,
    pub sub_encl_id: u8,
    pub elem_index: u8,
    pub buffer: BufferDescriptor,
    pub lcc_power_cycle_request: u8,
    pub lcc_power_cycle_duration: u8,
    pub lcc_power_cycle_delay: u8,
    pub shutdown_reason: u8,
    pub generation_code: u32,
    pub time_of_last_good_status_page: u64,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
}

/// LCC ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LccEses {
    pub flags: u16,
    pub sub_encl_id: u8,
    pub elem_index: u8,
    pub buffer: BufferDescriptor,
    pub bd_buffer_size: u32,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub product_id: [u8; PRODUCT_ID_SIZE],
    pub fw_info: [u8; FW_INFO_SIZE],
    pub exp_fw_info: [u8; FW_INFO_SIZE],
    pub boot_fw_info: [u8; FW_INFO_SIZE],
    pub init_fw_info: [u8; FW_INFO_SIZE],
    pub fpga_fw_info: [u8; FW_INFO_SIZE],
}

/// Power supply and cooling ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct FruEses {
    pub sub_encl_id: u8,
    pub elem_index: u8,
    pub buffer: BufferDescriptor,
    pub container_index: u8,
    pub bd_buffer_size: u32,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub product_id: [u8; PRODUCT_ID_SIZE],
    pub fw_info: [u8; FW_INFO_SIZE],
}

/// Temperature sensor ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct TempSensorEses {
    pub elem_index: u8,
    pub container_index: u8,
    pub max_temperature: u8,
}

/// Drive slot ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DriveEses {
    pub elem_index: u8,
    pub power_down_count: u8,
}

/// Expander phy ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ExpanderPhyEses {
    pub elem_index: u8,
    pub expander_elem_index: u8,
}

/// Connector ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ConnectorEses {
    pub elem_index: u8,
    pub container_index: u8,
    pub attached_sub_encl_id: u8,
    pub location: u8,
}

/// Display ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DisplayEses {
    pub mode_status: u8,
    pub mode: u8,
    pub character_status: u8,
    pub character: u8,
    pub elem_index: u8,
    pub subtype: u8,
}

/// SPS ESES fields.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SpsEses {
    pub sub_encl_id: u8,
    pub elem_index: u8,
    pub buffer: BufferDescriptor,
    pub container_index: u8,
    pub status: u16,
    pub battime: u16,
    pub ffid: u32,
    pub battery_ffid: u32,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub product_id: [u8; PRODUCT_ID_SIZE],
    pub fw_info: [u8; FW_INFO_SIZE],
    pub secondary_fw_info: [u8; FW_INFO_SIZE],
    pub battery_fw_info: [u8; FW_INFO_SIZE],
}

/// Expander, SSC: element index only.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ElementEses {
    pub elem_index: u8,
}

/// Length of the base-level region for `component`.
pub const fn base_len(component: ComponentType) -> usize {
    match component {
        ComponentType::PowerSupply => size_of::<PowerSupplyBase>(),
        ComponentType::Drive => size_of::<DriveBase>(),
        ComponentType::Cooling => size_of::<CoolingBase>(),
        ComponentType::TempSensor => size_of::<TempSensorBase>(),
        ComponentType::Lcc => size_of::<LccBase>(),
        ComponentType::Enclosure => size_of::<EnclosureBase>(),
        ComponentType::Connector
        | ComponentType::Expander
        | ComponentType::ExpanderPhy
        | ComponentType::Display
        | ComponentType::Sps
        | ComponentType::Ssc => 0,
    }
}

/// Length of the SAS-level region for `component`.
pub const fn sas_len(component: ComponentType) -> usize {
    match component {
        ComponentType::Drive => size_of::<DriveSas>(),
        ComponentType::ExpanderPhy => size_of::<ExpanderPhySas>(),
        ComponentType::Connector => size_of::<ConnectorSas>(),
        ComponentType::Expander => size_of::<ExpanderSas>(),
        _ => 0,
    }
}

/// Length of the ESES-level region for `component`.
pub const fn eses_len(component: ComponentType) -> usize {
    match component {
        ComponentType::Enclosure => size_of::<EnclosureEses>(),
        ComponentType::Lcc => size_of::<LccEses>(),
        ComponentType::PowerSupply | ComponentType::Cooling => size_of::<FruEses>(),
        ComponentType::TempSensor => size_of::<TempSensorEses>(),
        ComponentType::Drive => size_of::<DriveEses>(),
        ComponentType::ExpanderPhy => size_of::<ExpanderPhyEses>(),
        ComponentType::Connector => size_of::<ConnectorEses>(),
        ComponentType::Display => size_of::<DisplayEses>(),
        ComponentType::Sps => size_of::<SpsEses>(),
        ComponentType::Expander | ComponentType::Ssc => size_of::<ElementEses>(),
    }
}

/// Record offset at which `level`'s region for `component` starts.
pub const fn region_start(level: EnclosureKind, component: ComponentType) -> usize {
    let header = RECORD_HEADER_SIZE as usize;
    match level {
        EnclosureKind::Base => header,
        EnclosureKind::Sas => header + base_len(component),
        EnclosureKind::Eses => header + base_len(component) + sas_len(component),
    }
}

/// Smallest record that holds every region up to and including `kind`.
pub const fn record_minimum(kind: EnclosureKind, component: ComponentType) -> RecordSize {
    let end = match kind {
        EnclosureKind::Base => region_start(EnclosureKind::Sas, component),
        EnclosureKind::Sas => region_start(EnclosureKind::Eses, component),
        EnclosureKind::Eses => region_start(EnclosureKind::Eses, component) + eses_len(component),
    };
    end as RecordSize
}

/// Reads a `T` from `bytes` at `offset`, unaligned. `None` if out of bounds.
#[inline]
pub(crate) fn read_pod<T: Pod>(bytes: &[u8], offset: usize) -> Option<T> {
    let end = offset.checked_add(size_of::<T>())?;
    bytes.get(offset..end).map(bytemuck::pod_read_unaligned)
}

/// Writes `value` into `bytes` at `offset`. `None` if out of bounds.
#[inline]
pub(crate) fn write_pod<T: Pod>(bytes: &mut [u8], offset: usize, value: &T) -> Option<()> {
    let end = offset.checked_add(size_of::<T>())?;
    bytes.get_mut(offset..end)?.copy_from_slice(bytemuck::bytes_of(value));
    Some(())
}
