//! Base-level bindings: fields every enclosure kind carries.

use std::mem::offset_of;

use crate::engine::attribute::{BoolAttribute, U16Attribute, U32Attribute, U64Attribute, U8Attribute};
use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::dispatch::{AttributeLevel, BoolBinding, ScalarBinding};
use crate::engine::layout::{
    region_start,
    ComponentFlags,
    CoolingBase,
    CoolingFlags,
    DriveBase,
    DriveFlags,
    EnclosureBase,
    LccBase,
    LccFlags,
    PowerSupplyBase,
    PowerSupplyFlags,
    TempSensorBase,
    TempSensorFlags,
};
use crate::engine::record::FlagBit;


/// Broadest level. Every chain walk ends here.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseLevel;

const fn at(component: ComponentType, offset: usize) -> usize {
    region_start(EnclosureKind::Base, component) + offset
}

const PS_FLAGS: usize = at(ComponentType::PowerSupply, offset_of!(PowerSupplyBase, flags));
const DRIVE_FLAGS: usize = at(ComponentType::Drive, offset_of!(DriveBase, flags));
const COOLING_FLAGS: usize = at(ComponentType::Cooling, offset_of!(CoolingBase, flags));
const TEMP_FLAGS: usize = at(ComponentType::TempSensor, offset_of!(TempSensorBase, flags));
const LCC_FLAGS: usize = at(ComponentType::Lcc, offset_of!(LccBase, flags));

const fn drive(flag: DriveFlags) -> FlagBit {
    FlagBit::at(DRIVE_FLAGS, flag.bits())
}

const BYPASS_COMPARE: &[FlagBit] = &[drive(DriveFlags::BYPASSED)];
const DEVICE_OFF_COMPARE: &[FlagBit] =
    &[drive(DriveFlags::DEVICE_OFF), FlagBit::header(ComponentFlags::POWERED_OFF)];

impl AttributeLevel for BaseLevel {
    fn kind(&self) -> EnclosureKind {
        EnclosureKind::Base
    }

    fn broader(&self) -> Option<&'static dyn AttributeLevel> {
        None
    }

    fn bool_binding(&self, component: ComponentType, attribute: BoolAttribute) -> Option<BoolBinding> {
        use BoolAttribute as A;
        use ComponentType as C;

        let binding = match (component, attribute) {
            (C::PowerSupply, A::AcFail) => {
                BoolBinding::tracked(FlagBit::at(PS_FLAGS, PowerSupplyFlags::AC_FAIL.bits()))
            }
            (C::PowerSupply, A::DcDetected) => {
                BoolBinding::tracked(FlagBit::at(PS_FLAGS, PowerSupplyFlags::DC_DETECTED.bits()))
            }
            (C::PowerSupply, A::Supported) => {
                BoolBinding::tracked(FlagBit::at(PS_FLAGS, PowerSupplyFlags::SUPPORTED.bits()))
            }

            (C::Drive, A::Bypassed) => BoolBinding::tracked(drive(DriveFlags::BYPASSED)),
            (C::Drive, A::LoggedIn) => BoolBinding::tracked(drive(DriveFlags::LOGGED_IN)),
            (C::Drive, A::InsertMasked) => BoolBinding::tracked(drive(DriveFlags::INSERT_MASKED)),
            (C::Drive, A::BypassDrive) => BoolBinding::intent(drive(DriveFlags::BYPASS_DRIVE), BYPASS_COMPARE, None),
            (C::Drive, A::DeviceOff) => BoolBinding::intent(
                drive(DriveFlags::DEVICE_OFF),
                DEVICE_OFF_COMPARE,
                Some(drive(DriveFlags::USER_REQ_POWER_CNTL)),
            ),
            (C::Drive, A::UserReqPowerCntl) => BoolBinding::plain(drive(DriveFlags::USER_REQ_POWER_CNTL)),
            (C::Drive, A::PowerCyclePending) => BoolBinding::tracked(drive(DriveFlags::POWER_CYCLE_PENDING)),
            (C::Drive, A::PowerCycleCompleted) => BoolBinding::tracked(drive(DriveFlags::POWER_CYCLE_COMPLETED)),
            (C::Drive, A::BatteryBacked) => BoolBinding::plain(drive(DriveFlags::BATTERY_BACKED)),

            (C::Cooling, A::MultiFanFault) => {
                BoolBinding::tracked(FlagBit::at(COOLING_FLAGS, CoolingFlags::MULTI_FAN_FAULT.bits()))
            }

            (C::TempSensor, A::OtWarning) => {
                BoolBinding::tracked(FlagBit::at(TEMP_FLAGS, TempSensorFlags::OT_WARNING.bits()))
            }
            (C::TempSensor, A::OtFailure) => {
                BoolBinding::tracked(FlagBit::at(TEMP_FLAGS, TempSensorFlags::OT_FAILURE.bits()))
            }
            (C::TempSensor, A::TemperatureValid) => {
                BoolBinding::tracked(FlagBit::at(TEMP_FLAGS, TempSensorFlags::TEMPERATURE_VALID.bits()))
            }

            (C::Lcc, A::IsLocal) => BoolBinding::plain(FlagBit::at(LCC_FLAGS, LccFlags::IS_LOCAL.bits())),
            (C::Lcc, A::FaultMasked) => BoolBinding::tracked(FlagBit::at(LCC_FLAGS, LccFlags::FAULT_MASKED.bits())),

            _ => return None,
        };
        Some(binding)
    }

    fn u8_binding(&self, component: ComponentType, attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
        use ComponentType as C;
        use U8Attribute as A;

        let ps = |offset| at(C::PowerSupply, offset);
        let binding = match (component, attribute) {
            (C::PowerSupply, A::SideId) => ScalarBinding::silent(ps(offset_of!(PowerSupplyBase, side_id))),
            (C::PowerSupply, A::InputPowerStatus) => {
                ScalarBinding::silent(ps(offset_of!(PowerSupplyBase, input_power_status)))
            }
            (C::PowerSupply, A::MarginTestMode) => {
                ScalarBinding::tracked(ps(offset_of!(PowerSupplyBase, margin_test_mode)))
            }
            (C::PowerSupply, A::MarginTestModeControl) => {
                ScalarBinding::write_request(ps(offset_of!(PowerSupplyBase, margin_test_mode_control)))
            }
            (C::PowerSupply, A::MarginTestResults) => {
                ScalarBinding::tracked(ps(offset_of!(PowerSupplyBase, margin_test_results)))
            }

            (C::Drive, A::DriveCompType) => ScalarBinding::silent(at(C::Drive, offset_of!(DriveBase, comp_type))),
            (C::Drive, A::SlotNumber) => ScalarBinding::silent(at(C::Drive, offset_of!(DriveBase, slot_number))),
            (C::Drive, A::DeviceOffReason) => {
                ScalarBinding::silent(at(C::Drive, offset_of!(DriveBase, device_off_reason)))
            }

            (C::Cooling, A::Subtype) => ScalarBinding::silent(at(C::Cooling, offset_of!(CoolingBase, subtype))),
            (C::Cooling, A::SideId) => ScalarBinding::silent(at(C::Cooling, offset_of!(CoolingBase, side_id))),

            (C::TempSensor, A::Subtype) => {
                ScalarBinding::silent(at(C::TempSensor, offset_of!(TempSensorBase, subtype)))
            }
            (C::TempSensor, A::SideId) => {
                ScalarBinding::silent(at(C::TempSensor, offset_of!(TempSensorBase, side_id)))
            }

            (C::Lcc, A::SideId) => ScalarBinding::silent(at(C::Lcc, offset_of!(LccBase, side_id))),
            (C::Lcc, A::Location) => ScalarBinding::silent(at(C::Lcc, offset_of!(LccBase, location))),

            (C::Enclosure, A::Position) => ScalarBinding::silent(at(C::Enclosure, offset_of!(EnclosureBase, position))),
            (C::Enclosure, A::Address) => ScalarBinding::silent(at(C::Enclosure, offset_of!(EnclosureBase, address))),
            (C::Enclosure, A::PortNumber) => {
                ScalarBinding::silent(at(C::Enclosure, offset_of!(EnclosureBase, port_number)))
            }
            (C::Enclosure, A::SideId) => ScalarBinding::silent(at(C::Enclosure, offset_of!(EnclosureBase, side_id))),
            (C::Enclosure, A::MaxSlots) => {
                ScalarBinding::silent(at(C::Enclosure, offset_of!(EnclosureBase, max_slots)))
            }

            _ => return None,
        };
        Some(binding)
    }

    fn u16_binding(&self, component: ComponentType, attribute: U16Attribute) -> Option<ScalarBinding<u16>> {
        match (component, attribute) {
            (ComponentType::PowerSupply, U16Attribute::InputPower) => Some(ScalarBinding::tracked(at(
                ComponentType::PowerSupply,
                offset_of!(PowerSupplyBase, input_power),
            ))),
            (ComponentType::TempSensor, U16Attribute::Temperature) => Some(ScalarBinding::tracked(at(
                ComponentType::TempSensor,
                offset_of!(TempSensorBase, temperature),
            ))),
            _ => None,
        }
    }

    fn u32_binding(&self, component: ComponentType, attribute: U32Attribute) -> Option<ScalarBinding<u32>> {
        match (component, attribute) {
            (ComponentType::Enclosure, U32Attribute::ResetRideThruCount) => Some(ScalarBinding::tracked(at(
                ComponentType::Enclosure,
                offset_of!(EnclosureBase, reset_ride_thru_count),
            ))),
            _ => None,
        }
    }

    fn u64_binding(&self, component: ComponentType, attribute: U64Attribute) -> Option<ScalarBinding<u64>> {
        match (component, attribute) {
            (ComponentType::Lcc, U64Attribute::FaultStartTimestamp) => Some(ScalarBinding::silent(at(
                ComponentType::Lcc,
                offset_of!(LccBase, fault_start_timestamp),
            ))),
            (ComponentType::Enclosure, U64Attribute::FaultLedReason) => Some(ScalarBinding::tracked(at(
                ComponentType::Enclosure,
                offset_of!(EnclosureBase, fault_led_reason),
            ))),
            _ => None,
        }
    }
}
