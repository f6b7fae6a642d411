//! ESES-level bindings: element indices, buffer descriptors, resume data and
//! firmware revisions.
//!
//! Anything not recognized here is delegated to [`SasLevel`].

use std::mem::offset_of;

use crate::engine::attribute::{
    BoolAttribute,
    StringAttribute,
    U16Attribute,
    U32Attribute,
    U64Attribute,
    U8Attribute,
};
use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::dispatch::{AttributeLevel, BoolBinding, SasLevel, ScalarBinding, StringBinding};
use crate::engine::layout::{
    region_start,
    BufferDescriptor,
    ConnectorEses,
    DisplayEses,
    DriveEses,
    ElementEses,
    EnclosureEses,
    EsesEnclosureFlags,
    EsesLccFlags,
    ExpanderPhyEses,
    FruEses,
    LccEses,
    SpsEses,
    TempSensorEses,
};
use crate::engine::record::FlagBit;
use crate::engine::types::{FW_INFO_SIZE, PRODUCT_ID_SIZE, SERIAL_NUMBER_SIZE};


/// ESES enclosures. Falls back to [`SasLevel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EsesLevel;

const fn at(component: ComponentType, offset: usize) -> usize {
    region_start(EnclosureKind::Eses, component) + offset
}

const ENCLOSURE_FLAGS: usize = at(ComponentType::Enclosure, offset_of!(EnclosureEses, flags));
const LCC_FLAGS: usize = at(ComponentType::Lcc, offset_of!(LccEses, flags));

const fn enclosure(flag: EsesEnclosureFlags) -> FlagBit {
    FlagBit::at(ENCLOSURE_FLAGS, flag.bits())
}

/// Buffer-descriptor byte `attribute` of a descriptor starting at `buffer`.
fn buffer_u8(component: ComponentType, buffer: usize, attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    let field = match attribute {
        U8Attribute::BdBufferId => offset_of!(BufferDescriptor, bd_buffer_id),
        U8Attribute::BufferIdWriteable => offset_of!(BufferDescriptor, buffer_id_writeable),
        U8Attribute::BufferType => offset_of!(BufferDescriptor, buffer_type),
        U8Attribute::BufferIndex => offset_of!(BufferDescriptor, buffer_index),
        U8Attribute::ElogBufferId => offset_of!(BufferDescriptor, elog_buffer_id),
        U8Attribute::ActTrcBufferId => offset_of!(BufferDescriptor, act_trc_buffer_id),
        _ => return None,
    };
    Some(ScalarBinding::silent(at(component, buffer + field)))
}

fn enclosure_u8(attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    use U8Attribute as A;
    let c = ComponentType::Enclosure;
    let binding = match attribute {
        A::SubEnclId => ScalarBinding::silent(at(c, offset_of!(EnclosureEses, sub_encl_id))),
        A::ElemIndex => ScalarBinding::silent(at(c, offset_of!(EnclosureEses, elem_index))),
        A::LccPowerCycleRequest => ScalarBinding::silent(at(c, offset_of!(EnclosureEses, lcc_power_cycle_request))),
        A::LccPowerCycleDuration => {
            ScalarBinding::silent(at(c, offset_of!(EnclosureEses, lcc_power_cycle_duration)))
        }
        A::LccPowerCycleDelay => ScalarBinding::silent(at(c, offset_of!(EnclosureEses, lcc_power_cycle_delay))),
        A::ShutdownReason => ScalarBinding::tracked(at(c, offset_of!(EnclosureEses, shutdown_reason))),
        other => return buffer_u8(c, offset_of!(EnclosureEses, buffer), other),
    };
    Some(binding)
}

fn lcc_u8(attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    let c = ComponentType::Lcc;
    match attribute {
        U8Attribute::SubEnclId => Some(ScalarBinding::silent(at(c, offset_of!(LccEses, sub_encl_id)))),
        U8Attribute::ElemIndex => Some(ScalarBinding::silent(at(c, offset_of!(LccEses, elem_index)))),
        other => buffer_u8(c, offset_of!(LccEses, buffer), other),
    }
}

fn fru_u8(c: ComponentType, attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    match attribute {
        U8Attribute::SubEnclId => Some(ScalarBinding::silent(at(c, offset_of!(FruEses, sub_encl_id)))),
        U8Attribute::ElemIndex => Some(ScalarBinding::silent(at(c, offset_of!(FruEses, elem_index)))),
        U8Attribute::ContainerIndex => Some(ScalarBinding::silent(at(c, offset_of!(FruEses, container_index)))),
        other => buffer_u8(c, offset_of!(FruEses, buffer), other),
    }
}

fn sps_u8(attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    let c = ComponentType::Sps;
    match attribute {
        U8Attribute::SubEnclId => Some(ScalarBinding::silent(at(c, offset_of!(SpsEses, sub_encl_id)))),
        U8Attribute::ElemIndex => Some(ScalarBinding::silent(at(c, offset_of!(SpsEses, elem_index)))),
        U8Attribute::ContainerIndex => Some(ScalarBinding::silent(at(c, offset_of!(SpsEses, container_index)))),
        other => buffer_u8(c, offset_of!(SpsEses, buffer), other),
    }
}

fn display_u8(attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
    use U8Attribute as A;
    let c = ComponentType::Display;
    let binding = match attribute {
        A::DisplayModeStatus => ScalarBinding::tracked(at(c, offset_of!(DisplayEses, mode_status))),
        A::DisplayMode => ScalarBinding::write_request(at(c, offset_of!(DisplayEses, mode))),
        A::DisplayCharacterStatus => ScalarBinding::tracked(at(c, offset_of!(DisplayEses, character_status))),
        A::DisplayCharacter => ScalarBinding::write_request(at(c, offset_of!(DisplayEses, character))),
        A::ElemIndex => ScalarBinding::silent(at(c, offset_of!(DisplayEses, elem_index))),
        A::Subtype => ScalarBinding::silent(at(c, offset_of!(DisplayEses, subtype))),
        _ => return None,
    };
    Some(binding)
}

impl AttributeLevel for EsesLevel {
    fn kind(&self) -> EnclosureKind {
        EnclosureKind::Eses
    }

    fn broader(&self) -> Option<&'static dyn AttributeLevel> {
        Some(&SasLevel)
    }

    fn bool_binding(&self, component: ComponentType, attribute: BoolAttribute) -> Option<BoolBinding> {
        use BoolAttribute as A;
        use EsesEnclosureFlags as F;

        let binding = match (component, attribute) {
            (ComponentType::Enclosure, A::TracePresent) => BoolBinding::tracked(enclosure(F::TRACE_PRESENT)),
            (ComponentType::Enclosure, A::PartialShutdown) => BoolBinding::tracked(enclosure(F::PARTIAL_SHUTDOWN)),
            (ComponentType::Enclosure, A::AdditionalStatusPageUnsupported) => {
                BoolBinding::plain(enclosure(F::ADDITIONAL_STATUS_PAGE_UNSUPPORTED))
            }
            (ComponentType::Enclosure, A::EmcSpecificStatusPageUnsupported) => {
                BoolBinding::plain(enclosure(F::EMC_SPECIFIC_STATUS_PAGE_UNSUPPORTED))
            }
            (ComponentType::Enclosure, A::ModeSenseUnsupported) => {
                BoolBinding::plain(enclosure(F::MODE_SENSE_UNSUPPORTED))
            }
            (ComponentType::Enclosure, A::ModeSelectUnsupported) => {
                BoolBinding::plain(enclosure(F::MODE_SELECT_UNSUPPORTED))
            }
            (ComponentType::Lcc, A::EcbFault) => {
                BoolBinding::tracked(FlagBit::at(LCC_FLAGS, EsesLccFlags::ECB_FAULT.bits()))
            }
            _ => return None,
        };
        Some(binding)
    }

    fn u8_binding(&self, component: ComponentType, attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
        use ComponentType as C;
        use U8Attribute as A;

        match component {
            C::Enclosure => enclosure_u8(attribute),
            C::Lcc => lcc_u8(attribute),
            C::PowerSupply | C::Cooling => fru_u8(component, attribute),
            C::Sps => sps_u8(attribute),
            C::Display => display_u8(attribute),
            C::TempSensor => match attribute {
                A::ElemIndex => Some(ScalarBinding::silent(at(component, offset_of!(TempSensorEses, elem_index)))),
                A::ContainerIndex => {
                    Some(ScalarBinding::silent(at(component, offset_of!(TempSensorEses, container_index))))
                }
                A::MaxTemperature => {
                    Some(ScalarBinding::tracked(at(component, offset_of!(TempSensorEses, max_temperature))))
                }
                _ => None,
            },
            C::Drive => match attribute {
                A::ElemIndex => Some(ScalarBinding::silent(at(component, offset_of!(DriveEses, elem_index)))),
                A::PowerDownCount => {
                    Some(ScalarBinding::tracked(at(component, offset_of!(DriveEses, power_down_count))))
                }
                _ => None,
            },
            C::ExpanderPhy => match attribute {
                A::ElemIndex => Some(ScalarBinding::silent(at(component, offset_of!(ExpanderPhyEses, elem_index)))),
                A::ExpanderElemIndex => {
                    Some(ScalarBinding::silent(at(component, offset_of!(ExpanderPhyEses, expander_elem_index))))
                }
                _ => None,
            },
            C::Connector => match attribute {
                A::ElemIndex => Some(ScalarBinding::silent(at(component, offset_of!(ConnectorEses, elem_index)))),
                A::ContainerIndex => {
                    Some(ScalarBinding::silent(at(component, offset_of!(ConnectorEses, container_index))))
                }
                A::AttachedSubEnclId => {
                    Some(ScalarBinding::silent(at(component, offset_of!(ConnectorEses, attached_sub_encl_id))))
                }
                A::Location => Some(ScalarBinding::silent(at(component, offset_of!(ConnectorEses, location)))),
                _ => None,
            },
            C::Expander | C::Ssc => match attribute {
                A::ElemIndex => Some(ScalarBinding::silent(at(component, offset_of!(ElementEses, elem_index)))),
                _ => None,
            },
        }
    }

    fn u16_binding(&self, component: ComponentType, attribute: U16Attribute) -> Option<ScalarBinding<u16>> {
        match (component, attribute) {
            (ComponentType::Sps, U16Attribute::SpsStatus) => {
                Some(ScalarBinding::tracked(at(component, offset_of!(SpsEses, status))))
            }
            (ComponentType::Sps, U16Attribute::SpsBatTime) => {
                Some(ScalarBinding::tracked(at(component, offset_of!(SpsEses, battime))))
            }
            _ => None,
        }
    }

    fn u32_binding(&self, component: ComponentType, attribute: U32Attribute) -> Option<ScalarBinding<u32>> {
        use ComponentType as C;
        use U32Attribute as A;

        let binding = match (component, attribute) {
            (C::Enclosure, A::GenerationCode) => {
                ScalarBinding::silent(at(component, offset_of!(EnclosureEses, generation_code)))
            }
            (C::Lcc, A::BdBufferSize) => ScalarBinding::silent(at(component, offset_of!(LccEses, bd_buffer_size))),
            (C::PowerSupply | C::Cooling, A::BdBufferSize) => {
                ScalarBinding::silent(at(component, offset_of!(FruEses, bd_buffer_size)))
            }
            (C::Sps, A::SpsFfid) => ScalarBinding::silent(at(component, offset_of!(SpsEses, ffid))),
            (C::Sps, A::SpsBatteryFfid) => ScalarBinding::silent(at(component, offset_of!(SpsEses, battery_ffid))),
            _ => return None,
        };
        Some(binding)
    }

    fn u64_binding(&self, component: ComponentType, attribute: U64Attribute) -> Option<ScalarBinding<u64>> {
        match (component, attribute) {
            (ComponentType::Enclosure, U64Attribute::TimeOfLastGoodStatusPage) => Some(ScalarBinding::silent(at(
                component,
                offset_of!(EnclosureEses, time_of_last_good_status_page),
            ))),
            _ => None,
        }
    }

    fn string_binding(&self, component: ComponentType, attribute: StringAttribute) -> Option<StringBinding> {
        use ComponentType as C;
        use StringAttribute as A;

        let fw = |offset| StringBinding::at(at(component, offset), FW_INFO_SIZE);
        let binding = match (component, attribute) {
            (C::Enclosure, A::SerialNumber) => {
                StringBinding::serial(at(component, offset_of!(EnclosureEses, serial_number)), SERIAL_NUMBER_SIZE)
            }

            (C::Lcc, A::SerialNumber) => {
                StringBinding::serial(at(component, offset_of!(LccEses, serial_number)), SERIAL_NUMBER_SIZE)
            }
            (C::Lcc, A::ProductId) => StringBinding::at(at(component, offset_of!(LccEses, product_id)), PRODUCT_ID_SIZE),
            (C::Lcc, A::FwInfo) => fw(offset_of!(LccEses, fw_info)),
            (C::Lcc, A::ExpFwInfo) => fw(offset_of!(LccEses, exp_fw_info)),
            (C::Lcc, A::BootFwInfo) => fw(offset_of!(LccEses, boot_fw_info)),
            (C::Lcc, A::InitFwInfo) => fw(offset_of!(LccEses, init_fw_info)),
            (C::Lcc, A::FpgaFwInfo) => fw(offset_of!(LccEses, fpga_fw_info)),

            (C::PowerSupply | C::Cooling, A::SerialNumber) => {
                StringBinding::serial(at(component, offset_of!(FruEses, serial_number)), SERIAL_NUMBER_SIZE)
            }
            (C::PowerSupply | C::Cooling, A::ProductId) => {
                StringBinding::at(at(component, offset_of!(FruEses, product_id)), PRODUCT_ID_SIZE)
            }
            (C::PowerSupply | C::Cooling, A::FwInfo) => fw(offset_of!(FruEses, fw_info)),

            (C::Sps, A::SerialNumber) => {
                StringBinding::serial(at(component, offset_of!(SpsEses, serial_number)), SERIAL_NUMBER_SIZE)
            }
            (C::Sps, A::ProductId) => StringBinding::at(at(component, offset_of!(SpsEses, product_id)), PRODUCT_ID_SIZE),
            (C::Sps, A::FwInfo) => fw(offset_of!(SpsEses, fw_info)),
            (C::Sps, A::SecondaryFwInfo) => fw(offset_of!(SpsEses, secondary_fw_info)),
            (C::Sps, A::BatteryFwInfo) => fw(offset_of!(SpsEses, battery_fw_info)),

            _ => return None,
        };
        Some(binding)
    }
}
