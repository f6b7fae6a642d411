//! SAS-level bindings: phys, connectors and SAS addresses.
//!
//! Anything not recognized here is delegated to [`BaseLevel`].

use std::mem::offset_of;

use crate::engine::attribute::{BoolAttribute, U64Attribute, U8Attribute};
use crate::engine::component::{ComponentType, EnclosureKind};
use crate::engine::dispatch::{AttributeLevel, BaseLevel, BoolBinding, ScalarBinding};
use crate::engine::layout::{
    region_start,
    ConnectorFlags,
    ConnectorSas,
    DriveSas,
    ExpanderPhySas,
    ExpanderSas,
    PhyFlags,
};
use crate::engine::record::FlagBit;


/// SAS enclosures. Falls back to [`BaseLevel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SasLevel;

const fn at(component: ComponentType, offset: usize) -> usize {
    region_start(EnclosureKind::Sas, component) + offset
}

const PHY_FLAGS: usize = at(ComponentType::ExpanderPhy, offset_of!(ExpanderPhySas, flags));
const CONNECTOR_FLAGS: usize = at(ComponentType::Connector, offset_of!(ConnectorSas, flags));

const fn phy(flag: PhyFlags) -> FlagBit {
    FlagBit::at(PHY_FLAGS, flag.bits())
}

const fn connector(flag: ConnectorFlags) -> FlagBit {
    FlagBit::at(CONNECTOR_FLAGS, flag.bits())
}

const PHY_DISABLE_COMPARE: &[FlagBit] = &[phy(PhyFlags::DISABLE)];

impl AttributeLevel for SasLevel {
    fn kind(&self) -> EnclosureKind {
        EnclosureKind::Sas
    }

    fn broader(&self) -> Option<&'static dyn AttributeLevel> {
        Some(&BaseLevel)
    }

    fn bool_binding(&self, component: ComponentType, attribute: BoolAttribute) -> Option<BoolBinding> {
        use BoolAttribute as A;
        use ComponentType as C;

        let binding = match (component, attribute) {
            (C::ExpanderPhy, A::PhyDisabled) => BoolBinding::tracked(phy(PhyFlags::DISABLED)),
            (C::ExpanderPhy, A::PhyReady) => BoolBinding::tracked(phy(PhyFlags::READY)),
            (C::ExpanderPhy, A::PhyLinkReady) => BoolBinding::tracked(phy(PhyFlags::LINK_READY)),
            (C::ExpanderPhy, A::PhyForceDisabled) => BoolBinding::tracked(phy(PhyFlags::FORCE_DISABLED)),
            (C::ExpanderPhy, A::PhyCarrierDetected) => BoolBinding::tracked(phy(PhyFlags::CARRIER_DETECTED)),
            (C::ExpanderPhy, A::PhySpinupEnabled) => BoolBinding::tracked(phy(PhyFlags::SPINUP_ENABLED)),
            (C::ExpanderPhy, A::PhySataSpinupHold) => BoolBinding::tracked(phy(PhyFlags::SATA_SPINUP_HOLD)),
            (C::ExpanderPhy, A::PhyDisable) => BoolBinding::intent(phy(PhyFlags::DISABLE), PHY_DISABLE_COMPARE, None),

            (C::Connector, A::InsertMasked) => BoolBinding::tracked(connector(ConnectorFlags::INSERT_MASKED)),
            (C::Connector, A::ConnectorDisabled) => BoolBinding::tracked(connector(ConnectorFlags::DISABLED)),
            (C::Connector, A::PrimaryPort) => BoolBinding::plain(connector(ConnectorFlags::PRIMARY_PORT)),
            (C::Connector, A::IsEntireConnector) => BoolBinding::plain(connector(ConnectorFlags::IS_ENTIRE_CONNECTOR)),
            (C::Connector, A::IllegalCable) => BoolBinding::tracked(connector(ConnectorFlags::ILLEGAL_CABLE)),
            (C::Connector, A::ConnectorDegraded) => BoolBinding::tracked(connector(ConnectorFlags::DEGRADED)),
            (C::Connector, A::IsLocal) => BoolBinding::plain(connector(ConnectorFlags::IS_LOCAL)),

            _ => return None,
        };
        Some(binding)
    }

    fn u8_binding(&self, component: ComponentType, attribute: U8Attribute) -> Option<ScalarBinding<u8>> {
        use ComponentType as C;
        use U8Attribute as A;

        let binding = match (component, attribute) {
            (C::Drive, A::PhyIndex) => ScalarBinding::silent(at(C::Drive, offset_of!(DriveSas, phy_index))),

            (C::ExpanderPhy, A::PhyId) => ScalarBinding::silent(at(C::ExpanderPhy, offset_of!(ExpanderPhySas, phy_id))),
            (C::ExpanderPhy, A::PhyDisableReason) => {
                ScalarBinding::silent(at(C::ExpanderPhy, offset_of!(ExpanderPhySas, disable_reason)))
            }

            (C::Connector, A::PhyIndex) => ScalarBinding::silent(at(C::Connector, offset_of!(ConnectorSas, phy_index))),
            (C::Connector, A::ConnectorId) => {
                ScalarBinding::silent(at(C::Connector, offset_of!(ConnectorSas, connector_id)))
            }
            (C::Connector, A::ConnectorType) => {
                ScalarBinding::silent(at(C::Connector, offset_of!(ConnectorSas, connector_type)))
            }

            (C::Expander, A::SideId) => ScalarBinding::silent(at(C::Expander, offset_of!(ExpanderSas, side_id))),

            _ => return None,
        };
        Some(binding)
    }

    fn u64_binding(&self, component: ComponentType, attribute: U64Attribute) -> Option<ScalarBinding<u64>> {
        use ComponentType as C;
        use U64Attribute as A;

        let binding = match (component, attribute) {
            (C::Drive, A::DriveSasAddress) => ScalarBinding::tracked(at(C::Drive, offset_of!(DriveSas, sas_address))),
            (C::Connector, A::ExpSasAddress) => {
                ScalarBinding::tracked(at(C::Connector, offset_of!(ConnectorSas, exp_sas_address)))
            }
            (C::Connector, A::AttachedSasAddress) => {
                ScalarBinding::tracked(at(C::Connector, offset_of!(ConnectorSas, attached_sas_address)))
            }
            (C::Expander, A::ExpSasAddress) => ScalarBinding::tracked(at(C::Expander, offset_of!(ExpanderSas, sas_address))),
            _ => return None,
        };
        Some(binding)
    }
}
