use std::sync::Once;

use edal::engine::dispatch::{self, Binding, BoolBehavior, Tracking};
use edal::{
    AttributeId,
    BoolAttribute,
    ComponentType,
    EdalError,
    EnclosureKind,
    EnclosureStore,
    EnclosureType,
    SetOutcome,
    StoreConfig,
    StringAttribute,
    U16Attribute,
    U32Attribute,
    U64Attribute,
    U8Attribute,
    UnsupportedAttributeError,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn store_with(enclosure_type: EnclosureType, components: &[(ComponentType, u32)]) -> EnclosureStore {
    init_logging();
    let mut store = EnclosureStore::new(StoreConfig::for_enclosure(enclosure_type)).expect("store");
    for &(component, count) in components {
        let size = store.component_size(component);
        store.fit_component(component, count, size).expect("fit");
    }
    store
}

#[test]
fn header_attributes_resolve_for_every_component() {
    for component in ComponentType::ALL {
        for kind in [EnclosureKind::Base, EnclosureKind::Sas, EnclosureKind::Eses] {
            assert!(
                dispatch::resolve_bool(kind, component, BoolAttribute::Inserted).is_ok(),
                "{component} on {kind}"
            );
            assert!(dispatch::resolve_u8(kind, component, U8Attribute::AddlStatus).is_ok());
        }
    }
}

#[test]
fn eses_store_falls_back_to_sas_and_base() {
    let mut store = store_with(
        EnclosureType::Viper,
        &[(ComponentType::PowerSupply, 2), (ComponentType::Drive, 4), (ComponentType::Lcc, 1)],
    );

    // base
    assert_eq!(store.set_bool(ComponentType::PowerSupply, BoolAttribute::AcFail, 1, true).unwrap(), SetOutcome::Changed);
    assert!(store.get_bool(ComponentType::PowerSupply, BoolAttribute::AcFail, 1).unwrap());
    assert!(!store.get_bool(ComponentType::PowerSupply, BoolAttribute::AcFail, 0).unwrap());

    // sas
    store.set_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, 3, 0x5000_0970_0000_0001).unwrap();
    assert_eq!(
        store.get_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, 3).unwrap(),
        0x5000_0970_0000_0001
    );

    // eses
    store.set_u8(ComponentType::Drive, U8Attribute::ElemIndex, 2, 17).unwrap();
    assert_eq!(store.get_u8(ComponentType::Drive, U8Attribute::ElemIndex, 2).unwrap(), 17);
    store.set_u32(ComponentType::Lcc, U32Attribute::BdBufferSize, 0, 4096).unwrap();
    assert_eq!(store.get_u32(ComponentType::Lcc, U32Attribute::BdBufferSize, 0).unwrap(), 4096);
}

#[test]
fn base_store_reports_richer_attributes_unsupported() {
    let store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 2), (ComponentType::Lcc, 1)]);

    let err = store.get_u8(ComponentType::Drive, U8Attribute::ElemIndex, 0).unwrap_err();
    assert_eq!(
        err,
        EdalError::UnsupportedAttribute(UnsupportedAttributeError {
            component: ComponentType::Drive,
            attribute: AttributeId::U8(U8Attribute::ElemIndex),
            kind: EnclosureKind::Base,
        })
    );
    assert!(err.is_not_found());

    let err = store.get_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, 0).unwrap_err();
    assert!(matches!(err, EdalError::UnsupportedAttribute(_)), "got {err:?}");

    let mut buffer = [0u8; 16];
    let err = store.get_string(ComponentType::Lcc, StringAttribute::SerialNumber, 0, &mut buffer).unwrap_err();
    assert!(matches!(err, EdalError::UnsupportedAttribute(_)), "got {err:?}");
}

#[test]
fn attribute_unknown_to_component_is_unsupported_everywhere() {
    let err = dispatch::resolve_bool(EnclosureKind::Eses, ComponentType::Cooling, BoolAttribute::BypassDrive).unwrap_err();
    assert_eq!(err.component, ComponentType::Cooling);
    assert_eq!(err.kind, EnclosureKind::Eses);
}

#[test]
fn same_attribute_lives_at_different_offsets_per_component() {
    let side_ps = dispatch::resolve_u8(EnclosureKind::Base, ComponentType::PowerSupply, U8Attribute::SideId).unwrap();
    let side_lcc = dispatch::resolve_u8(EnclosureKind::Base, ComponentType::Lcc, U8Attribute::SideId).unwrap();
    assert_ne!(side_ps.field, side_lcc.field);

    let mut store = store_with(EnclosureType::Base, &[(ComponentType::PowerSupply, 1), (ComponentType::Lcc, 1)]);
    store.set_u8(ComponentType::PowerSupply, U8Attribute::SideId, 0, 1).unwrap();
    store.set_u8(ComponentType::Lcc, U8Attribute::SideId, 0, 0).unwrap();
    assert_eq!(store.get_u8(ComponentType::PowerSupply, U8Attribute::SideId, 0).unwrap(), 1);
    assert_eq!(store.get_u8(ComponentType::Lcc, U8Attribute::SideId, 0).unwrap(), 0);
}

#[test]
fn resolve_tags_binding_by_width() {
    let binding = dispatch::resolve(
        EnclosureKind::Base,
        ComponentType::TempSensor,
        AttributeId::U16(U16Attribute::Temperature),
    )
    .unwrap();
    match binding {
        Binding::U16(scalar) => assert_eq!(scalar.tracking, Tracking::StateChange),
        other => panic!("unexpected binding {other:?}"),
    }

    let binding = dispatch::resolve(
        EnclosureKind::Base,
        ComponentType::Drive,
        AttributeId::Bool(BoolAttribute::DeviceOff),
    )
    .unwrap();
    match binding {
        Binding::Bool(b) => assert!(matches!(b.behavior, BoolBehavior::Intent { also: Some(_), .. })),
        other => panic!("unexpected binding {other:?}"),
    }
}

#[test]
fn scalar_set_reports_changed_only_on_difference() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::TempSensor, 1)]);
    let set = |store: &mut EnclosureStore, value| {
        store.set_u16(ComponentType::TempSensor, U16Attribute::Temperature, 0, value).unwrap()
    };
    assert_eq!(set(&mut store, 42), SetOutcome::Changed);
    assert_eq!(set(&mut store, 42), SetOutcome::Unchanged);
    assert_eq!(set(&mut store, 43), SetOutcome::Changed);
    assert_eq!(store.get_u16(ComponentType::TempSensor, U16Attribute::Temperature, 0).unwrap(), 43);
}

#[test]
fn writes_stay_inside_their_record() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::PowerSupply, 3)]);
    store.set_u16(ComponentType::PowerSupply, U16Attribute::InputPower, 1, 0xFFFF).unwrap();
    store.set_bool(ComponentType::PowerSupply, BoolAttribute::Faulted, 1, true).unwrap();

    for index in [0, 2] {
        assert_eq!(store.get_u16(ComponentType::PowerSupply, U16Attribute::InputPower, index).unwrap(), 0);
        assert!(!store.get_bool(ComponentType::PowerSupply, BoolAttribute::Faulted, index).unwrap());
    }
}

#[test]
fn string_write_truncates_and_reports_mismatch() {
    let mut store = store_with(EnclosureType::Viper, &[(ComponentType::PowerSupply, 1)]);
    let long = [b'A'; 40];
    let err = store.set_string(ComponentType::PowerSupply, StringAttribute::ProductId, 0, &long).unwrap_err();
    assert!(matches!(err, EdalError::SizeMismatch(_)), "got {err:?}");

    let mut buffer = [0u8; 16];
    let copied = store.get_string(ComponentType::PowerSupply, StringAttribute::ProductId, 0, &mut buffer).unwrap();
    assert_eq!(copied, 16);
    assert_eq!(buffer, [b'A'; 16], "truncated value is still stored");
}

#[test]
fn short_string_is_zero_filled() {
    let mut store = store_with(EnclosureType::Viper, &[(ComponentType::Cooling, 1)]);
    store.set_string(ComponentType::Cooling, StringAttribute::ProductId, 0, b"FAN-MODULE-XL").unwrap();
    store.set_string(ComponentType::Cooling, StringAttribute::ProductId, 0, b"FAN").unwrap();

    let mut buffer = [0xAAu8; 16];
    store.get_string(ComponentType::Cooling, StringAttribute::ProductId, 0, &mut buffer).unwrap();
    assert_eq!(&buffer[..3], b"FAN");
    assert!(buffer[3..].iter().all(|b| *b == 0), "tail must be zero-filled: {buffer:?}");
}

#[test]
fn string_read_into_small_buffer_copies_prefix() {
    let mut store = store_with(EnclosureType::Viper, &[(ComponentType::Lcc, 1)]);
    store.set_string(ComponentType::Lcc, StringAttribute::SerialNumber, 0, b"FCNCH0123456789").unwrap();

    let mut buffer = [0u8; 4];
    let err = store.get_string(ComponentType::Lcc, StringAttribute::SerialNumber, 0, &mut buffer).unwrap_err();
    assert!(matches!(err, EdalError::SizeMismatch(_)), "got {err:?}");
    assert_eq!(&buffer, b"FCNC");
}
