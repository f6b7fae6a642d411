use std::sync::Once;

use edal::engine::record::RecordRef;
use edal::engine::layout::RecordHeader;
use edal::{
    BoolAttribute,
    ComponentStatus,
    ComponentType,
    EdalError,
    EnclosureStore,
    EnclosureType,
    LookupError,
    SetOutcome,
    StoreConfig,
    StringAttribute,
    U16Attribute,
    U8Attribute,
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

fn record_header(store: &EnclosureStore, component: ComponentType, index: u32) -> RecordHeader {
    let location = store.locate(component, index).unwrap();
    let block = store.chain().block(location.block).unwrap();
    RecordRef::new(block.record_bytes(location.range)).unwrap().header().unwrap()
}

fn flag(store: &EnclosureStore, component: ComponentType, attribute: BoolAttribute, index: u32) -> bool {
    store.get_bool(component, attribute, index).unwrap()
}

#[test]
fn fault_led_intent_arms_write_once() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 4)]);
    let drive = ComponentType::Drive;

    store.set_bool(drive, BoolAttribute::WriteDataSent, 2, true).unwrap();
    let outcome = store.set_bool(drive, BoolAttribute::TurnOnFaultLed, 2, true).unwrap();
    assert_eq!(outcome, SetOutcome::Changed);
    assert!(flag(&store, drive, BoolAttribute::TurnOnFaultLed, 2));
    assert!(flag(&store, drive, BoolAttribute::WriteData, 2), "write must be armed");
    assert!(!flag(&store, drive, BoolAttribute::WriteDataSent, 2), "sent flag must be cleared");

    // Hardware acknowledged: LED is on, write issued.
    store.set_bool(drive, BoolAttribute::FaultLedOn, 2, true).unwrap();
    store.set_bool(drive, BoolAttribute::WriteData, 2, false).unwrap();

    let outcome = store.set_bool(drive, BoolAttribute::TurnOnFaultLed, 2, true).unwrap();
    assert_eq!(outcome, SetOutcome::Unchanged);
    assert!(!flag(&store, drive, BoolAttribute::WriteData, 2), "write must not be re-armed");
}

#[test]
fn mark_intent_compares_against_marked_status() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::PowerSupply, 1)]);
    let ps = ComponentType::PowerSupply;

    assert_eq!(store.set_bool(ps, BoolAttribute::MarkComponent, 0, false).unwrap(), SetOutcome::Unchanged);
    assert!(!flag(&store, ps, BoolAttribute::WriteData, 0));

    assert_eq!(store.set_bool(ps, BoolAttribute::MarkComponent, 0, true).unwrap(), SetOutcome::Changed);
    assert!(flag(&store, ps, BoolAttribute::WriteData, 0));
}

#[test]
fn device_off_also_requests_power_control() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 1)]);
    let drive = ComponentType::Drive;

    assert_eq!(store.set_bool(drive, BoolAttribute::DeviceOff, 0, true).unwrap(), SetOutcome::Changed);
    assert!(flag(&store, drive, BoolAttribute::UserReqPowerCntl, 0));
    assert!(flag(&store, drive, BoolAttribute::WriteData, 0));
}

#[test]
fn bypass_intent_follows_bypassed_status() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 1)]);
    let drive = ComponentType::Drive;

    store.set_bool(drive, BoolAttribute::Bypassed, 0, true).unwrap();
    store.set_bool(drive, BoolAttribute::WriteData, 0, false).unwrap();
    assert_eq!(store.set_bool(drive, BoolAttribute::BypassDrive, 0, true).unwrap(), SetOutcome::Unchanged);
    assert_eq!(store.set_bool(drive, BoolAttribute::BypassDrive, 0, false).unwrap(), SetOutcome::Changed);
}

#[test]
fn margin_test_control_arms_write_on_change() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::PowerSupply, 1)]);
    let ps = ComponentType::PowerSupply;

    assert_eq!(store.set_u8(ps, U8Attribute::MarginTestModeControl, 0, 3).unwrap(), SetOutcome::Changed);
    assert!(flag(&store, ps, BoolAttribute::WriteData, 0));
    assert_eq!(store.set_u8(ps, U8Attribute::MarginTestModeControl, 0, 3).unwrap(), SetOutcome::Unchanged);

    assert_eq!(
        store.set_u8(ps, U8Attribute::MarginTestModeControl, 0, 5).unwrap(),
        SetOutcome::Changed,
        "a new value is a change even with a write already pending"
    );
    assert_eq!(store.get_u8(ps, U8Attribute::MarginTestModeControl, 0).unwrap(), 5);
    assert!(flag(&store, ps, BoolAttribute::WriteData, 0));
}

#[test]
fn write_data_clears_sent_flag() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Cooling, 1)]);
    let fan = ComponentType::Cooling;

    store.set_bool(fan, BoolAttribute::EmcEnclCtrlWriteDataSent, 0, true).unwrap();
    store.set_bool(fan, BoolAttribute::EmcEnclCtrlWriteData, 0, true).unwrap();
    assert!(!flag(&store, fan, BoolAttribute::EmcEnclCtrlWriteDataSent, 0));

    store.set_bool(fan, BoolAttribute::WriteDataSent, 0, true).unwrap();
    store.set_bool(fan, BoolAttribute::WriteData, 0, false).unwrap();
    assert!(!flag(&store, fan, BoolAttribute::WriteDataSent, 0));
}

#[test]
fn tracked_set_raises_state_change_exactly_on_difference() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::TempSensor, 2)]);
    let sensor = ComponentType::TempSensor;

    store.set_bool(sensor, BoolAttribute::OtWarning, 1, false).unwrap();
    assert_eq!(record_header(&store, sensor, 1).state_change_count, 0, "no-op write must not count");
    assert!(!flag(&store, sensor, BoolAttribute::StateChange, 1));

    store.set_bool(sensor, BoolAttribute::OtWarning, 1, true).unwrap();
    store.set_u16(sensor, U16Attribute::Temperature, 1, 55).unwrap();
    assert_eq!(record_header(&store, sensor, 1).state_change_count, 2);
    assert!(flag(&store, sensor, BoolAttribute::StateChange, 1));
    assert!(!flag(&store, sensor, BoolAttribute::StateChange, 0));
    assert_eq!(store.component_state_change_count(sensor).unwrap(), 2);
}

#[test]
fn setting_state_change_does_not_retrigger_itself() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Lcc, 1)]);
    let lcc = ComponentType::Lcc;

    store.set_bool(lcc, BoolAttribute::StateChange, 0, true).unwrap();
    assert!(flag(&store, lcc, BoolAttribute::StateChange, 0));
    assert_eq!(record_header(&store, lcc, 0).state_change_count, 0);
    assert_eq!(store.component_state_change_count(lcc).unwrap(), 0);
}

#[test]
fn silent_fields_do_not_raise_state_change() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 1)]);
    store.set_u8(ComponentType::Drive, U8Attribute::SlotNumber, 0, 9).unwrap();
    assert_eq!(record_header(&store, ComponentType::Drive, 0).state_change_count, 0);
}

#[test]
fn identical_serial_does_not_count_as_swap() {
    let mut store = store_with(EnclosureType::Viper, &[(ComponentType::PowerSupply, 2)]);
    let ps = ComponentType::PowerSupply;

    store.set_string(ps, StringAttribute::SerialNumber, 1, b"AC1234567890").unwrap();
    let swaps = record_header(&store, ps, 1).swap_count;
    assert_eq!(swaps, 1);

    let outcome = store.set_string(ps, StringAttribute::SerialNumber, 1, b"AC1234567890").unwrap();
    assert_eq!(outcome, SetOutcome::Unchanged);
    assert_eq!(record_header(&store, ps, 1).swap_count, swaps, "identical content is not a swap");

    let outcome = store.set_string(ps, StringAttribute::SerialNumber, 1, b"AC0000000001").unwrap();
    assert_eq!(outcome, SetOutcome::Changed);
    assert_eq!(record_header(&store, ps, 1).swap_count, swaps + 1);
    assert!(flag(&store, ps, BoolAttribute::StateChange, 1));
}

#[test]
fn non_serial_strings_are_not_swaps() {
    let mut store = store_with(EnclosureType::Viper, &[(ComponentType::Lcc, 1)]);
    store.set_string(ComponentType::Lcc, StringAttribute::FwInfo, 0, b"1.42").unwrap();
    assert_eq!(record_header(&store, ComponentType::Lcc, 0).swap_count, 0);
}

#[test]
fn clear_state_changes_resets_records_and_descriptors() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::PowerSupply, 2), (ComponentType::Cooling, 2)]);
    store.set_bool(ComponentType::PowerSupply, BoolAttribute::AcFail, 0, true).unwrap();
    store.set_bool(ComponentType::Cooling, BoolAttribute::MultiFanFault, 1, true).unwrap();

    store.clear_state_changes().unwrap();

    assert!(!flag(&store, ComponentType::PowerSupply, BoolAttribute::StateChange, 0));
    assert!(!flag(&store, ComponentType::Cooling, BoolAttribute::StateChange, 1));
    assert_eq!(record_header(&store, ComponentType::PowerSupply, 0).state_change_count, 1, "counters survive");
    assert!(flag(&store, ComponentType::PowerSupply, BoolAttribute::AcFail, 0));
}

#[test]
fn check_for_write_data_marks_pending_types() {
    let mut store = store_with(EnclosureType::Base, &[(ComponentType::Drive, 3), (ComponentType::Cooling, 1)]);
    assert!(!store.check_for_write_data().unwrap());

    store.set_bool(ComponentType::Drive, BoolAttribute::TurnOnFaultLed, 2, true).unwrap();
    assert!(store.check_for_write_data().unwrap());
    assert_eq!(store.component_overall_status(ComponentType::Drive).unwrap(), ComponentStatus::WriteNeeded);
    assert_eq!(store.component_overall_status(ComponentType::Cooling).unwrap(), ComponentStatus::Ok);
}

#[test]
fn overall_status_applies_to_every_descriptor() {
    init_logging();
    let config = StoreConfig::for_enclosure(EnclosureType::Base).with_block_size(512).with_max_component_types(2);
    let mut store = EnclosureStore::new(config).unwrap();
    store.fit_component(ComponentType::Drive, 40, 32).unwrap();
    assert!(store.block_count() > 1);

    store.set_component_overall_status(ComponentType::Drive, ComponentStatus::Error).unwrap();
    for block in store.chain().iter() {
        let (_, descriptor) = block.find_descriptor(ComponentType::Drive).unwrap().unwrap();
        assert_eq!(ComponentStatus::from_code(descriptor.overall_status), ComponentStatus::Error);
    }

    let err = store.set_component_overall_status(ComponentType::Sps, ComponentStatus::Ok).unwrap_err();
    assert_eq!(err, EdalError::Lookup(LookupError::ComponentTypeNotFound(ComponentType::Sps)));
}

#[test]
fn counters_propagate_to_every_block() {
    init_logging();
    let config = StoreConfig::for_enclosure(EnclosureType::Base).with_block_size(512).with_max_component_types(2);
    let mut store = EnclosureStore::new(config).unwrap();
    store.fit_component(ComponentType::Drive, 40, 32).unwrap();

    store.increment_overall_state_change().unwrap();
    store.increment_component_state_change(ComponentType::Drive).unwrap();
    assert_eq!(store.increment_generation_count().unwrap(), 1);

    for block in store.chain().iter() {
        let header = block.header().unwrap();
        assert_eq!(header.overall_state_change_count, 1);
        assert_eq!(header.generation_count, 1);
    }
    assert_eq!(store.overall_state_change_count().unwrap(), 1);
    assert_eq!(store.component_state_change_count(ComponentType::Drive).unwrap(), store.block_count() as u32);
}
