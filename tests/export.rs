use std::sync::Once;

use edal::engine::snapshot::{AttributeExport, AttributeValue};
use edal::{
    AttributeId,
    BoolAttribute,
    ComponentStatus,
    ComponentType,
    EnclosureStore,
    EnclosureType,
    StoreConfig,
    StringAttribute,
    U8Attribute,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn store() -> EnclosureStore {
    init_logging();
    let config = StoreConfig::for_enclosure(EnclosureType::Ancho).with_side_id(1);
    let mut store = EnclosureStore::new(config).unwrap();
    for (component, count) in [(ComponentType::Lcc, 2), (ComponentType::Cooling, 3)] {
        let size = store.component_size(component);
        store.fit_component(component, count, size).unwrap();
    }
    store
}

#[test]
fn export_describes_descriptors_and_record_headers() {
    let mut store = store();
    store.set_string(ComponentType::Lcc, StringAttribute::SerialNumber, 1, b"LCC-B").unwrap();
    store.set_bool(ComponentType::Cooling, BoolAttribute::TurnOnFaultLed, 0, true).unwrap();
    store.check_for_write_data().unwrap();

    let export = store.export().unwrap();
    assert_eq!(export.enclosure_type, EnclosureType::Ancho);
    assert_eq!(export.side_id, 1);
    assert_eq!(export.blocks.len(), 1);

    let descriptors = &export.blocks[0].descriptors;
    assert_eq!(descriptors.len(), 2);

    let lcc = &descriptors[0];
    assert_eq!(lcc.component_type, ComponentType::Lcc);
    assert_eq!(lcc.records.len(), 2);
    assert_eq!(lcc.records[1].swap_count, 1);
    assert_eq!(lcc.records[0].swap_count, 0);
    assert!(lcc.state_change);

    let cooling = &descriptors[1];
    assert_eq!(cooling.overall_status, ComponentStatus::WriteNeeded);
    assert_eq!(cooling.records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn export_serializes_to_json() {
    let store = store();
    let value = serde_json::to_value(store.export().unwrap()).unwrap();

    assert_eq!(value["enclosure_type"], "Ancho");
    assert_eq!(value["blocks"][0]["descriptors"][1]["component_type"], "Cooling");
    assert_eq!(value["blocks"][0]["descriptors"][1]["overall_status"], "Ok");
    assert_eq!(value["blocks"][0]["descriptors"][1]["records"].as_array().map(Vec::len), Some(3));
}

#[test]
fn export_carries_component_specific_attributes() {
    let mut store = store();
    store.set_string(ComponentType::Lcc, StringAttribute::SerialNumber, 1, b"LCC-B").unwrap();
    store.set_u8(ComponentType::Lcc, U8Attribute::SideId, 1, 1).unwrap();
    store.set_bool(ComponentType::Cooling, BoolAttribute::MultiFanFault, 2, true).unwrap();

    let export = store.export().unwrap();
    let lcc = &export.blocks[0].descriptors[0].records[1];
    let find = |attributes: &[AttributeExport], attribute: AttributeId| {
        attributes.iter().find(|a| a.attribute == attribute).map(|a| a.value.clone())
    };

    assert_eq!(
        find(&lcc.attributes, StringAttribute::SerialNumber.into()),
        Some(AttributeValue::Bytes(b"LCC-B".to_vec()))
    );
    assert_eq!(find(&lcc.attributes, U8Attribute::SideId.into()), Some(AttributeValue::U8(1)));
    assert_eq!(find(&lcc.attributes, BoolAttribute::PhyDisable.into()), None, "phy bits do not exist on an LCC");

    let fan = &export.blocks[0].descriptors[1].records[2];
    assert_eq!(find(&fan.attributes, BoolAttribute::MultiFanFault.into()), Some(AttributeValue::Bool(true)));
    assert_eq!(find(&fan.attributes, BoolAttribute::Inserted.into()), Some(AttributeValue::Bool(false)));

    let value = serde_json::to_value(&export).unwrap();
    let attributes = &value["blocks"][0]["descriptors"][0]["records"][1]["attributes"];
    assert!(
        attributes
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["attribute"]["String"] == "SerialNumber" && a["value"]["Bytes"][0] == 76),
        "serial number serialized as tagged bytes"
    );
}
