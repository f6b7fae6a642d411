#![allow(dead_code)]

use edal::{
    ComponentType,
    EdalResult,
    EnclosureStore,
    EnclosureType,
    StoreConfig,
};

pub const DRIVES_SMALL: u32 = 15;
pub const DRIVES_MED: u32 = 60;
pub const DRIVES_LARGE: u32 = 120;

/// Component population of a dense drive enclosure.
pub const POPULATION: [(ComponentType, u32); 7] = [
    (ComponentType::PowerSupply, 4),
    (ComponentType::Cooling, 10),
    (ComponentType::TempSensor, 8),
    (ComponentType::Lcc, 2),
    (ComponentType::Connector, 12),
    (ComponentType::ExpanderPhy, 36),
    (ComponentType::Display, 3),
];

pub fn config() -> StoreConfig {
    StoreConfig::for_enclosure(EnclosureType::VikingIosxp)
        .with_block_size(2048)
        .with_max_blocks(64)
}

pub fn setup_store(drive_count: u32) -> EdalResult<EnclosureStore> {
    let mut store = EnclosureStore::new(config())?;
    let size = store.component_size(ComponentType::Drive);
    store.fit_component(ComponentType::Drive, drive_count, size)?;
    for (component, count) in POPULATION {
        let size = store.component_size(component);
        store.fit_component(component, count, size)?;
    }
    Ok(store)
}
