use std::sync::Once;

use edal::{
    BoolAttribute,
    ComponentType,
    EdalError,
    EnclosureStore,
    EnclosureType,
    StoreConfig,
    StringAttribute,
    U16Attribute,
    U64Attribute,
    U8Attribute,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn populated_store() -> EnclosureStore {
    init_logging();
    let config = StoreConfig::for_enclosure(EnclosureType::Tabasco)
        .with_block_size(512)
        .with_max_component_types(4)
        .with_side_id(1)
        .with_locale(3);
    let mut store = EnclosureStore::new(config).unwrap();
    let drive = store.component_size(ComponentType::Drive);
    store.fit_component(ComponentType::Drive, 25, drive).unwrap();
    let ps = store.component_size(ComponentType::PowerSupply);
    store.fit_component(ComponentType::PowerSupply, 2, ps).unwrap();
    assert!(store.block_count() > 1, "fixture must span several blocks");

    for index in 0..25 {
        store.set_u8(ComponentType::Drive, U8Attribute::SlotNumber, index, index as u8).unwrap();
        store
            .set_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, index, 0x5000_0000_0000_0000 | index as u64)
            .unwrap();
    }
    store.set_bool(ComponentType::Drive, BoolAttribute::Inserted, 24, true).unwrap();
    store.set_u16(ComponentType::PowerSupply, U16Attribute::InputPower, 1, 410).unwrap();
    store.set_string(ComponentType::PowerSupply, StringAttribute::SerialNumber, 1, b"PS0001").unwrap();
    store.set_generation_count(7).unwrap();
    store
}

fn image_of(store: &EnclosureStore) -> Vec<u8> {
    let mut image = vec![0u8; store.image_size()];
    let written = store.copy_block_data(&mut image).unwrap();
    assert_eq!(written, image.len());
    image
}

#[test]
fn round_trip_preserves_every_attribute() {
    let store = populated_store();
    let image = image_of(&store);
    let restored = EnclosureStore::from_snapshot(&image).unwrap();

    assert_eq!(restored.block_count(), store.block_count());
    assert_eq!(restored.enclosure_type().unwrap(), EnclosureType::Tabasco);
    assert_eq!(restored.enclosure_side().unwrap(), 1);
    assert_eq!(restored.locale().unwrap(), 3);
    assert_eq!(restored.generation_count().unwrap(), 7);

    for index in 0..25 {
        assert_eq!(
            restored.get_u8(ComponentType::Drive, U8Attribute::SlotNumber, index).unwrap(),
            index as u8,
            "slot of drive {index}"
        );
        assert_eq!(
            restored.get_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, index).unwrap(),
            store.get_u64(ComponentType::Drive, U64Attribute::DriveSasAddress, index).unwrap()
        );
    }
    assert!(restored.get_bool(ComponentType::Drive, BoolAttribute::Inserted, 24).unwrap());
    assert_eq!(restored.get_u16(ComponentType::PowerSupply, U16Attribute::InputPower, 1).unwrap(), 410);

    let mut serial = [0u8; 16];
    restored.get_string(ComponentType::PowerSupply, StringAttribute::SerialNumber, 1, &mut serial).unwrap();
    assert_eq!(&serial[..6], b"PS0001");

    assert_eq!(image_of(&restored), image, "re-imaging must be byte identical");
}

#[test]
fn truncated_snapshot_keeps_whole_blocks() {
    let store = populated_store();
    let block_size = store.config().block_size as usize;
    let mut image = vec![0u8; block_size + block_size / 2];

    let err = store.copy_block_data(&mut image).unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");

    let partial = EnclosureStore::from_snapshot(&image).unwrap();
    assert_eq!(partial.block_count(), 1, "only the head fits");
    assert_eq!(partial.get_u8(ComponentType::Drive, U8Attribute::SlotNumber, 3).unwrap(), 3);
}

#[test]
fn corrupted_image_is_rejected() {
    let store = populated_store();
    let mut image = image_of(&store);
    image[0] ^= 0xFF;
    let err = EnclosureStore::from_snapshot(&image).unwrap_err();
    assert!(err.is_corruption(), "got {err:?}");

    let image = image_of(&store);
    let err = EnclosureStore::from_snapshot(&image[..image.len() - 1]).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");
}

#[test]
fn backup_copy_mirrors_source() {
    let source = populated_store();
    let mut backup = EnclosureStore::new(*source.config()).unwrap();
    let drive = backup.component_size(ComponentType::Drive);
    backup.fit_component(ComponentType::Drive, 25, drive).unwrap();
    let ps = backup.component_size(ComponentType::PowerSupply);
    backup.fit_component(ComponentType::PowerSupply, 2, ps).unwrap();

    source.copy_backup_data(&mut backup).unwrap();

    assert_eq!(backup.generation_count().unwrap(), 7);
    assert_eq!(backup.get_u8(ComponentType::Drive, U8Attribute::SlotNumber, 20).unwrap(), 20);
    assert_eq!(backup.get_u16(ComponentType::PowerSupply, U16Attribute::InputPower, 1).unwrap(), 410);
}

#[test]
fn backup_with_different_shape_is_rejected() {
    let source = populated_store();
    let mut backup = EnclosureStore::new(*source.config()).unwrap();
    let err = source.copy_backup_data(&mut backup).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");
}
