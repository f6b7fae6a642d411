use std::sync::Once;

use edal::engine::block::Block;
use edal::engine::chain::{BlockChain, Placement};
use edal::engine::types::{BLOCK_HEADER_SIZE, DESCRIPTOR_SIZE, RECORD_HEADER_SIZE};
use edal::{
    ComponentType,
    EdalError,
    EnclosureStore,
    EnclosureType,
    FitError,
    LookupError,
    StoreConfig,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn five_slot_store(max_blocks: usize) -> EnclosureStore {
    init_logging();
    let config = StoreConfig::for_enclosure(EnclosureType::Base)
        .with_block_size(4096)
        .with_max_component_types(5)
        .with_max_blocks(max_blocks);
    EnclosureStore::new(config).expect("store")
}

#[test]
fn fresh_block_reserves_header_and_descriptor_table() {
    init_logging();
    let block = Block::new(4096, EnclosureType::Base, 5, 0).unwrap();
    let expected = 4096 - BLOCK_HEADER_SIZE - 5 * DESCRIPTOR_SIZE;
    assert_eq!(block.available().unwrap(), expected, "remaining capacity formula");
    assert_eq!(block.header().unwrap().component_types, 0);
}

#[test]
fn block_too_small_for_its_table_is_rejected() {
    init_logging();
    let err = Block::new(64, EnclosureType::Base, 16, 0).unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");
}

#[test]
fn power_supplies_spill_into_second_block() {
    let mut store = five_slot_store(2);

    let drives = store.fit_component(ComponentType::Drive, 8, 443).unwrap();
    assert_eq!(drives, vec![Placement { block: 0, first_index: 0, count: 8 }]);
    assert_eq!(store.block_count(), 1);
    let head_before = store.chain().head().unwrap().available().unwrap();

    let supplies = store.fit_component(ComponentType::PowerSupply, 10, 64).unwrap();
    assert_eq!(
        supplies,
        vec![
            Placement { block: 0, first_index: 0, count: 6 },
            Placement { block: 1, first_index: 6, count: 4 },
        ],
        "ranges must be contiguous and cover [0, 10)"
    );
    assert_eq!(store.block_count(), 2);

    let usable = 4096 - BLOCK_HEADER_SIZE - 5 * DESCRIPTOR_SIZE;
    assert_eq!(store.chain().head().unwrap().available().unwrap(), head_before - 6 * 64);
    assert_eq!(store.chain().block(1).unwrap().available().unwrap(), usable - 4 * 64);

    assert_eq!(store.locate(ComponentType::PowerSupply, 7).unwrap().block, 1);
    assert_eq!(store.locate(ComponentType::PowerSupply, 5).unwrap().block, 0);
    assert_eq!(store.component_count(ComponentType::PowerSupply).unwrap(), 10);
}

#[test]
fn locate_distinguishes_missing_type_from_missing_index() {
    let mut store = five_slot_store(2);
    store.fit_component(ComponentType::PowerSupply, 4, 64).unwrap();

    let err = store.locate(ComponentType::PowerSupply, 4).unwrap_err();
    assert_eq!(
        err,
        EdalError::Lookup(LookupError::IndexOutOfRange {
            component: ComponentType::PowerSupply,
            index: 4,
            count: 4,
        })
    );

    let err = store.locate(ComponentType::Cooling, 0).unwrap_err();
    assert_eq!(err, EdalError::Lookup(LookupError::ComponentTypeNotFound(ComponentType::Cooling)));
    assert!(err.is_not_found());
}

#[test]
fn locate_is_deterministic() {
    let mut store = five_slot_store(3);
    store.fit_component(ComponentType::Drive, 20, 443).unwrap();
    for index in 0..20 {
        let first = store.locate(ComponentType::Drive, index).unwrap();
        let second = store.locate(ComponentType::Drive, index).unwrap();
        assert_eq!(first, second, "index {index}");
    }
}

#[test]
fn failed_fit_changes_nothing() {
    let mut store = five_slot_store(1);
    store.fit_component(ComponentType::Drive, 8, 443).unwrap();
    let before = store.chain().head().unwrap().available().unwrap();

    let err = store.fit_component(ComponentType::PowerSupply, 10, 64).unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");
    assert_eq!(store.block_count(), 1, "no block may be appended");
    assert_eq!(store.chain().head().unwrap().available().unwrap(), before);
    assert_eq!(store.component_count(ComponentType::PowerSupply).unwrap(), 0);
}

#[test]
fn chain_fit_without_room_leaves_blocks_untouched() {
    init_logging();
    let mut chain = BlockChain::new(Block::new(1024, EnclosureType::Base, 4, 0).unwrap());
    let err = chain.fit(ComponentType::Drive, 100, 64).unwrap_err();
    assert!(matches!(err, FitError::Capacity(_)), "got {err:?}");
    assert!(!chain.contains_type(ComponentType::Drive).unwrap());
}

#[test]
fn record_larger_than_a_block_is_rejected_up_front() {
    let mut store = five_slot_store(4);
    let err = store.fit_component(ComponentType::Drive, 1, 8192).unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");
    assert_eq!(store.block_count(), 1);
}

#[test]
fn zero_sized_fit_lands_in_head() {
    let mut store = five_slot_store(2);
    let placements = store.fit_component(ComponentType::Display, 0, 0).unwrap();
    assert_eq!(placements, vec![Placement { block: 0, first_index: 0, count: 0 }]);
    assert_eq!(store.component_type_count().unwrap(), 1);
    assert_eq!(store.component_type_at(0).unwrap(), Some(ComponentType::Display));
    assert_eq!(store.component_count(ComponentType::Display).unwrap(), 0);
}

#[test]
fn zero_sized_fit_needs_a_free_slot() {
    let mut store = five_slot_store(2);
    for component in [
        ComponentType::PowerSupply,
        ComponentType::Drive,
        ComponentType::Cooling,
        ComponentType::TempSensor,
        ComponentType::Lcc,
    ] {
        store.fit_component(component, 1, store.component_size(component)).unwrap();
    }
    let err = store.fit_component(ComponentType::Display, 0, 0).unwrap_err();
    assert_eq!(err, EdalError::Fit(FitError::DescriptorTableFull { max_component_types: 5 }));
}

#[test]
fn full_descriptor_table_forces_a_new_block() {
    let mut store = five_slot_store(2);
    for component in [
        ComponentType::PowerSupply,
        ComponentType::Drive,
        ComponentType::Cooling,
        ComponentType::TempSensor,
        ComponentType::Lcc,
    ] {
        store.fit_component(component, 1, store.component_size(component)).unwrap();
    }
    let placements = store.fit_component(ComponentType::Enclosure, 1, 64).unwrap();
    assert_eq!(placements, vec![Placement { block: 1, first_index: 0, count: 1 }]);
}

#[test]
fn duplicate_type_is_rejected() {
    let mut store = five_slot_store(2);
    store.fit_component(ComponentType::Cooling, 2, 32).unwrap();
    let err = store.fit_component(ComponentType::Cooling, 2, 32).unwrap_err();
    assert_eq!(err, EdalError::Fit(FitError::DuplicateComponentType(ComponentType::Cooling)));
}

#[test]
fn undersized_record_is_rejected() {
    let mut store = five_slot_store(2);
    let minimum = store.component_size(ComponentType::PowerSupply);
    let err = store.fit_component(ComponentType::PowerSupply, 1, minimum - 1).unwrap_err();
    assert_eq!(
        err,
        EdalError::Fit(FitError::InvalidRecordSize {
            component: ComponentType::PowerSupply,
            size: minimum - 1,
            minimum,
        })
    );
}

#[test]
fn detach_never_removes_head() {
    let mut store = five_slot_store(2);
    assert!(store.detach_tail().unwrap().is_none());
    assert_eq!(store.block_count(), 1);
}

#[test]
fn reattaching_detached_tail_restores_lookups() {
    let mut store = five_slot_store(2);
    store.fit_component(ComponentType::Drive, 8, 443).unwrap();
    store.fit_component(ComponentType::PowerSupply, 10, 64).unwrap();
    let before = store.locate(ComponentType::PowerSupply, 9).unwrap();

    let tail = store.detach_tail().unwrap().expect("tail block");
    assert_eq!(store.block_count(), 1);
    let err = store.locate(ComponentType::PowerSupply, 9).unwrap_err();
    assert!(matches!(err, EdalError::Lookup(LookupError::IndexOutOfRange { count: 6, .. })), "got {err:?}");

    store.reattach(tail).unwrap();
    assert_eq!(store.block_count(), 2);
    assert_eq!(store.locate(ComponentType::PowerSupply, 9).unwrap(), before);
}

#[test]
fn reattach_respects_block_limit() {
    let mut store = five_slot_store(2);
    store.fit_component(ComponentType::Drive, 8, 443).unwrap();
    store.fit_component(ComponentType::PowerSupply, 10, 64).unwrap();

    let tail = store.detach_tail().unwrap().expect("tail block");
    store.append_block().unwrap();
    let err = store.reattach(tail).unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");
    assert_eq!(store.block_count(), 2);
}

#[test]
fn reattach_rejects_foreign_ranges() {
    let mut donor = five_slot_store(2);
    donor.fit_component(ComponentType::Drive, 10, 443).unwrap();
    let tail = donor.detach_tail().unwrap().expect("tail block");

    let mut store = five_slot_store(3);
    store.fit_component(ComponentType::Drive, 2, 443).unwrap();
    let err = store.reattach(tail).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");
    assert_eq!(store.block_count(), 1);
    assert_eq!(store.component_count(ComponentType::Drive).unwrap(), 2);
}

#[test]
fn reattach_rejects_other_geometry() {
    init_logging();
    let mut other = EnclosureStore::new(StoreConfig::for_enclosure(EnclosureType::Base).with_block_size(2048)).unwrap();
    other.append_block().unwrap();
    let tail = other.detach_tail().unwrap().expect("tail block");

    let mut store = five_slot_store(3);
    let err = store.reattach(tail).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");
    assert_eq!(store.block_count(), 1);
}

#[test]
fn corrupted_tail_is_not_linked_or_unlinked() {
    let mut store = five_slot_store(3);
    store.raw_block_mut(0).unwrap()[..4].fill(0);
    let err = store.append_block().unwrap_err();
    assert!(err.is_corruption(), "got {err:?}");
    assert_eq!(store.block_count(), 1);

    let mut store = five_slot_store(3);
    store.append_block().unwrap();
    store.raw_block_mut(0).unwrap()[..4].fill(0);
    let err = store.detach_tail().unwrap_err();
    assert!(err.is_corruption(), "got {err:?}");
    assert_eq!(store.block_count(), 2);
}

#[test]
fn chain_fit_rejects_records_without_room_for_a_header() {
    init_logging();
    let mut chain = BlockChain::new(Block::new(1024, EnclosureType::Base, 4, 0).unwrap());
    for size in [0, RECORD_HEADER_SIZE - 1] {
        let err = chain.fit(ComponentType::Drive, 3, size).unwrap_err();
        assert_eq!(
            err,
            FitError::InvalidRecordSize { component: ComponentType::Drive, size, minimum: RECORD_HEADER_SIZE },
            "size {size}"
        );
    }
    assert!(!chain.contains_type(ComponentType::Drive).unwrap());

    let mut store = five_slot_store(2);
    let err = store.fit_component(ComponentType::Drive, 2, 0).unwrap_err();
    assert!(matches!(err, EdalError::Fit(FitError::InvalidRecordSize { size: 0, .. })), "got {err:?}");
}

#[test]
fn append_block_respects_limit() {
    let mut store = five_slot_store(2);
    store.append_block().unwrap();
    let err = store.append_block().unwrap_err();
    assert!(matches!(err, EdalError::InsufficientResource(_)), "got {err:?}");
}

#[test]
fn invalid_configurations_are_rejected() {
    init_logging();
    let err = EnclosureStore::new(StoreConfig::default().with_max_component_types(0)).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");

    let err = EnclosureStore::new(StoreConfig::default().with_max_blocks(0)).unwrap_err();
    assert!(matches!(err, EdalError::Config(_)), "got {err:?}");

    let err = EnclosureStore::new(StoreConfig::for_enclosure(EnclosureType::Processor)).unwrap_err();
    assert!(matches!(err, EdalError::UnsupportedEnclosure(_)), "got {err:?}");
}
