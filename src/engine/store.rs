//! # Enclosure Store
//!
//! [`EnclosureStore`] owns one block chain and exposes everything the
//! enclosure code does with it: fitting component records, typed attribute
//! get/set, change tracking, searches over components, and snapshots.
//!
//! ## Access path
//!
//! Every typed accessor follows the same steps:
//!
//! 1. Resolve the attribute for the store's [`EnclosureKind`] through the
//!    dispatcher. Unknown pairs fail with
//!    [`EdalError::UnsupportedAttribute`] before the chain is touched.
//! 2. Locate the record by component type and global index.
//! 3. Validate the record header, then read or write through the binding.
//!
//! A setter that raises the record's state change also bumps the owning
//! descriptor's counter and flag, even when the setter itself then fails (a
//! truncated serial number is still stored and still counts as a swap).
//!
//! ## Growth
//!
//! [`EnclosureStore::fit_component`] is the only operation that appends
//! blocks, and only as many as close the gap left by the existing chain.
//! The chain never grows past [`StoreConfig::max_blocks`].
//!
//! ## Ownership
//!
//! The store is single-threaded. Mutating operations take `&mut self`; callers
//! that share a store wrap it themselves.

use bytemuck::Pod;
use log::{debug, info, warn};

use crate::engine::attribute::{
    BoolAttribute,
    FirmwareTarget,
    StringAttribute,
    U16Attribute,
    U32Attribute,
    U64Attribute,
    U8Attribute,
};
use crate::engine::block::Block;
use crate::engine::chain::{BlockChain, Location, Placement};
use crate::engine::component::{ComponentStatus, ComponentType, EnclosureKind, EnclosureType};
use crate::engine::config::StoreConfig;
use crate::engine::dispatch::{self, ScalarBinding};
use crate::engine::error::{CapacityError, ConfigError, EdalError, EdalResult, FitError, LookupError};
use crate::engine::layout::record_minimum;
use crate::engine::record::{RecordMut, RecordRef};
use crate::engine::snapshot;
use crate::engine::tracking::{self, SetOutcome};
use crate::engine::types::{
    BlockPosition,
    ChangeCount,
    ComponentCount,
    ComponentIndex,
    DescriptorSlot,
    GenerationCount,
    RecordSize,
    CONTAINER_INDEX_SELF_CONTAINED,
    DEFAULT_MAX_BLOCKS,
    DISPLAY_BUS_INDICES,
    DISPLAY_ENCLOSURE_INDEX,
    DISPLAY_MODE_CHARACTER,
    PHY_INDEX_INVALID,
    SIDE_ID_MIDPLANE,
};
use crate::engine::validation;


/// Which whole connector [`EnclosureStore::connector_bool`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorSelector {
    /// The local connector flagged as primary port.
    Primary,
    /// The local connector that is not the primary port.
    Expansion,
}

/// Which temperature sensor a temperature query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempSensorScope {
    /// The self-contained sensor on the midplane.
    ChassisOverall,
    /// The self-contained sensor of one side.
    SideOverall(u8),
    /// The `index`-th sensor housed in a FRU on `side`.
    Individual {
        /// Side of the sensor.
        side: u8,
        /// Position among that side's FRU-housed sensors.
        index: u32,
    },
    /// The `n`-th FRU-housed sensor on the midplane.
    ChassisIndividual(u32),
}

/// Front-panel displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayType {
    /// Two digits, display indices 0 and 1.
    BusNumber,
    /// One digit, display index 2.
    EnclosurePosition,
}

/// Value written by [`EnclosureStore::set_display_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayValue {
    /// Decimal number shown as ASCII digits.
    Numeric(u32),
    /// Raw character repeated on every position of the display.
    Character(u8),
}

/// Enclosure data store: one block chain plus its configuration.
#[derive(Debug, Clone)]
pub struct EnclosureStore {
    chain: BlockChain,
    config: StoreConfig,
    kind: EnclosureKind,
}

impl EnclosureStore {
    /// Creates a store holding a single empty head block.
    ///
    /// # Errors
    /// Any error of [`StoreConfig::validate`].
    pub fn new(config: StoreConfig) -> EdalResult<Self> {
        config.validate()?;
        let kind = config.enclosure_type.kind()?;
        let mut head = Block::new(
            config.block_size,
            config.enclosure_type,
            config.max_component_types,
            config.side_id,
        )?;
        head.update_header(|h| h.locale = config.locale)?;
        info!(
            "EDAL: new {:?} store, {} byte blocks, {} descriptor slots",
            config.enclosure_type, config.block_size, config.max_component_types
        );
        Ok(EnclosureStore { chain: BlockChain::new(head), config, kind })
    }

    /// Rebuilds a store from an image written by [`EnclosureStore::copy_block_data`].
    ///
    /// The configuration is taken from the head block. The block limit is the
    /// larger of the default and the image's block count.
    pub fn from_snapshot(image: &[u8]) -> EdalResult<Self> {
        let chain = snapshot::chain_from_image(image)?;
        let head = chain.head()?.header()?;
        let enclosure_type = EnclosureType::try_from(head.enclosure_type)?;
        let config = StoreConfig {
            block_size: head.block_size,
            max_component_types: head.max_component_types,
            max_blocks: chain.len().max(DEFAULT_MAX_BLOCKS),
            enclosure_type,
            side_id: head.side_id,
            locale: head.locale,
        };
        let kind = enclosure_type.kind()?;
        Ok(EnclosureStore { chain, config, kind })
    }

    /// Configuration the store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying chain.
    pub fn chain(&self) -> &BlockChain {
        &self.chain
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.chain.len()
    }

    fn fresh_block(&self) -> EdalResult<Block> {
        Block::new(
            self.config.block_size,
            self.config.enclosure_type,
            self.config.max_component_types,
            self.config.side_id,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fitting
    // ─────────────────────────────────────────────────────────────────────

    /// Smallest record size the store's enclosure kind accepts for `component`.
    pub fn component_size(&self, component: ComponentType) -> RecordSize {
        record_minimum(self.kind, component)
    }

    /// Fits `count` records of `record_size` bytes for `component`, appending
    /// blocks when the existing chain is short.
    ///
    /// # Errors
    /// - [`FitError::InvalidRecordSize`] for a size below [`Self::component_size`].
    ///   Only a request for no records may pass a zero size.
    /// - [`FitError::DuplicateComponentType`] if the type is already fitted.
    /// - [`EdalError::InsufficientResource`] if a single record can never fit
    ///   in a block, or if closing the gap would exceed the block limit. No
    ///   block is appended in that case.
    pub fn fit_component(
        &mut self,
        component: ComponentType,
        count: ComponentCount,
        record_size: RecordSize,
    ) -> EdalResult<Vec<Placement>> {
        if count > 0 || record_size > 0 {
            let minimum = self.component_size(component);
            if record_size < minimum {
                return Err(FitError::InvalidRecordSize { component, size: record_size, minimum }.into());
            }
        }

        if count > 0 {
            BlockChain::can_fit_in_block(self.config.block_size, self.config.max_component_types, record_size)?;
            if self.chain.contains_type(component)? {
                return Err(FitError::DuplicateComponentType(component).into());
            }

            let capacity = self.chain.capacity_for(record_size)?;
            if capacity < count as u64 {
                let per_block = self.config.usable_block_bytes() / record_size as u64;
                let extra = (count as u64 - capacity).div_ceil(per_block) as usize;
                let length = self.chain.len();
                if length + extra > self.config.max_blocks {
                    let spare = self.config.max_blocks.saturating_sub(length) as u64;
                    warn!(
                        "EDAL: {} {} record(s) need {} more block(s), limit is {}",
                        count, component, extra, self.config.max_blocks
                    );
                    return Err(CapacityError { needed: count as u64, available: capacity + spare * per_block }.into());
                }
                for _ in 0..extra {
                    let block = self.fresh_block()?;
                    self.chain.append(block)?;
                }
            }
        }

        Ok(self.chain.fit(component, count, record_size)?)
    }

    /// Resolves `(component, index)` to its block, descriptor slot and byte range.
    pub fn locate(&self, component: ComponentType, index: ComponentIndex) -> EdalResult<Location> {
        self.chain.locate(component, index)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Record access
    // ─────────────────────────────────────────────────────────────────────

    fn record(&self, component: ComponentType, index: ComponentIndex) -> EdalResult<RecordRef<'_>> {
        let location = self.chain.locate(component, index)?;
        let block = validation::require(self.chain.block(location.block))?;
        Ok(RecordRef::new(block.record_bytes(location.range))?)
    }

    fn update_record<R>(
        &mut self,
        component: ComponentType,
        index: ComponentIndex,
        update: impl FnOnce(&mut RecordMut<'_>) -> EdalResult<R>,
    ) -> EdalResult<R> {
        let Location { block, slot, range } = self.chain.locate(component, index)?;
        let block = validation::require(self.chain.block_mut(block))?;
        let (result, raised) = {
            let mut record = RecordMut::new(block.record_bytes_mut(range))?;
            let result = update(&mut record);
            (result, record.raised_state_change())
        };
        if raised {
            tracking::note_state_change(block, slot)?;
        }
        result
    }

    fn read_scalar<T: Pod>(
        &self,
        component: ComponentType,
        index: ComponentIndex,
        binding: ScalarBinding<T>,
    ) -> EdalResult<T> {
        Ok(self.record(component, index)?.scalar(binding.field)?)
    }

    fn write_scalar<T: Pod + PartialEq>(
        &mut self,
        component: ComponentType,
        index: ComponentIndex,
        binding: ScalarBinding<T>,
        value: T,
    ) -> EdalResult<SetOutcome> {
        self.update_record(component, index, |record| Ok(tracking::apply_scalar(record, binding, value)?))
    }

    /// Reads a boolean attribute.
    pub fn get_bool(&self, component: ComponentType, attribute: BoolAttribute, index: ComponentIndex) -> EdalResult<bool> {
        let binding = dispatch::resolve_bool(self.kind, component, attribute)?;
        Ok(self.record(component, index)?.flag(binding.bit)?)
    }

    /// Writes a boolean attribute.
    pub fn set_bool(
        &mut self,
        component: ComponentType,
        attribute: BoolAttribute,
        index: ComponentIndex,
        value: bool,
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_bool(self.kind, component, attribute)?;
        self.update_record(component, index, |record| Ok(tracking::apply_bool(record, binding, value)?))
    }

    /// Reads an 8-bit attribute.
    pub fn get_u8(&self, component: ComponentType, attribute: U8Attribute, index: ComponentIndex) -> EdalResult<u8> {
        let binding = dispatch::resolve_u8(self.kind, component, attribute)?;
        self.read_scalar(component, index, binding)
    }

    /// Writes an 8-bit attribute.
    pub fn set_u8(
        &mut self,
        component: ComponentType,
        attribute: U8Attribute,
        index: ComponentIndex,
        value: u8,
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_u8(self.kind, component, attribute)?;
        self.write_scalar(component, index, binding, value)
    }

    /// Reads a 16-bit attribute.
    pub fn get_u16(&self, component: ComponentType, attribute: U16Attribute, index: ComponentIndex) -> EdalResult<u16> {
        let binding = dispatch::resolve_u16(self.kind, component, attribute)?;
        self.read_scalar(component, index, binding)
    }

    /// Writes a 16-bit attribute.
    pub fn set_u16(
        &mut self,
        component: ComponentType,
        attribute: U16Attribute,
        index: ComponentIndex,
        value: u16,
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_u16(self.kind, component, attribute)?;
        self.write_scalar(component, index, binding, value)
    }

    /// Reads a 32-bit attribute.
    pub fn get_u32(&self, component: ComponentType, attribute: U32Attribute, index: ComponentIndex) -> EdalResult<u32> {
        let binding = dispatch::resolve_u32(self.kind, component, attribute)?;
        self.read_scalar(component, index, binding)
    }

    /// Writes a 32-bit attribute.
    pub fn set_u32(
        &mut self,
        component: ComponentType,
        attribute: U32Attribute,
        index: ComponentIndex,
        value: u32,
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_u32(self.kind, component, attribute)?;
        self.write_scalar(component, index, binding, value)
    }

    /// Reads a 64-bit attribute.
    pub fn get_u64(&self, component: ComponentType, attribute: U64Attribute, index: ComponentIndex) -> EdalResult<u64> {
        let binding = dispatch::resolve_u64(self.kind, component, attribute)?;
        self.read_scalar(component, index, binding)
    }

    /// Writes a 64-bit attribute.
    pub fn set_u64(
        &mut self,
        component: ComponentType,
        attribute: U64Attribute,
        index: ComponentIndex,
        value: u64,
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_u64(self.kind, component, attribute)?;
        self.write_scalar(component, index, binding, value)
    }

    /// Copies a byte-string attribute into `buffer` and returns the bytes copied.
    ///
    /// # Errors
    /// [`EdalError::SizeMismatch`] when `buffer` is smaller than the field; the
    /// prefix that fits is still copied.
    pub fn get_string(
        &self,
        component: ComponentType,
        attribute: StringAttribute,
        index: ComponentIndex,
        buffer: &mut [u8],
    ) -> EdalResult<usize> {
        let binding = dispatch::resolve_string(self.kind, component, attribute)?;
        tracking::read_string(self.record(component, index)?, binding, buffer)
    }

    /// Writes a byte-string attribute.
    ///
    /// # Errors
    /// [`EdalError::SizeMismatch`] when `value` is longer than the field. The
    /// truncated value is stored anyway.
    pub fn set_string(
        &mut self,
        component: ComponentType,
        attribute: StringAttribute,
        index: ComponentIndex,
        value: &[u8],
    ) -> EdalResult<SetOutcome> {
        let binding = dispatch::resolve_string(self.kind, component, attribute)?;
        self.update_record(component, index, |record| tracking::apply_string(record, binding, value))
    }

    /// Copies the firmware revision of `target` on component `index` into `buffer`.
    pub fn firmware_revision(&self, target: FirmwareTarget, index: ComponentIndex, buffer: &mut [u8]) -> EdalResult<usize> {
        let (component, attribute) = target.component_attribute();
        self.get_string(component, attribute, index, buffer)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Change tracking
    // ─────────────────────────────────────────────────────────────────────

    /// Clears every record and descriptor state-change flag.
    pub fn clear_state_changes(&mut self) -> EdalResult<()> {
        tracking::clear_state_changes(&mut self.chain)
    }

    /// Marks every type holding a pending write as [`ComponentStatus::WriteNeeded`].
    /// Returns `true` if any write is pending.
    pub fn check_for_write_data(&mut self) -> EdalResult<bool> {
        tracking::check_for_write_data(&mut self.chain)
    }

    /// Increments the overall change counter of every block.
    pub fn increment_overall_state_change(&mut self) -> EdalResult<()> {
        Ok(tracking::increment_overall_state_change(&mut self.chain)?)
    }

    /// Increments the per-type change counter of `component` in every block.
    pub fn increment_component_state_change(&mut self, component: ComponentType) -> EdalResult<()> {
        tracking::increment_component_state_change(&mut self.chain, component)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Counts, status and identity
    // ─────────────────────────────────────────────────────────────────────

    /// Descriptors in use in the head block.
    pub fn component_type_count(&self) -> EdalResult<u8> {
        Ok(self.chain.head()?.header()?.component_types)
    }

    /// Component type described by head-block slot `slot`.
    pub fn component_type_at(&self, slot: DescriptorSlot) -> EdalResult<Option<ComponentType>> {
        let Some(descriptor) = self.chain.head()?.descriptor(slot)? else {
            return Ok(None);
        };
        let component =
            ComponentType::try_from(descriptor.component_type).map_err(EdalError::UnsupportedComponent)?;
        Ok(Some(component))
    }

    /// Records of `component` across every block. Zero for an absent type.
    pub fn component_count(&self, component: ComponentType) -> EdalResult<ComponentCount> {
        Ok(self.chain.component_count(component)?)
    }

    /// Overall status of `component`, read from its first descriptor.
    pub fn component_overall_status(&self, component: ComponentType) -> EdalResult<ComponentStatus> {
        for block in self.chain.iter() {
            if let Some((_, descriptor)) = block.find_descriptor(component)? {
                return Ok(ComponentStatus::from_code(descriptor.overall_status));
            }
        }
        Err(LookupError::ComponentTypeNotFound(component).into())
    }

    /// Sets the overall status of every descriptor of `component`.
    pub fn set_component_overall_status(&mut self, component: ComponentType, status: ComponentStatus) -> EdalResult<()> {
        tracking::set_overall_status(&mut self.chain, component, status)
    }

    /// Per-type change counter of `component`, summed over its descriptors.
    pub fn component_state_change_count(&self, component: ComponentType) -> EdalResult<ChangeCount> {
        let mut found = false;
        let mut total: ChangeCount = 0;
        for block in self.chain.iter() {
            if let Some((_, descriptor)) = block.find_descriptor(component)? {
                found = true;
                total = total.wrapping_add(descriptor.state_change_count);
            }
        }
        if !found {
            return Err(LookupError::ComponentTypeNotFound(component).into());
        }
        Ok(total)
    }

    /// Overall change counter of the head block.
    pub fn overall_state_change_count(&self) -> EdalResult<ChangeCount> {
        Ok(self.chain.head()?.header()?.overall_state_change_count)
    }

    /// Enclosure type recorded in the head block.
    pub fn enclosure_type(&self) -> EdalResult<EnclosureType> {
        EnclosureType::try_from(self.chain.head()?.header()?.enclosure_type)
    }

    /// Enclosure kind that drives attribute dispatch.
    pub fn enclosure_kind(&self) -> EnclosureKind {
        self.kind
    }

    /// Enclosure side recorded in the head block.
    pub fn enclosure_side(&self) -> EdalResult<u8> {
        Ok(self.chain.head()?.header()?.side_id)
    }

    /// Generation count of the head block.
    pub fn generation_count(&self) -> EdalResult<GenerationCount> {
        Ok(self.chain.head()?.header()?.generation_count)
    }

    /// Stores `generation` in every block.
    pub fn set_generation_count(&mut self, generation: GenerationCount) -> EdalResult<()> {
        Ok(tracking::set_generation_count(&mut self.chain, generation)?)
    }

    /// Increments the generation count and propagates it to every block.
    /// Returns the new count.
    pub fn increment_generation_count(&mut self) -> EdalResult<GenerationCount> {
        let generation = self.generation_count()?.wrapping_add(1);
        self.set_generation_count(generation)?;
        Ok(generation)
    }

    /// Locale byte of the head block.
    pub fn locale(&self) -> EdalResult<u8> {
        Ok(self.chain.head()?.header()?.locale)
    }

    /// Sets the locale byte of the head block.
    pub fn set_locale(&mut self, locale: u8) -> EdalResult<()> {
        self.chain.head_mut()?.update_header(|h| h.locale = locale)?;
        self.config.locale = locale;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Searches
    // ─────────────────────────────────────────────────────────────────────

    /// First index at or after `start` whose boolean `attribute` equals `value`.
    pub fn find_first_bool(
        &self,
        component: ComponentType,
        attribute: BoolAttribute,
        value: bool,
        start: ComponentIndex,
    ) -> EdalResult<Option<ComponentIndex>> {
        let binding = dispatch::resolve_bool(self.kind, component, attribute)?;
        for index in start..self.component_count(component)? {
            if self.record(component, index)?.flag(binding.bit)? == value {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// First index at or after `start` whose 8-bit `attribute` equals `value`.
    pub fn find_first_u8(
        &self,
        component: ComponentType,
        attribute: U8Attribute,
        value: u8,
        start: ComponentIndex,
    ) -> EdalResult<Option<ComponentIndex>> {
        let binding = dispatch::resolve_u8(self.kind, component, attribute)?;
        for index in start..self.component_count(component)? {
            if self.record(component, index)?.scalar(binding.field)? == value {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Reads boolean `attribute` of the first `component` whose `selector`
    /// equals `selector_value`.
    pub fn bool_matching_component(
        &self,
        component: ComponentType,
        selector: U8Attribute,
        selector_value: u8,
        attribute: BoolAttribute,
    ) -> EdalResult<Option<bool>> {
        match self.find_first_u8(component, selector, selector_value, 0)? {
            Some(index) => Ok(Some(self.get_bool(component, attribute, index)?)),
            None => Ok(None),
        }
    }

    /// Reads 8-bit `attribute` of the first `component` whose `selector`
    /// equals `selector_value`.
    pub fn u8_matching_component(
        &self,
        component: ComponentType,
        selector: U8Attribute,
        selector_value: u8,
        attribute: U8Attribute,
    ) -> EdalResult<Option<u8>> {
        match self.find_first_u8(component, selector, selector_value, 0)? {
            Some(index) => Ok(Some(self.get_u8(component, attribute, index)?)),
            None => Ok(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Connectors
    // ─────────────────────────────────────────────────────────────────────

    /// Reads `attribute` of the local whole connector picked by `selector`.
    pub fn connector_bool(&self, attribute: BoolAttribute, selector: ConnectorSelector) -> EdalResult<Option<bool>> {
        let connector = ComponentType::Connector;
        for index in 0..self.component_count(connector)? {
            if !self.get_bool(connector, BoolAttribute::IsLocal, index)?
                || !self.get_bool(connector, BoolAttribute::IsEntireConnector, index)?
            {
                continue;
            }
            let primary = self.get_bool(connector, BoolAttribute::PrimaryPort, index)?;
            if primary == (selector == ConnectorSelector::Primary) {
                return Ok(Some(self.get_bool(connector, attribute, index)?));
            }
        }
        debug!("EDAL: no local {:?} connector", selector);
        Ok(None)
    }

    /// Requests every expander phy behind the local lanes of `connector_id` to
    /// be disabled (or enabled). Returns the number of phys whose request
    /// changed.
    pub fn connector_control(&mut self, connector_id: u8, disable: bool) -> EdalResult<u32> {
        let connector = ComponentType::Connector;
        let Some(mut start) = self.find_first_bool(connector, BoolAttribute::IsLocal, true, 0)? else {
            return Ok(0);
        };

        let mut changed = 0;
        while let Some(index) = self.find_first_u8(connector, U8Attribute::ConnectorId, connector_id, start)? {
            if !self.get_bool(connector, BoolAttribute::IsLocal, index)? {
                break;
            }
            if !self.get_bool(connector, BoolAttribute::IsEntireConnector, index)? {
                let phy = self.get_u8(connector, U8Attribute::PhyIndex, index)?;
                if phy != PHY_INDEX_INVALID
                    && self
                        .set_bool(ComponentType::ExpanderPhy, BoolAttribute::PhyDisable, phy as ComponentIndex, disable)?
                        .is_changed()
                {
                    changed += 1;
                }
            }
            start = index + 1;
        }
        Ok(changed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Temperature sensors
    // ─────────────────────────────────────────────────────────────────────

    fn temp_sensor_index(&self, scope: TempSensorScope) -> EdalResult<Option<ComponentIndex>> {
        let sensor = ComponentType::TempSensor;
        let mut housed = 0u32;
        for index in 0..self.component_count(sensor)? {
            let container = self.get_u8(sensor, U8Attribute::ContainerIndex, index)?;
            let side = self.get_u8(sensor, U8Attribute::SideId, index)?;
            let self_contained = container == CONTAINER_INDEX_SELF_CONTAINED;
            let nth = |wanted: u32, housed: &mut u32| {
                let hit = *housed == wanted;
                *housed += 1;
                hit
            };
            let hit = match scope {
                TempSensorScope::ChassisOverall => self_contained && side == SIDE_ID_MIDPLANE,
                TempSensorScope::SideOverall(wanted) => self_contained && side == wanted,
                TempSensorScope::Individual { side: wanted, index: n } => {
                    !self_contained && side == wanted && nth(n, &mut housed)
                }
                TempSensorScope::ChassisIndividual(n) => !self_contained && side == SIDE_ID_MIDPLANE && nth(n, &mut housed),
            };
            if hit {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Reads boolean `attribute` of the temperature sensor selected by `scope`.
    pub fn temp_sensor_bool(&self, attribute: BoolAttribute, scope: TempSensorScope) -> EdalResult<Option<bool>> {
        match self.temp_sensor_index(scope)? {
            Some(index) => Ok(Some(self.get_bool(ComponentType::TempSensor, attribute, index)?)),
            None => Ok(None),
        }
    }

    /// Reads 16-bit `attribute` of the temperature sensor selected by `scope`.
    pub fn temp_sensor_u16(&self, attribute: U16Attribute, scope: TempSensorScope) -> EdalResult<Option<u16>> {
        match self.temp_sensor_index(scope)? {
            Some(index) => Ok(Some(self.get_u16(ComponentType::TempSensor, attribute, index)?)),
            None => Ok(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Display
    // ─────────────────────────────────────────────────────────────────────

    fn display_digit(&self, index: ComponentIndex) -> EdalResult<u8> {
        let character = self.get_u8(ComponentType::Display, U8Attribute::DisplayCharacterStatus, index)?;
        if !character.is_ascii_digit() {
            return Err(EdalError::InvalidDisplayCharacter(character));
        }
        Ok(character - b'0')
    }

    /// Decodes the number currently shown on `display`.
    ///
    /// # Errors
    /// [`EdalError::InvalidDisplayCharacter`] if a position shows a non-digit.
    pub fn display_value(&self, display: DisplayType) -> EdalResult<u8> {
        match display {
            DisplayType::BusNumber => {
                let [tens, ones] = DISPLAY_BUS_INDICES;
                Ok(self.display_digit(tens)? * 10 + self.display_digit(ones)?)
            }
            DisplayType::EnclosurePosition => self.display_digit(DISPLAY_ENCLOSURE_INDEX),
        }
    }

    fn show_character(&mut self, index: ComponentIndex, character: u8, flash: bool) -> EdalResult<()> {
        let display = ComponentType::Display;
        self.set_u8(display, U8Attribute::DisplayCharacter, index, character)?;
        self.set_u8(display, U8Attribute::DisplayMode, index, DISPLAY_MODE_CHARACTER)?;
        self.set_bool(display, BoolAttribute::MarkComponent, index, flash)?;
        Ok(())
    }

    /// Requests `display` to show `value`, flashing when `flash` is set.
    ///
    /// # Errors
    /// [`EdalError::DisplayValueOutOfRange`] for a number above 99.
    pub fn set_display_value(&mut self, display: DisplayType, value: DisplayValue, flash: bool) -> EdalResult<()> {
        let (tens, ones) = match value {
            DisplayValue::Numeric(n) if n > 99 => return Err(EdalError::DisplayValueOutOfRange(n)),
            DisplayValue::Numeric(n) => (b'0' + (n / 10) as u8, b'0' + (n % 10) as u8),
            DisplayValue::Character(c) => (c, c),
        };
        match display {
            DisplayType::BusNumber => {
                let [tens_index, ones_index] = DISPLAY_BUS_INDICES;
                self.show_character(tens_index, tens, flash)?;
                self.show_character(ones_index, ones, flash)
            }
            DisplayType::EnclosurePosition => self.show_character(DISPLAY_ENCLOSURE_INDEX, ones, flash),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Snapshots and diagnostics
    // ─────────────────────────────────────────────────────────────────────

    /// Bytes an image of the chain occupies.
    pub fn image_size(&self) -> usize {
        snapshot::image_size(&self.chain)
    }

    /// Writes a byte image of the chain into `buffer`.
    pub fn copy_block_data(&self, buffer: &mut [u8]) -> EdalResult<usize> {
        snapshot::copy_block_data(&self.chain, buffer)
    }

    /// Copies the generation count and used bytes into a same-shaped `backup`.
    pub fn copy_backup_data(&self, backup: &mut EnclosureStore) -> EdalResult<()> {
        snapshot::copy_backup_data(&self.chain, &mut backup.chain)
    }

    /// Structured, serializable view of the chain.
    #[cfg(feature = "export")]
    pub fn export(&self) -> EdalResult<snapshot::StoreExport> {
        snapshot::export(&self.chain)
    }

    /// Raw bytes of block `position`, for diagnostics and fault injection.
    pub fn raw_block_mut(&mut self, position: BlockPosition) -> Option<&mut [u8]> {
        self.chain.block_mut(position).map(Block::raw_mut)
    }

    /// Appends a block built from the store's configuration.
    pub fn append_block(&mut self) -> EdalResult<()> {
        self.check_block_limit()?;
        let block = self.fresh_block()?;
        self.chain.append(block)?;
        Ok(())
    }

    fn check_block_limit(&self) -> EdalResult<()> {
        if self.chain.len() >= self.config.max_blocks {
            warn!("EDAL: chain already holds the limit of {} block(s)", self.config.max_blocks);
            return Err(CapacityError { needed: self.chain.len() as u64 + 1, available: self.config.max_blocks as u64 }.into());
        }
        Ok(())
    }

    /// Unlinks and returns the tail block. The head is never detached.
    pub fn detach_tail(&mut self) -> EdalResult<Option<Box<Block>>> {
        Ok(self.chain.detach_tail()?)
    }

    /// Relinks a block previously returned by [`Self::detach_tail`].
    ///
    /// # Errors
    /// - [`EdalError::InsufficientResource`] if the chain is at its block limit.
    /// - [`EdalError::Config`] if the block was built for another geometry or
    ///   enclosure, or its index ranges do not continue the chain's.
    /// - [`EdalError::Validation`] if the block header is corrupted.
    pub fn reattach(&mut self, block: Box<Block>) -> EdalResult<()> {
        self.check_block_limit()?;
        let header = block.header()?;
        let config = &self.config;
        if header.block_size != config.block_size
            || header.max_component_types != config.max_component_types
            || header.enclosure_type != config.enclosure_type.code()
        {
            warn!("EDAL: reattached block does not match the store configuration");
            return Err(ConfigError { reason: "reattached block has a different shape" }.into());
        }
        self.chain.reattach(*block)
    }
}
