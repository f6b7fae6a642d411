//! Byte images and structured views of a block chain.
//!
//! # Byte image
//!
//! [`copy_block_data`] writes every block back to back, canaries included.
//! Each block header's `has_next` byte tells a reader whether another block
//! follows, so [`chain_from_image`] can rebuild the chain without side
//! information. A buffer too small for the whole chain receives the blocks
//! that fit, with `has_next` cleared on the last one, so the partial image
//! still decodes.
//!
//! # Backup
//!
//! [`copy_backup_data`] refreshes a same-shaped chain in place: the generation
//! count of the head plus, block by block, the descriptor table and the used
//! record bytes.
//!
//! # Export
//!
//! With the `export` feature, [`export`] produces a serde-serializable view of
//! the chain: block geometry, descriptors, record headers and every attribute
//! the enclosure kind resolves for each record.

use std::mem::offset_of;

use log::{error, info};

use crate::engine::block::Block;
use crate::engine::chain::BlockChain;
use crate::engine::error::{CapacityError, ConfigError, EdalError, ValidationError};
use crate::engine::layout::BlockHeader;
use crate::engine::types::{block_overhead, BLOCK_HEADER_SIZE};
use crate::engine::validation;


const HAS_NEXT: usize = offset_of!(BlockHeader, has_next);

/// Total bytes an image of `chain` occupies.
pub fn image_size(chain: &BlockChain) -> usize {
    chain.iter().map(Block::block_size).sum()
}

/// Writes a byte image of `chain` into `buffer` and returns the bytes written.
///
/// # Errors
/// - [`ValidationError`] if the head block is null or corrupted.
/// - [`EdalError::InsufficientResource`] when `buffer` cannot hold every block.
///   The blocks that fit are still written and terminate the image.
pub fn copy_block_data(chain: &BlockChain, buffer: &mut [u8]) -> Result<usize, EdalError> {
    chain.head()?;
    let needed = image_size(chain);
    let mut written = 0usize;
    let mut last_start: Option<usize> = None;

    for block in chain.iter() {
        let size = block.block_size();
        let Some(target) = buffer.get_mut(written..written + size) else {
            break;
        };
        target.copy_from_slice(block.as_bytes());
        last_start = Some(written);
        written += size;
    }

    if written < needed {
        if let Some(start) = last_start {
            buffer[start + HAS_NEXT] = 0;
        }
        error!(
            "EDAL: insufficient memory for block image, expected {} bytes, actual {}",
            needed,
            buffer.len()
        );
        return Err(CapacityError { needed: needed as u64, available: buffer.len() as u64 }.into());
    }
    Ok(written)
}

/// Rebuilds a chain from a byte image produced by [`copy_block_data`].
///
/// # Errors
/// - [`ValidationError`] if the image does not start with a valid block.
/// - [`EdalError::Config`] if a header claims more bytes than the image holds.
pub fn chain_from_image(image: &[u8]) -> Result<BlockChain, EdalError> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut offset = 0usize;
    loop {
        let rest = image.get(offset..).unwrap_or(&[]);
        let header = validation::check_block(rest)?;
        let size = header.block_size as usize;
        if size < BLOCK_HEADER_SIZE as usize {
            return Err(ConfigError { reason: "block header reports a size below its own" }.into());
        }
        let Some(bytes) = image.get(offset..offset + size) else {
            return Err(ConfigError { reason: "image truncated inside a block" }.into());
        };
        blocks.push(Block::from_bytes(bytes.to_vec()));
        if header.has_next == 0 {
            break;
        }
        offset += size;
    }

    let mut blocks = blocks.into_iter();
    let head = validation::require(blocks.next())?;
    let mut chain = BlockChain::new(head);
    for block in blocks {
        chain.append(block)?;
    }
    info!("EDAL: rebuilt chain of {} block(s) from {} image bytes", chain.len(), image.len());
    Ok(chain)
}

fn used_end(header: &BlockHeader) -> usize {
    let overhead = block_overhead(header.max_component_types);
    let usable = (header.block_size as u64).saturating_sub(overhead);
    (overhead + usable.saturating_sub(header.available as u64)) as usize
}

/// Copies the generation count and the used descriptor and record bytes of
/// `source` into `backup`.
///
/// # Errors
/// - [`ValidationError`] if either chain has a null or corrupted block.
/// - [`EdalError::Config`] if the chains differ in block count or geometry.
pub fn copy_backup_data(source: &BlockChain, backup: &mut BlockChain) -> Result<(), EdalError> {
    let generation = source.head()?.header()?.generation_count;
    backup.head()?;
    if source.len() != backup.len() {
        return Err(ConfigError { reason: "backup chain has a different block count" }.into());
    }

    backup.head_mut()?.update_header(|h| h.generation_count = generation)?;

    let mut target = backup.block_mut(0);
    for block in source.iter() {
        let Some(copy) = target else {
            return Err(ValidationError::NullBlock.into());
        };
        let header = block.header()?;
        let copy_header = copy.header()?;
        if header.block_size != copy_header.block_size
            || header.max_component_types != copy_header.max_component_types
        {
            return Err(ConfigError { reason: "backup block geometry differs" }.into());
        }

        let range = BLOCK_HEADER_SIZE as usize..used_end(&header);
        let Some(used) = block.as_bytes().get(range.clone()) else {
            return Err(ValidationError::NullBlock.into());
        };
        copy.raw_mut()[range].copy_from_slice(used);
        copy.update_header(|h| {
            h.component_types = header.component_types;
            h.available = header.available;
        })?;
        target = copy.next_mut();
    }
    Ok(())
}

#[cfg(feature = "export")]
pub use self::export_view::*;

#[cfg(feature = "export")]
mod export_view {
    use serde::Serialize;

    use crate::engine::attribute::AttributeId;
    use crate::engine::block::Block;
    use crate::engine::chain::BlockChain;
    use crate::engine::component::{ComponentStatus, ComponentType, EnclosureKind, EnclosureType};
    use crate::engine::dispatch::{self, Binding};
    use crate::engine::error::EdalError;
    use crate::engine::layout::DescriptorFlags;
    use crate::engine::record::RecordRef;

    /// Structured view of a whole chain.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct StoreExport {
        /// Enclosure type of the head block.
        pub enclosure_type: EnclosureType,
        /// Enclosure side of the head block.
        pub side_id: u8,
        /// Locale byte of the head block.
        pub locale: u8,
        /// Generation count of the head block.
        pub generation_count: u32,
        /// Overall change counter of the head block.
        pub overall_state_change_count: u32,
        /// Every block, head first.
        pub blocks: Vec<BlockExport>,
    }

    /// One block of a [`StoreExport`].
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct BlockExport {
        /// Block size in bytes.
        pub block_size: u32,
        /// Free bytes.
        pub available: u32,
        /// Descriptor-table capacity.
        pub max_component_types: u8,
        /// Descriptors in use.
        pub descriptors: Vec<DescriptorExport>,
    }

    /// One descriptor of a [`BlockExport`].
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct DescriptorExport {
        /// Component type.
        pub component_type: ComponentType,
        /// Aggregate status.
        pub overall_status: ComponentStatus,
        /// Per-type change flag.
        pub state_change: bool,
        /// Per-type change counter.
        pub state_change_count: u32,
        /// Record size.
        pub record_size: u32,
        /// Global index of the first record.
        pub first_index: u32,
        /// Record headers, in index order.
        pub records: Vec<RecordExport>,
    }

    /// Decoded value of one attribute.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub enum AttributeValue {
        /// Boolean.
        Bool(bool),
        /// 8-bit.
        U8(u8),
        /// 16-bit.
        U16(u16),
        /// 32-bit.
        U32(u32),
        /// 64-bit.
        U64(u64),
        /// Byte string without its trailing zero fill.
        Bytes(Vec<u8>),
    }

    /// One attribute of a [`RecordExport`].
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct AttributeExport {
        /// Attribute code.
        pub attribute: AttributeId,
        /// Stored value.
        pub value: AttributeValue,
    }

    /// Header and attributes of one record.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct RecordExport {
        /// Global index.
        pub index: u32,
        /// Raw shared flag word.
        pub flags: u16,
        /// Additional status byte.
        pub addl_status: u8,
        /// Per-record change counter.
        pub state_change_count: u16,
        /// Swap counter.
        pub swap_count: u16,
        /// Every attribute the enclosure kind resolves for the component type.
        pub attributes: Vec<AttributeExport>,
    }

    fn read_value(record: RecordRef<'_>, binding: Binding) -> Result<AttributeValue, EdalError> {
        Ok(match binding {
            Binding::Bool(b) => AttributeValue::Bool(record.flag(b.bit)?),
            Binding::U8(b) => AttributeValue::U8(record.scalar(b.field)?),
            Binding::U16(b) => AttributeValue::U16(record.scalar(b.field)?),
            Binding::U32(b) => AttributeValue::U32(record.scalar(b.field)?),
            Binding::U64(b) => AttributeValue::U64(record.scalar(b.field)?),
            Binding::String(b) => {
                let bytes = record.bytes(b.field)?;
                let end = bytes.iter().rposition(|byte| *byte != 0).map_or(0, |last| last + 1);
                AttributeValue::Bytes(bytes[..end].to_vec())
            }
        })
    }

    fn record_attributes(
        record: RecordRef<'_>,
        bindings: &[(AttributeId, Binding)],
    ) -> Result<Vec<AttributeExport>, EdalError> {
        bindings
            .iter()
            .map(|&(attribute, binding)| -> Result<AttributeExport, EdalError> {
                Ok(AttributeExport { attribute, value: read_value(record, binding)? })
            })
            .collect()
    }

    fn bindings_for(kind: EnclosureKind, component: ComponentType) -> Vec<(AttributeId, Binding)> {
        AttributeId::all()
            .filter_map(|attribute| dispatch::resolve(kind, component, attribute).ok().map(|b| (attribute, b)))
            .collect()
    }

    /// Builds the structured view of `chain`.
    pub fn export(chain: &BlockChain) -> Result<StoreExport, EdalError> {
        let head = chain.head()?.header()?;
        let enclosure_type = EnclosureType::try_from(head.enclosure_type)?;
        let kind = enclosure_type.kind()?;
        let mut blocks = Vec::with_capacity(chain.len());
        for block in chain.iter() {
            let header = block.header()?;
            let mut descriptors = Vec::new();
            for (slot, d) in block.descriptors()? {
                let component_type =
                    ComponentType::try_from(d.component_type).map_err(EdalError::UnsupportedComponent)?;
                let mut records = Vec::new();
                let bindings = bindings_for(kind, component_type);
                if d.record_size > 0 {
                    for index in d.first_index..d.first_index + d.count {
                        let Some(range) = Block::record_range(slot, &d, index) else {
                            continue;
                        };
                        let record = RecordRef::new(block.record_bytes(range))?;
                        let header = record.header()?;
                        records.push(RecordExport {
                            index,
                            flags: header.flags,
                            addl_status: header.addl_status,
                            state_change_count: header.state_change_count,
                            swap_count: header.swap_count,
                            attributes: record_attributes(record, &bindings)?,
                        });
                    }
                }
                descriptors.push(DescriptorExport {
                    component_type,
                    overall_status: ComponentStatus::from_code(d.overall_status),
                    state_change: d.flags & DescriptorFlags::STATE_CHANGE.bits() != 0,
                    state_change_count: d.state_change_count,
                    record_size: d.record_size,
                    first_index: d.first_index,
                    records,
                });
            }
            blocks.push(BlockExport {
                block_size: header.block_size,
                available: header.available,
                max_component_types: header.max_component_types,
                descriptors,
            });
        }

        Ok(StoreExport {
            enclosure_type,
            side_id: head.side_id,
            locale: head.locale,
            generation_count: head.generation_count,
            overall_state_change_count: head.overall_state_change_count,
            blocks,
        })
    }
}
