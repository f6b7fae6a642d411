//! Canary and reference checks performed before any block or record is trusted.
//!
//! Every traversal step goes through these functions: the chain walk checks
//! each block header before reading its descriptor table, and every record view
//! checks the record canary before exposing a single field. Failures are logged
//! at `error` level and returned as distinct [`ValidationError`] variants, so a
//! caller can tell a store that was never initialized (or already released) from
//! one whose memory was overwritten.
//!
//! Ownership and bounds checking already rule out dangling references inside the
//! process. The canaries stay because the byte image of a chain crosses process
//! boundaries through [`crate::engine::snapshot`], and a rebuilt chain has to be
//! validated the same way a live one is.

use log::error;

use crate::engine::error::{CanaryError, ValidationError};
use crate::engine::layout::{read_pod, BlockHeader};
use crate::engine::types::{BLOCK_CANARY, COMPONENT_CANARY};


/// Checks that `bytes` is a non-empty record with an intact canary.
pub fn check_record(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.is_empty() {
        error!("EDAL: null component record");
        return Err(ValidationError::NullRecord);
    }
    let actual: u32 = match read_pod(bytes, 0) {
        Some(canary) => canary,
        None => {
            error!("EDAL: component record of {} bytes cannot hold a canary", bytes.len());
            return Err(ValidationError::NullRecord);
        }
    };
    if actual != COMPONENT_CANARY {
        error!(
            "EDAL: invalid component canary, expected {:#010x}, actual {:#010x}",
            COMPONENT_CANARY, actual
        );
        return Err(ValidationError::RecordCorrupt(CanaryError { expected: COMPONENT_CANARY, actual }));
    }
    Ok(())
}

/// Checks that `bytes` starts with an intact block header and returns it.
pub fn check_block(bytes: &[u8]) -> Result<BlockHeader, ValidationError> {
    let header: BlockHeader = match read_pod(bytes, 0) {
        Some(header) => header,
        None => {
            error!("EDAL: null block pointer ({} bytes)", bytes.len());
            return Err(ValidationError::NullBlock);
        }
    };
    if header.canary != BLOCK_CANARY {
        error!(
            "EDAL: invalid block canary, expected {:#010x}, actual {:#010x}",
            BLOCK_CANARY, header.canary
        );
        return Err(ValidationError::BlockCorrupt(CanaryError { expected: BLOCK_CANARY, actual: header.canary }));
    }
    Ok(header)
}

/// Unwraps an optional chain link, reporting a null block when absent.
pub fn require<T>(link: Option<T>) -> Result<T, ValidationError> {
    link.ok_or_else(|| {
        error!("EDAL: null block pointer");
        ValidationError::NullBlock
    })
}

/// Non-logging canary probe used by diagnostics.
pub fn record_canary_intact(bytes: &[u8]) -> bool {
    read_pod::<u32>(bytes, 0) == Some(COMPONENT_CANARY)
}
