//! # Engine Module
//!
//! Block-chained enclosure data store.
//!
//! This module contains the building blocks of the store:
//! - Byte layouts and canaries
//! - Blocks, descriptors and the block chain
//! - Attribute dispatch across enclosure kinds
//! - Change tracking and snapshots
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod component;
pub mod attribute;
#[allow(missing_docs)]
pub mod layout;
pub mod record;
pub mod validation;
pub mod block;
pub mod chain;
pub mod dispatch;
pub mod tracking;
pub mod snapshot;
pub mod config;
pub mod store;
