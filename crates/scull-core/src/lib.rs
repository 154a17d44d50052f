//! Scull storage engine
//!
//! A sparse, dynamically growing byte store addressed like a seekable blob.
//! Memory is only spent on bytes that have actually been written.
//!
//! ## Layout
//!
//! - [`block`] - `quantum`-byte blocks, allocated on first write
//! - [`segment`] - segments holding `qset` block slots
//! - [`chain`] - the ordered list of segments, grown on demand
//! - [`address`] - offset to `(segment, block, byte)` translation
//! - [`store`] - `read` / `write` / `trim` on top of the chain
//! - [`config`] - geometry and allocation budgets
//! - [`error`] - error types
//!
//! ## Example Usage
//!
//! ```rust
//! use scull_core::{ScullStore, StoreConfig};
//!
//! let mut store = ScullStore::new(StoreConfig::new(4000, 1)).unwrap();
//!
//! assert_eq!(store.write(0, b"0123456789").unwrap(), 10);
//! assert_eq!(store.write(8000, b"0123456789").unwrap(), 10);
//! assert_eq!(store.current_size(), 8010);
//!
//! // Bytes 10..8000 were never written: reading there is a hole
//! let mut buf = [0u8; 4000];
//! assert_eq!(store.read(10, &mut buf).unwrap(), 0);
//!
//! store.trim();
//! assert_eq!(store.current_size(), 0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! offset ──► Geometry::locate ──► (segment, block, byte)
//!
//! SegmentChain
//! ┌───────────┐ ┌───────────┐ ┌───────────┐
//! │ Segment 0 │ │ Segment 1 │ │ Segment 2 │ ...
//! │  [B][ ]   │ │  (none)   │ │  [ ][B]   │
//! └───────────┘ └───────────┘ └───────────┘
//!   B = allocated block, [ ] = hole, (none) = no block array yet
//! ```

pub mod address;
pub mod block;
pub mod chain;
pub mod config;
mod copy;
pub mod error;
pub mod segment;
pub mod store;

pub use address::{Geometry, Position};
pub use block::Block;
pub use chain::SegmentChain;
pub use config::{StoreConfig, SCULL_QSET, SCULL_QUANTUM};
pub use error::{Result, ScullError};
pub use segment::Segment;
pub use store::{ScullStats, ScullStore};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
