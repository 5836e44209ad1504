//! `bims-inventory` — inventory items and the stock ledger.
//!
//! The ledger is the structural core of the system: every stock-affecting
//! event is validated against current state, the new quantity is computed by
//! [`apply_movement`], and the log entry plus the item update are committed
//! as one unit by the infra layer.

pub mod item;
pub mod ledger;

pub use item::{InventoryItem, ItemUpdate, NewItem};
pub use ledger::{Movement, MovementKind, StockMovement, apply_movement};
