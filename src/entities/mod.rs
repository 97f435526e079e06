pub mod drink_items;
pub mod inventory_entries;
pub mod players;
pub mod purchase_receipts;
pub mod stock_counters;

pub use drink_items as drink_item_entity;
pub use inventory_entries as inventory_entity;
pub use players as player_entity;
pub use purchase_receipts as receipt_entity;
pub use stock_counters as stock_entity;

pub use purchase_receipts::{PerkKind, ReceiptStatus};
