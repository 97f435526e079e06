pub mod admin;
pub mod autosearch;
pub mod common;
pub mod gift;
pub mod inventory;
pub mod item;
pub mod pagination;
pub mod player;
pub mod rarity;
pub mod search;
pub mod shop;

pub use admin::*;
pub use autosearch::*;
pub use common::*;
pub use gift::*;
pub use inventory::*;
pub use item::*;
pub use pagination::*;
pub use player::*;
pub use rarity::*;
pub use search::*;
pub use shop::*;
