pub mod autosearch;
pub mod gift_service;
pub mod inventory_service;
pub mod item_service;
pub mod locks;
pub mod player_service;
pub mod purchase_service;
pub mod reward_service;

pub use autosearch::AutoSearchService;
pub use gift_service::GiftService;
pub use inventory_service::InventoryService;
pub use item_service::ItemService;
pub use locks::{ActionGuard, LockRegistry};
pub use player_service::PlayerService;
pub use purchase_service::PurchaseService;
pub use reward_service::RewardService;
