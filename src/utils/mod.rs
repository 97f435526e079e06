pub mod cooldown;
pub mod token;

pub use cooldown::{check_cooldown, effective_cooldown_secs, CooldownCheck};
pub use token::generate_offer_token;
