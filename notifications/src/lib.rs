pub mod configuration;
pub mod delivery;
pub mod notify;
pub mod viber;
