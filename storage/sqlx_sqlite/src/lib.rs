pub mod configuration;
mod outages;
pub mod repository;

pub use outages::{LeadTime, NewOutage, OutageRecord};
