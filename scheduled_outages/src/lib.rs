pub mod configuration;
pub mod location_cache;
pub mod web_page_reader;
