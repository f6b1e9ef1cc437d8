pub mod api;
pub mod config;
pub mod db;
pub mod gym;
pub mod recent;
pub mod refresh;
pub mod scrape;
pub mod store;
