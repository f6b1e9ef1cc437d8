pub mod client;
pub mod service;

pub use client::{Clock, Scraper};
pub use service::ScrapeService;
