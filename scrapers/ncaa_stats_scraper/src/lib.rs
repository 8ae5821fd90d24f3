pub mod checkpoint;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod input;
pub mod locator;
pub mod orchestrator;
pub mod pacing;
pub mod types;
