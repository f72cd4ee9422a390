pub mod cache;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod loader;
pub mod populate;

pub use cache::{CacheEntry, GraphCache};
pub use config::Config;
pub use data::Store;
pub use engine::{Clock, ConnectedComments, ConnectedGraph, GraphEngine, ReadMode};
pub use error::CoreError;
pub use loader::load_corpus;
pub use populate::{
    PopulationFailure, PopulationManifest, PopulationOptions, PopulationProgressCallback, Populator,
};
