#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{build_engine, load_config, population_options, resolve_path};
