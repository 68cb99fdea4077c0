pub mod api;
pub mod cli;
pub mod logging;
pub mod reorder;
pub mod settings;
pub mod types;
