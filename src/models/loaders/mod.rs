pub mod config_loader;

pub use config_loader::{load_run_config, save_run_config};
