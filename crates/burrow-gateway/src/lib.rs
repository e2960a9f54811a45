pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod owner;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use config::{Cli, Config, LogFormat};
pub use state::AppState;
