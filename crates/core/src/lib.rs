pub mod config;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod links;
pub mod pages;
pub mod types;

pub use config::AppConfig;
pub use error::{PhishlineError, PhishlineResult};
