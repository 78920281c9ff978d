//! HTTP surface: campaign send/preview/job endpoints, the tracking and
//! capture endpoints recipients hit, and operational routes.

pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::ApiServer;
