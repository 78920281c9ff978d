//! Inbound event pipeline: click tracking with idempotent logging, the
//! spoofed login page, and append-only credential capture.

pub mod service;

pub use service::{RequestMeta, TrackingService};
