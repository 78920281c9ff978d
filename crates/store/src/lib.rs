//! In-memory stores backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! The same API surface drives development and testing; the click-dedup
//! write in [`events::EventStore`] keeps the atomicity a unique index
//! would provide.

pub mod campaigns;
pub mod directory;
pub mod events;

pub use campaigns::CampaignStore;
pub use directory::DirectoryStore;
pub use events::EventStore;
