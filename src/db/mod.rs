pub mod changes;
pub mod photos;
pub mod pins;
pub mod pool;
pub mod settings;

pub use changes::{ChangeSet, PhotoFeed};
pub use pool::{create_pool, run_migrations};
