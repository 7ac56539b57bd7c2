//! Key storage and queries

pub mod predicate;
pub mod registry;
pub mod sweeper;

pub use predicate::KeyPredicate;
pub use registry::KeyRegistry;
pub use sweeper::spawn_expiry_sweeper;
