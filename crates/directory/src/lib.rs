//! Persistence collaborator and application service for directory services.
//! - `service_record` owns the write path: assign input, normalize, validate, store.
//! - `db` holds the SeaORM queries; saving a service touches its location in the same transaction.
//! - Validation failures surface as `DirectoryError::Invalid` and nothing is written.

pub mod errors;
#[cfg(test)]
pub mod test_support;
pub mod db;
pub mod service_record;
