//! SeaORM-backed queries used by the service record repository.

pub mod service_record_service;
