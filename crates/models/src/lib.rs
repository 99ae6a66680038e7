pub mod errors;
pub mod db;
pub mod text;
pub mod validation;
pub mod location;
pub mod category;
pub mod categories_services;
pub mod service;
