pub mod error;
pub mod providers;
pub mod query;
pub mod scorer;
pub mod transfer_service;
