pub mod admission;
pub mod delivery;
pub mod health_service;
pub mod submission_service;
