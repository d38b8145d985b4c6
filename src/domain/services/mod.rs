pub mod booking_service;
pub mod catalog;
pub mod invite_registry;
pub mod lifecycle;
pub mod reconciliation;
