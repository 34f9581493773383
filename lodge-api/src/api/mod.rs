//! HTTP API handlers for lodge-api

pub mod auth;
pub mod events;
pub mod extract;
pub mod health;
pub mod members;
pub mod payments;
pub mod receipts;

pub use auth::auth_routes;
pub use events::event_routes;
pub use health::health_routes;
pub use members::member_routes;
pub use payments::payment_routes;
pub use receipts::receipt_routes;
