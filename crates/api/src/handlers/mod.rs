pub mod auth;
pub mod health;
pub mod migration;
pub mod upload;
pub mod users;
