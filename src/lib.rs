pub mod config;
pub mod dispatch;
pub mod geo;
pub mod models;
pub mod push;
pub mod reliability;
pub mod repair;
pub mod store;
