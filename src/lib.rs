pub mod bot;
pub mod config;
pub mod error;
pub mod gateway;
pub mod moderation;
