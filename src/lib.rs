pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
