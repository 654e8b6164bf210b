pub mod admin;
pub mod backup;
pub mod cache;
pub mod config;
pub mod contact;
pub mod demo;
pub mod directory;
pub mod error;
pub mod newsletter;
pub mod pages;
pub mod store;
pub mod telemetry;
