//! Onboard Flow: configurable onboarding wizard and its backend.

pub mod admin;
pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod layout;
pub mod profile;
pub mod server;
pub mod services;
pub mod store;
pub mod wizard;
