//! Storynook Database Layer
//!
//! This crate provides database operations for the story library.
//! It uses SQLite with sqlx for type-safe database queries.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{connect, DatabaseConfig, DbPool};
pub use migrations::{current_version, run_migrations, verify_integrity};
