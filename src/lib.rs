//! Rollcall Backend Library
//!
//! Identity gateway plus ownership-filtered CRUD over school records.
//! The `rollcall` binary wires these into an HTTP server.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod records;
