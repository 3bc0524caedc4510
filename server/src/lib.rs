//! Highlighter library
//!
//! Document highlighting backend: accounts, uploaded text documents and the
//! highlights drawn over them, served over HTTP. Exposed as a library for
//! integration tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod services;
