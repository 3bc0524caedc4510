//! Services module
//!
//! Business logic services that coordinate between routes and repository.

pub mod documents;

pub use documents::DocumentService;
