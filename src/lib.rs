//! PR Reviewer - pull request reviewer assignment service.
//!
//! Manages teams, users and pull requests, and assigns reviewers from the
//! author's team. The HTTP surface in [`server`] is a thin layer over
//! [`services`]; all state lives in SQLite behind [`db`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

pub use error::AppError;
