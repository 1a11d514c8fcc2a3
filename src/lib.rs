//! ArtSpark - Backend for an art gallery website
//!
//! This library provides the artwork catalogue, moderated visitor reviews,
//! the contact inbox and token-based admin authentication.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
