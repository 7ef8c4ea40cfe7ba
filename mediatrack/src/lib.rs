//! mediatrack library
//!
//! Storage, progress aggregation and entry lifecycle for a personal
//! anime/manga/novel tracker. The presentation layer talks to
//! [`services::EntriesService`].

pub mod app;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
