#![forbid(unsafe_code)]

//! Lists the uploads of a YouTube channel, optionally narrowed to shorts or
//! long videos, behind a single JSON endpoint.

pub mod api;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod filter;
pub mod youtube;
