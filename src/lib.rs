//! Habomai scraper library.
//!
//! Collects a ramen shop account's posts from a saved timeline snapshot and
//! the live timeline API, parses shop, price, menu and commentary out of each
//! post body, optionally geocodes the shop, and writes everything as JSON.

pub mod config;
pub mod constants;
pub mod extract;
pub mod pipeline;
pub mod places;
pub mod post;
pub mod sources;
pub mod store;
