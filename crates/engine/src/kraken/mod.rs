//! Kraken REST exchange client.

pub mod mapping;
mod model;
mod rest;

pub use rest::KrakenClient;
