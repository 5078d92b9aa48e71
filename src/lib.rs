pub mod config;
pub mod daemon;
pub mod domain;
pub mod engine;
pub mod mail;
pub mod store;
pub mod surface;
pub mod terminal;
