//! Imageseed: prompt-override image seeding
//!
//! A one-shot batch driver that resolves known buildings and agents from the
//! simulation store, pairs each with a hand-authored prompt from the catalog,
//! and asks the image generation service for one image per entity.

pub mod auth;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod store;
