#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::multiple_crate_versions)]

//! Shared configuration and data model for the Curator console.

pub mod config;
pub mod models;
