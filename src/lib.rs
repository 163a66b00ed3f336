//! Core library functions for the peer review graph

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod storage;

pub use anyhow::{Result, anyhow};
