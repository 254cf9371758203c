//! WealthBlocks Backend Library
//!
//! Data pipeline for the block-proportional wealth visualization:
//! snapshot reconciliation, deterministic coloring, block quantization,
//! cache persistence and best-effort live value updates. Rendering and
//! all DOM/UI concerns live elsewhere; they hand this crate a refresh
//! request and receive a render plan back.

pub mod baseline;
pub mod cache;
pub mod color;
pub mod config;
pub mod export;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod quantize;
pub mod reconcile;
pub mod session;
pub mod view;
