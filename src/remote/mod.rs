//! Client for the remote realtime document store ("Projects" and
//! "Category" collections) plus the per-field wire coercion layer.

pub mod client;
pub mod decode;

pub use client::{ProjectSource, RemoteStore};
