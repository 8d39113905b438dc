//! Clients for the external model collaborators.
//!
//! This crate provides:
//! - Adapter traits for detection, captioning, and summarization
//! - An HTTP client for the detection/captioning ML service
//! - A Cohere client for window summarization

pub mod adapter;
pub mod client;
pub mod cohere;
pub mod error;
pub mod types;

pub use adapter::{CaptionAdapter, DetectionAdapter, SummaryAdapter};
pub use client::{MlClient, MlClientConfig};
pub use cohere::{CohereClient, CohereConfig};
pub use error::{MlError, MlResult};
