//! Financial term dictionary backed by a generative-text API.
//!
//! A lookup runs two dependent model calls: a full explanation of the term,
//! then a summary of that explanation. [`SearchController`] tracks the
//! per-search state and [`format`] turns model text into display segments.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod messages;
pub mod service;

#[cfg(feature = "web")]
pub mod web;

pub use client::{GeminiClient, TextGenerator};
pub use config::Config;
pub use controller::{InteractionState, PendingSearch, RequestId, SearchController, SearchSession};
pub use error::{ConfigError, GenerationError, LookupError};
pub use format::{DisplaySegment, format};
pub use service::{DefinitionResult, DefinitionService};
