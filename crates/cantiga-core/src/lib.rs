//! Core domain model for cantiga.
//!
//! This crate defines the value objects that flow through the song
//! resolution pipeline (queries, candidates, outcomes, scraped page
//! content) and the text normalization helpers shared by query
//! reformulation and candidate scoring. It performs no I/O.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod model;
pub mod text;

pub use model::{Candidate, MatchOutcome, ScrapedContent, SearchStrategy, SongQuery};
