#![doc = "docintel-bucket-core: core logic library for docintel-bucket."]

//! This crate holds the document tree engine and the storage/analysis pipeline
//! built around it. Concrete cloud clients are not included here; they implement
//! the traits in [`contract`].
//!
//! # Layout
//! - [`tree`]: key projection, key pruning with page-number hoisting, key-path listing
//! - [`contract`]: `BlobStore` and `DocumentAnalyzer` traits (mockable)
//! - [`catalog`]: container listings grouped by extension, blob loading/decoding
//! - [`analysis`]: PDF submission to the analyzer
//! - [`output`]: blob writes and local file I/O
//! - [`pipeline`]: the batch run tying it all together

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod tree;
