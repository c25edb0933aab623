// protoeval-host library
// Axum host serving the embedded UI and the document evaluation endpoint

// HTTP surface
pub mod api;

// Configuration
pub mod config;

// Embedded UI assets (single-binary distribution)
pub mod embedded;

// LLM evaluation
pub mod evaluate;

// Uploaded document text extraction
pub mod extract;
