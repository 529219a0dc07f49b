//! Property tests entry point.

mod documents;
mod resolution;
