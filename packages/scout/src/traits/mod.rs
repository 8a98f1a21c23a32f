//! Seams to the outside world.

pub mod llm;
pub mod searcher;
