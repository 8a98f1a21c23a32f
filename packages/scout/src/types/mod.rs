//! Domain types for scouting runs.

pub mod candidate;
pub mod company;
pub mod request;
pub mod run;
