// Startup Scout - API Core
//
// HTTP front end for the scouting pipeline: SSE endpoints for scout runs and
// chat, plus query enhancement and a thin search proxy.

pub mod config;
pub mod server;

pub use config::*;
