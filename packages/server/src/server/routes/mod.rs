// HTTP routes
pub mod chat;
pub mod enhance;
pub mod health;
pub mod scout;
pub mod search;
pub mod stream;

pub use chat::*;
pub use enhance::*;
pub use health::*;
pub use scout::*;
pub use search::*;
