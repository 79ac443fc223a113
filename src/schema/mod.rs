//! Schema module - Configuration, draft and score types for the draft search.

mod config;
mod draft;
mod score;
mod search;

pub use config::*;
pub use draft::*;
pub use score::*;
pub use search::*;
