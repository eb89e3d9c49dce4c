//! HTTP request handlers.
//!
//! - [`search`] - Compile a clause tree and run it against the index
//! - [`scroll`] - Continue a scrolled search
//! - [`documentation`] - Describe every registered clause type
//! - [`health`] - Service status

pub mod documentation;
pub mod health;
pub mod scroll;
pub mod search;

pub use documentation::documentation_handler;
pub use health::health_handler;
pub use scroll::scroll_handler;
pub use search::search_handler;
