//! Flag detection and the delete-and-respond moderation flow.

mod handler;
mod matcher;
mod selector;

pub use handler::{ModerationOutcome, moderate};
pub use matcher::PatternMatcher;
pub use selector::pick;
