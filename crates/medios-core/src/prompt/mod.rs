mod builder;
mod intent;
mod templates;

pub use builder::{build, shape_for, QueryRequest};
pub use intent::{IntentKind, PromptIntent};
