//! Commands Layer
//!
//! Command handlers the admin shell invokes on behalf of its list screens.
//! Every handler returns `Result<_, String>` so errors cross the UI boundary as
//! user-facing text.

mod reorder_cmd;
mod log_cmd;

pub use reorder_cmd::*;
pub use log_cmd::*;
