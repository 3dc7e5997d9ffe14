// evlayer Event Handling
// Key event model and the sequential processing loop

mod runner;
mod state;

pub use runner::{EventRunner, RunError, RunStats, DEFAULT_POLL_TIMEOUT_MS};
pub use state::{KeyEvent, KeyState};
