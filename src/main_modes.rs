mod claimer_mode;

pub use claimer_mode::{run_claimer, run_status};
