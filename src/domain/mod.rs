pub mod producer;
pub mod reward;
pub mod state;

pub use producer::*;
pub use reward::*;
pub use state::*;
