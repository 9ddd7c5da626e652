pub mod render;
pub mod state;

pub use state::{Event, Screen};
