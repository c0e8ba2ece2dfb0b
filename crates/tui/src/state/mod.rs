mod app_state;
mod board;
mod projects;

pub use app_state::*;
pub use board::*;
pub use projects::*;
