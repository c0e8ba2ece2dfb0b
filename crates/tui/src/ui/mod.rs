mod common;
mod kanban;
mod projects;

pub use common::*;
pub use kanban::*;
pub use projects::*;
