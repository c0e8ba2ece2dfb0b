mod actions;
mod events;
mod keybindings;

pub use actions::*;
pub use events::*;
pub use keybindings::*;
