pub mod event_bus;
pub mod gate;
pub mod timers;

pub use event_bus::*;
pub use gate::*;
pub use timers::*;
