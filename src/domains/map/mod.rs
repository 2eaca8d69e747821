pub mod events;
pub mod ports;
pub mod state;
pub mod synchronizer;

pub use events::*;
pub use ports::*;
pub use state::*;
pub use synchronizer::*;
