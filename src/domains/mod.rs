pub mod geometry;
pub mod logger;
pub mod map;
pub mod path_planning;

pub use geometry::*;
pub use logger::*;
pub use map::*;
pub use path_planning::*;
