pub mod features;
pub mod projection;
pub mod types;

pub use projection::*;
pub use types::*;
