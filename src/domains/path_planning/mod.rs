pub mod dispatcher;
pub mod engine;
pub mod request;
pub mod wire;

pub use dispatcher::*;
pub use engine::{GridPathEngine, PathEngine};
pub use request::*;
pub use wire::*;
