pub mod buffered_logger;
pub mod console_logger;
pub mod file_logger;
pub mod geojson_renderer;
pub mod map_data;
pub mod multi_logger;
pub mod noop_logger;
pub mod recording_renderer;

pub use buffered_logger::*;
pub use console_logger::*;
pub use file_logger::*;
pub use geojson_renderer::*;
pub use map_data::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use recording_renderer::*;
