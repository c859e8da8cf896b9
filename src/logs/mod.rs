// Logs module - Log line model and rendering

mod line;
mod render;

pub use line::{LogLine, Timestamp};
pub use render::{render_line, render_line_in, LineRenderer, TIMESTAMP_FORMAT};
