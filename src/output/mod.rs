//! Multi-format export writers
//!
//! One protocol engine (`ExportWriter`) in front of four format encoders.
//! `create_writer` selects the encoder once; after that the engine never
//! inspects which format is active.

mod encoder;
mod html;
mod json;
mod stream;
mod text;
mod writer;
mod yaml;

pub use encoder::{ChatListKind, Encoder};
pub use html::HtmlEncoder;
pub use json::JsonEncoder;
pub use stream::{OutputStream, RunLock};
pub use text::TextEncoder;
pub use writer::ExportWriter;
pub use yaml::YamlEncoder;

use chrono::{DateTime, Utc};

use crate::settings::Format;

/// Construct the writer matching the requested format
pub fn create_writer(format: Format) -> ExportWriter {
    match format {
        Format::Text => ExportWriter::new(Box::new(TextEncoder::new())),
        Format::Yaml => ExportWriter::new(Box::new(YamlEncoder::new())),
        Format::Html => ExportWriter::new(Box::new(HtmlEncoder::new())),
        Format::Json => ExportWriter::new(Box::new(JsonEncoder::new())),
    }
}

/// Timestamp rendering shared by every encoder
pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Human-readable byte size used by the text and HTML encoders
pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
