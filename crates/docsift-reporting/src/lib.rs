pub mod export;

pub use export::{ExportError, ExportFormat, export_report, render_report};
