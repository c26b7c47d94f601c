pub mod csv_mirror;

pub use csv_mirror::{CsvExporter, ExportError, ExportSink};
