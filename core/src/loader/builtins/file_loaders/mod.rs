//! Module for loading documents from files.
//!
//! Currently provides the `csv_loader`, which turns every row of a delimited
//! file into one [`Document`](crate::document::Document).

mod utils;

pub mod csv_loader;

pub use csv_loader::{CsvLoader, CsvLoaderBuilder};
