use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::utils::resolve_input_to_files;
use crate::{
    document::{Document, ROW_KEY, SOURCE_KEY},
    loader::{Loader, LoaderError},
};

/// A builder for constructing a [`CsvLoader`].
///
/// It takes a list of glob patterns, validates them, and resolves them to
/// actual files when [`build`](CsvLoaderBuilder::build) is called.
pub struct CsvLoaderBuilder {
    glob_patterns: Vec<String>,
    delimiter: u8,
    source_column: Option<String>,
    required_columns: Vec<String>,
}

impl CsvLoaderBuilder {
    /// Creates a new `CsvLoaderBuilder` instance.
    ///
    /// # Errors
    /// Returns [`LoaderError::InvalidGlobPattern`] if any pattern fails to parse.
    pub fn new(glob_patterns: Vec<String>) -> Result<Self, LoaderError> {
        for p in &glob_patterns {
            Pattern::new(p)?;
        }

        Ok(Self {
            glob_patterns,
            delimiter: b',',
            source_column: None,
            required_columns: vec![],
        })
    }

    /// Field delimiter, `,` by default
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Column whose value is recorded as the document's `source` instead of the file path
    #[must_use]
    pub fn source_column(mut self, column: impl Into<String>) -> Self {
        self.source_column = Some(column.into());
        self
    }

    /// Columns every file's header row has to contain
    #[must_use]
    pub fn required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    /// Resolves the glob patterns and constructs the `CsvLoader`.
    pub fn build(self) -> Result<CsvLoader, LoaderError> {
        let files = resolve_input_to_files(&self.glob_patterns)?;
        Ok(CsvLoader {
            files,
            delimiter: self.delimiter,
            source_column: self.source_column,
            required_columns: self.required_columns,
        })
    }
}

/// Reads delimited text files with a header row, producing one [`Document`]
/// per row.
///
/// The document content lists every field as a `header: value` line in header order.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    files: Vec<PathBuf>,
    delimiter: u8,
    source_column: Option<String>,
    required_columns: Vec<String>,
}

impl CsvLoader {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Blocking counterpart of [`Loader::load`].
    pub fn load_blocking(&self) -> Result<Vec<Document>, LoaderError> {
        let mut documents = vec![];
        for file in &self.files {
            self.read_file(file, &mut documents)?;
        }
        if documents.is_empty() {
            return Err(LoaderError::NoRecords);
        }
        Ok(documents)
    }

    fn read_file(&self, path: &Path, documents: &mut Vec<Document>) -> Result<(), LoaderError> {
        let csv_error = |source| LoaderError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(LoaderError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        self.check_columns(path, &headers)?;
        let source_index = self
            .source_column
            .as_ref()
            .and_then(|c| headers.iter().position(|h| h.trim() == c));

        let mut record = StringRecord::new();
        let mut row = 0usize;
        while reader.read_record(&mut record).map_err(csv_error)? {
            let source = match source_index {
                Some(i) => record.get(i).unwrap_or_default().trim().to_string(),
                None => path.display().to_string(),
            };
            let doc = Document::new(documents.len(), serialize_row(&headers, &record))
                .with_metadata(SOURCE_KEY, source)
                .with_metadata(ROW_KEY, row.to_string());
            documents.push(doc);
            row += 1;
        }
        info!(file = %path.display(), rows = row, "Read CSV file");
        Ok(())
    }

    fn check_columns(&self, path: &Path, headers: &StringRecord) -> Result<(), LoaderError> {
        let missing: Vec<String> = self
            .required_columns
            .iter()
            .chain(self.source_column.iter())
            .filter(|c| !headers.iter().any(|h| h.trim() == c.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoaderError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            })
        }
    }
}

#[async_trait]
impl Loader for CsvLoader {
    async fn load(&self) -> Result<Vec<Document>, LoaderError> {
        let loader = self.clone();
        let result = tokio::task::spawn_blocking(move || loader.load_blocking())
            .await
            .map_err(|e| LoaderError::Task(e.to_string()))?;
        match &result {
            Ok(docs) => info!("Loaded {} records from {} file(s)", docs.len(), self.files.len()),
            Err(e) => error!("Error loading CSV data: {e}"),
        }
        result
    }
}

/// Serializes a row as `header: value` lines, trimming both sides.
pub fn serialize_row(headers: &StringRecord, record: &StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .map(|(k, v)| format!("{}: {}", k.trim(), v.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
