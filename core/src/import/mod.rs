//! Spreadsheet to relational table import.
//!
//! Reads the customer review export, coerces types, fills gaps and (with the
//! `postgres` feature) inserts the rows into `customer_reviews_new`.

#[cfg(feature = "postgres")]
pub mod postgres;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Accepted `PurchaseDate` formats, tried in order.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%b %d, %Y"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One row of the review export as it appears in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawReview {
    #[serde(rename = "CustomerID")]
    pub customer_id: i32,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "PurchaseDate")]
    pub purchase_date: Option<String>,
    #[serde(rename = "ProductCategory")]
    pub product_category: Option<String>,
    #[serde(rename = "ReviewRating")]
    pub review_rating: Option<f64>,
    #[serde(rename = "ReviewText")]
    pub review_text: Option<String>,
}

/// A review after preprocessing, ready to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "CustomerID")]
    pub customer_id: i32,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    /// `None` only when no row of the file has an age.
    #[serde(rename = "Age")]
    pub age: Option<i32>,
    /// `None` when the date matched none of [`DATE_FORMATS`].
    #[serde(rename = "PurchaseDate")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(rename = "ProductCategory")]
    pub product_category: Option<String>,
    #[serde(rename = "ReviewRating")]
    pub review_rating: i32,
    #[serde(rename = "ReviewText")]
    pub review_text: Option<String>,
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

pub fn read_reviews(path: impl AsRef<Path>) -> Result<Vec<RawReview>, ImportError> {
    let path = path.as_ref();
    let read_error = |source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawReview>, _>>()
        .map_err(|e| {
            error!(path = %path.display(), "Failed to read reviews: {e}");
            read_error(e)
        })?;
    info!(path = %path.display(), rows = rows.len(), "Loaded review rows");
    Ok(rows)
}

/// Parses purchase dates, defaults missing ratings to 0 and missing ages to
/// the mean of the known ages.
pub fn preprocess(rows: Vec<RawReview>) -> Vec<Review> {
    info!("Preprocessing data...");
    let ages: Vec<f64> = rows.iter().filter_map(|r| r.age).collect();
    let mean_age = (!ages.is_empty()).then(|| ages.iter().sum::<f64>() / ages.len() as f64);

    rows.into_iter()
        .map(|row| {
            let purchase_date = row.purchase_date.as_deref().and_then(|d| {
                let parsed = parse_date(d);
                if parsed.is_none() {
                    warn!(customer_id = row.customer_id, date = d, "Unrecognized purchase date");
                }
                parsed
            });
            Review {
                customer_id: row.customer_id,
                name: row.name,
                age: row.age.or(mean_age).map(|a| a.round() as i32),
                purchase_date,
                product_category: row.product_category,
                review_rating: row.review_rating.unwrap_or(0.0).round() as i32,
                review_text: row.review_text,
            }
        })
        .collect()
}

pub fn write_preprocessed(path: impl AsRef<Path>, reviews: &[Review]) -> Result<(), ImportError> {
    let path = path.as_ref();
    let write_error = |source| ImportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for review in reviews {
        writer.serialize(review).map_err(write_error)?;
    }
    writer.flush().map_err(|e| write_error(e.into()))?;
    info!("Preprocessed data saved to '{}'", path.display());
    Ok(())
}
