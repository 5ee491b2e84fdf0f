use sqlx::{Acquire, PgPool};
use tracing::{error, info};

use super::{ImportError, Review};

pub const TABLE: &str = "customer_reviews_new";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Creates `customer_reviews_new` unless it already exists.
///
/// Dates are stored as text, `YYYY-MM-DD`.
pub async fn ensure_table(pool: &PgPool) -> Result<(), ImportError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS customer_reviews_new (
            CustomerID INT PRIMARY KEY,
            Name VARCHAR(255),
            Age INT,
            PurchaseDate VARCHAR(255),
            ProductCategory VARCHAR(255),
            ReviewRating INT,
            ReviewText TEXT
        )",
    )
    .execute(pool)
    .await?;
    info!("Table '{TABLE}' is ready");
    Ok(())
}

/// Inserts every review in one transaction, committed at the end.
///
/// A row the database rejects (a duplicate `CustomerID`, say) is rolled back
/// to its savepoint, logged and skipped.
pub async fn insert_reviews(pool: &PgPool, reviews: &[Review]) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();
    let mut tx = pool.begin().await?;

    for (index, review) in reviews.iter().enumerate() {
        let mut row_tx = tx.begin().await?;
        let result = sqlx::query(
            "INSERT INTO customer_reviews_new (CustomerID, Name, Age, PurchaseDate, ProductCategory, ReviewRating, ReviewText)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(review.customer_id)
        .bind(&review.name)
        .bind(review.age)
        .bind(review.purchase_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&review.product_category)
        .bind(review.review_rating)
        .bind(&review.review_text)
        .execute(&mut *row_tx)
        .await;

        match result {
            Ok(_) => {
                row_tx.commit().await?;
                report.inserted += 1;
            }
            Err(e) => {
                row_tx.rollback().await?;
                error!("Error inserting row {}: {e}", index + 1);
                report.skipped += 1;
            }
        }
    }

    tx.commit().await?;
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Data uploaded into the '{TABLE}' table"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(customer_id: i32) -> Review {
        Review {
            customer_id,
            name: Some("Abebe".to_string()),
            age: Some(30),
            purchase_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
            product_category: Some("Kitchen".to_string()),
            review_rating: 5,
            review_text: Some("Great product, fast shipping".to_string()),
        }
    }

    // needs a disposable database in DATABASE_URL
    #[tokio::test]
    #[ignore]
    async fn test_duplicate_rows_are_skipped() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::query("DROP TABLE IF EXISTS customer_reviews_new")
            .execute(&pool)
            .await
            .unwrap();
        ensure_table(&pool).await.unwrap();

        let report = insert_reviews(&pool, &[review(1), review(2), review(1)])
            .await
            .unwrap();

        assert_eq!(report, ImportReport { inserted: 2, skipped: 1 });
    }
}
