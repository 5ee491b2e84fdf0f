use std::io::Write;
use std::path::Path;

use reviewqa::import::{postgres, preprocess, read_reviews, write_preprocessed};
use sqlx::PgPool;

/// Run the `reviewqa import` command.
pub async fn run_import(
    csv: &Path,
    database_url: &str,
    preprocessed_out: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let reviews = preprocess(read_reviews(csv)?);

    let pool = PgPool::connect(database_url).await?;
    postgres::ensure_table(&pool).await?;
    let report = postgres::insert_reviews(&pool, &reviews).await?;
    pool.close().await;

    write_preprocessed(preprocessed_out, &reviews)?;
    writeln!(
        out,
        "Inserted {} rows into '{}' ({} skipped); preprocessed data saved to '{}'",
        report.inserted,
        postgres::TABLE,
        report.skipped,
        preprocessed_out.display()
    )?;
    Ok(())
}
