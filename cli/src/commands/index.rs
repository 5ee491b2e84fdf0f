use std::io::Write;

use reviewqa::config::Config;
use reviewqa::pipeline::IndexPipeline;
use reviewqa::vector_store::InMemoryVectorStore;

/// Builds the pipeline for `patterns` and opens or (re)builds the index in
/// the configured directory.
pub async fn open_or_build(
    config: &Config,
    patterns: Vec<String>,
    rebuild: bool,
) -> anyhow::Result<InMemoryVectorStore> {
    let pipeline = IndexPipeline::new(
        config.csv_loader(patterns)?,
        config.splitter()?,
        config.embedder()?,
    );
    Ok(pipeline.open_or_build(&config.index_dir, rebuild).await?)
}

/// Run the `reviewqa index` command.
pub async fn run_index(
    config: &Config,
    patterns: Vec<String>,
    rebuild: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let store = open_or_build(config, patterns, rebuild).await?;
    let manifest = store.manifest().await;
    writeln!(
        out,
        "Index {} holds {} chunks ({} dimensions, model `{}`) in {}",
        manifest.index_id,
        manifest.entries,
        manifest.dimension,
        manifest.embedding_model,
        config.index_dir.display()
    )?;
    Ok(())
}
