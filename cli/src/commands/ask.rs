use std::io::Write;
use std::sync::Arc;

use reviewqa::config::Config;
use reviewqa::pipeline::open_index;

use super::render_answer;

/// Run the `reviewqa ask` command against the saved index.
pub async fn run_ask(config: &Config, question: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let model = config.embedding_model()?;
    let store = open_index(&config.index_dir, model.name())?;
    let qa = config.retrieval_qa(Arc::new(store))?;

    let answer = qa.ask(question).await?;
    render_answer(&answer, out)?;
    Ok(())
}
