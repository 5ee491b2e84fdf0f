use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use reviewqa::config::Config;
use reviewqa::qa::RetrievalQa;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::error;

use super::{index::open_or_build, render_answer};
use crate::logging::read_log;

const QUIT: &str = ":quit";
const LOGS: &str = ":logs";

/// Run the `reviewqa chat` command on stdin.
pub async fn run_chat(
    config: &Config,
    patterns: Vec<String>,
    rebuild: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let store = open_or_build(config, patterns, rebuild).await?;
    let qa = config.retrieval_qa(Arc::new(store))?;

    writeln!(out, "Ask a question about the reviews ({LOGS} shows the log, {QUIT} exits).")?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    chat_loop(&qa, &config.log_file, stdin, out).await
}

/// One answer per input line until `:quit` or end of input.
pub async fn chat_loop<R>(
    qa: &RetrievalQa,
    log_file: &Path,
    input: R,
    out: &mut dyn Write,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            QUIT => break,
            LOGS => write!(out, "{}", read_log(log_file)?)?,
            question => match qa.ask(question).await {
                Ok(answer) => render_answer(&answer, out)?,
                Err(e) => {
                    error!("Error processing question: {e}");
                    writeln!(out, "Error: {e}")?;
                }
            },
        }
    }
    Ok(())
}
