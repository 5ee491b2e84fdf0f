pub mod ask;
pub mod chat;
pub mod import;
pub mod index;

use std::io::Write;

use reviewqa::qa::Answer;

/// Prints the answer followed by the chunks it was based on.
pub fn render_answer(answer: &Answer, out: &mut dyn Write) -> std::io::Result<()> {
    match answer {
        Answer::Found { text, .. } => writeln!(out, "{text}")?,
        Answer::NoAnswer { reason, .. } => {
            writeln!(out, "An error occurred while processing your query: {reason}")?;
        }
    }
    let sources = answer.sources();
    if !sources.is_empty() {
        writeln!(out, "\nSources:")?;
        for (i, hit) in sources.iter().enumerate() {
            writeln!(out, "[{}] {} (score {:.4})", i + 1, hit.id, hit.score)?;
            for line in hit.text.lines() {
                writeln!(out, "    {line}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewqa::vector_store::SearchHit;

    #[test]
    fn render_found_answer_with_sources() {
        let answer = Answer::Found {
            text: "Shipping is fast.".to_string(),
            sources: vec![SearchHit {
                id: "0:0".to_string(),
                text: "CustomerID: 1\nReviewText: fast shipping".to_string(),
                score: 0.91234,
            }],
        };
        let mut out = Vec::new();
        render_answer(&answer, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Shipping is fast.\n\nSources:\n[1] 0:0 (score 0.9123)\n    CustomerID: 1\n    ReviewText: fast shipping\n"
        );
    }

    #[test]
    fn render_no_answer() {
        let answer = Answer::NoAnswer {
            reason: "connection refused".to_string(),
            sources: vec![],
        };
        let mut out = Vec::new();
        render_answer(&answer, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "An error occurred while processing your query: connection refused\n"
        );
    }
}
