use super::AnswerError;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";
pub const DEFAULT_TEMPLATE: &str = "Given this context: {context}\n\nQuestion: {question}\n\nAnswer:";

/// A prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, AnswerError> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(AnswerError::InvalidTemplate(placeholder));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill both placeholders. Placeholder-like text inside `context` or
    /// `question` is left alone.
    pub fn format(&self, context: &str, question: &str) -> String {
        self.template
            .split(CONTEXT_PLACEHOLDER)
            .map(|part| part.replace(QUESTION_PLACEHOLDER, question))
            .collect::<Vec<_>>()
            .join(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let prompt = PromptTemplate::default().format("fast shipping", "How is shipping?");
        assert_eq!(
            prompt,
            "Given this context: fast shipping\n\nQuestion: How is shipping?\n\nAnswer:"
        );
    }

    #[test]
    fn test_template_needs_both_placeholders() {
        assert_eq!(
            PromptTemplate::new("Context: {context}"),
            Err(AnswerError::InvalidTemplate(QUESTION_PLACEHOLDER))
        );
        assert_eq!(
            PromptTemplate::new("Q: {question}"),
            Err(AnswerError::InvalidTemplate(CONTEXT_PLACEHOLDER))
        );
    }

    #[test]
    fn test_placeholders_in_values_are_not_expanded() {
        let template = PromptTemplate::new("{question}|{context}|{question}").unwrap();
        assert_eq!(
            template.format("ctx {question}", "q {context}"),
            "q {context}|ctx {question}|q {context}"
        );
    }
}
