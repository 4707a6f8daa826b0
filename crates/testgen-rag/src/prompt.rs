use crate::document::Chunk;
use crate::error::{RagError, Result};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

const DEFAULT_TEMPLATE: &str = "Write code answering the user's request as thoroughly as possible. \
Use only the information from the context. If the context does not contain the information \
needed, tell the user so and point out what in the context is similar to the request.
Context: {context}
Request: {question}
Answer:";

/// Prompt text with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

impl PromptTemplate {
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if either placeholder is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::Config(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute both slots in a single left-to-right pass, so placeholder text inside
    /// the substituted values is left alone.
    #[must_use]
    pub fn render(&self, context: &str, question: &str) -> String {
        let slots = [(CONTEXT_PLACEHOLDER, context), (QUESTION_PLACEHOLDER, question)];
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some((at, placeholder, value)) = slots
            .iter()
            .filter_map(|(p, v)| rest.find(p).map(|at| (at, *p, *v)))
            .min_by_key(|(at, ..)| *at)
        {
            out.push_str(&rest[..at]);
            out.push_str(value);
            rest = &rest[at + placeholder.len()..];
        }
        out.push_str(rest);
        out
    }
}

/// Optional prefix followed by chunk contents, separated by blank lines.
#[must_use]
pub fn format_context(chunks: &[Chunk], prefix: Option<&str>) -> String {
    prefix
        .filter(|p| !p.trim().is_empty())
        .into_iter()
        .chain(chunks.iter().map(|c| c.content.as_str()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
