//! LLM-backed docstring generation.
//!
//! Builds the prompt, cleans the model's output (markdown fences, chatty
//! intros, trailing notes), and gates on the result still looking like
//! Python. When the gate fails the input code is returned unchanged; only
//! transport/backend errors propagate so the pipeline can record them.

use std::sync::OnceLock;

use regex::Regex;

use crate::llm::{LlmBackend, LlmError};

const SYSTEM_PROMPT: &str = "You are a Python expert. You add clear, concise Google-style \
docstrings. You return ONLY the Python code, with no text before or after.";

fn build_prompt(code: &str) -> String {
    format!(
        "Add Google-style docstrings to every function and class in this Python code.\n\
         \n\
         Rules:\n\
         - Do NOT change the code logic\n\
         - Only add missing docstrings\n\
         - Use the Google style (Args, Returns, Raises)\n\
         - Be concise and precise\n\
         - Return ONLY the Python code, with no text before or after\n\
         \n\
         Code:\n\
         ```python\n\
         {code}\n\
         ```"
    )
}

fn fence_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^```(?:python)?\n?").unwrap())
}

fn fence_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\s*$").unwrap())
}

fn intro_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:here is|here's|the code)[^\n]*:\n*").unwrap())
}

fn trailing_note_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\n+note\s*:.*$").unwrap())
}

/// Strip non-code chatter from a raw LLM completion.
pub fn clean_llm_output(text: &str) -> String {
    let text = fence_open_re().replace_all(text, "");
    let text = fence_close_re().replace(&text, "");
    let text = intro_re().replace(&text, "");
    let text = trailing_note_re().replace(&text, "");
    text.trim().to_string()
}

/// Does the cleaned output still look like Python code?
fn looks_like_python(text: &str) -> bool {
    !text.is_empty() && (text.contains("def ") || text.contains("class "))
}

/// Ask the backend to add docstrings to `code`.
///
/// Returns the documented code, or the input unchanged when the model's
/// output fails the validity gate.
pub async fn generate_docstrings(llm: &LlmBackend, code: &str) -> Result<String, LlmError> {
    let response = llm.generate(SYSTEM_PROMPT, &build_prompt(code)).await?;
    let cleaned = clean_llm_output(&response);

    if looks_like_python(&cleaned) {
        Ok(cleaned)
    } else {
        tracing::warn!("LLM output failed the Python gate, keeping input code");
        Ok(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        let raw = "```python\ndef f():\n    pass\n```";
        assert_eq!(clean_llm_output(raw), "def f():\n    pass");
    }

    #[test]
    fn strips_bare_fences() {
        let raw = "```\ndef f():\n    pass\n```";
        assert_eq!(clean_llm_output(raw), "def f():\n    pass");
    }

    #[test]
    fn strips_intro_sentence() {
        let raw = "Here is the documented code:\ndef f():\n    pass";
        assert_eq!(clean_llm_output(raw), "def f():\n    pass");
    }

    #[test]
    fn strips_trailing_note() {
        let raw = "def f():\n    pass\n\nNote: I added one docstring.";
        assert_eq!(clean_llm_output(raw), "def f():\n    pass");
    }

    #[test]
    fn plain_code_passes_through() {
        let raw = "def f():\n    \"\"\"Doc.\"\"\"\n    pass";
        assert_eq!(clean_llm_output(raw), raw);
    }

    #[tokio::test]
    async fn returns_cleaned_model_output() {
        let llm = LlmBackend::mock("```python\ndef f():\n    \"\"\"Doc.\"\"\"\n    pass\n```");
        let out = generate_docstrings(&llm, "def f():\n    pass\n").await.unwrap();
        assert_eq!(out, "def f():\n    \"\"\"Doc.\"\"\"\n    pass");
    }

    #[tokio::test]
    async fn falls_back_when_output_is_not_python() {
        let llm = LlmBackend::mock("Sorry, I cannot help with that.");
        let code = "def f():\n    pass\n";
        let out = generate_docstrings(&llm, code).await.unwrap();
        assert_eq!(out, code);
    }

    #[tokio::test]
    async fn falls_back_on_empty_output() {
        let llm = LlmBackend::mock("");
        let code = "class A:\n    pass\n";
        let out = generate_docstrings(&llm, code).await.unwrap();
        assert_eq!(out, code);
    }
}
