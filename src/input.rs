//! Query input using rustyline
//!
//! Reads one line of free text per run. Ctrl-C, Ctrl-D and blank input are
//! all reported as input errors; there is nothing to search for.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

use crate::errors::{PipelineError, Result};

/// Interactive prompt for the search query
pub struct QueryPrompt {
    editor: DefaultEditor,
    prompt: String,
}

impl QueryPrompt {
    /// Create a prompt naming the document being searched
    pub fn new(document: &Path) -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| PipelineError::InputError(format!("Failed to open terminal: {}", e)))?;

        Ok(Self {
            editor,
            prompt: Self::prompt_for(document),
        })
    }

    fn prompt_for(document: &Path) -> String {
        let name = document
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.display().to_string());
        format!("What do you want to know about {}? ", name)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Read one query line
    pub fn read_query(&mut self) -> Result<String> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => normalize_query(&line),
            Err(ReadlineError::Interrupted) => {
                Err(PipelineError::InputError("Interrupted".to_string()))
            }
            Err(ReadlineError::Eof) => {
                Err(PipelineError::InputError("No query provided".to_string()))
            }
            Err(err) => Err(PipelineError::InputError(format!("Readline error: {}", err))),
        }
    }
}

/// Trim a raw query and reject blank input
pub fn normalize_query(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InputError("Query is empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_document() {
        let prompt = QueryPrompt::prompt_for(Path::new("docs/swebok-v3.pdf"));
        assert_eq!(prompt, "What do you want to know about swebok-v3? ");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_query("  software testing \n").unwrap(), "software testing");
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(
            normalize_query("   \t"),
            Err(PipelineError::InputError(_))
        ));
    }
}
