//! System prompts, one `<role>.txt` file per role

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{error, info, warn};

/// Role every chat falls back to
pub const DEFAULT_ROLE: &str = "default";
/// Used when no `default.txt` exists
pub const FALLBACK_PROMPT: &str = "You are a helpful AI assistant.";

/// Role name → system prompt
#[derive(Debug, Clone)]
pub struct PromptBook {
    prompts: BTreeMap<String, String>,
}

impl Default for PromptBook {
    fn default() -> Self {
        Self::from_prompts(BTreeMap::new())
    }
}

impl PromptBook {
    /// Build from an explicit map; a `default` role is always present
    pub fn from_prompts(mut prompts: BTreeMap<String, String>) -> Self {
        prompts
            .entry(DEFAULT_ROLE.to_string())
            .or_insert_with(|| FALLBACK_PROMPT.to_string());
        Self { prompts }
    }

    /// Load every `*.txt` file in `dir`, keyed by file stem
    ///
    /// Unreadable files are skipped. A missing directory yields only the
    /// built-in default prompt.
    pub fn load(dir: &Path) -> Self {
        let mut prompts = BTreeMap::new();

        match fs::read_dir(dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                        continue;
                    }
                    let Some(role) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match fs::read_to_string(&path) {
                        Ok(content) => {
                            prompts.insert(role.to_string(), content.trim().to_string());
                        }
                        Err(e) => error!(path = %path.display(), error = %e, "failed to load prompt"),
                    }
                }
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "prompts directory not readable"),
        }

        if !prompts.contains_key(DEFAULT_ROLE) {
            warn!("'default.txt' not found, using the built-in default prompt");
        }

        let book = Self::from_prompts(prompts);
        info!(count = book.prompts.len(), roles = ?book.roles(), "loaded prompts");
        book
    }

    pub fn contains(&self, role: &str) -> bool {
        self.prompts.contains_key(role)
    }

    /// Prompt for `role`, falling back to the default role
    pub fn system_prompt(&self, role: &str) -> &str {
        self.prompts
            .get(role)
            .or_else(|| self.prompts.get(DEFAULT_ROLE))
            .map(String::as_str)
            .unwrap_or(FALLBACK_PROMPT)
    }

    /// Role names in sorted order
    pub fn roles(&self) -> Vec<&str> {
        self.prompts.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.txt"), "  Be helpful.\n").unwrap();
        fs::write(dir.path().join("coder.txt"), "Write Rust.").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let book = PromptBook::load(dir.path());
        assert_eq!(book.roles(), vec!["coder", "default"]);
        assert_eq!(book.system_prompt("default"), "Be helpful.");
        assert_eq!(book.system_prompt("coder"), "Write Rust.");
        assert!(!book.contains("notes"));
    }

    #[test]
    fn test_unknown_role_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.txt"), "Be helpful.").unwrap();

        let book = PromptBook::load(dir.path());
        assert_eq!(book.system_prompt("pirate"), "Be helpful.");
    }

    #[test]
    fn test_missing_directory_has_builtin_default() {
        let dir = tempfile::tempdir().unwrap();
        let book = PromptBook::load(&dir.path().join("absent"));
        assert_eq!(book.roles(), vec!["default"]);
        assert_eq!(book.system_prompt("default"), FALLBACK_PROMPT);
    }
}
