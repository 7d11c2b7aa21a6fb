use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("> ").to_string()
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}

/// Readline history lives next to other per-user app data.
pub fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("confucius-chat").join("history.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt() {
        assert_eq!(generate_prompt(None), "> ");
        assert_eq!(generate_prompt(Some("ask> ")), "ask> ");
    }

    #[test]
    fn history_file_is_namespaced() {
        if let Some(path) = history_path() {
            assert!(path.ends_with("confucius-chat/history.txt"));
        }
    }
}
