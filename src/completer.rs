use reedline::{Completer, Span, Suggestion};

use crate::commands::{COMMANDS, FIELDS};
use academy_cms::section::SectionType;
use academy_cms::ViewMode;

/// Completes command names, then the first argument of commands that take a fixed vocabulary
pub struct CmsCompleter;

impl CmsCompleter {
    pub fn new() -> Self {
        Self
    }

    fn candidates(command: Option<&str>) -> Vec<(String, &'static str)> {
        match command {
            None => COMMANDS.iter().map(|c| (c.to_string(), "command")).collect(),
            Some("edit") => FIELDS.iter().map(|f| (f.to_string(), "field")).collect(),
            Some("add") => SectionType::ALL
                .iter()
                .map(|t| (t.to_string(), "section type"))
                .collect(),
            Some("view") => [ViewMode::List, ViewMode::Edit, ViewMode::Preview]
                .iter()
                .map(|m| (format!("{m:?}").to_lowercase(), "view"))
                .collect(),
            Some("ai") => vec![("on".to_string(), "ai"), ("off".to_string(), "ai")],
            Some(_) => Vec::new(),
        }
    }
}

impl Completer for CmsCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let words: Vec<&str> = input.split_whitespace().collect();
        let at_word_start = input.is_empty() || input.ends_with(char::is_whitespace);

        // Only the command itself and its first argument are completed
        let (command, partial) = match (words.as_slice(), at_word_start) {
            ([], _) => (None, ""),
            ([word], false) => (None, *word),
            ([command], true) => (Some(*command), ""),
            ([command, word], false) => (Some(*command), *word),
            _ => return Vec::new(),
        };

        let start = pos.saturating_sub(partial.len());
        let partial = partial.to_lowercase();

        Self::candidates(command)
            .into_iter()
            .filter(|(value, _)| value.starts_with(&partial))
            .map(|(value, description)| Suggestion {
                value,
                description: Some(description.to_string()),
                extra: None,
                span: Span { start, end: pos },
                style: None,
                append_whitespace: true,
            })
            .collect()
    }
}
