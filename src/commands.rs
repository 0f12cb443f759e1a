use academy_cms::section::{ContentPatch, SectionId};
use academy_cms::workflow::WorkflowAction;
use academy_cms::{CmsError, MoveEvent, SectionStore, ViewMode};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

pub const COMMANDS: &[&str] = &[
    "list", "select", "close", "edit", "save", "submit", "approve", "reject", "publish",
    "archive", "move", "add", "delete", "toggle", "view", "reload", "ai", "log", "help",
    "clear", "quit",
];

pub const FIELDS: &[&str] = &["title", "subtitle", "description", "body", "tags"];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Select(String),
    Close,
    Edit(ContentPatch),
    Save,
    Transition(WorkflowAction),
    Move(MoveEvent),
    Add { section_type: String, name: String },
    Delete(SectionId),
    Toggle(SectionId),
    View(ViewMode),
    Reload,
    Ai(bool),
    Log(usize),
    Help,
    Clear,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "select" | "sel" => Command::Select(required(rest, "select <id|name>")?.to_string()),
            "close" => Command::Close,
            "edit" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                required(field, "edit <field> <value>")?;
                Command::Edit(ContentPatch::field(field, value).map_err(|e| e.to_string())?)
            }
            "save" => Command::Save,
            "submit" | "approve" | "reject" | "publish" | "archive" => {
                Command::Transition(head.parse().map_err(|e: CmsError| e.to_string())?)
            }
            "move" | "mv" => {
                let mut ids = rest.split_whitespace();
                let usage = "move <id> <onto-id>";
                let active = id(ids.next(), usage)?;
                let over = id(ids.next(), usage)?;
                Command::Move(MoveEvent::new(active, over))
            }
            "add" => {
                let (section_type, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("Usage: add <type> <name>")?;
                Command::Add {
                    section_type: section_type.to_string(),
                    name: name.trim().to_string(),
                }
            }
            "delete" | "rm" => Command::Delete(id(Some(rest).filter(|s| !s.is_empty()), "delete <id>")?),
            "toggle" => Command::Toggle(id(Some(rest).filter(|s| !s.is_empty()), "toggle <id>")?),
            "view" => Command::View(
                ViewMode::parse(rest).ok_or("Usage: view <list|edit|preview>")?,
            ),
            "reload" => Command::Reload,
            "ai" => match rest {
                "on" => Command::Ai(true),
                "off" => Command::Ai(false),
                _ => return Err("Usage: ai <on|off>".to_string()),
            },
            "log" => Command::Log(if rest.is_empty() {
                20
            } else {
                rest.parse().map_err(|_| "Usage: log [count]")?
            }),
            "help" | "?" => Command::Help,
            "clear" => Command::Clear,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{other}'. Type 'help'.")),
        };
        Ok(command)
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(value)
    }
}

fn id(value: Option<&str>, usage: &str) -> Result<SectionId, String> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| format!("Usage: {usage}"))
}

/// Resolve a section by id, exact key, or best fuzzy match on name/key
pub fn resolve_section(store: &SectionStore, query: &str) -> Option<SectionId> {
    if let Ok(id) = query.parse::<SectionId>() {
        return store.get(id).map(|s| s.id);
    }
    if let Some(section) = store.sections().iter().find(|s| s.key == query) {
        return Some(section.id);
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    store
        .sections()
        .iter()
        .filter_map(|s| {
            let by_name = matcher.fuzzy_match(&s.name, query);
            let by_key = matcher.fuzzy_match(&s.key, query);
            by_name.max(by_key).map(|score| (score, s.id))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, id)| id)
}
