use academy_cms::config::Config;
use academy_cms::logging::{self, LogRingBuffer};
use academy_cms::section::NewSection;
use academy_cms::{
    ApiClient, CmsEditor, EditorOptions, Notice, NoticeLevel, Selection, SectionRepository,
    ViewMode,
};
use anyhow::Result;
use crossterm::style::Stylize;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, ExternalPrinter, FileBackedHistory, KeyCode,
    KeyModifiers, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, ReedlineEvent, ReedlineMenu, Signal,
};
use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info};

mod commands;
mod completer;
mod table_display;

use commands::{resolve_section, Command};
use completer::CmsCompleter;
use table_display::{display_editor, display_preview, display_sections};

/// How often the autosave timer is polled while waiting for input
const TICK: Duration = Duration::from_millis(100);
/// How often notices raised in the background are printed above the prompt
const NOTICE_POLL: Duration = Duration::from_millis(250);

/// Shows the section under edit and a marker for unsaved changes
struct CmsPrompt {
    label: String,
}

impl Prompt for CmsPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.label.as_str())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn prompt_for<R: SectionRepository>(editor: &CmsEditor<R>) -> CmsPrompt {
    let store = editor.store();
    let label = match store.selected_section() {
        Some(section) if store.is_dirty() => format!("cms:{}* ", section.key),
        Some(section) => format!("cms:{} ", section.key),
        None => "cms ".to_string(),
    };
    CmsPrompt { label }
}

fn print_help() {
    println!("{}", "Academy CMS - homepage section editor".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  cms-cli [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Sections:".yellow());
    println!("  {}                   - Show sections in display order", "list".green());
    println!("  {}       - Open a section for editing", "select <id|name>".green());
    println!("  {}                  - Leave the editor", "close".green());
    println!("  {}       - Drop section <id> onto <onto-id>", "move <id> <onto>".green());
    println!("  {}      - Create a section at the end", "add <type> <name>".green());
    println!("  {}            - Delete a section", "delete <id>".green());
    println!("  {}            - Show or hide a section", "toggle <id>".green());
    println!("  {}                 - Reload from the server", "reload".green());
    println!();
    println!("{}", "Editing:".yellow());
    println!(
        "  {} - Edit title, subtitle, description, body or tags",
        "edit <field> <value>".green()
    );
    println!("  {}                   - Save now", "save".green());
    println!(
        "  {} - Workflow actions",
        "submit | approve | reject | publish | archive".green()
    );
    println!("  {}  - Switch view", "view <list|edit|preview>".green());
    println!("  {}           - Ask the backend for AI content on save", "ai <on|off>".green());
    println!();
    println!("{}", "Other:".yellow());
    println!("  {}            - Show recent log lines", "log [count]".green());
    println!("  {}  - Clear screen", "clear".green());
    println!("  {}   - Exit (also Ctrl+D)", "quit".green());
    println!();
}

fn confirm_discard(ask: bool) -> bool {
    if !ask {
        return true;
    }
    print!("{}", "Discard unsaved changes? [y/N] ".yellow());
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn styled_notice(notice: &Notice) -> String {
    let message = notice.message.as_str();
    match notice.level {
        NoticeLevel::Info => message.cyan().to_string(),
        NoticeLevel::Warning => message.yellow().to_string(),
        NoticeLevel::Error => message.red().to_string(),
    }
}

/// Feed finished background work into the editor and print any notices
fn drain_background<R: SectionRepository>(editor: &mut CmsEditor<R>) {
    editor.tick(Instant::now());
    while let Some(completion) = editor.try_next_completion() {
        editor.handle_completion(completion);
    }
    for notice in editor.drain_notices() {
        println!("{}", styled_notice(&notice));
    }
}

fn build_line_editor(history_file: PathBuf, printer: ExternalPrinter<String>) -> io::Result<Reedline> {
    let history = FileBackedHistory::with_file(100, history_file)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("cms_completion")
            .with_columns(1)
            .with_column_width(None)
            .with_column_padding(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Menu("cms_completion".to_string()),
    );

    Ok(Reedline::create()
        .with_completer(Box::new(CmsCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_external_printer(printer))
}

/// Owns the line editor on its own thread; each prompt sent in yields one signal back
struct LineReader {
    prompts: std_mpsc::Sender<CmsPrompt>,
    lines: UnboundedReceiver<io::Result<Signal>>,
}

impl LineReader {
    fn spawn(history_file: PathBuf, printer: ExternalPrinter<String>) -> Self {
        let (prompts, prompt_rx) = std_mpsc::channel::<CmsPrompt>();
        let (line_tx, lines) = unbounded_channel();

        std::thread::spawn(move || {
            let mut line_editor = match build_line_editor(history_file, printer) {
                Ok(line_editor) => line_editor,
                Err(e) => {
                    let _ = line_tx.send(Err(e));
                    return;
                }
            };
            while let Ok(prompt) = prompt_rx.recv() {
                if line_tx.send(line_editor.read_line(&prompt)).is_err() {
                    break;
                }
            }
        });

        Self { prompts, lines }
    }

    async fn read_line(&mut self, prompt: CmsPrompt) -> io::Result<Signal> {
        let stopped = || io::Error::new(io::ErrorKind::BrokenPipe, "line reader stopped");
        self.prompts.send(prompt).map_err(|_| stopped())?;
        self.lines.recv().await.unwrap_or_else(|| Err(stopped()))
    }
}

fn render<R: SectionRepository>(editor: &CmsEditor<R>) {
    let store = editor.store();
    match (store.view_mode(), store.selected_section()) {
        (ViewMode::Edit, Some(section)) => display_editor(section, store.is_dirty()),
        (ViewMode::Preview, Some(section)) => display_preview(section),
        _ => display_sections(store),
    }
}

fn report_selection(outcome: Selection) {
    if outcome == Selection::Cancelled {
        println!("{}", "Kept your unsaved changes.".yellow());
    }
}

/// Run one command. Returns false when the shell should exit.
async fn execute<R: SectionRepository>(
    editor: &mut CmsEditor<R>,
    command: Command,
    config: &Config,
    log_buffer: &LogRingBuffer,
) -> Result<bool> {
    let ask = config.editor.confirm_discard;

    match command {
        Command::List => display_sections(editor.store()),
        Command::Select(query) => {
            let Some(id) = resolve_section(editor.store(), &query) else {
                eprintln!("{}", format!("No section matches '{query}'").red());
                return Ok(true);
            };
            let outcome = editor.select_section(id, || confirm_discard(ask))?;
            report_selection(outcome);
            render(editor);
        }
        Command::Close => {
            report_selection(editor.clear_selection(|| confirm_discard(ask)));
        }
        Command::Edit(patch) => {
            editor.update_section(&patch, Instant::now())?;
            render(editor);
        }
        Command::Save => {
            editor.save().await?;
            println!("{}", "Saved.".green());
        }
        Command::Transition(action) => {
            let status = editor.transition(action).await?;
            println!("{}", format!("Content is now {status}.").green());
        }
        Command::Move(event) => {
            if editor.move_section(event) {
                display_sections(editor.store());
            } else {
                println!("{}", "Nothing to move.".yellow());
            }
        }
        Command::Add { section_type, name } => {
            let id = editor
                .add_section(NewSection::new(section_type, name))
                .await?;
            println!("{}", format!("Added section {id}.").green());
        }
        Command::Delete(id) => {
            editor.delete_section(id).await?;
            println!("{}", format!("Deleted section {id}.").green());
        }
        Command::Toggle(id) => {
            let active = editor
                .store()
                .get(id)
                .map(|s| !s.is_active)
                .unwrap_or(true);
            editor.set_section_active(id, active).await?;
            let state = if active { "visible" } else { "hidden" };
            println!("{}", format!("Section {id} is now {state}.").green());
        }
        Command::View(mode) => {
            editor.set_view_mode(mode);
            render(editor);
        }
        Command::Reload => {
            if editor.store().is_dirty() && !confirm_discard(ask) {
                return Ok(true);
            }
            editor.load_sections().await?;
            display_sections(editor.store());
        }
        Command::Ai(enabled) => {
            editor.set_generate_ai_content(enabled);
            println!("AI content generation {}", if enabled { "on" } else { "off" });
        }
        Command::Log(count) => {
            for entry in log_buffer.get_recent(count) {
                println!("{}", entry.format_for_display());
            }
        }
        Command::Help => print_help(),
        Command::Clear => print!("{esc}[2J{esc}[1;1H", esc = 27 as char),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    if args.contains(&"--generate-config".to_string()) {
        return generate_config();
    }

    let config = Config::load()?;
    let log_buffer = logging::init_tracing(&config.logging);

    let client = ApiClient::from_config(&config.api)?;
    info!("cms-cli: using backend {}", client.base_url());
    let mut editor = CmsEditor::new(
        std::sync::Arc::new(client),
        EditorOptions::from(&config.editor),
    );

    println!("{}", format!("Connected to API: {}", config.api.base_url).cyan());
    match editor.load_sections().await {
        Ok(()) => display_sections(editor.store()),
        Err(e) => {
            error!("cms-cli: initial load failed: {}", e);
            eprintln!("{}", format!("Could not load sections: {e}").red());
        }
    }

    let printer = ExternalPrinter::default();
    let notice_printer = printer.sender();
    let history_file = Config::get_config_path()?.with_file_name("history");
    let mut reader = LineReader::spawn(history_file, printer);

    loop {
        drain_background(&mut editor);

        let read = reader.read_line(prompt_for(&editor));
        tokio::pin!(read);
        // While the prompt is up, autosave and background results keep running
        let sig = loop {
            let waited = editor
                .run_until(
                    async {
                        tokio::select! {
                            sig = &mut read => Some(sig),
                            _ = tokio::time::sleep(NOTICE_POLL) => None,
                        }
                    },
                    TICK,
                )
                .await;
            if let Some(sig) = waited {
                break sig?;
            }
            for notice in editor.drain_notices() {
                let _ = notice_printer.send(styled_notice(&notice));
            }
        };

        match sig {
            Signal::Success(buffer) => {
                drain_background(&mut editor);
                if buffer.trim().is_empty() {
                    continue;
                }

                let command = match Command::parse(&buffer) {
                    Ok(command) => command,
                    Err(usage) => {
                        eprintln!("{}", usage.red());
                        continue;
                    }
                };
                match execute(&mut editor, command, &config, &log_buffer).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", format!("Error: {e}").red()),
                }
            }
            Signal::CtrlD | Signal::CtrlC => break,
        }
    }

    if editor.store().is_dirty() {
        match editor.save().await {
            Ok(()) => println!("{}", "Saved pending changes.".green()),
            Err(e) => eprintln!("{}", format!("Unsaved changes were lost: {e}").red()),
        }
    }
    editor.settle().await;
    println!("\nGoodbye!");
    Ok(())
}
