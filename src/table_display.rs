use academy_cms::section::{Content, Section};
use academy_cms::workflow;
use academy_cms::SectionStore;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::style::Stylize;

/// Print the section list in display order, marking the one under edit
pub fn display_sections(store: &SectionStore) {
    if store.is_empty() {
        println!("{}", "No sections yet. Use 'add <type> <name>'.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["", "#", "id", "key", "type", "name", "status", "visible"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for section in store.sections() {
        let marker = if store.selected_id() == Some(section.id) {
            if store.is_dirty() {
                "*"
            } else {
                ">"
            }
        } else {
            ""
        };
        let status = section
            .content
            .as_ref()
            .map(|c| c.status.to_string())
            .unwrap_or_else(|| "-".to_string());
        let visible = if section.is_active {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(marker),
            Cell::new(section.order_index),
            Cell::new(section.id),
            Cell::new(&section.key),
            Cell::new(section.section_type),
            Cell::new(&section.name),
            Cell::new(status),
            visible,
        ]);
    }

    println!("{table}");
    println!("\n{}", format!("{} sections", store.len()).green());
}

/// Print the editable fields of the selected section
pub fn display_editor(section: &Section, dirty: bool) {
    println!(
        "{} {} ({})",
        "Editing".cyan().bold(),
        section.name.as_str().bold(),
        section.key
    );
    let Some(content) = &section.content else {
        println!("{}", "This section has no content.".yellow());
        return;
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (field, value) in fields(content) {
        table.add_row(vec![Cell::new(field).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");

    let actions: Vec<_> = workflow::allowed_actions(content.status)
        .iter()
        .map(|a| a.to_string())
        .collect();
    println!(
        "status {} (version {}) | next: {}{}",
        content.status.to_string().magenta(),
        content.version,
        if actions.is_empty() {
            "none".to_string()
        } else {
            actions.join(", ")
        },
        if dirty {
            " | unsaved changes".yellow().to_string()
        } else {
            String::new()
        }
    );
}

/// Rendered view of the selected section, as a visitor would read it
pub fn display_preview(section: &Section) {
    let Some(content) = &section.content else {
        println!("{}", "Nothing to preview.".yellow());
        return;
    };
    if !section.is_active {
        println!("{}", "(hidden on the homepage)".dark_grey());
    }
    println!("{}", content.title.as_str().bold());
    if !content.subtitle.is_empty() {
        println!("{}", content.subtitle.as_str().italic());
    }
    println!();
    if !content.body_content.is_empty() {
        println!("{}", content.body_content);
    } else if !content.description.is_empty() {
        println!("{}", content.description);
    }
    if !content.tags.is_empty() {
        println!("\n{}", format!("#{}", content.tags.join(" #")).dark_grey());
    }
}

fn fields(content: &Content) -> Vec<(&'static str, String)> {
    vec![
        ("title", content.title.clone()),
        ("subtitle", content.subtitle.clone()),
        ("description", content.description.clone()),
        ("body", content.body_content.clone()),
        ("tags", content.tags.join(", ")),
    ]
}
