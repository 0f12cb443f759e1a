//! In-memory section list, selection and dirty tracking for the dashboard
//!
//! The store is synchronous and never talks to the backend. Callers feed it
//! server data (`load_sections`, `reconcile`, `confirm_content`) and editor
//! actions (`select_section`, `update_section`); the editor session decides
//! when to persist.

use crate::error::{CmsError, CmsResult};
use crate::section::{Content, ContentPatch, Section, SectionId, SectionOrder};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Edit,
    Preview,
}

impl ViewMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "list" => Some(ViewMode::List),
            "edit" => Some(ViewMode::Edit),
            "preview" => Some(ViewMode::Preview),
            _ => None,
        }
    }
}

/// Outcome of a guarded selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The requested section is now selected
    Selected,
    /// The requested section was already selected
    Unchanged,
    /// Unsaved edits exist and the user declined to discard them
    Cancelled,
}

/// Rewrite every `order_index` to `position + 1`
pub fn renumber(sections: &mut [Section]) {
    for (position, section) in sections.iter_mut().enumerate() {
        section.order_index = position as u32 + 1;
    }
}

/// True when the order indexes are exactly `1..=N` in list order
pub fn is_dense(sections: &[Section]) -> bool {
    sections
        .iter()
        .enumerate()
        .all(|(position, section)| section.order_index == position as u32 + 1)
}

#[derive(Debug, Default)]
pub struct SectionStore {
    sections: Vec<Section>,
    selected: Option<SectionId>,
    /// Last server-confirmed content of the selected section
    snapshot: Option<Content>,
    dirty: bool,
    /// Bumped on every local edit and every wholesale reload
    revision: u64,
    /// Revision of the most recent local edit still held; zero once edits are dropped
    edited_at: u64,
    view_mode: ViewMode,
}

impl SectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn selected_id(&self) -> Option<SectionId> {
        self.selected
    }

    pub fn selected_section(&self) -> Option<&Section> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_content(&self) -> Option<&Content> {
        self.selected_section().and_then(|s| s.content.as_ref())
    }

    pub fn snapshot(&self) -> Option<&Content> {
        self.snapshot.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        debug!("SectionStore: view mode {:?} -> {:?}", self.view_mode, mode);
        self.view_mode = mode;
    }

    /// The `{id, order_index}` list as the reorder endpoint expects it
    pub fn order(&self) -> Vec<SectionOrder> {
        self.sections
            .iter()
            .map(|s| SectionOrder {
                id: s.id,
                order_index: s.order_index,
            })
            .collect()
    }

    /// Replace the whole list with server data. Unsaved edits are dropped.
    pub fn load_sections(&mut self, sections: Vec<Section>) {
        self.sections = normalize(sections);
        self.revision += 1;
        self.edited_at = 0;
        self.dirty = false;

        self.snapshot = match self.selected.and_then(|id| self.get(id)) {
            Some(section) => section.content.clone(),
            None => {
                self.selected = None;
                None
            }
        };
        info!(
            "SectionStore: loaded {} sections (selected: {:?})",
            self.sections.len(),
            self.selected
        );
    }

    /// Adopt the server's list after a failed commit, keeping unsaved edits
    /// of the selected section if it still exists.
    pub fn reconcile(&mut self, sections: Vec<Section>) {
        let local = self.selected_content().cloned();
        let (snapshot, dirty) = (self.snapshot.take(), self.dirty);

        self.sections = normalize(sections);
        match self.selected.and_then(|id| self.position(id)) {
            Some(pos) if dirty => {
                self.sections[pos].content = local;
                self.snapshot = snapshot;
            }
            Some(pos) => {
                self.snapshot = self.sections[pos].content.clone();
                self.dirty = false;
            }
            None => {
                self.selected = None;
                self.dirty = false;
            }
        }
        info!(
            "SectionStore: reconciled to server order of {} sections",
            self.sections.len()
        );
    }

    /// Change the selected section.
    ///
    /// While edits are unsaved, `confirm` decides whether they may be
    /// discarded; declining leaves selection and edits untouched.
    pub fn select_section(
        &mut self,
        id: SectionId,
        confirm: impl FnOnce() -> bool,
    ) -> CmsResult<Selection> {
        if self.get(id).is_none() {
            return Err(CmsError::validation(format!("no section with id {id}")));
        }
        if self.selected == Some(id) {
            return Ok(Selection::Unchanged);
        }
        if self.dirty && !confirm() {
            debug!("SectionStore: selection of {} cancelled, keeping edits", id);
            return Ok(Selection::Cancelled);
        }

        self.discard_edits();
        self.selected = Some(id);
        self.snapshot = self.get(id).and_then(|s| s.content.clone());
        self.revision += 1;
        self.view_mode = ViewMode::Edit;
        debug!("SectionStore: selected section {}", id);
        Ok(Selection::Selected)
    }

    /// Leave the editor, with the same guard as `select_section`
    pub fn clear_selection(&mut self, confirm: impl FnOnce() -> bool) -> Selection {
        if self.selected.is_none() {
            return Selection::Unchanged;
        }
        if self.dirty && !confirm() {
            return Selection::Cancelled;
        }
        self.discard_edits();
        self.selected = None;
        self.snapshot = None;
        self.revision += 1;
        self.view_mode = ViewMode::List;
        Selection::Selected
    }

    /// Revert the selected section's content to the last confirmed snapshot
    pub fn discard_edits(&mut self) {
        if !self.dirty {
            return;
        }
        if let Some(pos) = self.selected.and_then(|id| self.position(id)) {
            self.sections[pos].content = self.snapshot.clone();
        }
        self.dirty = false;
        self.edited_at = 0;
        self.revision += 1;
        info!("SectionStore: discarded unsaved edits");
    }

    /// Merge `patch` into the selected section's content.
    ///
    /// Returns the new edit revision. Nothing is persisted.
    pub fn update_section(&mut self, patch: &ContentPatch) -> CmsResult<u64> {
        let pos = self
            .selected
            .and_then(|id| self.position(id))
            .ok_or_else(|| CmsError::validation("no section is selected"))?;
        let content = self.sections[pos]
            .content
            .as_mut()
            .ok_or_else(|| CmsError::validation("selected section has no content"))?;

        patch.apply_to(content);
        self.dirty = self.snapshot.as_ref() != Some(&*content);
        self.revision += 1;
        self.edited_at = self.revision;
        debug!(
            "SectionStore: edited section {} (revision {}, dirty {})",
            self.sections[pos].id, self.revision, self.dirty
        );
        Ok(self.revision)
    }

    /// Record content the server has confirmed for `section_id`.
    ///
    /// `revision` is the store revision the request was built from. If the
    /// user edited after that, the local text is kept and only the server's
    /// version, timestamp and status are adopted; otherwise (including after a
    /// reload) the server content replaces the local one.
    /// Returns false when the section is no longer selected.
    pub fn confirm_content(&mut self, section_id: SectionId, revision: u64, server: Content) -> bool {
        let Some(pos) = self.position(section_id) else {
            warn!("SectionStore: confirmed content for unknown section {}", section_id);
            return false;
        };

        if self.selected != Some(section_id) {
            self.sections[pos].content = Some(server);
            return false;
        }

        let edited_since = self.edited_at > revision;
        match self.sections[pos].content.as_mut() {
            Some(local) if edited_since => {
                local.version = server.version;
                local.updated_at = server.updated_at;
                local.status = server.status;
            }
            _ => self.sections[pos].content = Some(server.clone()),
        }
        self.dirty = self.sections[pos].content.as_ref() != Some(&server);
        self.snapshot = Some(server);
        true
    }

    /// Install an order produced by the reorder coordinator
    pub fn apply_order(&mut self, sections: Vec<Section>) {
        debug_assert!(is_dense(&sections));
        self.sections = sections;
    }

    /// Append a newly created section at the end of the list
    pub fn insert_section(&mut self, mut section: Section) -> CmsResult<()> {
        if self.keys().any(|k| k == section.key) {
            return Err(CmsError::validation(format!(
                "a section with key '{}' already exists",
                section.key
            )));
        }
        section.order_index = self.sections.len() as u32 + 1;
        self.sections.push(section);
        Ok(())
    }

    /// Remove a section and close the gap it leaves in the order
    pub fn remove_section(&mut self, id: SectionId) -> Option<Section> {
        let pos = self.position(id)?;
        let removed = self.sections.remove(pos);
        renumber(&mut self.sections);

        if self.selected == Some(id) {
            self.selected = None;
            self.snapshot = None;
            self.dirty = false;
            self.revision += 1;
            self.view_mode = ViewMode::List;
        }
        Some(removed)
    }

    pub fn set_active(&mut self, id: SectionId, active: bool) -> bool {
        match self.sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                section.is_active = active;
                true
            }
            None => false,
        }
    }
}

/// Sort server data by rank and close any gaps or duplicates in it
fn normalize(mut sections: Vec<Section>) -> Vec<Section> {
    sections.sort_by_key(|s| s.order_index);
    if !is_dense(&sections) {
        warn!("SectionStore: server order is not dense, renumbering");
        renumber(&mut sections);
    }

    let mut keys = HashSet::new();
    for section in &sections {
        if !keys.insert(section.key.as_str()) {
            warn!("SectionStore: duplicate section key '{}'", section.key);
        }
    }
    sections
}
