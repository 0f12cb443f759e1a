//! Editor session: the command layer behind the CMS dashboard
//!
//! Every user action follows the same shape: mutate the store synchronously,
//! issue the matching repository call, and on failure either keep the local
//! state for a retry (saves) or reload the server's version (reorders).
//!
//! Background work (autosaves, reorder commits, reconciliation reloads) is
//! spawned on the tokio runtime and reported back as [`Completion`]s, which
//! the owning event loop feeds into [`CmsEditor::handle_completion`]. Manual
//! saves and workflow transitions are awaited directly so their errors reach
//! the caller.

use crate::autosave::AutosaveScheduler;
use crate::config::EditorConfig;
use crate::error::{CmsError, CmsResult};
use crate::repository::SectionRepository;
use crate::reorder::{MoveEvent, ReorderCommit, ReorderCoordinator, ReorderFollowUp};
use crate::section::{
    unique_key, Content, ContentId, ContentPatch, CreateSectionRequest, NewSection, Section,
    SectionId,
};
use crate::section_store::{SectionStore, Selection, ViewMode};
use crate::workflow::{self, ContentStatus, WorkflowAction};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub autosave_delay: Duration,
    pub generate_ai_content: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            autosave_delay: config.autosave_delay(),
            generate_ai_content: config.generate_ai_content,
        }
    }
}

/// Result of a spawned repository call
#[derive(Debug)]
pub enum Completion {
    Saved {
        section_id: SectionId,
        content_id: ContentId,
        revision: u64,
        result: CmsResult<Content>,
    },
    Reordered {
        generation: u64,
        result: CmsResult<()>,
    },
    Reloaded {
        token: u64,
        result: CmsResult<Vec<Section>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the status line; never blocks the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct CmsEditor<R: SectionRepository> {
    repo: Arc<R>,
    store: SectionStore,
    autosave: AutosaveScheduler,
    reorder: ReorderCoordinator,
    options: EditorOptions,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    /// Spawned calls whose completion has not been handled yet
    outstanding: usize,
    notices: VecDeque<Notice>,
}

impl<R: SectionRepository> CmsEditor<R> {
    pub fn new(repo: Arc<R>, options: EditorOptions) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            repo,
            store: SectionStore::new(),
            autosave: AutosaveScheduler::new(options.autosave_delay),
            reorder: ReorderCoordinator::new(),
            options,
            completions_tx,
            completions_rx,
            outstanding: 0,
            notices: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &SectionStore {
        &self.store
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn autosave(&self) -> &AutosaveScheduler {
        &self.autosave
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn set_generate_ai_content(&mut self, enabled: bool) {
        self.options.generate_ai_content = enabled;
    }

    pub fn has_outstanding_work(&self) -> bool {
        self.outstanding > 0
    }

    // --- notices -------------------------------------------------------

    fn notify(&mut self, level: NoticeLevel, message: String) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice { level, message });
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // --- loading and selection -----------------------------------------

    /// Replace the local list with the server's. Unsaved edits are dropped.
    pub async fn load_sections(&mut self) -> CmsResult<()> {
        let sections = self.repo.list_sections().await?;
        self.autosave.cancel();
        self.store.load_sections(sections);
        Ok(())
    }

    /// Switch the section under edit; `confirm` is asked only if edits are unsaved
    pub fn select_section(
        &mut self,
        id: SectionId,
        confirm: impl FnOnce() -> bool,
    ) -> CmsResult<Selection> {
        let outcome = self.store.select_section(id, confirm)?;
        if outcome == Selection::Selected {
            self.autosave.cancel();
        }
        Ok(outcome)
    }

    /// Leave the editor (navigation away or unmount)
    pub fn clear_selection(&mut self, confirm: impl FnOnce() -> bool) -> Selection {
        let outcome = self.store.clear_selection(confirm);
        if outcome == Selection::Selected {
            self.autosave.cancel();
        }
        outcome
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.store.set_view_mode(mode);
    }

    // --- editing and autosave ------------------------------------------

    /// Apply an edit locally and (re)arm the autosave timer
    pub fn update_section(&mut self, patch: &ContentPatch, now: Instant) -> CmsResult<()> {
        self.store.update_section(patch)?;
        if self.store.is_dirty() {
            self.autosave.arm(now);
        } else {
            self.autosave.cancel();
        }
        Ok(())
    }

    /// Drive the autosave timer; call from the event loop
    pub fn tick(&mut self, now: Instant) {
        if self.autosave.poll(now) {
            debug!("CmsEditor: autosave due");
            self.request_autosave();
        }
    }

    /// Send the selected content unless a save for it is already in flight
    fn request_autosave(&mut self) {
        let Some((section_id, content)) = self.dirty_selection() else {
            return;
        };
        if !self.autosave.begin(content.id) {
            return;
        }

        let revision = self.store.revision();
        let repo = Arc::clone(&self.repo);
        let generate_ai = self.options.generate_ai_content;
        let content_id = content.id;

        self.spawn_call(
            async move { repo.update_content(content.id, &content, generate_ai).await },
            move |result| Completion::Saved {
                section_id,
                content_id,
                revision,
                result,
            },
        );
    }

    /// Run a repository call in the background and report it as a completion.
    ///
    /// The call runs in its own task so a panic still produces a completion
    /// (as a network error) and nothing waiting on it hangs.
    fn spawn_call<T, F>(
        &mut self,
        call: F,
        report: impl FnOnce(CmsResult<T>) -> Completion + Send + 'static,
    ) where
        T: Send + 'static,
        F: Future<Output = CmsResult<T>> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        self.outstanding += 1;

        tokio::spawn(async move {
            let result = match tokio::spawn(call).await {
                Ok(result) => result,
                Err(e) => {
                    error!("CmsEditor: background call failed: {}", e);
                    Err(CmsError::network(format!("background call failed: {e}")))
                }
            };
            let _ = tx.send(report(result));
        });
    }

    fn dirty_selection(&self) -> Option<(SectionId, Content)> {
        if !self.store.is_dirty() {
            return None;
        }
        let section = self.store.selected_section()?;
        Some((section.id, section.content.clone()?))
    }

    // --- completions ---------------------------------------------------

    /// Wait for the next spawned call to finish. `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.outstanding == 0 {
            return None;
        }
        self.completions_rx.recv().await
    }

    /// Non-blocking variant of `next_completion` for the shell loop
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.try_recv().ok()
    }

    /// Handle completions until no spawned work remains
    pub async fn settle(&mut self) {
        while let Some(completion) = self.next_completion().await {
            self.handle_completion(completion);
        }
    }

    /// Keep autosave and background results moving until `until` resolves.
    ///
    /// The timer is polled every `tick_every` against the wall clock; this is
    /// what an interactive front end awaits while the user is idle.
    pub async fn run_until<T>(&mut self, until: impl Future<Output = T>, tick_every: Duration) -> T {
        tokio::pin!(until);
        let mut ticker = tokio::time::interval(tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                output = &mut until => return output,
                Some(completion) = self.next_completion() => self.handle_completion(completion),
                _ = ticker.tick() => self.tick(Instant::now()),
            }
        }
    }

    pub fn handle_completion(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);

        match completion {
            Completion::Saved {
                section_id,
                content_id,
                revision,
                result,
            } => self.on_saved(section_id, content_id, revision, result),
            Completion::Reordered { generation, result } => self.on_reordered(generation, result),
            Completion::Reloaded { token, result } => self.on_reloaded(token, result),
        }
    }

    fn on_saved(
        &mut self,
        section_id: SectionId,
        content_id: ContentId,
        revision: u64,
        result: CmsResult<Content>,
    ) {
        let deferred = self.autosave.finish(content_id);
        let was_dirty = self.store.is_dirty();

        match result {
            Ok(server) => {
                if self.store.confirm_content(section_id, revision, server) {
                    info!("CmsEditor: saved content {} (revision {})", content_id, revision);
                } else {
                    debug!(
                        "CmsEditor: save of section {} resolved after it was deselected",
                        section_id
                    );
                }
            }
            Err(e) => {
                // Local edits stay and the section stays dirty for the next attempt
                warn!("CmsEditor: autosave of content {} failed: {}", content_id, e);
                self.notify(NoticeLevel::Warning, format!("Autosave failed: {e}"));
            }
        }

        let still_selected = self.store.selected_content().map(|c| c.id) == Some(content_id);
        if deferred && still_selected {
            self.request_autosave();
        } else if !was_dirty && self.store.is_dirty() {
            // Local text diverged from what the server now holds
            self.autosave.arm(Instant::now());
        }
    }

    fn on_reordered(&mut self, generation: u64, result: CmsResult<()>) {
        if let Err(e) = &result {
            let conflict = CmsError::Conflict(e.to_string());
            error!("CmsEditor: {}", conflict);
            self.notify(NoticeLevel::Error, conflict.to_string());
        }

        match self
            .reorder
            .finish_commit(&self.store, generation, result.is_ok())
        {
            ReorderFollowUp::Idle => {}
            ReorderFollowUp::Commit(commit) => self.spawn_commit(commit),
            ReorderFollowUp::Reconcile { token } => self.spawn_reload(token),
        }
    }

    fn on_reloaded(&mut self, token: u64, result: CmsResult<Vec<Section>>) {
        let current = self.reorder.accept_reload(token);
        match result {
            Ok(sections) if current => {
                self.store.reconcile(sections);
                self.notify(
                    NoticeLevel::Info,
                    "Section order restored from the server".to_string(),
                );
            }
            Ok(_) => debug!("CmsEditor: discarding stale reload {}", token),
            Err(e) => {
                error!("CmsEditor: could not reload section order: {}", e);
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not reload section order: {e}"),
                );
            }
        }
    }

    // --- manual save and workflow --------------------------------------

    /// Save the selected section now, bypassing the autosave timer
    pub async fn save(&mut self) -> CmsResult<()> {
        self.autosave.cancel();
        let content_id = self
            .store
            .selected_content()
            .map(|c| c.id)
            .ok_or_else(|| CmsError::validation("no section is selected"))?;

        self.wait_for_save(content_id).await;

        let Some((section_id, content)) = self.dirty_selection() else {
            return Ok(());
        };
        self.autosave.begin(content.id);
        let revision = self.store.revision();
        let result = self
            .repo
            .update_content(content.id, &content, self.options.generate_ai_content)
            .await;
        self.autosave.finish(content.id);

        match result {
            Ok(server) => {
                self.store.confirm_content(section_id, revision, server);
                info!("CmsEditor: saved content {}", content.id);
                Ok(())
            }
            Err(e) => {
                error!("CmsEditor: save of content {} failed: {}", content.id, e);
                Err(e)
            }
        }
    }

    /// Let an in-flight autosave (and any save deferred behind it) resolve
    async fn wait_for_save(&mut self, content_id: ContentId) {
        while self.autosave.is_in_flight(content_id) {
            match self.completions_rx.recv().await {
                Some(completion) => self.handle_completion(completion),
                None => break,
            }
        }
    }

    /// Move the selected content through the workflow.
    ///
    /// The action is checked against the transition table before anything is
    /// sent. Unsaved edits are flushed first. The local status changes only
    /// once the backend confirms.
    pub async fn transition(&mut self, action: WorkflowAction) -> CmsResult<ContentStatus> {
        let status = self
            .store
            .selected_content()
            .map(|c| c.status)
            .ok_or_else(|| CmsError::validation("no section is selected"))?;
        workflow::apply(status, action)?;

        self.save().await?;

        let (section_id, mut content) = match self.store.selected_section() {
            Some(Section {
                id,
                content: Some(content),
                ..
            }) => (*id, content.clone()),
            _ => return Err(CmsError::validation("no section is selected")),
        };
        let next = workflow::apply(content.status, action)?;
        let revision = self.store.revision();

        self.autosave.begin(content.id);
        let result = match action {
            WorkflowAction::Publish => self.repo.publish_content(content.id).await,
            _ => {
                content.status = next;
                self.repo
                    .update_content(content.id, &content, self.options.generate_ai_content)
                    .await
            }
        };
        self.autosave.finish(content.id);

        let server = result.map_err(|e| {
            error!("CmsEditor: {} of content {} failed: {}", action, content.id, e);
            e
        })?;
        if server.status != next {
            warn!(
                "CmsEditor: backend reported {} after {}, expected {}",
                server.status, action, next
            );
        }
        let confirmed = server.status;
        self.store.confirm_content(section_id, revision, server);
        info!("CmsEditor: content {} is now {}", content.id, confirmed);
        Ok(confirmed)
    }

    pub async fn publish(&mut self) -> CmsResult<ContentStatus> {
        self.transition(WorkflowAction::Publish).await
    }

    // --- ordering ------------------------------------------------------

    /// Apply a drop gesture. Returns false when it was a no-op.
    pub fn move_section(&mut self, event: MoveEvent) -> bool {
        let before = self.reorder.generation();
        if let Some(commit) = self.reorder.apply_move(&mut self.store, event) {
            self.spawn_commit(commit);
        }
        self.reorder.generation() != before
    }

    fn spawn_commit(&mut self, commit: ReorderCommit) {
        let repo = Arc::clone(&self.repo);
        let generation = commit.generation;
        self.spawn_call(
            async move { repo.reorder_sections(&commit.orders).await },
            move |result| Completion::Reordered { generation, result },
        );
    }

    fn spawn_reload(&mut self, token: u64) {
        info!("CmsEditor: reloading canonical section order");
        let repo = Arc::clone(&self.repo);
        self.spawn_call(
            async move { repo.list_sections().await },
            move |result| Completion::Reloaded { token, result },
        );
    }

    // --- section lifecycle ---------------------------------------------

    /// Create a section (and its draft content) at the end of the list
    pub async fn add_section(&mut self, draft: NewSection) -> CmsResult<SectionId> {
        let section_type = draft.validate()?;
        let request = CreateSectionRequest {
            section_key: unique_key(&draft.name, self.store.keys()),
            section_type,
            name: draft.name.trim().to_string(),
            description: draft.description,
            order_index: self.store.len() as u32 + 1,
            is_active: draft.is_active,
            layout_config: draft.layout_config,
            responsive_settings: draft.responsive_settings,
            animation_config: draft.animation_config,
            custom_css: draft.custom_css,
            seo: draft.seo,
        };

        let created = self.repo.create_section(&request).await?;
        let id = created.id;
        self.store.insert_section(created)?;
        info!("CmsEditor: added section {} ('{}')", id, request.section_key);
        Ok(id)
    }

    /// Delete a section and persist the closed-up order
    pub async fn delete_section(&mut self, id: SectionId) -> CmsResult<()> {
        if self.store.get(id).is_none() {
            return Err(CmsError::validation(format!("no section with id {id}")));
        }
        self.repo.delete_section(id).await?;

        let was_selected = self.store.selected_id() == Some(id);
        self.store.remove_section(id);
        if was_selected {
            self.autosave.cancel();
        }
        info!("CmsEditor: deleted section {}", id);

        if !self.store.is_empty() {
            if let Some(commit) = self.reorder.local_change(&self.store) {
                self.spawn_commit(commit);
            }
        }
        Ok(())
    }

    pub async fn set_section_active(&mut self, id: SectionId, active: bool) -> CmsResult<()> {
        if self.store.get(id).is_none() {
            return Err(CmsError::validation(format!("no section with id {id}")));
        }
        self.repo.set_section_active(id, active).await?;
        self.store.set_active(id, active);
        Ok(())
    }
}
