#![allow(dead_code)]

use academy_cms::error::{CmsError, CmsResult};
use academy_cms::repository::SectionRepository;
use academy_cms::section::{
    Content, ContentId, CreateSectionRequest, Section, SectionId, SectionOrder, SectionType,
};
use academy_cms::workflow::ContentStatus;
use academy_cms::{CmsEditor, EditorOptions};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Every call the fake backend received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    List,
    Create(String),
    Reorder(Vec<SectionOrder>),
    SetActive(SectionId, bool),
    Delete(SectionId),
    UpdateContent(ContentId, Content, bool),
    Publish(ContentId),
}

/// In-memory backend with failure injection and a gate for holding saves in flight
pub struct FakeRepository {
    sections: Mutex<Vec<Section>>,
    requests: Mutex<Vec<Request>>,
    fail_reorder: AtomicBool,
    fail_updates: AtomicBool,
    panic_updates: AtomicBool,
    update_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeRepository {
    pub fn with_sections(sections: Vec<Section>) -> Arc<Self> {
        Arc::new(Self {
            sections: Mutex::new(sections),
            requests: Mutex::new(Vec::new()),
            fail_reorder: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            panic_updates: AtomicBool::new(false),
            update_gate: Mutex::new(None),
        })
    }

    pub fn fail_reorder(&self, fail: bool) {
        self.fail_reorder.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Make content updates panic inside the repository call
    pub fn panic_updates(&self, panic: bool) {
        self.panic_updates.store(panic, Ordering::SeqCst);
    }

    /// Make content updates wait until `release_updates` hands out permits
    pub fn hold_updates(&self) {
        *self.update_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_updates(&self, count: usize) {
        if let Some(gate) = self.update_gate.lock().unwrap().as_ref() {
            gate.add_permits(count);
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn reorders(&self) -> Vec<Vec<SectionOrder>> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::Reorder(orders) => Some(orders),
                _ => None,
            })
            .collect()
    }

    pub fn content_updates(&self) -> Vec<Content> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::UpdateContent(_, content, _) => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Server-side order as `(id, order_index)` sorted by rank
    pub fn server_order(&self) -> Vec<(SectionId, u32)> {
        let mut order: Vec<_> = self
            .sections
            .lock()
            .unwrap()
            .iter()
            .map(|s| (s.id, s.order_index))
            .collect();
        order.sort_by_key(|(_, index)| *index);
        order
    }

    pub fn server_content(&self, section_id: SectionId) -> Option<Content> {
        self.sections
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == section_id)
            .and_then(|s| s.content.clone())
    }

    pub fn set_status(&self, section_id: SectionId, status: ContentStatus) {
        let mut sections = self.sections.lock().unwrap();
        if let Some(content) = sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .and_then(|s| s.content.as_mut())
        {
            content.status = status;
        }
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }

    fn store_content(&self, content: Content) -> CmsResult<Content> {
        let mut sections = self.sections.lock().unwrap();
        let slot = sections
            .iter_mut()
            .filter_map(|s| s.content.as_mut())
            .find(|c| c.id == content.id)
            .ok_or_else(|| CmsError::Network {
                status: Some(404),
                message: "content not found".to_string(),
            })?;
        let version = slot.version + 1;
        *slot = Content {
            version,
            updated_at: Some(Utc::now()),
            ..content
        };
        Ok(slot.clone())
    }
}

fn server_error(message: &str) -> CmsError {
    CmsError::Network {
        status: Some(500),
        message: message.to_string(),
    }
}

#[async_trait]
impl SectionRepository for FakeRepository {
    async fn list_sections(&self) -> CmsResult<Vec<Section>> {
        self.record(Request::List);
        Ok(self.sections.lock().unwrap().clone())
    }

    async fn create_section(&self, request: &CreateSectionRequest) -> CmsResult<Section> {
        self.record(Request::Create(request.section_key.clone()));
        let mut sections = self.sections.lock().unwrap();
        let id = sections.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let section = Section {
            id,
            key: request.section_key.clone(),
            section_type: request.section_type,
            name: request.name.clone(),
            description: request.description.clone(),
            order_index: request.order_index,
            is_active: request.is_active,
            layout_config: request.layout_config.clone(),
            responsive_settings: request.responsive_settings.clone(),
            animation_config: request.animation_config.clone(),
            custom_css: request.custom_css.clone(),
            seo: request.seo.clone(),
            content: Some(Content::draft(id * 100)),
        };
        sections.push(section.clone());
        Ok(section)
    }

    async fn reorder_sections(&self, orders: &[SectionOrder]) -> CmsResult<()> {
        self.record(Request::Reorder(orders.to_vec()));
        if self.fail_reorder.load(Ordering::SeqCst) {
            return Err(server_error("reorder failed"));
        }
        let mut sections = self.sections.lock().unwrap();
        for order in orders {
            if let Some(section) = sections.iter_mut().find(|s| s.id == order.id) {
                section.order_index = order.order_index;
            }
        }
        Ok(())
    }

    async fn set_section_active(&self, id: SectionId, is_active: bool) -> CmsResult<()> {
        self.record(Request::SetActive(id, is_active));
        let mut sections = self.sections.lock().unwrap();
        match sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                section.is_active = is_active;
                Ok(())
            }
            None => Err(server_error("section not found")),
        }
    }

    async fn delete_section(&self, id: SectionId) -> CmsResult<()> {
        self.record(Request::Delete(id));
        self.sections.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn update_content(
        &self,
        id: ContentId,
        content: &Content,
        generate_ai_content: bool,
    ) -> CmsResult<Content> {
        self.record(Request::UpdateContent(id, content.clone(), generate_ai_content));

        let gate = self.update_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.panic_updates.load(Ordering::SeqCst) {
            panic!("update handler crashed");
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(server_error("database unavailable"));
        }
        self.store_content(content.clone())
    }

    async fn publish_content(&self, id: ContentId) -> CmsResult<Content> {
        self.record(Request::Publish(id));
        let current = {
            let sections = self.sections.lock().unwrap();
            sections
                .iter()
                .filter_map(|s| s.content.clone())
                .find(|c| c.id == id)
        };
        match current {
            Some(content) if content.status == ContentStatus::Approved => {
                self.store_content(Content {
                    status: ContentStatus::Published,
                    ..content
                })
            }
            Some(_) => Err(CmsError::Network {
                status: Some(409),
                message: "content is not approved".to_string(),
            }),
            None => Err(server_error("content not found")),
        }
    }
}

pub fn section(id: SectionId, key: &str, order_index: u32) -> Section {
    Section {
        id,
        key: key.to_string(),
        section_type: SectionType::Custom,
        name: key.to_uppercase(),
        description: String::new(),
        order_index,
        is_active: true,
        layout_config: Value::Null,
        responsive_settings: Value::Null,
        animation_config: Value::Null,
        custom_css: String::new(),
        seo: Default::default(),
        content: Some(Content::draft(id * 100)),
    }
}

/// Sections A(1), B(2), C(3) with ids 1, 2, 3
pub fn abc() -> Vec<Section> {
    vec![section(1, "a", 1), section(2, "b", 2), section(3, "c", 3)]
}

pub const DELAY: Duration = Duration::from_millis(1000);

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub async fn loaded_editor(repo: &Arc<FakeRepository>) -> CmsEditor<FakeRepository> {
    let mut editor = CmsEditor::new(
        Arc::clone(repo),
        EditorOptions {
            autosave_delay: DELAY,
            generate_ai_content: false,
        },
    );
    editor.load_sections().await.unwrap();
    editor
}

pub fn store_keys(editor: &CmsEditor<FakeRepository>) -> Vec<(String, u32)> {
    editor
        .store()
        .sections()
        .iter()
        .map(|s| (s.key.clone(), s.order_index))
        .collect()
}
