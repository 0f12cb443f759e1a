//! Persistence seam between the editor and the CMS backend

use crate::error::CmsResult;
use crate::section::{Content, ContentId, CreateSectionRequest, Section, SectionId, SectionOrder};
use async_trait::async_trait;

/// The backend operations the dashboard relies on.
///
/// `ApiClient` implements this over HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait SectionRepository: Send + Sync + 'static {
    /// All sections with their content, in any order
    async fn list_sections(&self) -> CmsResult<Vec<Section>>;

    /// Create a section together with its draft content
    async fn create_section(&self, request: &CreateSectionRequest) -> CmsResult<Section>;

    /// Persist the complete order of every section
    async fn reorder_sections(&self, orders: &[SectionOrder]) -> CmsResult<()>;

    async fn set_section_active(&self, id: SectionId, is_active: bool) -> CmsResult<()>;

    async fn delete_section(&self, id: SectionId) -> CmsResult<()>;

    /// Replace the stored content; returns what the server stored
    async fn update_content(
        &self,
        id: ContentId,
        content: &Content,
        generate_ai_content: bool,
    ) -> CmsResult<Content>;

    async fn publish_content(&self, id: ContentId) -> CmsResult<Content>;
}
