//! Homepage section management for the academy CMS dashboard.
//!
//! [`SectionStore`] holds the ordered sections and the one under edit,
//! [`workflow`] holds the publication rules, [`ReorderCoordinator`] and
//! [`AutosaveScheduler`] decide when to talk to the backend, and
//! [`CmsEditor`] ties them to a [`SectionRepository`].

pub mod api_client;
pub mod autosave;
pub mod config;
pub mod debouncer;
pub mod editor;
pub mod error;
pub mod logging;
pub mod reorder;
pub mod repository;
pub mod section;
pub mod section_store;
pub mod workflow;

pub use api_client::ApiClient;
pub use autosave::AutosaveScheduler;
pub use editor::{CmsEditor, Completion, EditorOptions, Notice, NoticeLevel};
pub use error::{CmsError, CmsResult};
pub use reorder::{MoveEvent, ReorderCoordinator};
pub use repository::SectionRepository;
pub use section_store::{SectionStore, Selection, ViewMode};
