//! Homepage sections and their editorial content, as exchanged with the backend

use crate::error::{CmsError, CmsResult};
use crate::workflow::ContentStatus;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub type SectionId = i64;
pub type ContentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Hero,
    About,
    Programs,
    Gallery,
    Testimonials,
    Stats,
    Team,
    Events,
    Contact,
    Cta,
    #[serde(other)]
    Custom,
}

impl SectionType {
    pub const ALL: [SectionType; 11] = [
        SectionType::Hero,
        SectionType::About,
        SectionType::Programs,
        SectionType::Gallery,
        SectionType::Testimonials,
        SectionType::Stats,
        SectionType::Team,
        SectionType::Events,
        SectionType::Contact,
        SectionType::Cta,
        SectionType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::About => "about",
            SectionType::Programs => "programs",
            SectionType::Gallery => "gallery",
            SectionType::Testimonials => "testimonials",
            SectionType::Stats => "stats",
            SectionType::Team => "team",
            SectionType::Events => "events",
            SectionType::Contact => "contact",
            SectionType::Cta => "cta",
            SectionType::Custom => "custom",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CmsError::validation(format!("unknown section type '{s}'")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seo {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

fn first_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// The versioned editorial payload attached to a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body_content: String,
    #[serde(default)]
    pub rich_content: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub ai_generated_content: Option<Value>,
    #[serde(default)]
    pub ai_seo_score: Option<f64>,
    #[serde(default)]
    pub media: Vec<Value>,
    #[serde(default)]
    pub ctas: Vec<Value>,
    #[serde(default)]
    pub specialized: Value,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Content {
    /// Empty draft content, as the backend creates alongside a new section
    pub fn draft(id: ContentId) -> Self {
        Self {
            id,
            version: 1,
            title: String::new(),
            subtitle: String::new(),
            description: String::new(),
            body_content: String::new(),
            rich_content: Value::Null,
            metadata: Value::Null,
            tags: Vec::new(),
            status: ContentStatus::Draft,
            ai_generated_content: None,
            ai_seo_score: None,
            media: Vec::new(),
            ctas: Vec::new(),
            specialized: Value::Null,
            updated_at: None,
        }
    }
}

/// A partial edit to a section's content. Status is deliberately absent:
/// it only changes through workflow transitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub body_content: Option<String>,
    pub rich_content: Option<Value>,
    pub metadata: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub media: Option<Vec<Value>>,
    pub ctas: Option<Vec<Value>>,
    pub specialized: Option<Value>,
}

impl ContentPatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn body(value: impl Into<String>) -> Self {
        Self {
            body_content: Some(value.into()),
            ..Default::default()
        }
    }

    /// Build a patch for a single text field by name, as typed in the shell
    pub fn field(name: &str, value: &str) -> CmsResult<Self> {
        let mut patch = Self::default();
        match name {
            "title" => patch.title = Some(value.to_string()),
            "subtitle" => patch.subtitle = Some(value.to_string()),
            "description" => patch.description = Some(value.to_string()),
            "body" | "body_content" => patch.body_content = Some(value.to_string()),
            "tags" => {
                patch.tags = Some(
                    value
                        .split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect(),
                )
            }
            other => {
                return Err(CmsError::validation(format!(
                    "'{other}' is not an editable field"
                )))
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, content: &mut Content) {
        if let Some(title) = &self.title {
            content.title = title.clone();
        }
        if let Some(subtitle) = &self.subtitle {
            content.subtitle = subtitle.clone();
        }
        if let Some(description) = &self.description {
            content.description = description.clone();
        }
        if let Some(body) = &self.body_content {
            content.body_content = body.clone();
        }
        if let Some(rich) = &self.rich_content {
            content.rich_content = rich.clone();
        }
        if let Some(metadata) = &self.metadata {
            content.metadata = metadata.clone();
        }
        if let Some(tags) = &self.tags {
            content.tags = tags.clone();
        }
        if let Some(media) = &self.media {
            content.media = media.clone();
        }
        if let Some(ctas) = &self.ctas {
            content.ctas = ctas.clone();
        }
        if let Some(specialized) = &self.specialized {
            content.specialized = specialized.clone();
        }
    }
}

/// A homepage content block with a position and an activation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    #[serde(rename = "section_key")]
    pub key: String,
    pub section_type: SectionType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 1-based rank on the homepage
    pub order_index: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub layout_config: Value,
    #[serde(default)]
    pub responsive_settings: Value,
    #[serde(default)]
    pub animation_config: Value,
    #[serde(default)]
    pub custom_css: String,
    #[serde(default)]
    pub seo: Seo,
    #[serde(default)]
    pub content: Option<Content>,
}

/// One entry of the reorder request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOrder {
    pub id: SectionId,
    pub order_index: u32,
}

/// Everything needed to create a section; the backend creates its content alongside
#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub section_type: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub layout_config: Value,
    pub responsive_settings: Value,
    pub animation_config: Value,
    pub custom_css: String,
    pub seo: Seo,
}

impl NewSection {
    pub fn new(section_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section_type: section_type.into(),
            name: name.into(),
            description: String::new(),
            is_active: true,
            layout_config: Value::Null,
            responsive_settings: Value::Null,
            animation_config: Value::Null,
            custom_css: String::new(),
            seo: Seo::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check required fields and resolve the section type
    pub fn validate(&self) -> CmsResult<SectionType> {
        if self.name.trim().is_empty() {
            return Err(CmsError::validation("section name is required"));
        }
        if self.section_type.trim().is_empty() {
            return Err(CmsError::validation("section type is required"));
        }
        self.section_type.parse()
    }
}

/// Body of `POST /api/cms/sections`
#[derive(Debug, Clone, Serialize)]
pub struct CreateSectionRequest {
    pub section_key: String,
    pub section_type: SectionType,
    pub name: String,
    pub description: String,
    pub order_index: u32,
    pub is_active: bool,
    pub layout_config: Value,
    pub responsive_settings: Value,
    pub animation_config: Value,
    pub custom_css: String,
    pub seo: Seo,
}

fn slug_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"))
}

/// Lowercase dash-separated slug of a section name
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let slug = slug_separator().replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Derive a key from `name` that no existing section owns
pub fn unique_key<'a>(name: &str, existing: impl IntoIterator<Item = &'a str> + Clone) -> String {
    let base = slugify(name);
    let taken = |candidate: &str| existing.clone().into_iter().any(|k| k == candidate);

    if !taken(&base) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
