use crate::config::ApiConfig;
use crate::error::{CmsError, CmsResult};
use crate::repository::SectionRepository;
use crate::section::{Content, ContentId, CreateSectionRequest, Section, SectionId, SectionOrder};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// `{success, data?, error?}` wrapper used by every CMS endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReorderRequest<'a> {
    section_orders: &'a [SectionOrder],
}

#[derive(Debug, Serialize)]
struct UpdateSectionRequest {
    is_active: bool,
}

#[derive(Debug, Serialize)]
struct UpdateContentRequest<'a> {
    #[serde(flatten)]
    content: &'a Content,
    generate_ai_content: bool,
}

/// Turn a raw response into the envelope's data, treating any non-2xx status
/// or `success: false` as a failure
pub fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> CmsResult<Option<T>> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiEnvelope<Value>>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.to_string()
                }
            });
        return Err(CmsError::Network {
            status: Some(status),
            message,
        });
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(body).map_err(|e| CmsError::Network {
        status: Some(status),
        message: format!("unexpected response body: {e}"),
    })?;

    if !envelope.success {
        return Err(CmsError::Network {
            status: Some(status),
            message: envelope
                .error
                .unwrap_or_else(|| "request was not successful".to_string()),
        });
    }
    Ok(envelope.data)
}

fn require<T>(data: Option<T>, what: &str) -> CmsResult<T> {
    data.ok_or_else(|| CmsError::network(format!("response carried no {what}")))
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> CmsResult<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> CmsResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| CmsError::validation(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> CmsResult<Option<T>> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("ApiClient: HTTP {} ({} bytes)", status, body.len());
        parse_envelope(status, &body)
    }
}

#[async_trait]
impl SectionRepository for ApiClient {
    async fn list_sections(&self) -> CmsResult<Vec<Section>> {
        let sections: Option<Vec<Section>> = self
            .send(self.client.get(self.url("/api/cms/sections")))
            .await?;
        let sections = sections.unwrap_or_default();
        info!("ApiClient: fetched {} sections", sections.len());
        Ok(sections)
    }

    async fn create_section(&self, request: &CreateSectionRequest) -> CmsResult<Section> {
        info!("ApiClient: creating section '{}'", request.section_key);
        let created = self
            .send(self.client.post(self.url("/api/cms/sections")).json(request))
            .await?;
        require(created, "section")
    }

    async fn reorder_sections(&self, orders: &[SectionOrder]) -> CmsResult<()> {
        info!("ApiClient: committing order of {} sections", orders.len());
        self.send::<Value>(
            self.client
                .post(self.url("/api/cms/sections/reorder"))
                .json(&ReorderRequest {
                    section_orders: orders,
                }),
        )
        .await?;
        Ok(())
    }

    async fn set_section_active(&self, id: SectionId, is_active: bool) -> CmsResult<()> {
        self.send::<Value>(
            self.client
                .put(self.url(&format!("/api/cms/sections/{id}")))
                .json(&UpdateSectionRequest { is_active }),
        )
        .await?;
        Ok(())
    }

    async fn delete_section(&self, id: SectionId) -> CmsResult<()> {
        info!("ApiClient: deleting section {}", id);
        self.send::<Value>(self.client.delete(self.url(&format!("/api/cms/sections/{id}"))))
            .await?;
        Ok(())
    }

    async fn update_content(
        &self,
        id: ContentId,
        content: &Content,
        generate_ai_content: bool,
    ) -> CmsResult<Content> {
        let saved = self
            .send(
                self.client
                    .put(self.url(&format!("/api/cms/content/{id}")))
                    .json(&UpdateContentRequest {
                        content,
                        generate_ai_content,
                    }),
            )
            .await?;
        require(saved, "content")
    }

    async fn publish_content(&self, id: ContentId) -> CmsResult<Content> {
        info!("ApiClient: publishing content {}", id);
        let published = self
            .send(self.client.post(self.url(&format!("/api/cms/content/{id}/publish"))))
            .await?;
        require(published, "content")
    }
}
