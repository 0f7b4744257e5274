use crate::models::{BriefProfile, ProjectRequest, RequestStatus, ServiceProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the profile directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Directory returned error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid directory API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read access to the records owned by the surrounding CRUD service
///
/// Profiles, requests and provider listings are created and edited
/// elsewhere; matching only reads them.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn brief_profile(&self, user_id: &str) -> Result<BriefProfile, DirectoryError>;

    async fn request(&self, request_id: &str) -> Result<ProjectRequest, DirectoryError>;

    async fn open_requests(&self) -> Result<Vec<ProjectRequest>, DirectoryError>;

    async fn provider(&self, provider_id: &str) -> Result<ServiceProvider, DirectoryError>;

    async fn providers(&self) -> Result<Vec<ServiceProvider>, DirectoryError>;
}

/// HTTP client for the directory service
///
/// Single documents are returned bare; listings as `{"documents": [...]}`.
pub struct HttpDirectory {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpDirectory {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn get_json(&self, path: &str, what: &str) -> Result<Value, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Fetching {} from: {}", what, url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Unauthorized),
            s => Err(DirectoryError::Api(format!("Failed to fetch {}: {}", what, s))),
        }
    }

    async fn get_document<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, DirectoryError> {
        let json = self.get_json(path, what).await?;
        serde_json::from_value(json)
            .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn get_documents<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>, DirectoryError> {
        let json = self.get_json(path, what).await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

        let mut parsed = Vec::with_capacity(documents.len());
        for doc in documents {
            match serde_json::from_value(doc.clone()) {
                Ok(item) => parsed.push(item),
                Err(e) => tracing::warn!("Skipping malformed {} document: {}", what, e),
            }
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ProfileDirectory for HttpDirectory {
    async fn brief_profile(&self, user_id: &str) -> Result<BriefProfile, DirectoryError> {
        let path = format!("/profiles/{}", urlencoding::encode(user_id));
        self.get_document(&path, &format!("profile {}", user_id)).await
    }

    async fn request(&self, request_id: &str) -> Result<ProjectRequest, DirectoryError> {
        let path = format!("/requests/{}", urlencoding::encode(request_id));
        self.get_document(&path, &format!("request {}", request_id)).await
    }

    async fn open_requests(&self) -> Result<Vec<ProjectRequest>, DirectoryError> {
        self.get_documents("/requests?status=open", "open requests").await
    }

    async fn provider(&self, provider_id: &str) -> Result<ServiceProvider, DirectoryError> {
        let path = format!("/providers/{}", urlencoding::encode(provider_id));
        self.get_document(&path, &format!("provider {}", provider_id)).await
    }

    async fn providers(&self) -> Result<Vec<ServiceProvider>, DirectoryError> {
        self.get_documents("/providers?status=active", "providers").await
    }
}

/// In-process directory, for tests and local runs without the CRUD service
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: DashMap<String, BriefProfile>,
    requests: DashMap<String, ProjectRequest>,
    providers: DashMap<String, ServiceProvider>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: BriefProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn insert_request(&self, request: ProjectRequest) {
        self.requests.insert(request.id.clone(), request);
    }

    pub fn insert_provider(&self, provider: ServiceProvider) {
        self.providers.insert(provider.id.clone(), provider);
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn brief_profile(&self, user_id: &str) -> Result<BriefProfile, DirectoryError> {
        self.profiles
            .get(user_id)
            .map(|p| p.clone())
            .ok_or_else(|| DirectoryError::NotFound(format!("profile {}", user_id)))
    }

    async fn request(&self, request_id: &str) -> Result<ProjectRequest, DirectoryError> {
        self.requests
            .get(request_id)
            .map(|r| r.clone())
            .ok_or_else(|| DirectoryError::NotFound(format!("request {}", request_id)))
    }

    async fn open_requests(&self) -> Result<Vec<ProjectRequest>, DirectoryError> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Open)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn provider(&self, provider_id: &str) -> Result<ServiceProvider, DirectoryError> {
        self.providers
            .get(provider_id)
            .map(|p| p.clone())
            .ok_or_else(|| DirectoryError::NotFound(format!("provider {}", provider_id)))
    }

    async fn providers(&self) -> Result<Vec<ServiceProvider>, DirectoryError> {
        Ok(self.providers.iter().map(|p| p.value().clone()).collect())
    }
}
