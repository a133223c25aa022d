use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OwnerDto {
    pub display_name: Option<String>,
    pub profile_image: Option<String>,
    pub reputation: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QuestionDto {
    pub question_id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub answer_count: i32,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub view_count: i32,
    pub creation_date: i64,
    pub last_activity_date: i64,
    #[serde(default)]
    pub last_edit_date: Option<i64>,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub owner: OwnerDto,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AnswerDto {
    pub answer_id: i64,
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub is_accepted: bool,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub body: String,
    pub creation_date: i64,
    #[serde(default)]
    pub last_activity_date: Option<i64>,
    #[serde(default)]
    pub last_edit_date: Option<i64>,
    #[serde(default)]
    pub owner: OwnerDto,
}

/// The envelope every list endpoint wraps its items in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub quota_max: Option<i64>,
    #[serde(default)]
    pub quota_remaining: Option<i64>,
}

pub type QuestionsResponse = ItemsResponse<QuestionDto>;
pub type AnswersResponse = ItemsResponse<AnswerDto>;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_id: Option<i64>,
    error_name: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {name} ({message})")]
    Status {
        status: u16,
        error_id: Option<i64>,
        name: String,
        message: String,
    },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait QuestionService: Send + Sync {
    async fn get_newest_questions(&self) -> Result<QuestionsResponse, RemoteError>;

    async fn search_questions(&self, title: &str) -> Result<QuestionsResponse, RemoteError>;
}

#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn get_answers_for_question(&self, question_id: i64) -> Result<AnswersResponse, RemoteError>;
}

/// Stack Exchange API client shared by both repositories.
#[derive(Clone)]
pub struct StackExchangeClient {
    client: Client,
    base_url: String,
    api_key: String,
    site: String,
    page_size: u32,
}

impl StackExchangeClient {
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("stack_search/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            site: config.site.clone(),
            page_size: config.page_size,
        })
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pagesize", self.page_size.to_string()),
            ("order", "desc".to_string()),
            ("sort", "activity".to_string()),
            ("site", self.site.clone()),
            ("filter", "withbody".to_string()),
            ("page", "1".to_string()),
        ];
        if !self.api_key.trim().is_empty() {
            params.push(("key", self.api_key.clone()));
        }
        params
    }

    async fn get_items<T>(
        &self,
        path: &str,
        extra: &[(&'static str, String)],
    ) -> Result<ItemsResponse<T>, RemoteError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut params = extra.to_vec();
        params.extend(self.params());

        debug!("GET {}", url);
        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let api_error = serde_json::from_slice::<ApiErrorBody>(&body).ok();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                error_id: api_error.as_ref().and_then(|e| e.error_id),
                name: api_error
                    .as_ref()
                    .and_then(|e| e.error_name.clone())
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
                message: api_error
                    .and_then(|e| e.error_message)
                    .unwrap_or_default(),
            });
        }

        let parsed: ItemsResponse<T> = serde_json::from_slice(&body)?;
        info!(
            "Loaded {} items from {} (quota remaining: {})",
            parsed.items.len(),
            path,
            parsed
                .quota_remaining
                .map(|q| q.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        debug!("has_more={} quota_max={:?}", parsed.has_more, parsed.quota_max);
        Ok(parsed)
    }
}

#[async_trait]
impl QuestionService for StackExchangeClient {
    async fn get_newest_questions(&self) -> Result<QuestionsResponse, RemoteError> {
        self.get_items("questions", &[]).await
    }

    async fn search_questions(&self, title: &str) -> Result<QuestionsResponse, RemoteError> {
        self.get_items("search/advanced", &[("title", title.to_string())]).await
    }
}

#[async_trait]
impl AnswerService for StackExchangeClient {
    async fn get_answers_for_question(&self, question_id: i64) -> Result<AnswersResponse, RemoteError> {
        self.get_items(&format!("questions/{}/answers", question_id), &[]).await
    }
}
