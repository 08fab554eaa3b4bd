//! NewsAPI integration.

use chrono::{Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use agentry_core::engine::runner::Invocation;
use agentry_core::tool::Tool;
use agentry_types::outcome::StepResult;
use agentry_types::tool::{ParameterKind, ToolCapability, ToolError, ToolParameter};

use super::{capped_count, str_param};

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// Headlines, article search, and source listings from NewsAPI.
pub struct NewsTool {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    capabilities: Vec<ToolCapability>,
}

impl NewsTool {
    pub fn new(client: reqwest::Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            capabilities: declare_capabilities(),
        }
    }

    /// Override the base URL (testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&SecretString, ToolError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ToolError::MissingKey("NEWS_API_KEY".to_string()))
    }

    async fn request(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, ToolError> {
        let key = self.key()?;
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(endpoint, "querying NewsAPI");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apiKey", key.expose_secret())])
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Deserialization(e.to_string()))
    }

    async fn top_headlines(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(country) = str_param(params, "country") {
            query.push(("country", country.to_string()));
        }
        if let Some(category) = str_param(params, "category") {
            query.push(("category", category.to_string()));
        }
        if let Some(source) = str_param(params, "source") {
            query.push(("sources", source.to_string()));
        }
        if let Some(q) = str_param(params, "query") {
            query.push(("q", q.to_string()));
        }
        query.push(("pageSize", capped_count(params, "page_size", 20, 100).to_string()));

        let data = self.request("top-headlines", &query).await?;
        let articles = shape_articles(&data);
        let count = articles.len();

        Ok(StepResult::success(json!({
            "articles": articles,
            "total_results": data["totalResults"],
        }))
        .with_metadata(json!({"api_source": "NewsAPI", "results_returned": count})))
    }

    async fn search_news(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let q = str_param(params, "query").unwrap_or_default().to_string();

        // NewsAPI's free tier only covers the past month.
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(30);

        let query = [
            ("q", q.clone()),
            (
                "language",
                str_param(params, "language").unwrap_or("en").to_string(),
            ),
            (
                "sortBy",
                str_param(params, "sort_by").unwrap_or("publishedAt").to_string(),
            ),
            ("pageSize", capped_count(params, "page_size", 20, 100).to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];

        let data = self.request("everything", &query).await?;
        let articles = shape_articles(&data);
        let count = articles.len();

        Ok(StepResult::success(json!({
            "articles": articles,
            "total_results": data["totalResults"],
            "search_query": q,
            "date_range": {"from": from.to_string(), "to": to.to_string()},
        }))
        .with_metadata(json!({"api_source": "NewsAPI", "results_returned": count})))
    }

    async fn sources(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        for name in ["category", "language", "country"] {
            if let Some(value) = str_param(params, name) {
                query.push((name, value.to_string()));
            }
        }

        let data = self.request("top-headlines/sources", &query).await?;

        let sources: Vec<Value> = data["sources"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|source| {
                json!({
                    "id": source["id"],
                    "name": source["name"],
                    "description": source["description"],
                    "category": source["category"],
                    "language": source["language"],
                    "country": source["country"],
                    "url": source["url"],
                })
            })
            .collect();

        let count = sources.len();
        Ok(StepResult::success(json!({"sources": sources}))
            .with_metadata(json!({"api_source": "NewsAPI", "results_returned": count})))
    }
}

impl Tool for NewsTool {
    fn name(&self) -> &str {
        "news"
    }

    fn description(&self) -> &str {
        "Headlines and article search from NewsAPI"
    }

    fn capabilities(&self) -> &[ToolCapability] {
        &self.capabilities
    }

    async fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        _invocation: &Invocation<'_>,
    ) -> Result<StepResult, ToolError> {
        match capability {
            "get_top_headlines" => self.top_headlines(parameters).await,
            "search_news" => self.search_news(parameters).await,
            "get_sources" => self.sources(parameters).await,
            other => Err(ToolError::UnknownCapability(other.to_string())),
        }
    }
}

/// Project NewsAPI articles onto the fields the pipeline cares about.
fn shape_articles(data: &Value) -> Vec<Value> {
    data["articles"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|article| {
            json!({
                "title": article["title"],
                "description": article["description"],
                "source": article["source"]["name"],
                "author": article["author"],
                "url": article["url"],
                "published_at": article["publishedAt"],
            })
        })
        .collect()
}

fn category_values() -> Vec<Value> {
    CATEGORIES.iter().map(|c| json!(c)).collect()
}

fn declare_capabilities() -> Vec<ToolCapability> {
    vec![
        ToolCapability::new("get_top_headlines", "Get top headlines")
            .with_parameters(vec![
                ToolParameter::optional(
                    "country",
                    ParameterKind::String,
                    "ISO 3166-1 alpha-2 country code (e.g. 'us', 'gb')",
                ),
                ToolParameter::optional("category", ParameterKind::String, "news category")
                    .with_allowed(category_values()),
                ToolParameter::optional("source", ParameterKind::String, "specific source id"),
                ToolParameter::optional("query", ParameterKind::String, "headline search query"),
                ToolParameter::optional(
                    "page_size",
                    ParameterKind::Number,
                    "results to return (max 100)",
                )
                .with_default(json!(20)),
            ])
            .with_examples(vec![
                "get_top_headlines(country='us')",
                "get_top_headlines(category='technology', page_size=10)",
            ]),
        ToolCapability::new("search_news", "Search articles from the past month")
            .with_parameters(vec![
                ToolParameter::required("query", ParameterKind::String, "search keywords"),
                ToolParameter::optional(
                    "language",
                    ParameterKind::String,
                    "ISO 639-1 language code",
                )
                .with_default(json!("en")),
                ToolParameter::optional("sort_by", ParameterKind::String, "sort order")
                    .with_default(json!("publishedAt"))
                    .with_allowed(vec![
                        json!("relevancy"),
                        json!("popularity"),
                        json!("publishedAt"),
                    ]),
                ToolParameter::optional(
                    "page_size",
                    ParameterKind::Number,
                    "results to return (max 100)",
                )
                .with_default(json!(20)),
            ])
            .with_examples(vec![
                "search_news(query='rust 1.93 release')",
                "search_news(query='climate summit', sort_by='popularity')",
            ]),
        ToolCapability::new("get_sources", "List available news sources")
            .with_parameters(vec![
                ToolParameter::optional("category", ParameterKind::String, "filter by category")
                    .with_allowed(category_values()),
                ToolParameter::optional(
                    "language",
                    ParameterKind::String,
                    "filter by language (ISO 639-1)",
                ),
                ToolParameter::optional(
                    "country",
                    ParameterKind::String,
                    "filter by country (ISO 3166-1)",
                ),
            ])
            .with_examples(vec!["get_sources(category='technology')"]),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
