//! GitHub REST v3 integration.
//!
//! The token is optional: unauthenticated requests work with a lower rate
//! limit, so a missing `GITHUB_TOKEN` only drops the Authorization header.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use agentry_core::engine::runner::Invocation;
use agentry_core::tool::Tool;
use agentry_types::outcome::StepResult;
use agentry_types::tool::{ParameterKind, ToolCapability, ToolError, ToolParameter};

use super::{capped_count, str_param};

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Repository, user, and commit lookups against the GitHub REST API.
pub struct GithubTool {
    client: reqwest::Client,
    token: Option<SecretString>,
    base_url: String,
    capabilities: Vec<ToolCapability>,
}

impl GithubTool {
    pub fn new(client: reqwest::Client, token: Option<SecretString>) -> Self {
        Self {
            client,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            capabilities: declare_capabilities(),
        }
    }

    /// Override the base URL (testing, GitHub Enterprise).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ToolError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(path, authenticated = self.token.is_some(), "querying GitHub");

        let mut builder = self
            .client
            .get(&url)
            .header("accept", "application/vnd.github.v3+json")
            .query(query);
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("token {}", token.expose_secret()));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                403 => "rate limit exceeded or access forbidden".to_string(),
                404 => "resource not found".to_string(),
                _ => response.text().await.unwrap_or_default(),
            };
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

    async fn search_repositories(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let query = str_param(params, "query").unwrap_or_default().to_string();
        let sort = str_param(params, "sort").unwrap_or("stars").to_string();
        let order = str_param(params, "order").unwrap_or("desc").to_string();
        let per_page = capped_count(params, "per_page", 10, 100);

        let data = self
            .request(
                "/search/repositories",
                &[
                    ("q", query.clone()),
                    ("sort", sort),
                    ("order", order),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await?;

        let repositories: Vec<Value> = data["items"]
            .as_array()
            .into_iter()
            .flatten()
            .map(shape_repository)
            .collect();

        let count = repositories.len();
        Ok(StepResult::success(json!({
            "repositories": repositories,
            "total_count": data["total_count"],
            "query": query,
        }))
        .with_metadata(json!({"api_source": "GitHub", "results_returned": count})))
    }

    async fn get_repository(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let owner = str_param(params, "owner").unwrap_or_default();
        let repo = str_param(params, "repo").unwrap_or_default();

        let data = self.request(&format!("/repos/{owner}/{repo}"), &[]).await?;

        Ok(StepResult::success(json!({
            "repository": shape_repository(&data),
            "open_issues": data["open_issues_count"],
            "default_branch": data["default_branch"],
            "license": data["license"]["name"],
        }))
        .with_metadata(json!({"api_source": "GitHub"})))
    }

    async fn get_user_info(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let username = str_param(params, "username").unwrap_or_default();

        let data = self.request(&format!("/users/{username}"), &[]).await?;

        Ok(StepResult::success(json!({
            "login": data["login"],
            "name": data["name"],
            "bio": data["bio"],
            "company": data["company"],
            "location": data["location"],
            "public_repos": data["public_repos"],
            "followers": data["followers"],
            "following": data["following"],
            "created_at": data["created_at"],
            "url": data["html_url"],
        }))
        .with_metadata(json!({"api_source": "GitHub"})))
    }

    async fn list_commits(
        &self,
        params: &serde_json::Map<String, Value>,
    ) -> Result<StepResult, ToolError> {
        let owner = str_param(params, "owner").unwrap_or_default();
        let repo = str_param(params, "repo").unwrap_or_default();
        let per_page = capped_count(params, "per_page", 10, 100);

        let data = self
            .request(
                &format!("/repos/{owner}/{repo}/commits"),
                &[("per_page", per_page.to_string())],
            )
            .await?;

        let commits: Vec<Value> = data
            .as_array()
            .into_iter()
            .flatten()
            .map(|commit| {
                json!({
                    "sha": commit["sha"],
                    "message": commit["commit"]["message"],
                    "author": commit["commit"]["author"]["name"],
                    "date": commit["commit"]["author"]["date"],
                    "url": commit["html_url"],
                })
            })
            .collect();

        let count = commits.len();
        Ok(StepResult::success(json!({
            "commits": commits,
            "repository": format!("{owner}/{repo}"),
        }))
        .with_metadata(json!({"api_source": "GitHub", "results_returned": count})))
    }
}

impl Tool for GithubTool {
    fn name(&self) -> &str {
        "github"
    }

    fn description(&self) -> &str {
        "Repository, user, and commit data from the GitHub REST API"
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
            "search_repositories" => self.search_repositories(parameters).await,
            "get_repository" => self.get_repository(parameters).await,
            "get_user_info" => self.get_user_info(parameters).await,
            "list_repository_commits" => self.list_commits(parameters).await,
            other => Err(ToolError::UnknownCapability(other.to_string())),
        }
    }
}

/// Project a repository object onto the fields the pipeline cares about.
fn shape_repository(item: &Value) -> Value {
    json!({
        "name": item["name"],
        "full_name": item["full_name"],
        "owner": item["owner"]["login"],
        "description": item["description"],
        "stars": item["stargazers_count"],
        "forks": item["forks_count"],
        "language": item["language"],
        "updated_at": item["updated_at"],
        "url": item["html_url"],
        "topics": item["topics"],
    })
}

fn declare_capabilities() -> Vec<ToolCapability> {
    vec![
        ToolCapability::new("search_repositories", "Search GitHub repositories")
            .with_parameters(vec![
                ToolParameter::required(
                    "query",
                    ParameterKind::String,
                    "search query (e.g. 'language:rust stars:>100')",
                ),
                ToolParameter::optional("sort", ParameterKind::String, "sort field")
                    .with_default(json!("stars"))
                    .with_allowed(vec![
                        json!("stars"),
                        json!("forks"),
                        json!("updated"),
                        json!("created"),
                    ]),
                ToolParameter::optional("order", ParameterKind::String, "sort order")
                    .with_default(json!("desc"))
                    .with_allowed(vec![json!("desc"), json!("asc")]),
                ToolParameter::optional(
                    "per_page",
                    ParameterKind::Number,
                    "results per page (max 100)",
                )
                .with_default(json!(10)),
            ])
            .with_examples(vec![
                "search_repositories(query='language:rust http client')",
                "search_repositories(query='stars:>1000', sort='stars')",
            ]),
        ToolCapability::new("get_repository", "Get details for one repository")
            .with_parameters(vec![
                ToolParameter::required(
                    "owner",
                    ParameterKind::String,
                    "repository owner (user or organization)",
                ),
                ToolParameter::required("repo", ParameterKind::String, "repository name"),
            ])
            .with_examples(vec!["get_repository(owner='rust-lang', repo='rust')"]),
        ToolCapability::new("get_user_info", "Get a GitHub user's profile")
            .with_parameters(vec![ToolParameter::required(
                "username",
                ParameterKind::String,
                "GitHub username",
            )])
            .with_examples(vec!["get_user_info(username='octocat')"]),
        ToolCapability::new("list_repository_commits", "List recent commits in a repository")
            .with_parameters(vec![
                ToolParameter::required("owner", ParameterKind::String, "repository owner"),
                ToolParameter::required("repo", ParameterKind::String, "repository name"),
                ToolParameter::optional(
                    "per_page",
                    ParameterKind::Number,
                    "commits to return (max 100)",
                )
                .with_default(json!(10)),
            ])
            .with_examples(vec!["list_repository_commits(owner='rust-lang', repo='cargo')"]),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
