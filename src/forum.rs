//! Read-only Reddit client: application-only OAuth, thread fetch, comment flattening.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

use crate::config::ForumConfig;

#[derive(Error, Debug)]
pub enum ForumError {
    #[error("{0} is not set")]
    MissingCredentials(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Forum API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected forum response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ForumError>;

/// The original post as returned by the API.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub selftext: String,
    pub score: i64,
    pub author: String,
    pub permalink: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub score: i64,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FetchedThread {
    pub submission: Submission,
    pub comments: Vec<Comment>,
}

// Wire types. Things are adjacently tagged: {"kind": "t1", "data": {...}}.

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
enum Thing {
    #[serde(rename = "t3")]
    Submission(SubmissionData),
    #[serde(rename = "t1")]
    Comment(CommentData),
    #[serde(rename = "more")]
    More(MoreData),
}

#[derive(Debug, Deserialize)]
struct SubmissionData {
    id: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default, deserialize_with = "author_or_deleted")]
    author: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default, deserialize_with = "author_or_deleted")]
    author: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    body: String,
    #[serde(default, deserialize_with = "replies_or_empty")]
    replies: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct MoreData {
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

fn author_or_deleted<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let author = Option::<String>::deserialize(deserializer)?;
    Ok(author.unwrap_or_else(|| "[deleted]".to_string()))
}

// A comment without replies carries `"replies": ""` instead of a listing.
fn replies_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Thing>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Replies {
        Listing(Listing),
        Other(serde_json::Value),
    }

    Ok(match Replies::deserialize(deserializer)? {
        Replies::Listing(listing) => listing.data.children,
        Replies::Other(_) => Vec::new(),
    })
}

impl From<SubmissionData> for Submission {
    fn from(data: SubmissionData) -> Self {
        let created_at = data
            .created_utc
            .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single());
        Self {
            id: data.id,
            subreddit: data.subreddit,
            title: data.title,
            selftext: data.selftext,
            score: data.score,
            author: data.author,
            permalink: data.permalink,
            created_at,
        }
    }
}

pub struct ForumClient {
    client: Client,
    auth_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    more_expansions: usize,
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            tracing::error!("Missing Reddit API credential ({})", name);
            ForumError::MissingCredentials(name.to_string())
        })
}

impl ForumClient {
    /// Validates the three credentials and prepares the HTTP client. No request is sent.
    pub fn authenticate(config: &ForumConfig, timeout_secs: Option<u64>) -> Result<Self> {
        let client_id = required(&config.client_id, "REDDIT_CLIENT_ID")?;
        let client_secret = required(&config.client_secret, "REDDIT_CLIENT_SECRET")?;
        let user_agent = required(&config.user_agent, "REDDIT_USER_AGENT")?;

        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            auth_base: config.auth_base.trim_end_matches('/').to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            more_expansions: config.more_expansions,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let url = format!("{}/api/v1/access_token", self.auth_base);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = Self::read_json(resp).await?;
        Ok(token.access_token)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForumError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| ForumError::Parse(e.to_string()))
    }

    /// Fetches the submission and up to `limit` comments, flattened breadth-first.
    pub async fn fetch_thread(&self, id: &str, limit: usize, sort: &str) -> Result<FetchedThread> {
        let result = self.fetch_thread_inner(id, limit, sort).await;
        if let Err(err) = &result {
            tracing::error!(submission = id, error = %err, "Failed to fetch thread");
        }
        result
    }

    async fn fetch_thread_inner(
        &self,
        id: &str,
        limit: usize,
        sort: &str,
    ) -> Result<FetchedThread> {
        let token = self.access_token().await?;
        tracing::debug!(submission = id, "Obtained forum access token");

        let url = format!("{}/comments/{}", self.api_base, id);
        let limit_param = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("limit", limit_param.as_str()),
                ("sort", sort),
                ("raw_json", "1"),
            ])
            .send()
            .await?;

        let listings: Vec<Listing> = Self::read_json(resp).await?;
        let mut listings = listings.into_iter();

        let submission = listings
            .next()
            .and_then(|l| l.data.children.into_iter().next())
            .and_then(|thing| match thing {
                Thing::Submission(data) => Some(Submission::from(data)),
                _ => None,
            })
            .ok_or_else(|| ForumError::Parse(format!("no submission in response for {}", id)))?;

        let forest = listings.next().map(|l| l.data.children).unwrap_or_default();
        let comments = self.flatten(&token, id, forest, limit, sort).await?;

        tracing::info!(
            submission = id,
            title = %submission.title,
            comments = comments.len(),
            "Fetched thread"
        );

        Ok(FetchedThread {
            submission,
            comments,
        })
    }

    async fn flatten(
        &self,
        token: &str,
        link_id: &str,
        forest: Vec<Thing>,
        limit: usize,
        sort: &str,
    ) -> Result<Vec<Comment>> {
        let mut queue: VecDeque<Thing> = forest.into();
        let mut comments = Vec::new();
        let mut expansions_left = self.more_expansions;

        while comments.len() < limit {
            let Some(thing) = queue.pop_front() else {
                break;
            };

            match thing {
                Thing::Comment(data) => {
                    queue.extend(data.replies);
                    comments.push(Comment {
                        id: data.id,
                        author: data.author,
                        score: data.score,
                        body: data.body,
                    });
                }
                Thing::More(more) => {
                    if more.children.is_empty() || expansions_left == 0 {
                        continue;
                    }
                    expansions_left -= 1;
                    let things = self.more_children(token, link_id, &more.children, sort).await?;
                    tracing::debug!(
                        requested = more.children.len(),
                        loaded = things.len(),
                        "Expanded more-comments placeholder"
                    );
                    queue.extend(things);
                }
                Thing::Submission(_) => {}
            }
        }

        Ok(comments)
    }

    async fn more_children(
        &self,
        token: &str,
        link_id: &str,
        children: &[String],
        sort: &str,
    ) -> Result<Vec<Thing>> {
        let url = format!("{}/api/morechildren", self.api_base);
        let link = format!("t3_{}", link_id);
        let joined = children.join(",");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("api_type", "json"),
                ("link_id", link.as_str()),
                ("children", joined.as_str()),
                ("sort", sort),
                ("raw_json", "1"),
            ])
            .send()
            .await?;

        let body: MoreChildrenResponse = Self::read_json(resp).await?;
        if !body.json.errors.is_empty() {
            return Err(ForumError::Parse(format!(
                "morechildren errors: {:?}",
                body.json.errors
            )));
        }
        Ok(body.json.data.map(|d| d.things).unwrap_or_default())
    }
}
