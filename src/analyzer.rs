use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::forum::ForumClient;
use crate::llm::LlmClient;
use crate::report::{CommentRecord, ThreadRecord};
use crate::thread_url::parse_thread_id;

/// Drives one analysis: fetch, then summarize and classify each comment in order.
pub struct Analyzer {
    config: Arc<Config>,
}

impl Analyzer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn process_default(&self, url: &str, limit: usize) -> Result<ThreadRecord, AppError> {
        let llm = &self.config.llm;
        self.process(url, limit, &llm.summary_model, &llm.relevance_model)
            .await
    }

    pub async fn process(
        &self,
        url: &str,
        limit: usize,
        summary_model: &str,
        relevance_model: &str,
    ) -> Result<ThreadRecord, AppError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %run_id, url);
        self.run(url, limit, summary_model, relevance_model)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        url: &str,
        limit: usize,
        summary_model: &str,
        relevance_model: &str,
    ) -> Result<ThreadRecord, AppError> {
        let timeout = self.config.http.timeout_secs;

        // Both credential sets are checked before any network traffic.
        let forum = ForumClient::authenticate(&self.config.forum, timeout)?;
        let llm = LlmClient::authenticate(&self.config.llm, timeout)?;

        let submission_id = parse_thread_id(url)?;
        tracing::info!(submission = %submission_id, limit, "Starting thread analysis");

        let fetched = forum
            .fetch_thread(&submission_id, limit, &self.config.forum.sort)
            .await
            .map_err(|err| AppError::FetchFailure(err.to_string()))?;

        let submission = fetched.submission;
        let post_text = if submission.selftext.trim().is_empty() {
            submission.title.clone()
        } else {
            format!("{}\n\n{}", submission.title, submission.selftext)
        };

        let post_summary = llm.summarize(&post_text, summary_model).await;

        let mut comments = Vec::with_capacity(fetched.comments.len());
        for comment in fetched.comments {
            if comment.body.trim().is_empty() {
                tracing::debug!(comment = %comment.id, "Skipping comment with empty body");
                continue;
            }

            let summary = llm.summarize(&comment.body, summary_model).await;
            let relevance = llm
                .classify_relevance(&post_text, &comment.body, relevance_model)
                .await;

            comments.push(CommentRecord {
                id: comment.id,
                author: comment.author,
                score: comment.score,
                body: comment.body,
                summary,
                relevance,
            });
        }

        tracing::info!(
            submission = %submission_id,
            processed = comments.len(),
            "Thread analysis complete"
        );

        Ok(ThreadRecord {
            url: url.to_string(),
            submission_id,
            subreddit: submission.subreddit,
            title: submission.title,
            post_text: submission.selftext,
            score: submission.score,
            author: submission.author,
            permalink: submission.permalink,
            created_at: submission.created_at,
            post_summary,
            summary_model: summary_model.to_string(),
            relevance_model: relevance_model.to_string(),
            analyzed_at: Utc::now(),
            comments,
        })
    }
}
