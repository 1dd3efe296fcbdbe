#[cfg(test)]
mod tests {
    use crate::analyzer::Analyzer;
    use crate::config::{Config, ForumConfig, LlmConfig};
    use crate::error::AppError;
    use crate::forum::fixtures::{comment, thread, TOKEN_BODY};
    use crate::relevance::Verdict;
    use crate::report::Summary;
    use mockito::{Matcher, Mock, ServerGuard};
    use std::sync::Arc;

    const THREAD_URL: &str = "https://www.reddit.com/r/test/comments/abc123/title/";

    fn config_for(forum_base: &str, llm_base: &str) -> Config {
        Config {
            forum: ForumConfig {
                auth_base: forum_base.to_string(),
                api_base: forum_base.to_string(),
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                user_agent: Some("threadlens/test".to_string()),
                ..ForumConfig::default()
            },
            llm: LlmConfig {
                api_base: llm_base.to_string(),
                api_key: Some("sk-test".to_string()),
                ..LlmConfig::default()
            },
            ..Config::default()
        }
    }

    fn completion(content: &str) -> String {
        serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
            .to_string()
    }

    async fn mock_forum(
        server: &mut ServerGuard,
        comments: Vec<serde_json::Value>,
    ) -> (Mock, Mock) {
        let token = server
            .mock("POST", "/api/v1/access_token")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        let listing = server
            .mock("GET", "/comments/abc123")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(thread("abc123", comments))
            .create_async()
            .await;
        (token, listing)
    }

    async fn mock_summaries(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("TEXT TO SUMMARIZE".to_string()))
            .expect(hits)
            .with_status(status)
            .with_body(completion("A short summary."))
            .create_async()
            .await
    }

    async fn mock_relevance(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("ORIGINAL POST".to_string()))
            .expect(hits)
            .with_status(status)
            .with_body(completion(
                r#"{"is_relevant": "yes", "reasoning": "Recommends an editor."}"#,
            ))
            .create_async()
            .await
    }

    #[tokio::test]
    async fn skips_empty_comments_end_to_end() {
        let mut forum = mockito::Server::new_async().await;
        let mut gateway = mockito::Server::new_async().await;
        let _forum_mocks = mock_forum(
            &mut forum,
            vec![comment("c1", "great point", vec![]), comment("c2", "", vec![])],
        )
        .await;
        // One call for the post, one for "great point".
        let summaries = mock_summaries(&mut gateway, 200, 2).await;
        let relevance = mock_relevance(&mut gateway, 200, 1).await;

        let analyzer = Analyzer::new(Arc::new(config_for(&forum.url(), &gateway.url())));
        let record = analyzer
            .process(THREAD_URL, 2, "openai/gpt-4o", "openai/gpt-4o")
            .await
            .expect("analysis should succeed");

        assert_eq!(record.submission_id, "abc123");
        assert_eq!(record.comments.len(), 1);
        let only = &record.comments[0];
        assert_eq!(only.id, "c1");
        assert_eq!(only.body, "great point");
        assert_eq!(only.summary, Summary::Text("A short summary.".to_string()));
        assert_eq!(only.relevance.verdict, Verdict::Yes);
        assert_eq!(only.relevance.reasoning, "Recommends an editor.");
        assert!(record.post_summary.is_text());

        summaries.assert_async().await;
        relevance.assert_async().await;
    }

    #[tokio::test]
    async fn keeps_fetch_order_and_respects_limit() {
        let mut forum = mockito::Server::new_async().await;
        let mut gateway = mockito::Server::new_async().await;
        let _forum_mocks = mock_forum(
            &mut forum,
            vec![
                comment("c1", "first comment body", vec![]),
                comment("c2", "second comment body", vec![]),
                comment("c3", "third comment body", vec![]),
            ],
        )
        .await;
        // Post plus two comments; the third is cut by the limit.
        let summaries = mock_summaries(&mut gateway, 200, 3).await;
        let relevance = mock_relevance(&mut gateway, 200, 2).await;

        let analyzer = Analyzer::new(Arc::new(config_for(&forum.url(), &gateway.url())));
        let record = analyzer.process_default(THREAD_URL, 2).await.unwrap();
        summaries.assert_async().await;
        relevance.assert_async().await;

        let ids: Vec<&str> = record.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(record.summary_model, "google/gemini-2.5-pro-preview");
    }

    #[tokio::test]
    async fn per_comment_failures_are_recorded_not_fatal() {
        let mut forum = mockito::Server::new_async().await;
        let mut gateway = mockito::Server::new_async().await;
        let _forum_mocks = mock_forum(
            &mut forum,
            vec![
                comment("c1", "first comment body", vec![]),
                comment("c2", "ok", vec![]),
            ],
        )
        .await;
        // "ok" is below the summary threshold, so only the post and c1 are summarized.
        let summaries = mock_summaries(&mut gateway, 503, 2).await;
        let relevance = mock_relevance(&mut gateway, 503, 2).await;

        let analyzer = Analyzer::new(Arc::new(config_for(&forum.url(), &gateway.url())));
        let record = analyzer
            .process(THREAD_URL, 5, "openai/gpt-4o", "openai/gpt-4o")
            .await
            .unwrap();

        assert_eq!(record.comments.len(), 2);
        assert_eq!(record.comments[0].summary, Summary::Unavailable);
        assert_eq!(record.comments[0].relevance.verdict, Verdict::Unknown);
        assert_eq!(record.comments[1].summary, Summary::TooShort);
        assert_eq!(record.post_summary, Summary::Unavailable);
        summaries.assert_async().await;
        relevance.assert_async().await;
    }

    #[tokio::test]
    async fn missing_forum_credential_fails_before_any_request() {
        for missing in ["id", "secret", "agent"] {
            let mut forum = mockito::Server::new_async().await;
            let mut gateway = mockito::Server::new_async().await;
            let token = forum
                .mock("POST", "/api/v1/access_token")
                .expect(0)
                .create_async()
                .await;
            let completions = gateway
                .mock("POST", "/chat/completions")
                .expect(0)
                .create_async()
                .await;

            let mut config = config_for(&forum.url(), &gateway.url());
            match missing {
                "id" => config.forum.client_id = None,
                "secret" => config.forum.client_secret = None,
                _ => config.forum.user_agent = None,
            }

            let analyzer = Analyzer::new(Arc::new(config));
            let err = analyzer.process_default(THREAD_URL, 2).await.unwrap_err();

            assert!(matches!(err, AppError::MissingCredentials(_)), "{missing}: {err}");
            token.assert_async().await;
            completions.assert_async().await;
        }
    }

    #[tokio::test]
    async fn missing_llm_key_fails_before_any_request() {
        let mut forum = mockito::Server::new_async().await;
        let token = forum
            .mock("POST", "/api/v1/access_token")
            .expect(0)
            .create_async()
            .await;

        let mut config = config_for(&forum.url(), "http://127.0.0.1:9");
        config.llm.api_key = None;

        let err = Analyzer::new(Arc::new(config))
            .process_default(THREAD_URL, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingCredentials(_)));
        token.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let config = config_for("http://127.0.0.1:9", "http://127.0.0.1:9");
        let err = Analyzer::new(Arc::new(config))
            .process_default("https://www.reddit.com/r/test/", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_request() {
        let mut forum = mockito::Server::new_async().await;
        let mut gateway = mockito::Server::new_async().await;
        let _token = forum
            .mock("POST", "/api/v1/access_token")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        let _listing = forum
            .mock("GET", "/comments/abc123")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let completions = gateway
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let analyzer = Analyzer::new(Arc::new(config_for(&forum.url(), &gateway.url())));
        let err = analyzer.process_default(THREAD_URL, 2).await.unwrap_err();

        assert!(matches!(err, AppError::FetchFailure(_)));
        completions.assert_async().await;
    }
}
