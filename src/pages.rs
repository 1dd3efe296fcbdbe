//! Server-rendered HTML for the form and the report.

use std::fmt::Write;

use crate::relevance::Verdict;
use crate::report::{Summary, ThreadRecord};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1a1a1b; }
form { display: grid; gap: .75rem; max-width: 640px; }
input { padding: .5rem; font-size: 1rem; }
button { padding: .6rem 1.2rem; font-size: 1rem; cursor: pointer; }
.flash { background: #fdecea; border: 1px solid #f5c2c0; padding: .75rem; border-radius: 4px; }
.post { background: #f6f7f8; padding: 1rem; border-radius: 6px; white-space: pre-wrap; }
.comment { border-top: 1px solid #ddd; padding: 1rem 0; }
.meta { color: #666; font-size: .85rem; }
.badge { display: inline-block; padding: .1rem .5rem; border-radius: 10px; font-size: .8rem; font-weight: 600; }
.badge.yes { background: #d4edda; } .badge.somewhat { background: #fff3cd; }
.badge.no { background: #f8d7da; } .badge.unknown { background: #e2e3e5; }
.marker { color: #888; font-style: italic; }
"#;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

pub fn render_index(error: Option<&str>, url: &str, limit: usize, max_limit: usize) -> String {
    let mut body = String::from("<h1>Reddit Thread Analyzer</h1>\n");
    if let Some(message) = error {
        let _ = writeln!(body, "<div class=\"flash\">{}</div>", escape_html(message));
    }
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/\">\n\
         <label for=\"reddit_url\">Thread URL</label>\n\
         <input type=\"url\" id=\"reddit_url\" name=\"reddit_url\" value=\"{}\" \
         placeholder=\"https://www.reddit.com/r/.../comments/...\" required>\n\
         <label for=\"comment_limit\">Comments to analyze (1-{})</label>\n\
         <input type=\"number\" id=\"comment_limit\" name=\"comment_limit\" min=\"1\" max=\"{}\" value=\"{}\">\n\
         <button type=\"submit\">Analyze</button>\n\
         </form>",
        escape_html(url),
        max_limit,
        max_limit,
        limit
    );
    layout("Reddit Thread Analyzer", &body)
}

fn summary_html(summary: &Summary) -> String {
    match summary {
        Summary::Text(text) => escape_html(text),
        other => format!("<span class=\"marker\">{}</span>", escape_html(other.as_str())),
    }
}

fn verdict_badge(verdict: Verdict) -> String {
    format!(
        "<span class=\"badge {0}\">{0}</span>",
        verdict.as_str()
    )
}

pub fn render_results(record: &ThreadRecord) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<p><a href=\"/\">&larr; Analyze another thread</a></p>\n<h1>{}</h1>",
        escape_html(&record.title)
    );
    let _ = writeln!(
        body,
        "<p class=\"meta\">r/{} &middot; u/{} &middot; score {} &middot; <a href=\"{}\">original thread</a></p>",
        escape_html(&record.subreddit),
        escape_html(&record.author),
        record.score,
        escape_html(&record.url)
    );
    if !record.post_text.trim().is_empty() {
        let _ = writeln!(body, "<div class=\"post\">{}</div>", escape_html(&record.post_text));
    }
    let _ = writeln!(
        body,
        "<h2>Post summary</h2>\n<p>{}</p>",
        summary_html(&record.post_summary)
    );
    let _ = writeln!(
        body,
        "<h2>Comments ({} analyzed, {} relevant)</h2>",
        record.comments.len(),
        record.relevant_count()
    );

    if record.comments.is_empty() {
        body.push_str("<p class=\"marker\">No comments with text were found.</p>\n");
    }

    for comment in &record.comments {
        let _ = writeln!(
            body,
            "<div class=\"comment\">\n\
             <div class=\"meta\">u/{} &middot; score {} &middot; {}</div>\n\
             <p>{}</p>\n\
             <p><strong>Summary:</strong> {}</p>\n\
             <p><strong>Reasoning:</strong> {}</p>\n\
             </div>",
            escape_html(&comment.author),
            comment.score,
            verdict_badge(comment.relevance.verdict),
            escape_html(&comment.body),
            summary_html(&comment.summary),
            escape_html(&comment.relevance.reasoning)
        );
    }

    let _ = writeln!(
        body,
        "<p class=\"meta\">Models: {} (summary), {} (relevance). Analyzed {}.</p>",
        escape_html(&record.summary_model),
        escape_html(&record.relevance_model),
        record.analyzed_at.format("%Y-%m-%d %H:%M UTC")
    );

    layout(&format!("{} - analysis", record.title), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relevance::Relevance;
    use crate::report::CommentRecord;
    use chrono::Utc;

    fn record() -> ThreadRecord {
        ThreadRecord {
            url: "https://www.reddit.com/r/test/comments/abc123/title/".into(),
            submission_id: "abc123".into(),
            subreddit: "test".into(),
            title: "Tabs <or> spaces?".into(),
            post_text: "Settle it.".into(),
            score: 7,
            author: "op".into(),
            permalink: "/r/test/comments/abc123/title/".into(),
            created_at: None,
            post_summary: Summary::Text("Asks about indentation.".into()),
            summary_model: "m".into(),
            relevance_model: "m".into(),
            analyzed_at: Utc::now(),
            comments: vec![CommentRecord {
                id: "c1".into(),
                author: "someone".into(),
                score: 2,
                body: "<script>alert(1)</script>".into(),
                summary: Summary::TooShort,
                relevance: Relevance {
                    verdict: Verdict::Somewhat,
                    reasoning: "Loosely related.".into(),
                },
            }],
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn index_shows_flash_error() {
        let html = render_index(Some("Reddit URL is required."), "", 10, 50);
        assert!(html.contains("class=\"flash\">Reddit URL is required.</div>"));
        assert!(html.contains("name=\"comment_limit\""));
        assert!(html.contains("max=\"50\""));
    }

    #[test]
    fn results_escape_comment_text_and_show_markers() {
        let html = render_results(&record());
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Tabs &lt;or&gt; spaces?"));
        assert!(html.contains("Text too short to summarize"));
        assert!(html.contains("badge somewhat"));
        assert!(html.contains("1 analyzed, 0 relevant"));
    }
}
