use dom_smoothie::{Config as ReadabilityConfig, Readability};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use crate::error::{AppError, Result};

/// Character budget for the text handed to the model. Longer pages are
/// truncated to this prefix before prompt assembly.
pub const MAX_CONTENT_CHARS: usize = 20_000;

const USER_AGENT: &str = "LinkDashboard/1.0 (+https://github.com/raiyanmehraj/link-dashboard)";

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

// Create static selectors to avoid recompiling them each time
static META_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("Failed to parse meta description selector")
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});

/// Readable content pulled out of a page, ready for summarization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub excerpt: String,
    pub body: String,
}

impl ExtractedContent {
    /// Title, excerpt and body joined the way they are presented to the
    /// model; empty parts are skipped.
    pub fn combined_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.excerpt.len() + self.body.len() + 4,
        );
        if !self.title.is_empty() {
            text.push_str(&self.title);
            text.push_str("\n\n");
        }
        if !self.excerpt.is_empty() {
            text.push_str(&self.excerpt);
            text.push_str("\n\n");
        }
        text.push_str(&self.body);
        text
    }
}

/// Fetches the HTML for `url`, following redirects. Any transport error
/// or non-success status is reported as `FetchBlocked`; the pipeline
/// never summarizes partial or absent content.
pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT
        .get(url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "text/html,application/xhtml+xml")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| AppError::FetchBlocked(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::FetchBlocked(format!(
            "Failed to fetch {}: {}",
            url,
            status.as_u16()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| AppError::FetchBlocked(e.to_string()))
}

/// Runs readability extraction on the page. Returns None when no
/// article body can be identified.
pub fn extract_content(html: &str, url: &str) -> Option<ExtractedContent> {
    let cfg = ReadabilityConfig {
        max_elements_to_parse: 9000,
        ..Default::default()
    };

    let mut readability = Readability::new(html, Some(url), Some(cfg)).ok()?;
    let article = readability.parse().ok()?;

    Some(ExtractedContent {
        title: article.title.to_string(),
        excerpt: article.excerpt.clone().unwrap_or_default(),
        body: article.text_content.to_string(),
    })
}

/// Fallback when readability finds no article: the meta description
/// stands in for both excerpt and body, the `<title>` element for the
/// title.
fn meta_fallback(html: &str) -> ExtractedContent {
    let document = Html::parse_document(html);

    let description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or("")
        .trim()
        .to_string();

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();

    ExtractedContent {
        title,
        excerpt: description.clone(),
        body: description,
    }
}

/// Readability extraction with the meta-description fallback. Fails
/// with `NoContent` when both passes come up empty, so the model is
/// never called with nothing to work from.
pub fn extract_or_fallback(html: &str, url: &str) -> Result<ExtractedContent> {
    let extracted = extract_content(html, url)
        .filter(|c| !c.body.trim().is_empty())
        .unwrap_or_else(|| {
            debug!(url, "readability found no article, using meta fallback");
            meta_fallback(html)
        });

    if extracted.body.trim().is_empty() && extracted.excerpt.trim().is_empty() {
        return Err(AppError::NoContent);
    }

    Ok(extracted)
}

/// Char-boundary-safe prefix of at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
