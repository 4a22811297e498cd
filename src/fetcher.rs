use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

static TEXTAREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<textarea\b[^>]*\bid\s*=\s*["']?wpTextbox1["']?[^>]*>(.*?)</textarea>"#)
        .unwrap()
});

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {title} failed: {source}")]
    Http {
        title: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{title} returned HTTP {status}")]
    Status { title: String, status: StatusCode },
    #[error("no wikitext textarea on the edit page for {title}")]
    MissingContent { title: String },
}

/// Source of raw wiki markup, keyed by page title.
pub trait PageFetcher {
    fn fetch(&self, title: &str) -> Result<String, FetchError>;
}

/// Reads page source from the wiki's `action=edit` form. No retries.
pub struct WikiClient {
    client: Client,
    endpoint: String,
}

impl WikiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(WikiClient {
            client,
            endpoint: format!("{}/w/index.php", settings.base_url.trim_end_matches('/')),
        })
    }
}

impl PageFetcher for WikiClient {
    fn fetch(&self, title: &str) -> Result<String, FetchError> {
        debug!("Fetching {} from {}", title, self.endpoint);
        let http = |source| FetchError::Http {
            title: title.to_string(),
            source,
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("title", title), ("action", "edit")])
            .send()
            .map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                title: title.to_string(),
                status,
            });
        }

        let html = response.text().map_err(http)?;
        extract_textarea(&html).ok_or_else(|| FetchError::MissingContent {
            title: title.to_string(),
        })
    }
}

/// Wikitext held in the edit form's `wpTextbox1` textarea, entities decoded.
pub fn extract_textarea(html: &str) -> Option<String> {
    let caps = TEXTAREA_RE.captures(html)?;
    let raw = caps.get(1).map_or("", |m| m.as_str());
    // Browsers drop one newline right after <textarea>.
    let raw = raw.strip_prefix('\n').unwrap_or(raw);
    Some(html_escape::decode_html_entities(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_page_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/edit_page.html").unwrap();
        let markup = extract_textarea(&html).unwrap();
        assert!(markup.starts_with("{{Infobox_quest\n"));
        assert!(markup.contains("|next = [[Trash Into Treasure]]"));
        // One level of escaping is undone; wiki-level entities survive.
        assert!(markup.contains("Salt &amp; Pepper <br>"));
    }

    #[test]
    fn missing_textarea() {
        assert!(extract_textarea("<html><body><p>Login required</p></body></html>").is_none());
        assert!(extract_textarea("<textarea id=\"other\">x</textarea>").is_none());
    }

    #[test]
    fn empty_textarea_is_some_empty() {
        assert_eq!(
            extract_textarea("<textarea name=\"wpTextbox1\" id=\"wpTextbox1\"></textarea>").as_deref(),
            Some("")
        );
    }

    #[test]
    fn status_error_message() {
        let err = FetchError::Status {
            title: "Clearer_Skies".into(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "Clearer_Skies returned HTTP 404 Not Found");
    }

    #[test]
    fn endpoint_from_settings() {
        let settings = Settings {
            base_url: "https://wiki.example.org/".into(),
            ..Settings::default()
        };
        let client = WikiClient::new(&settings).unwrap();
        assert_eq!(client.endpoint, "https://wiki.example.org/w/index.php");
    }
}
