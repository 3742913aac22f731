use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::media::{MediaEntry, MediaKind};

pub const DEFAULT_SOURCE_URL: &str =
    "https://api.nasa.gov/planetary/apod?api_key=DEMO_KEY&count=24&thumbs=true";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("response is not valid JSON: {0}")]
    Parse(String),
    #[error("response is not a JSON array")]
    Format,
    #[error("no displayable media entries")]
    Empty,
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Network(_) | FetchError::Parse(_) => {
                "Could not load media. Check your connection and try again."
            }
            FetchError::Format => "Received an unexpected data format from the server.",
            FetchError::Empty => "No media entries found.",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub source_url: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    source_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("apod client user agent required");
        }
        if config.source_url.trim().is_empty() {
            bail!("apod client source url required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            source_url: config.source_url,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn load_media(&self) -> Result<Vec<MediaEntry>, FetchError> {
        let response = self
            .http
            .get(&self.source_url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("unexpected status {status}")));
        }

        let body = response
            .text()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        parse_media_body(&body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WireEntry {
    #[serde(deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    media_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    hdurl: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    thumbnail_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    explanation: Option<String>,
}

// Scalars become their text form; arrays, objects and null count as missing.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

impl WireEntry {
    fn into_entry(self) -> Option<MediaEntry> {
        let kind = MediaKind::parse(self.media_type.as_deref().unwrap_or_default())?;
        let entry = MediaEntry {
            kind,
            date: self.date.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            hdurl: self.hdurl.unwrap_or_default(),
            thumbnail_url: self.thumbnail_url.unwrap_or_default(),
            explanation: self.explanation.unwrap_or_default(),
        };
        entry.has_visual().then_some(entry)
    }
}

pub fn parse_media_body(body: &str) -> Result<Vec<MediaEntry>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| FetchError::Parse(err.to_string()))?;
    let Value::Array(items) = value else {
        return Err(FetchError::Format);
    };

    let entries: Vec<MediaEntry> = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<WireEntry>(item).ok())
        .filter_map(WireEntry::into_entry)
        .collect();

    if entries.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_media_body("[{\"title\":"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(parse_media_body("{}"), Err(FetchError::Format)));
        assert!(matches!(parse_media_body("\"text\""), Err(FetchError::Format)));
    }

    #[test]
    fn empty_array_is_empty_result() {
        assert!(matches!(parse_media_body("[]"), Err(FetchError::Empty)));
    }

    #[test]
    fn filters_unknown_types_and_missing_visuals() {
        let body = r#"[
            {"title": "Keep", "media_type": "IMAGE", "url": "https://a/1.jpg"},
            {"title": "Audio", "media_type": "audio", "url": "https://a/2.mp3"},
            {"title": "No visual", "media_type": "video", "url": ""},
            {"title": "Thumb only", "media_type": "Video", "thumbnail_url": "https://a/t.jpg"},
            {"title": "Untyped", "url": "https://a/3.jpg"},
            42,
            "string"
        ]"#;
        let entries = parse_media_body(body).unwrap();
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Keep", "Thumb only"]);
        assert_eq!(entries[0].kind, MediaKind::Image);
        assert_eq!(entries[1].kind, MediaKind::Video);
    }

    #[test]
    fn only_filtered_out_entries_is_empty_result() {
        let body = r#"[{"media_type": "other", "url": "https://a/1"}]"#;
        assert!(matches!(parse_media_body(body), Err(FetchError::Empty)));
    }

    #[test]
    fn maps_snake_case_wire_fields() {
        let body = r#"[{
            "date": "2024-03-01",
            "title": "Moon",
            "media_type": "image",
            "url": "https://a/moon.jpg",
            "hdurl": "https://a/moon_hd.jpg",
            "thumbnail_url": "https://a/moon_t.jpg",
            "explanation": "Craters."
        }]"#;
        let entry = parse_media_body(body).unwrap().remove(0);
        assert_eq!(entry.date, "2024-03-01");
        assert_eq!(entry.hdurl, "https://a/moon_hd.jpg");
        assert_eq!(entry.thumbnail_url, "https://a/moon_t.jpg");
        assert_eq!(entry.explanation, "Craters.");
    }

    #[test]
    fn null_fields_are_treated_as_missing() {
        let body = r#"[{"media_type": "image", "url": "https://a/1.jpg", "title": null}]"#;
        let entry = parse_media_body(body).unwrap().remove(0);
        assert_eq!(entry.display_title(), "Untitled");
    }

    #[test]
    fn non_string_metadata_keeps_entry() {
        let body = r#"[
            {"media_type": "image", "url": "https://a/1.jpg", "title": 42, "date": 20240101},
            {"media_type": "video", "thumbnail_url": "https://a/t.jpg", "explanation": ["x"]},
            {"media_type": 7, "url": "https://a/2.jpg"},
            {"media_type": "image", "url": {"href": "https://a/3.jpg"}}
        ]"#;
        let entries = parse_media_body(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "42");
        assert_eq!(entries[0].date, "20240101");
        assert_eq!(entries[0].url, "https://a/1.jpg");
        assert_eq!(entries[1].display_explanation(), "No explanation available.");
    }

    #[test]
    fn error_messages_are_distinct() {
        let generic = FetchError::Network("boom".into()).user_message();
        assert_eq!(FetchError::Parse("x".into()).user_message(), generic);
        assert_ne!(FetchError::Format.user_message(), generic);
        assert_eq!(FetchError::Empty.user_message(), "No media entries found.");
    }

    #[test]
    fn client_requires_user_agent() {
        let result = Client::new(ClientConfig {
            source_url: DEFAULT_SOURCE_URL.into(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
