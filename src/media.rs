use url::Url;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DATE: &str = "Unknown date";
pub const DEFAULT_EXPLANATION: &str = "No explanation available.";
pub const VIDEO_GLYPH: &str = "▶";
const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("image") {
            Some(MediaKind::Image)
        } else if trimmed.eq_ignore_ascii_case("video") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub kind: MediaKind,
    pub date: String,
    pub title: String,
    pub url: String,
    pub hdurl: String,
    pub thumbnail_url: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailMedia {
    Player {
        video_id: String,
        embed_url: String,
        watch_url: String,
    },
    Still {
        source: String,
        link: Option<String>,
    },
}

impl MediaEntry {
    pub fn has_visual(&self) -> bool {
        [&self.url, &self.hdurl, &self.thumbnail_url]
            .iter()
            .any(|value| !value.trim().is_empty())
    }

    pub fn display_title(&self) -> &str {
        non_empty(&self.title).unwrap_or(DEFAULT_TITLE)
    }

    pub fn display_date(&self) -> &str {
        non_empty(&self.date).unwrap_or(DEFAULT_DATE)
    }

    pub fn display_explanation(&self) -> &str {
        non_empty(&self.explanation).unwrap_or(DEFAULT_EXPLANATION)
    }

    pub fn card_source(&self) -> &str {
        let candidates = match self.kind {
            MediaKind::Video => [&self.thumbnail_url, &self.url],
            MediaKind::Image => [&self.url, &self.hdurl],
        };
        candidates
            .into_iter()
            .find_map(|value| non_empty(value))
            .unwrap_or("")
    }

    pub fn caption(&self) -> String {
        let base = format!("{} ({})", self.display_title(), self.display_date());
        match self.kind {
            MediaKind::Video => format!("{VIDEO_GLYPH} {base}"),
            MediaKind::Image => base,
        }
    }

    pub fn detail_media(&self) -> DetailMedia {
        match self.kind {
            MediaKind::Image => DetailMedia::Still {
                source: non_empty(&self.hdurl)
                    .or_else(|| non_empty(&self.url))
                    .unwrap_or("")
                    .to_string(),
                link: None,
            },
            MediaKind::Video => match youtube_id(&self.url) {
                Some(video_id) => DetailMedia::Player {
                    embed_url: format!("{YOUTUBE_EMBED_BASE}/{video_id}"),
                    watch_url: with_scheme(self.url.trim()),
                    video_id,
                },
                None => DetailMedia::Still {
                    source: self.card_source().to_string(),
                    link: non_empty(&self.url).map(str::to_string),
                },
            },
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn youtube_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(&with_scheme(raw.trim())).ok()?;
    let host = parsed
        .host_str()?
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => parsed.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = parsed.path_segments()?;
            match segments.next() {
                Some("watch") => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    valid.then_some(candidate)
}

fn with_scheme(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{rest}")
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

#[cfg(test)]
pub(crate) fn sample(kind: MediaKind, title: &str) -> MediaEntry {
    MediaEntry {
        kind,
        date: "2024-01-01".into(),
        title: title.into(),
        url: format!("https://apod.example/{title}.jpg"),
        hdurl: String::new(),
        thumbnail_url: String::new(),
        explanation: format!("About {title}"),
    }
}
