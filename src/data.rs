use std::sync::Arc;

use crate::apod::{self, FetchError};
use crate::media::MediaEntry;

pub trait MediaService: Send + Sync {
    fn load_media(&self) -> Result<Vec<MediaEntry>, FetchError>;

    fn describe(&self) -> String;
}

pub struct ApodMediaService {
    client: Arc<apod::Client>,
}

impl ApodMediaService {
    pub fn new(client: Arc<apod::Client>) -> Self {
        Self { client }
    }
}

impl MediaService for ApodMediaService {
    fn load_media(&self) -> Result<Vec<MediaEntry>, FetchError> {
        self.client.load_media()
    }

    fn describe(&self) -> String {
        self.client.source_url().to_string()
    }
}

pub struct StaticMediaService {
    body: String,
}

impl StaticMediaService {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_BODY)
    }
}

impl Default for StaticMediaService {
    fn default() -> Self {
        Self::demo()
    }
}

impl MediaService for StaticMediaService {
    fn load_media(&self) -> Result<Vec<MediaEntry>, FetchError> {
        apod::parse_media_body(&self.body)
    }

    fn describe(&self) -> String {
        "built-in demo set".to_string()
    }
}

const DEMO_BODY: &str = r#"[
  {
    "date": "2023-07-12",
    "title": "The Pillars of Creation",
    "media_type": "image",
    "url": "https://apod.nasa.gov/apod/image/2210/pillars_jwst_960.jpg",
    "hdurl": "https://apod.nasa.gov/apod/image/2210/pillars_jwst.jpg",
    "explanation": "Columns of cold gas and dust in the Eagle Nebula, seen in near-infrared light."
  },
  {
    "date": "2023-07-13",
    "title": "Total Solar Eclipse Timelapse",
    "media_type": "video",
    "url": "https://www.youtube.com/embed/tGxe_lKxXgM?rel=0",
    "thumbnail_url": "https://img.youtube.com/vi/tGxe_lKxXgM/0.jpg",
    "explanation": "The shadow of the Moon sweeps across the landscape during totality."
  },
  {
    "date": "2023-07-14",
    "title": "Saturn in Infrared",
    "media_type": "image",
    "url": "https://apod.nasa.gov/apod/image/2307/Saturn_Webb_960.jpg",
    "hdurl": "https://apod.nasa.gov/apod/image/2307/Saturn_Webb.jpg"
  },
  {
    "date": "2023-07-15",
    "title": "Aurora over Iceland",
    "media_type": "video",
    "url": "https://vimeo.com/123456789",
    "thumbnail_url": "https://apod.nasa.gov/apod/image/2307/aurora_thumb.jpg",
    "explanation": "Curtains of green light ripple above a frozen lagoon."
  },
  {
    "date": "2023-07-16",
    "title": "Interactive Sky Map",
    "media_type": "other",
    "url": "https://apod.nasa.gov/apod/ap230716.html"
  }
]"#;
