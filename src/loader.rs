use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use image::RgbImage;
use tracing::{debug, warn};

use crate::apod::FetchError;
use crate::data::MediaService;
use crate::media::MediaEntry;

pub enum AsyncResponse {
    Media {
        request_id: u64,
        result: Result<Vec<MediaEntry>, FetchError>,
    },
    Preview {
        url: String,
        result: anyhow::Result<RgbImage>,
    },
}

// Sends a network failure on drop if the worker never completed.
pub struct CompletionGuard {
    request_id: u64,
    tx: Option<Sender<AsyncResponse>>,
}

impl CompletionGuard {
    pub fn new(request_id: u64, tx: Sender<AsyncResponse>) -> Self {
        Self {
            request_id,
            tx: Some(tx),
        }
    }

    pub fn complete(mut self, result: Result<Vec<MediaEntry>, FetchError>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(AsyncResponse::Media {
                request_id: self.request_id,
                result,
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(request_id = self.request_id, "media loader exited without a result");
            let _ = tx.send(AsyncResponse::Media {
                request_id: self.request_id,
                result: Err(FetchError::Network(
                    "media loader stopped before reporting".to_string(),
                )),
            });
        }
    }
}

pub fn spawn_media_load(
    service: Arc<dyn MediaService>,
    request_id: u64,
    tx: Sender<AsyncResponse>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let guard = CompletionGuard::new(request_id, tx);
        debug!(request_id, source = %service.describe(), "loading media");
        let result = service.load_media();
        guard.complete(result);
    })
}
