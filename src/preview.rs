use std::thread;

use anyhow::{bail, Context, Result};
use crossbeam_channel::Sender;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use reqwest::blocking::Client;
use tracing::debug;

use crate::loader::AsyncResponse;

const MAX_PREVIEW_PX: u32 = 512;
const HALF_BLOCK: &str = "▀";

pub fn spawn_preview(http: Client, url: String, tx: Sender<AsyncResponse>) {
    thread::spawn(move || {
        let result = fetch_preview(&http, &url);
        if let Err(err) = &result {
            debug!(%url, error = %err, "preview download failed");
        }
        let _ = tx.send(AsyncResponse::Preview { url, result });
    });
}

pub fn fetch_preview(http: &Client, url: &str) -> Result<RgbImage> {
    let response = http
        .get(url)
        .send()
        .with_context(|| format!("request preview {url}"))?;
    if !response.status().is_success() {
        bail!("preview request failed with status {}", response.status());
    }
    let bytes = response.bytes().context("read preview body")?;
    decode_preview(&bytes)
}

pub fn decode_preview(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes).context("decode preview image")?;
    if image.width() > MAX_PREVIEW_PX || image.height() > MAX_PREVIEW_PX {
        return Ok(image.thumbnail(MAX_PREVIEW_PX, MAX_PREVIEW_PX).to_rgb8());
    }
    Ok(image.to_rgb8())
}

pub fn half_block_lines(image: &RgbImage, max_cols: u16, max_rows: u16) -> Vec<Line<'static>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || max_cols == 0 || max_rows == 0 {
        return Vec::new();
    }

    let scale = (f64::from(max_cols) / f64::from(width))
        .min(f64::from(max_rows) * 2.0 / f64::from(height));
    let target_w = ((f64::from(width) * scale).floor() as u32).max(1);
    let target_h = ((f64::from(height) * scale).floor() as u32).max(1);
    let scaled = imageops::resize(image, target_w, target_h, FilterType::Triangle);

    (0..target_h)
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span<'static>> = (0..target_w)
                .map(|x| {
                    let top = scaled.get_pixel(x, y);
                    let mut style = Style::default().fg(Color::Rgb(top[0], top[1], top[2]));
                    if y + 1 < target_h {
                        let bottom = scaled.get_pixel(x, y + 1);
                        style = style.bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                    }
                    Span::styled(HALF_BLOCK, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}
