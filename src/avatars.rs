use anyhow::{Context, Result};
use eframe::egui;
use egui::{ColorImage, TextureHandle, TextureOptions};
use image::GenericImageView;
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

const AVATAR_SIZE: u32 = 64;

enum Slot {
    Pending,
    Ready(TextureHandle),
    Failed,
}

/// Downloads profile images in the background and keeps them as textures.
/// Each URL is fetched at most once per run; failures are remembered.
pub struct AvatarCache {
    client: reqwest::Client,
    runtime: Handle,
    slots: HashMap<String, Slot>,
    sender: mpsc::Sender<(String, Result<ColorImage>)>,
    receiver: mpsc::Receiver<(String, Result<ColorImage>)>,
}

impl AvatarCache {
    pub fn new(runtime: Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build avatar HTTP client")?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            client,
            runtime,
            slots: HashMap::new(),
            sender,
            receiver,
        })
    }

    /// Returns the texture if it's ready, otherwise starts (or keeps waiting
    /// for) the download and returns `None`.
    pub fn get(&mut self, ctx: &egui::Context, url: &str) -> Option<TextureHandle> {
        match self.slots.get(url) {
            Some(Slot::Ready(texture)) => return Some(texture.clone()),
            Some(Slot::Pending) | Some(Slot::Failed) => return None,
            None => {}
        }

        self.slots.insert(url.to_string(), Slot::Pending);
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let result = download(&client, &url).await;
            let _ = sender.send((url, result));
            ctx.request_repaint();
        });
        None
    }

    /// Turns finished downloads into textures. Call once per frame.
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((url, result)) = self.receiver.try_recv() {
            let slot = match result {
                Ok(image) => {
                    debug!("Loaded avatar {}", url);
                    Slot::Ready(ctx.load_texture(&url, image, TextureOptions::LINEAR))
                }
                Err(e) => {
                    warn!("Failed to load avatar {}: {:#}", url, e);
                    Slot::Failed
                }
            };
            self.slots.insert(url, slot);
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<ColorImage> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    tokio::task::spawn_blocking(move || decode_avatar(&bytes)).await?
}

/// Decodes an avatar, shrinking it to fit a 64px square.
pub fn decode_avatar(bytes: &[u8]) -> Result<ColorImage> {
    let image = image::load_from_memory(bytes).context("Unsupported avatar image")?;
    let (width, height) = image.dimensions();
    let image = if width > AVATAR_SIZE || height > AVATAR_SIZE {
        image.thumbnail(AVATAR_SIZE, AVATAR_SIZE)
    } else {
        image
    };
    let thumbnail = image.into_rgba8();
    let (width, height) = thumbnail.dimensions();
    Ok(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        thumbnail.as_raw(),
    ))
}
