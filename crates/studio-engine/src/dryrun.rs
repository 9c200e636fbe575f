use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use studio_contracts::images::ImageResource;

use crate::service::{GenerateContentRequest, GenerationService};

const DRYRUN_EDGE: u32 = 64;

/// Offline stand-in for the generation service: answers every request with
/// one solid-colour PNG whose colour is derived from the request's text and
/// input images, so identical requests give identical images.
#[derive(Debug, Clone, Default)]
pub struct DryrunService;

impl DryrunService {
    pub fn new() -> Self {
        Self
    }
}

impl GenerationService for DryrunService {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_content(&self, request: &GenerateContentRequest) -> Result<Value> {
        let (r, g, b) = color_for_request(request);
        let mut image = RgbImage::new(DRYRUN_EDGE, DRYRUN_EDGE);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .context("failed to encode dry-run image")?;
        let resource = ImageResource::from_bytes("image/png", bytes.get_ref());

        Ok(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": format!("dry-run render for {}", request.model)},
                        {"inlineData": {
                            "mimeType": resource.mime_type(),
                            "data": resource.base64_data(),
                        }},
                    ]
                },
                "finishReason": "STOP",
            }],
            "modelVersion": request.model,
        }))
    }
}

fn color_for_request(request: &GenerateContentRequest) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(request.model.as_bytes());
    hasher.update(request.prompt_text().as_bytes());
    for image in request.images() {
        hasher.update(image.base64_data().as_bytes());
    }
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}
