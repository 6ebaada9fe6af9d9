use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::Result;

pub const THUMBNAIL_SIZE: u32 = 64;

/// Downscales to fit within `THUMBNAIL_SIZE` on both sides, keeping the
/// aspect ratio. Smaller images are returned unchanged.
pub fn render_thumbnail(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= THUMBNAIL_SIZE && height <= THUMBNAIL_SIZE {
        return image.clone();
    }
    image.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
}

/// Decodes `bytes`, renders the thumbnail and encodes it as `format`.
pub fn encode_thumbnail(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
    let source = image::load_from_memory(bytes)?;
    let thumb = render_thumbnail(&source);
    // JPEG has no alpha channel.
    let thumb = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumb.to_rgb8()),
        _ => thumb,
    };

    let mut out = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut out), format)?;
    Ok(out)
}
