use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::shared::constants::SNAPSHOT_MIME;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("not a base64 data URL")]
    Malformed,
    #[error("unsupported media type: {0}")]
    UnsupportedMime(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame buffer does not match its dimensions")]
    InvalidRaster,
}

/// Encodes a frame losslessly as PNG bytes.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, DataUrlError> {
    let image: RgbImage = frame.to_rgb_image().ok_or(DataUrlError::InvalidRaster)?;
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// `data:image/png;base64,...` for the given frame.
pub fn to_png_data_url(frame: &Frame) -> Result<String, DataUrlError> {
    let png = encode_png(frame)?;
    Ok(format!("data:{SNAPSHOT_MIME};base64,{}", BASE64.encode(png)))
}

/// Decodes a PNG data URL produced by [`to_png_data_url`] back into a frame.
pub fn from_png_data_url(url: &str) -> Result<Frame, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::Malformed)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::Malformed)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::Malformed)?;
    if mime != SNAPSHOT_MIME {
        return Err(DataUrlError::UnsupportedMime(mime.to_string()));
    }

    let bytes = BASE64.decode(payload)?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?.to_rgb8();
    Ok(Frame::from_rgb_image(image, 0))
}
