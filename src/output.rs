//! Frame output.
//!
//! Develop accumulates linear f32 color and hands finished frames here for
//! conversion to 24-bit TGA. The film is linear and already exposure
//! scaled, so the only conversion is a clamp to [0, 1] and an 8-bit
//! quantization; no gamma curve is applied.

use image::{ImageBuffer, Rgb};
use log::debug;
use std::io;
use std::path::Path;

/// Save a linear f32 frame as an uncompressed 24-bit TGA.
pub fn save_image_as_tga(
    image: &ImageBuffer<Rgb<f32>, Vec<f32>>,
    path: &Path,
) -> io::Result<()> {
    let (width, height) = image.dimensions();
    let quantized: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y);
        Rgb([
            (pixel[0].clamp(0.0, 1.0) * 255.0) as u8,
            (pixel[1].clamp(0.0, 1.0) * 255.0) as u8,
            (pixel[2].clamp(0.0, 1.0) * 255.0) as u8,
        ])
    });

    quantized.save(path).map_err(io::Error::other)?;
    debug!("Frame saved as {}", path.display());
    Ok(())
}
