//! Page encoding: `DynamicImage` → base64 PNG.
//!
//! PNG keeps digits and thin table rules crisp; JPEG artefacts around small
//! price figures are a common source of misread numbers.

use crate::model::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as base64 PNG. `index` is the 0-based page index.
pub fn encode_page(index: usize, img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let png_base64 = STANDARD.encode(&buf);
    debug!(
        "Page {}: {} PNG bytes → {} base64 chars",
        index + 1,
        buf.len(),
        png_base64.len()
    );

    Ok(PageImage { index, png_base64 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encodes_valid_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let page = encode_page(3, &img).expect("encode should succeed");
        assert_eq!(page.index, 3);

        let decoded = STANDARD.decode(&page.png_base64).expect("valid base64");
        assert_eq!(&decoded[..8], b"\x89PNG\r\n\x1a\n");

        let round = image::load_from_memory(&decoded).expect("decodable PNG");
        assert_eq!((round.width(), round.height()), (10, 10));
    }
}
