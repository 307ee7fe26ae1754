use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Default file name offered in the save dialog.
pub const EXPORT_FILE_NAME: &str = "inkpink-flash.png";

/// Ask the user where to save the exported board. Returns `None` when the
/// dialog is cancelled.
pub fn prompt_export_path() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Save flash")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("PNG Image", &["png"])
        .save_file()
}

/// Encode the composed board raster as a PNG at `path`.
pub fn save_png(path: &PathBuf, raster: &RgbaImage) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("Failed to create file: {}", e))?;
    let writer = BufWriter::new(file);
    PngEncoder::new(writer)
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ColorType::Rgba8,
        )
        .map_err(|e| format!("PNG encode error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn exported_png_decodes_back_to_the_same_raster() {
        let mut raster = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        raster.put_pixel(2, 3, Rgba([0xed, 0x00, 0xb2, 255]));

        let dir = std::env::temp_dir();
        let path = dir.join(format!("inkpink-io-test-{}.png", std::process::id()));
        save_png(&path, &raster).unwrap();

        let decoded = image::open(&path).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(*decoded.get_pixel(2, 3), Rgba([0xed, 0x00, 0xb2, 255]));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([255, 255, 255, 255]));

        let _ = std::fs::remove_file(&path);
    }
}
