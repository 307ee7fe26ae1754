use eframe::egui;
use egui::{Color32, ColorImage, TextureFilter, TextureHandle, TextureOptions};
use image::{Rgba, RgbaImage, imageops};
use rayon::prelude::*;
use std::sync::mpsc;

use crate::grid::GRID_SIZE;
use crate::pixels::PixelStore;
use crate::{log_err, log_warn};

/// Side of one grid cell on the composed raster, in device pixels.
pub const CELL_PX: u32 = 16;
/// Side of the composed raster (and of the exported PNG).
pub const SURFACE_PX: u32 = GRID_SIZE * CELL_PX;

/// The flash template is traced over, not painted — keep it barely visible.
const TEMPLATE_OPACITY: f32 = 0.10;
/// Grid lines are a hint, not a frame.
const GRID_OPACITY: f32 = 0.05;

/// The fixed "flash" background template the artist traces over.
const TEMPLATE_BYTES: &[u8] = include_bytes!("../assets/flash_template.png");

// ============================================================================
// BOARD RENDERER — template + grid overlay + pixel layer, in that order
// ============================================================================

/// Composes the visible board raster and owns its GPU texture.
///
/// Static layers are cached: the grid overlay is pre-rendered once at
/// construction, and the template is decoded on a worker thread so a slow
/// decode can never stall input handling. Until the template arrives that
/// layer is simply skipped. If the renderer is dropped before the worker
/// finishes, the closed channel swallows the stale result.
pub struct BoardRenderer {
    grid_overlay: RgbaImage,
    template: Option<RgbaImage>,
    template_rx: Option<mpsc::Receiver<Result<RgbaImage, String>>>,
    texture: Option<TextureHandle>,
}

impl Default for BoardRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardRenderer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // Receiver may be gone by the time we finish — ignore send errors.
            let _ = tx.send(decode_template());
        });

        Self {
            grid_overlay: render_grid_overlay(),
            template: None,
            template_rx: Some(rx),
            texture: None,
        }
    }

    /// Check the worker channel for the decoded template. Returns `true`
    /// exactly once, when the template arrives, so the caller knows to
    /// re-compose.
    pub fn poll_template(&mut self) -> bool {
        let Some(rx) = &self.template_rx else {
            return false;
        };
        match rx.try_recv() {
            Ok(Ok(img)) => {
                self.template = Some(img);
                self.template_rx = None;
                true
            }
            Ok(Err(e)) => {
                // Template layer stays skipped for the whole session.
                log_err!("Flash template failed to load: {}", e);
                self.template_rx = None;
                false
            }
            Err(mpsc::TryRecvError::Empty) => false,
            Err(mpsc::TryRecvError::Disconnected) => {
                log_err!("Flash template loader thread died without a result");
                self.template_rx = None;
                false
            }
        }
    }

    pub fn template_loaded(&self) -> bool {
        self.template.is_some()
    }

    /// True while the worker thread has not reported back yet.
    pub fn template_pending(&self) -> bool {
        self.template_rx.is_some()
    }

    /// Compose the full board raster from the three layers.
    ///
    /// Runs on every pixel-store change; the static layers are pre-scaled so
    /// this is two alpha blends and one opaque rectangle per painted cell.
    pub fn compose(&self, store: &PixelStore) -> RgbaImage {
        // 1. Clear to the board background.
        let mut out = RgbaImage::from_pixel(SURFACE_PX, SURFACE_PX, Rgba([255, 255, 255, 255]));

        // 2. + 3. Template (when loaded) and grid overlay, both pre-faded.
        if let Some(template) = &self.template {
            blend_over(&mut out, template);
        }
        blend_over(&mut out, &self.grid_overlay);

        // 4. One opaque unit-cell rectangle per painted cell. A bad entry is
        //    logged and skipped; the rest of the board still renders.
        for (cell, color) in store.iter() {
            let x0 = cell.x * CELL_PX;
            let y0 = cell.y * CELL_PX;
            if x0 + CELL_PX > SURFACE_PX || y0 + CELL_PX > SURFACE_PX {
                log_warn!("Skipping out-of-range cell {} during render", cell);
                continue;
            }
            let rgba = color.to_rgba();
            for y in y0..y0 + CELL_PX {
                for x in x0..x0 + CELL_PX {
                    out.put_pixel(x, y, rgba);
                }
            }
        }

        out
    }

    /// Upload a composed raster, reusing the existing texture allocation
    /// when possible. Nearest filtering in both directions — the pixelated
    /// look is a hard requirement, not a scaling artifact.
    pub fn update_texture(&mut self, ctx: &egui::Context, raster: &RgbaImage) {
        let size = [raster.width() as usize, raster.height() as usize];
        let pixels: Vec<Color32> = raster
            .pixels()
            .map(|p| Color32::from_rgba_unmultiplied(p[0], p[1], p[2], p[3]))
            .collect();
        let color_image = ColorImage { size, pixels };

        let options = TextureOptions {
            magnification: TextureFilter::Nearest,
            minification: TextureFilter::Nearest,
            ..Default::default()
        };

        match &mut self.texture {
            Some(tex) => tex.set(color_image, options),
            None => {
                self.texture = Some(ctx.load_texture("board_raster", color_image, options));
            }
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }
}

/// Decode the embedded template PNG and pre-scale it to the board surface
/// at template opacity. Runs on the loader thread.
fn decode_template() -> Result<RgbaImage, String> {
    let decoded = image::load_from_memory(TEMPLATE_BYTES)
        .map_err(|e| format!("decode error: {}", e))?
        .into_rgba8();
    let mut scaled = imageops::resize(
        &decoded,
        SURFACE_PX,
        SURFACE_PX,
        imageops::FilterType::Nearest,
    );
    for p in scaled.pixels_mut() {
        p[3] = (p[3] as f32 * TEMPLATE_OPACITY).round() as u8;
    }
    Ok(scaled)
}

/// Pre-render the faint grid overlay once: a 1px line at every cell boundary.
fn render_grid_overlay() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(SURFACE_PX, SURFACE_PX, Rgba([0, 0, 0, 0]));
    let alpha = (255.0 * GRID_OPACITY).round() as u8;
    let line = Rgba([0, 0, 0, alpha]);
    for i in 0..=GRID_SIZE {
        let offset = (i * CELL_PX).min(SURFACE_PX - 1);
        for t in 0..SURFACE_PX {
            img.put_pixel(offset, t, line);
            img.put_pixel(t, offset, line);
        }
    }
    img
}

/// Source-over blend of `layer` onto the opaque `base`, row-parallel.
fn blend_over(base: &mut RgbaImage, layer: &RgbaImage) {
    debug_assert_eq!(base.dimensions(), layer.dimensions());
    let width = base.width() as usize;
    let layer_raw = layer.as_raw();
    base.par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(row, dst)| {
            let src = &layer_raw[row * width * 4..(row + 1) * width * 4];
            for i in (0..dst.len()).step_by(4) {
                let a = src[i + 3] as u32;
                if a == 0 {
                    continue;
                }
                for c in 0..3 {
                    let s = src[i + c] as u32;
                    let d = dst[i + c] as u32;
                    dst[i + c] = ((s * a + d * (255 - a) + 127) / 255) as u8;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, PixelColor};
    use std::time::{Duration, Instant};

    fn painted(x: u32, y: u32, hex: &str) -> PixelStore {
        PixelStore::new()
            .with_painted(Cell::new(x, y).unwrap(), PixelColor::parse(hex).unwrap())
            .unwrap()
    }

    /// Center of a cell on the raster — away from grid lines.
    fn center(cell: u32) -> u32 {
        cell * CELL_PX + CELL_PX / 2
    }

    #[test]
    fn empty_board_is_background_off_the_grid_lines() {
        let r = BoardRenderer::new();
        let raster = r.compose(&PixelStore::new());
        // (0,0) cell center: no template diamond there, no grid line.
        assert_eq!(*raster.get_pixel(center(0), center(0)), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn painted_cell_fills_exactly_its_rectangle() {
        let r = BoardRenderer::new();
        let raster = r.compose(&painted(2, 3, "#ed00b2"));
        let pink = Rgba([0xed, 0x00, 0xb2, 255]);

        // Every device pixel of the cell is the opaque brush color.
        for y in 3 * CELL_PX..4 * CELL_PX {
            for x in 2 * CELL_PX..3 * CELL_PX {
                assert_eq!(*raster.get_pixel(x, y), pink);
            }
        }
        // The neighbor cell's center is untouched.
        assert_ne!(*raster.get_pixel(center(3), center(3)), pink);
    }

    #[test]
    fn grid_lines_are_faint_not_opaque() {
        let r = BoardRenderer::new();
        let raster = r.compose(&PixelStore::new());
        let on_line = *raster.get_pixel(CELL_PX, center(5));
        // Darker than the background but nowhere near black.
        assert!(on_line[0] < 255);
        assert!(on_line[0] > 200);
    }

    #[test]
    fn pixel_layer_draws_over_template_and_grid() {
        let mut r = BoardRenderer::new();
        // Wait for the async template decode so the test is deterministic.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !r.poll_template() && r.template_rx.is_some() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(r.template_loaded(), "embedded template should decode");

        // (16,8) sits on the outer diamond of the template.
        let raster = r.compose(&painted(16, 8, "#2ecc71"));
        assert_eq!(*raster.get_pixel(center(16), center(8)), Rgba([0x2e, 0xcc, 0x71, 255]));
    }

    #[test]
    fn template_is_skipped_until_it_arrives() {
        let r = BoardRenderer {
            grid_overlay: render_grid_overlay(),
            template: None,
            template_rx: None,
            texture: None,
        };
        // Composing without the template must not fail or block.
        let raster = r.compose(&painted(0, 0, "#1a1a1a"));
        assert_eq!(raster.width(), SURFACE_PX);
    }

    #[test]
    fn embedded_template_decodes() {
        let img = decode_template().expect("embedded asset must decode");
        assert_eq!(img.dimensions(), (SURFACE_PX, SURFACE_PX));
        // Pre-faded: nothing in the template layer is more than 10% opaque.
        assert!(img.pixels().all(|p| p[3] <= 26));
    }
}
