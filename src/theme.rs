use eframe::egui;
use egui::Color32;

use crate::grid::PixelColor;
use crate::log_warn;

// ============================================================================
// BRAND PALETTE — the Ju Tattoo look
// ============================================================================

pub const BRAND_PINK: Color32 = Color32::from_rgb(0xed, 0x00, 0xb2);
pub const BRAND_BG: Color32 = Color32::from_rgb(0xe8, 0xe9, 0xe2);
pub const BRAND_DARK: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x1a);
pub const BRAND_WHITE: Color32 = Color32::from_rgb(0xff, 0xff, 0xff);

/// One swatch of the 8-bit user palette.
pub struct PaletteEntry {
    pub hex: &'static str,
    /// Translation key for the swatch tooltip.
    pub name_key: &'static str,
}

/// The 8-bit palette offered to the user, in display order.
pub const PALETTE: &[PaletteEntry] = &[
    PaletteEntry { hex: "#1a1a1a", name_key: "colors.ink_black" },
    PaletteEntry { hex: "#ed00b2", name_key: "colors.ju_pink" },
    PaletteEntry { hex: "#e74c3c", name_key: "colors.old_school_red" },
    PaletteEntry { hex: "#f1c40f", name_key: "colors.gold" },
    PaletteEntry { hex: "#2ecc71", name_key: "colors.venom_green" },
    PaletteEntry { hex: "#3498db", name_key: "colors.sky_blue" },
    PaletteEntry { hex: "#ecf0f1", name_key: "colors.ghost_white" },
];

impl PaletteEntry {
    pub fn color(&self) -> PixelColor {
        PixelColor::parse(self.hex).unwrap_or_else(|| {
            log_warn!("Palette entry {:?} is not valid hex, using ink black", self.hex);
            PixelColor::from_rgb(0x1a, 0x1a, 0x1a)
        })
    }

    pub fn color32(&self) -> Color32 {
        self.color().to_color32()
    }
}

/// The default brush: Ju Pink.
pub fn default_brush() -> PixelColor {
    PALETTE[1].color()
}

/// Flat, sharp-cornered light theme over the brand background.
pub fn apply(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::light();
    visuals.panel_fill = BRAND_BG;
    visuals.window_fill = BRAND_WHITE;
    visuals.window_stroke = egui::Stroke::new(3.0, BRAND_DARK);
    visuals.selection.bg_fill = BRAND_PINK;
    visuals.widgets.noninteractive.rounding = egui::Rounding::ZERO;
    visuals.widgets.inactive.rounding = egui::Rounding::ZERO;
    visuals.widgets.hovered.rounding = egui::Rounding::ZERO;
    visuals.widgets.active.rounding = egui::Rounding::ZERO;
    visuals.widgets.open.rounding = egui::Rounding::ZERO;
    visuals.window_rounding = egui::Rounding::ZERO;
    ctx.set_visuals(visuals);
}
