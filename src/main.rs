// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]

use eframe::egui;
use inkpink::app::InkPinkApp;
use inkpink::{i18n, log_info, log_warn, logger};

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    // Initialize the internationalization system
    i18n::init();
    i18n::set_language(&i18n::detect_system_language());
    log_info!("Language: {}", i18n::current_language());

    // The generative-flash integration needs an API key; the studio works
    // without it, so only report its presence at startup.
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let masked: String = key.chars().take(4).collect();
            log_info!("GEMINI_API_KEY present ({}...)", masked);
        }
        _ => log_warn!("GEMINI_API_KEY not set, generative templates unavailable"),
    }

    // Load application icon (window title bar, taskbar, Alt+Tab)
    let icon = load_app_icon();

    // Phone-shaped portrait window, like a studio kiosk.
    let options = eframe::NativeOptions {
        viewport: {
            let mut vp = egui::ViewportBuilder::default()
                .with_inner_size([480.0, 800.0])
                .with_min_inner_size([360.0, 600.0])
                .with_title("InkPink");
            if let Some(icon_data) = icon {
                vp = vp.with_icon(std::sync::Arc::new(icon_data));
            }
            vp
        },
        ..Default::default()
    };

    eframe::run_native(
        "InkPink",
        options,
        Box::new(|cc| Box::new(InkPinkApp::new(cc))),
    )
}

/// Decode the embedded PNG icon into raw RGBA for the egui viewport.
fn load_app_icon() -> Option<egui::viewport::IconData> {
    let png_bytes = include_bytes!("../assets/icons/app_icon.png");
    let img = image::load_from_memory(png_bytes).ok()?.into_rgba8();
    let (w, h) = img.dimensions();
    Some(egui::viewport::IconData {
        rgba: img.into_raw(),
        width: w,
        height: h,
    })
}
