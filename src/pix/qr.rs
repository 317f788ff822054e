//! QR rendering of payload strings.
//!
//! The payload is encoded verbatim; rendering never alters it.

use qrcode::render::{svg, unicode};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

/// Output options for SVG rendering.
#[derive(Debug, Clone)]
pub struct QrOptions {
    /// Minimum width/height in pixels.
    pub size: u32,
    /// Foreground color (hex, e.g. "#ea580c").
    pub fg_color: String,
    /// Background color (hex).
    pub bg_color: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 160,
            fg_color: "#ea580c".to_string(),
            bg_color: "#ffffff".to_string(),
        }
    }
}

fn build(payload: &str) -> Result<QrCode, QrError> {
    QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
}

/// Render `payload` as an SVG document.
pub fn render_svg(payload: &str, options: &QrOptions) -> Result<String, QrError> {
    let code = build(payload)?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(options.size, options.size)
        .dark_color(svg::Color(&options.fg_color))
        .light_color(svg::Color(&options.bg_color))
        .build())
}

/// Render `payload` with half-block characters for terminals.
pub fn render_terminal(payload: &str) -> Result<String, QrError> {
    let code = build(payload)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .quiet_zone(true)
        .build())
}
