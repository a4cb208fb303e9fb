use base64::{engine::general_purpose::STANDARD, Engine as _};
use qrcode::render::svg;
use qrcode::QrCode;

use crate::error::{AppError, Result};

/// Renders `payload` as an SVG QR code.
pub fn render_svg(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// The SVG as a `data:` URL, ready for an `<img src>`.
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_svg() {
        let svg = render_svg("3f2a.deadbeef").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg_data_url(&svg).starts_with("data:image/svg+xml;base64,"));
    }
}
