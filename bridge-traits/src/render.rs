//! 2D Render Surface Abstraction
//!
//! A minimal drawing API covering what the visualizer paints. The browser
//! implementation forwards to `CanvasRenderingContext2d`.

use std::fmt;

use crate::platform::PlatformSendSync;

/// A CSS color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
    /// Hue in degrees, saturation and lightness in percent.
    Hsl(f64, f64, f64),
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgb(r, g, b) => write!(f, "rgb({}, {}, {})", r, g, b),
            Color::Rgba(r, g, b, a) => write!(f, "rgba({}, {}, {}, {})", r, g, b, a),
            Color::Hsl(h, s, l) => write!(f, "hsl({}, {}%, {}%)", h, s, l),
        }
    }
}

/// Text placement for [`RenderSurface::fill_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Immediate-mode drawing target for one animation frame.
pub trait RenderSurface: PlatformSendSync {
    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, align: TextAlign, color: Color);

    fn begin_path(&mut self);

    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);

    fn stroke(&mut self, color: Color, line_width: f64);

    /// Glow applied to subsequent strokes; `blur == 0` disables it.
    fn set_shadow(&mut self, blur: f64, color: Color);

    /// Start (or continue) loading an image; returns its natural size once ready.
    fn image_size(&mut self, url: &str) -> Option<(f64, f64)>;

    /// Draw a previously loaded image. Does nothing if it is not ready.
    fn draw_image(&mut self, url: &str, x: f64, y: f64, width: f64, height: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_color_strings() {
        assert_eq!(Color::Rgb(31, 41, 55).to_string(), "rgb(31, 41, 55)");
        assert_eq!(
            Color::Rgba(255, 255, 255, 0.7).to_string(),
            "rgba(255, 255, 255, 0.7)"
        );
        assert_eq!(Color::Hsl(240.0, 100.0, 50.0).to_string(), "hsl(240, 100%, 50%)");
    }
}
