//! `CanvasRenderingContext2d` render surface.

use std::collections::HashMap;

use bridge_traits::render::{Color, RenderSurface, TextAlign};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::error::{WasmError, WasmResult};

/// Cover images kept per URL; more than this and the cache is reset.
const MAX_CACHED_IMAGES: usize = 32;

pub struct WasmCanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl WasmCanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> WasmResult<Self> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| WasmError::CanvasContext("2d context is null".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| WasmError::CanvasContext("unexpected context type".to_string()))?;
        Ok(Self {
            canvas,
            ctx,
            images: HashMap::new(),
        })
    }

    /// Find a `<canvas>` element by id.
    pub fn from_element_id(id: &str) -> WasmResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| WasmError::NotAvailable("document".to_string()))?;
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| WasmError::ElementNotFound(id.to_string()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| WasmError::ElementNotFound(format!("#{} is not a <canvas>", id)))?;
        Self::new(canvas)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Start loading `url` if it is not cached yet.
    fn image(&mut self, url: &str) -> Option<&HtmlImageElement> {
        if !self.images.contains_key(url) {
            if self.images.len() >= MAX_CACHED_IMAGES {
                self.images.clear();
            }
            let image = HtmlImageElement::new().ok()?;
            image.set_src(url);
            self.images.insert(url.to_string(), image);
        }
        self.images.get(url)
    }
}

impl RenderSurface for WasmCanvasSurface {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx.fill_rect(x, y, width, height);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, align: TextAlign, color: Color) {
        self.ctx.set_font(font);
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx.fill_text(text, x, y).ok();
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.ctx.arc(x, y, radius.max(0.0), start_angle, end_angle).ok();
    }

    fn stroke(&mut self, color: Color, line_width: f64) {
        self.ctx.set_stroke_style_str(&color.to_string());
        self.ctx.set_line_width(line_width);
        self.ctx.stroke();
    }

    fn set_shadow(&mut self, blur: f64, color: Color) {
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_color(&color.to_string());
    }

    fn image_size(&mut self, url: &str) -> Option<(f64, f64)> {
        let image = self.image(url)?;
        if image.complete() && image.natural_width() > 0 {
            Some((image.natural_width() as f64, image.natural_height() as f64))
        } else {
            None
        }
    }

    fn draw_image(&mut self, url: &str, x: f64, y: f64, width: f64, height: f64) {
        if let Some(image) = self.images.get(url) {
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
                .ok();
        }
    }
}
