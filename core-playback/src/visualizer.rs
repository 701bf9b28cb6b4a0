//! # Visualizer
//!
//! Paints one animation frame from live analysis samples. The host calls
//! [`Visualizer::render_frame`] on every display refresh, playing or not.
//! Rendering only reads from the analysis graph and never touches playback.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use bridge_traits::analysis::AnalysisBackend;
use bridge_traits::render::{Color, RenderSurface, TextAlign};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisGraph, SampleKind};
use crate::config::PlaybackConfig;
use crate::error::PlaybackError;

pub const BACKGROUND: Color = Color::Rgb(31, 41, 55);
const IDLE_FONT: &str = "bold 16px Inter";
const IDLE_COLOR: Color = Color::Rgba(255, 255, 255, 0.2);
const COVER_WAVE_COLOR: Color = Color::Rgba(255, 255, 255, 0.7);
const RING_COUNT: usize = 12;

/// Visualization style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizerMode {
    #[default]
    Waveform,
    Bars,
    Circles,
    /// Track artwork with a subdued waveform on top.
    Cover,
    /// Idle label only.
    None,
}

impl VisualizerMode {
    pub const ALL: [VisualizerMode; 5] = [
        VisualizerMode::Waveform,
        VisualizerMode::Bars,
        VisualizerMode::Circles,
        VisualizerMode::Cover,
        VisualizerMode::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizerMode::Waveform => "waveform",
            VisualizerMode::Bars => "bars",
            VisualizerMode::Circles => "circles",
            VisualizerMode::Cover => "cover",
            VisualizerMode::None => "none",
        }
    }

    /// Analysis window used while this mode is active.
    pub fn fft_size(&self) -> u32 {
        match self {
            VisualizerMode::Waveform | VisualizerMode::Cover => 2048,
            VisualizerMode::Circles => 512,
            VisualizerMode::Bars | VisualizerMode::None => 256,
        }
    }

    pub fn sample_kind(&self) -> Option<SampleKind> {
        match self {
            VisualizerMode::Waveform | VisualizerMode::Cover => Some(SampleKind::TimeDomain),
            VisualizerMode::Bars | VisualizerMode::Circles => Some(SampleKind::Frequency),
            VisualizerMode::None => None,
        }
    }
}

impl fmt::Display for VisualizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizerMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        VisualizerMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PlaybackError::InvalidConfig(format!("unknown visualizer mode {:?}", s)))
    }
}

/// What a frame ended up painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Idle,
    Drawn(VisualizerMode),
    /// Cover mode without a loaded image; painted the plain waveform.
    CoverFallback,
}

/// Per-frame renderer. Owns the frame counter and a reusable sample buffer.
#[derive(Debug, Clone)]
pub struct Visualizer {
    mode: VisualizerMode,
    frame: u64,
    idle_label: String,
    samples: Vec<u8>,
}

impl Visualizer {
    pub fn new(mode: VisualizerMode, idle_label: impl Into<String>) -> Self {
        Self {
            mode,
            frame: 0,
            idle_label: idle_label.into(),
            samples: Vec::new(),
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.visualizer, config.idle_label.clone())
    }

    pub fn mode(&self) -> VisualizerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: VisualizerMode) {
        self.mode = mode;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Paint one frame.
    ///
    /// Samples are only requested while `playing` and the graph is ready.
    pub fn render_frame(
        &mut self,
        surface: &mut dyn RenderSurface,
        graph: &AnalysisGraph,
        backend: &dyn AnalysisBackend,
        playing: bool,
        cover_url: Option<&str>,
    ) -> FrameOutcome {
        self.frame = self.frame.wrapping_add(1);
        let (width, height) = (surface.width(), surface.height());
        surface.fill_rect(0.0, 0.0, width, height, BACKGROUND);

        let kind = match self.mode.sample_kind() {
            Some(kind) if playing && graph.is_ready() => kind,
            _ => {
                self.draw_idle(surface, width, height);
                return FrameOutcome::Idle;
            }
        };

        if !graph.sample(backend, kind, &mut self.samples) || self.samples.is_empty() {
            self.draw_idle(surface, width, height);
            return FrameOutcome::Idle;
        }

        let hue_frame = (self.frame % 360) as f64;
        match self.mode {
            VisualizerMode::Waveform => {
                draw_waveform(surface, &self.samples, width, height, hue_frame, false);
                FrameOutcome::Drawn(VisualizerMode::Waveform)
            }
            VisualizerMode::Bars => {
                draw_bars(surface, &self.samples, width, height);
                FrameOutcome::Drawn(VisualizerMode::Bars)
            }
            VisualizerMode::Circles => {
                draw_circles(surface, &self.samples, width, height, hue_frame);
                FrameOutcome::Drawn(VisualizerMode::Circles)
            }
            VisualizerMode::Cover => {
                let image = cover_url.and_then(|url| {
                    surface
                        .image_size(url)
                        .filter(|&(w, h)| w > 0.0 && h > 0.0)
                        .map(|size| (url, size))
                });
                match image {
                    Some((url, (image_w, image_h))) => {
                        let (x, y, w, h) = letterbox(image_w, image_h, width, height);
                        surface.draw_image(url, x, y, w, h);
                        draw_waveform(surface, &self.samples, width, height, hue_frame, true);
                        FrameOutcome::Drawn(VisualizerMode::Cover)
                    }
                    None => {
                        draw_waveform(surface, &self.samples, width, height, hue_frame, false);
                        FrameOutcome::CoverFallback
                    }
                }
            }
            VisualizerMode::None => {
                self.draw_idle(surface, width, height);
                FrameOutcome::Idle
            }
        }
    }

    fn draw_idle(&self, surface: &mut dyn RenderSurface, width: f64, height: f64) {
        surface.fill_text(
            &self.idle_label,
            width / 2.0,
            height / 2.0,
            IDLE_FONT,
            TextAlign::Center,
            IDLE_COLOR,
        );
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

/// Fit an image inside the canvas keeping its aspect ratio, centered.
pub fn letterbox(image_w: f64, image_h: f64, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let image_aspect = image_w / image_h;
    let canvas_aspect = width / height;
    let (w, h) = if image_aspect > canvas_aspect {
        (width, width / image_aspect)
    } else {
        (height * image_aspect, height)
    };
    ((width - w) / 2.0, (height - h) / 2.0, w, h)
}

fn draw_waveform(
    surface: &mut dyn RenderSurface,
    data: &[u8],
    width: f64,
    height: f64,
    frame: f64,
    on_cover: bool,
) {
    let (color, line_width) = if on_cover {
        (COVER_WAVE_COLOR, 1.5)
    } else {
        let color = Color::Hsl((frame * 2.0) % 360.0, 90.0, 65.0);
        surface.set_shadow(15.0, color);
        (color, 3.0)
    };

    let slice = width / data.len() as f64;
    surface.begin_path();
    for (i, &sample) in data.iter().enumerate() {
        let x = i as f64 * slice;
        let y = sample as f64 / 128.0 * (height / 2.0);
        if i == 0 {
            surface.move_to(x, y);
        } else {
            surface.line_to(x, y);
        }
    }
    surface.stroke(color, line_width);

    if !on_cover {
        surface.set_shadow(0.0, Color::Rgba(0, 0, 0, 0.0));
    }
}

fn draw_bars(surface: &mut dyn RenderSurface, data: &[u8], width: f64, height: f64) {
    let len = data.len() as f64;
    let bar_width = width / len * 2.5;
    let mut x = 0.0;
    for (i, &magnitude) in data.iter().enumerate() {
        if x >= width {
            break;
        }
        let bar_height = magnitude as f64 / 255.0 * height;
        let hue = i as f64 / len * 360.0;
        surface.fill_rect(x, height - bar_height, bar_width, bar_height, Color::Hsl(hue, 80.0, 60.0));
        x += bar_width + 1.0;
    }
}

fn draw_circles(surface: &mut dyn RenderSurface, data: &[u8], width: f64, height: f64, frame: f64) {
    let (cx, cy) = (width / 2.0, height / 2.0);
    let base = width.min(height) / 2.5;
    for i in 0..RING_COUNT {
        let magnitude = data.get(i * 10).copied().unwrap_or(0) as f64;
        let radius = i as f64 / RING_COUNT as f64 * base + magnitude / 255.0 * 50.0;
        let hue = (i as f64 * 30.0 + frame) % 360.0;
        surface.begin_path();
        surface.arc(cx, cy, radius, 0.0, PI * 2.0);
        surface.stroke(Color::Hsl(hue, 80.0, 60.0), 3.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::analysis::{CompressorParam, CompressorSettings, ContextState};
    use bridge_traits::error::Result as BridgeResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Backend {
        samples: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AnalysisBackend for Backend {
        fn connect(&self, _: &CompressorSettings, _: u32) -> BridgeResult<()> {
            Ok(())
        }
        fn context_state(&self) -> ContextState {
            ContextState::Running
        }
        async fn resume(&self) -> BridgeResult<()> {
            Ok(())
        }
        fn set_fft_size(&self, _: u32) -> BridgeResult<()> {
            Ok(())
        }
        fn frequency_bin_count(&self) -> usize {
            128
        }
        fn time_domain_data(&self, buffer: &mut [u8]) {
            self.samples.fetch_add(1, Ordering::SeqCst);
            buffer.fill(128);
        }
        fn frequency_data(&self, buffer: &mut [u8]) {
            self.samples.fetch_add(1, Ordering::SeqCst);
            buffer.fill(255);
        }
        fn set_compressor_param(&self, _: CompressorParam, _: f32, _: f64) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Canvas {
        ops: Vec<String>,
        image: Option<(f64, f64)>,
    }

    impl Canvas {
        fn count(&self, prefix: &str) -> usize {
            self.ops.iter().filter(|op| op.starts_with(prefix)).count()
        }
    }

    impl RenderSurface for Canvas {
        fn width(&self) -> f64 {
            400.0
        }
        fn height(&self) -> f64 {
            200.0
        }
        fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
            self.ops.push(format!("rect {} {} {} {} {}", x, y, w, h, color));
        }
        fn fill_text(&mut self, text: &str, x: f64, y: f64, _: &str, _: TextAlign, _: Color) {
            self.ops.push(format!("text {} {} {}", text, x, y));
        }
        fn begin_path(&mut self) {
            self.ops.push("begin".into());
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.ops.push(format!("move {} {}", x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.ops.push(format!("line {} {}", x, y));
        }
        fn arc(&mut self, _: f64, _: f64, radius: f64, _: f64, _: f64) {
            self.ops.push(format!("arc {}", radius));
        }
        fn stroke(&mut self, color: Color, line_width: f64) {
            self.ops.push(format!("stroke {} {}", color, line_width));
        }
        fn set_shadow(&mut self, blur: f64, _: Color) {
            self.ops.push(format!("shadow {}", blur));
        }
        fn image_size(&mut self, _: &str) -> Option<(f64, f64)> {
            self.image
        }
        fn draw_image(&mut self, url: &str, x: f64, y: f64, w: f64, h: f64) {
            self.ops.push(format!("image {} {} {} {} {}", url, x, y, w, h));
        }
    }

    fn ready_graph(backend: &Backend) -> AnalysisGraph {
        let mut graph = AnalysisGraph::default();
        assert!(graph.ensure_initialized(backend));
        graph
    }

    #[test]
    fn test_idle_when_paused_never_samples() {
        let backend = Backend::default();
        let graph = ready_graph(&backend);
        let mut canvas = Canvas::default();
        let mut visualizer = Visualizer::default();

        for mode in VisualizerMode::ALL {
            visualizer.set_mode(mode);
            let outcome = visualizer.render_frame(&mut canvas, &graph, &backend, false, None);
            assert_eq!(outcome, FrameOutcome::Idle);
        }
        assert_eq!(backend.samples.load(Ordering::SeqCst), 0);
        assert_eq!(canvas.ops[0], "rect 0 0 400 200 rgb(31, 41, 55)");
        assert_eq!(canvas.ops[1], "text PAUSED 200 100");
    }

    #[test]
    fn test_idle_without_graph() {
        let backend = Backend::default();
        let graph = AnalysisGraph::default();
        let mut canvas = Canvas::default();
        let outcome = Visualizer::default().render_frame(&mut canvas, &graph, &backend, true, None);
        assert_eq!(outcome, FrameOutcome::Idle);
        assert_eq!(backend.samples.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_waveform_silence_is_centered() {
        let backend = Backend::default();
        let graph = ready_graph(&backend);
        let mut canvas = Canvas::default();
        let outcome = Visualizer::default().render_frame(&mut canvas, &graph, &backend, true, None);

        assert_eq!(outcome, FrameOutcome::Drawn(VisualizerMode::Waveform));
        assert_eq!(canvas.count("move"), 1);
        assert_eq!(canvas.count("line"), 127);
        assert!(canvas.ops.iter().filter(|op| op.starts_with("line")).all(|op| op.ends_with(" 100")));
        assert!(canvas.ops.contains(&"stroke hsl(2, 90%, 65%) 3".to_string()));
        assert_eq!(canvas.ops.last().unwrap(), "shadow 0");
    }

    #[test]
    fn test_bars_stay_on_canvas() {
        let backend = Backend::default();
        let graph = ready_graph(&backend);
        let mut canvas = Canvas::default();
        let mut visualizer = Visualizer::new(VisualizerMode::Bars, "idle");
        visualizer.render_frame(&mut canvas, &graph, &backend, true, None);

        let bars = canvas.count("rect") - 1;
        assert!(bars > 0 && bars < 128);
        // Full magnitude: bars span the whole height.
        assert!(canvas.ops[1].starts_with("rect 0 0 7.8125 200 hsl(0, 80%, 60%)"));
    }

    #[test]
    fn test_circles_draw_fixed_ring_count() {
        let backend = Backend::default();
        let graph = ready_graph(&backend);
        let mut canvas = Canvas::default();
        let mut visualizer = Visualizer::new(VisualizerMode::Circles, "idle");
        visualizer.render_frame(&mut canvas, &graph, &backend, true, None);

        assert_eq!(canvas.count("arc"), 12);
        assert_eq!(canvas.ops[2], "arc 50");
    }

    #[test]
    fn test_cover_letterboxes_or_falls_back() {
        let backend = Backend::default();
        let graph = ready_graph(&backend);
        let mut visualizer = Visualizer::new(VisualizerMode::Cover, "idle");

        let mut loading = Canvas::default();
        let outcome = visualizer.render_frame(&mut loading, &graph, &backend, true, Some("c.jpg"));
        assert_eq!(outcome, FrameOutcome::CoverFallback);

        let mut loaded = Canvas {
            image: Some((100.0, 100.0)),
            ..Default::default()
        };
        let outcome = visualizer.render_frame(&mut loaded, &graph, &backend, true, Some("c.jpg"));
        assert_eq!(outcome, FrameOutcome::Drawn(VisualizerMode::Cover));
        assert_eq!(loaded.ops[1], "image c.jpg 100 0 200 200");
        assert!(loaded.ops.contains(&"stroke rgba(255, 255, 255, 0.7) 1.5".to_string()));
        assert_eq!(loaded.count("shadow"), 0);
    }

    #[test]
    fn test_letterbox_wide_image() {
        assert_eq!(letterbox(400.0, 100.0, 400.0, 200.0), (0.0, 50.0, 400.0, 100.0));
    }

    #[test]
    fn test_mode_parsing_and_windows() {
        assert_eq!("Bars".parse::<VisualizerMode>().unwrap(), VisualizerMode::Bars);
        assert!("laser".parse::<VisualizerMode>().is_err());
        assert_eq!(VisualizerMode::Waveform.fft_size(), 2048);
        assert_eq!(VisualizerMode::Bars.fft_size(), 256);
        assert_eq!(VisualizerMode::Circles.fft_size(), 512);
    }
}
