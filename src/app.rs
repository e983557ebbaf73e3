//! Stage window — egui/eframe application.
//!
//! # Architecture
//!
//! [`StageApp`] is the top-level [`eframe::App`].  It owns the
//! [`PersonaPipeline`], the [`PlaybackEngine`] and two channel endpoints:
//!
//! * `request_tx` — sends [`GenerationRequest`]s to the generation worker.
//! * `message_rx` — receives [`GatewayMessage`]s from the worker.
//!
//! Every frame the app drains `message_rx`, ticks the playback engine with
//! the current time, executes the [`Directive`]s the pipeline returns and
//! then paints:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ background (aspect-fill)                 │
//! │    ╭──────────────────────────╮          │
//! │    │  balloon + chunk text    │ ← fades  │
//! │    ╰──────────────────────────╯          │
//! │ status line                              │
//! └──────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::generation::{GatewayMessage, GenerationRequest};
use crate::persona::Persona;
use crate::pipeline::{Directive, PersonaPipeline, PipelineState};
use crate::playback::{
    BalloonSurface, DesignSpace, PlaybackEngine, PlaybackEvent, ScreenRect, Viewport,
    BALLOON_PADDING,
};

/// Repaint cadence while a fade is running (~60 fps).
const FADE_FRAME: Duration = Duration::from_millis(16);

/// Repaint cadence otherwise; keeps channel polling and hold deadlines live.
const IDLE_FRAME: Duration = Duration::from_millis(100);

const STATUS_HEIGHT: f32 = 28.0;

// ---------------------------------------------------------------------------
// EguiBalloon — BalloonSurface backed by egui fonts
// ---------------------------------------------------------------------------

/// Balloon render state written by the playback engine and read by `paint`.
struct EguiBalloon {
    ctx: egui::Context,
    font: egui::FontId,
    text: String,
    opacity: f32,
    rect: ScreenRect,
    top_padding: f32,
}

impl EguiBalloon {
    fn new(ctx: egui::Context, font: egui::FontId) -> Self {
        Self {
            ctx,
            font,
            text: String::new(),
            opacity: 0.0,
            rect: ScreenRect::default(),
            top_padding: 0.0,
        }
    }

    fn galley(&self, text: &str, wrap_width: f32, color: egui::Color32) -> std::sync::Arc<egui::Galley> {
        self.ctx.fonts(|fonts| {
            fonts.layout(text.to_owned(), self.font.clone(), color, wrap_width.max(1.0))
        })
    }

    fn paint(&self, painter: &egui::Painter, rounding: u8, fill_alpha: f32) {
        if self.opacity <= 0.0 || self.rect.width <= 0.0 || self.rect.height <= 0.0 {
            return;
        }
        let rect = egui::Rect::from_min_size(
            egui::pos2(self.rect.x, self.rect.y),
            egui::vec2(self.rect.width, self.rect.height),
        );
        let fill = egui::Color32::WHITE.gamma_multiply(fill_alpha * self.opacity);
        painter.rect_filled(rect, egui::CornerRadius::same(rounding), fill);

        if self.text.is_empty() {
            return;
        }
        let (wrap_width, _) = self.rect.inner_size(BALLOON_PADDING);
        let ink = egui::Color32::from_rgb(20, 20, 20).gamma_multiply(self.opacity);
        let galley = self.galley(&self.text, wrap_width, ink);
        let x = rect.left() + BALLOON_PADDING + ((wrap_width - galley.size().x) / 2.0).max(0.0);
        let y = rect.top() + BALLOON_PADDING + self.top_padding;
        painter.with_clip_rect(rect).galley(egui::pos2(x, y), galley, ink);
    }
}

impl BalloonSurface for EguiBalloon {
    fn show_text(&mut self, text: &str) {
        self.text = text.to_owned();
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn place_balloon(&mut self, rect: ScreenRect) {
        self.rect = rect;
    }

    fn set_top_padding(&mut self, pixels: f32) {
        self.top_padding = pixels;
    }

    fn text_height(&self, text: &str, wrap_width: f32) -> f32 {
        self.galley(text, wrap_width, egui::Color32::BLACK).size().y
    }
}

// ---------------------------------------------------------------------------
// Background
// ---------------------------------------------------------------------------

/// Decode `path` into an egui texture.
fn load_background(ctx: &egui::Context, path: &Path) -> anyhow::Result<egui::TextureHandle> {
    let decoded = image::open(path)?.to_rgba8();
    let size = [decoded.width() as usize, decoded.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, decoded.as_raw());
    Ok(ctx.load_texture(
        path.display().to_string(),
        pixels,
        egui::TextureOptions::LINEAR,
    ))
}

/// UV sub-rectangle that scales an `image` of the given size to cover
/// `target` while keeping its aspect ratio, cropping the overflow evenly.
fn cover_uv(image: egui::Vec2, target: egui::Vec2) -> egui::Rect {
    if image.x <= 0.0 || image.y <= 0.0 || target.x <= 0.0 || target.y <= 0.0 {
        return egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    }
    let scale = (target.x / image.x).max(target.y / image.y);
    let visible_u = (target.x / scale / image.x).min(1.0);
    let visible_v = (target.y / scale / image.y).min(1.0);
    let u0 = (1.0 - visible_u) / 2.0;
    let v0 = (1.0 - visible_v) / 2.0;
    egui::Rect::from_min_max(egui::pos2(u0, v0), egui::pos2(u0 + visible_u, v0 + visible_v))
}

/// Parse `#rrggbb` into a colour.
fn parse_hex_colour(style: &str) -> Option<egui::Color32> {
    let hex = style.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(egui::Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Map a configured font family name onto one of egui's built-in families.
fn font_family(name: &str) -> egui::FontFamily {
    if name.to_ascii_lowercase().contains("mono") {
        egui::FontFamily::Monospace
    } else {
        egui::FontFamily::Proportional
    }
}

// ---------------------------------------------------------------------------
// StageApp
// ---------------------------------------------------------------------------

/// eframe application — the persona stage.
pub struct StageApp {
    // ── Show logic ───────────────────────────────────────────────────────
    pipeline: PersonaPipeline,
    engine: PlaybackEngine,
    balloon: EguiBalloon,
    hold: Duration,

    // ── Presentation ─────────────────────────────────────────────────────
    background: Option<egui::TextureHandle>,
    status: String,
    status_colour: Option<egui::Color32>,
    viewport: Viewport,
    rounding: u8,
    balloon_alpha: f32,

    // ── Channels ─────────────────────────────────────────────────────────
    /// Send requests to the generation worker.
    request_tx: mpsc::Sender<GenerationRequest>,
    /// Receive status and results from the generation worker.
    message_rx: mpsc::Receiver<GatewayMessage>,
}

impl StageApp {
    /// Create the app and start the pipeline.
    ///
    /// * `cc`         — eframe creation context (provides the egui context).
    /// * `config`     — loaded application configuration.
    /// * `request_tx` — sender end of the generation request channel.
    /// * `message_rx` — receiver end of the gateway message channel.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        request_tx: mpsc::Sender<GenerationRequest>,
        message_rx: mpsc::Receiver<GatewayMessage>,
    ) -> Self {
        let ui = &config.ui;
        let design = DesignSpace::new(ui.screen_width as f32, ui.screen_height as f32);
        let viewport = Viewport::new(ui.screen_width as f32, ui.screen_height as f32);
        let font = egui::FontId::new(ui.font_point_size, font_family(&ui.font_family));

        let personas: Vec<Persona> = config.personalities.iter().map(Persona::from).collect();
        let pipeline =
            PersonaPipeline::new(personas, config.num_characters, config.assets_dir.clone());

        let mut app = Self {
            pipeline,
            engine: PlaybackEngine::new(design, viewport, Duration::from_millis(ui.fade_ms)),
            balloon: EguiBalloon::new(cc.egui_ctx.clone(), font),
            hold: Duration::from_secs(ui.chunk_duration_s),
            background: None,
            status: String::new(),
            status_colour: parse_hex_colour(&ui.status_style),
            viewport,
            rounding: ui.balloon_rounding_px,
            balloon_alpha: ui.balloon_opacity,
            request_tx,
            message_rx,
        };

        let directives = app.pipeline.start();
        app.execute(&cc.egui_ctx, directives);
        app
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending gateway messages (non-blocking).
    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.message_rx.try_recv() {
            let directives = self.pipeline.on_gateway(message);
            self.execute(ctx, directives);
        }
    }

    /// Advance playback to `now` and route the finish signal.
    fn tick_playback(&mut self, ctx: &egui::Context, now: Instant) {
        for event in self.engine.tick(now, &mut self.balloon) {
            match event {
                PlaybackEvent::FadeInStarted(i) => log::debug!("stage: chunk {i} fading in"),
                PlaybackEvent::FadeOutStarted(i) => log::debug!("stage: chunk {i} fading out"),
                PlaybackEvent::Finished => {
                    let directives = self.pipeline.on_playback_finished();
                    self.execute(ctx, directives);
                }
            }
        }
    }

    /// Re-map the balloon when the window size changes.
    fn track_viewport(&mut self, ctx: &egui::Context) {
        let size = ctx.screen_rect().size();
        let viewport = Viewport::new(size.x, size.y);
        if viewport != self.viewport {
            self.viewport = viewport;
            self.engine.resize(viewport, &mut self.balloon);
        }
    }

    // ── Directives ───────────────────────────────────────────────────────

    fn execute(&mut self, ctx: &egui::Context, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Status(text) => {
                    log::info!("status: {text}");
                    self.status = text;
                }
                Directive::Background(path) => self.set_background(ctx, path.as_deref()),
                Directive::Balloon(rect) => self.engine.set_balloon(rect, &mut self.balloon),
                Directive::Request(request) => {
                    if let Err(e) = self.request_tx.try_send(request) {
                        log::error!("stage: generation worker unreachable: {e}");
                        let directives = self
                            .pipeline
                            .on_gateway(GatewayMessage::Error("generation worker unavailable".into()));
                        self.execute(ctx, directives);
                    }
                }
                Directive::Play(chunks) => {
                    self.engine
                        .play(chunks, self.hold, Instant::now(), &mut self.balloon)
                }
                Directive::Done => log::info!("stage: show complete"),
            }
        }
    }

    fn set_background(&mut self, ctx: &egui::Context, path: Option<&Path>) {
        self.background = path.and_then(|p| match load_background(ctx, p) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("stage: could not load background {}: {e}", p.display());
                None
            }
        });
    }

    // ── Painting ─────────────────────────────────────────────────────────

    fn draw_background(&self, painter: &egui::Painter, rect: egui::Rect) {
        painter.rect_filled(rect, egui::CornerRadius::ZERO, egui::Color32::BLACK);
        if let Some(texture) = &self.background {
            let uv = cover_uv(texture.size_vec2(), rect.size());
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }
    }

    fn draw_status(&self, ui: &egui::Ui, rect: egui::Rect) {
        if self.status.is_empty() {
            return;
        }
        let strip = egui::Rect::from_min_max(
            egui::pos2(rect.left(), rect.bottom() - STATUS_HEIGHT),
            rect.max,
        );
        let painter = ui.painter();
        painter.rect_filled(
            strip,
            egui::CornerRadius::ZERO,
            egui::Color32::from_black_alpha(160),
        );
        let colour = self
            .status_colour
            .unwrap_or_else(|| egui::Color32::from_rgb(200, 200, 200));
        painter.text(
            egui::pos2(strip.left() + 10.0, strip.center().y),
            egui::Align2::LEFT_CENTER,
            &self.status,
            egui::FontId::proportional(13.0),
            colour,
        );
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for StageApp {
    /// Called every frame by eframe.  Polls the worker, advances playback,
    /// then renders the stage.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Poll / advance -----------------------------------------------
        self.track_viewport(ctx);
        self.poll_messages(ctx);
        self.tick_playback(ctx, Instant::now());

        // --- Schedule repaints --------------------------------------------
        if self.engine.is_playing() {
            ctx.request_repaint_after(FADE_FRAME);
        } else if self.pipeline.state() != PipelineState::Done {
            ctx.request_repaint_after(IDLE_FRAME);
        }

        // --- Paint ---------------------------------------------------------
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();
                self.draw_background(painter, rect);
                self.balloon.paint(painter, self.rounding, self.balloon_alpha);
                self.draw_status(ui, rect);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!(
            "stage closing (pipeline {})",
            self.pipeline.state().label()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
