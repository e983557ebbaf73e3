//! Timed chunk playback state machine.
//!
//! [`PlaybackEngine`] shows an ordered list of chunks one at a time:
//!
//! ```text
//! play(chunks) ──▶ FadeIn(0) ──fade──▶ Hold(0) ──hold──▶ FadeOut(0)
//!                      ▲                                     │
//!                      └────────── swap text, recentre ◀─────┘  (i + 1 < n)
//!                                                            │
//!                                             Finished ◀─────┘  (i + 1 == n)
//!
//! play([]) ──▶ Finishing ──300 ms──▶ Finished
//! ```
//!
//! The engine owns no timers.  The caller passes the current [`Instant`] to
//! [`PlaybackEngine::tick`] (the UI does so every frame) and a single
//! dispatch on [`PlaybackPhase`] decides what happens next.  Phases end at
//! absolute deadlines, so a late tick replays every transition it missed in
//! order and the schedule never drifts.

use std::time::{Duration, Instant};

use crate::persona::BalloonRect;

use super::easing::ease_in_out_quad;
use super::geometry::{centred_top_padding, DesignSpace, ScreenRect, Viewport};

/// Delay before `Finished` is delivered for an empty chunk list.
pub const EMPTY_SESSION_DELAY: Duration = Duration::from_millis(300);

/// Shortest hold a chunk is ever given.
pub const MIN_HOLD: Duration = Duration::from_secs(1);

/// Inner padding of the balloon on every side, in pixels.
pub const BALLOON_PADDING: f32 = 20.0;

// ---------------------------------------------------------------------------
// BalloonSurface — render capability
// ---------------------------------------------------------------------------

/// What the engine needs from the renderer.
pub trait BalloonSurface {
    /// Replace the balloon text.
    fn show_text(&mut self, text: &str);
    /// Set the balloon opacity (`0.0` – `1.0`).
    fn set_opacity(&mut self, opacity: f32);
    /// Move/resize the balloon to `rect` (viewport pixels).
    fn place_balloon(&mut self, rect: ScreenRect);
    /// Offset the text block from the top of the balloon's inner area.
    fn set_top_padding(&mut self, pixels: f32);
    /// Rendered height of `text` when wrapped at `wrap_width` pixels.
    fn text_height(&self, text: &str, wrap_width: f32) -> f32;
}

// ---------------------------------------------------------------------------
// Phase / events
// ---------------------------------------------------------------------------

/// Where the engine is within the current session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackPhase {
    /// No session.
    Idle,
    /// Chunk `index` is fading in since `started`.
    FadeIn { index: usize, started: Instant },
    /// Chunk `index` is fully visible until `until`.
    Hold { index: usize, until: Instant },
    /// Chunk `index` is fading out since `started`.
    FadeOut { index: usize, started: Instant },
    /// Empty session; `Finished` is due at `at`.
    Finishing { at: Instant },
}

impl PlaybackPhase {
    /// `true` while a session is running.
    pub fn is_active(&self) -> bool {
        !matches!(self, PlaybackPhase::Idle)
    }
}

/// Transitions reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    FadeInStarted(usize),
    FadeOutStarted(usize),
    /// The chunk list is exhausted and the session has been released.
    Finished,
}

struct Session {
    chunks: Vec<String>,
    /// Displayed chunk; `None` until the first one is shown.
    index: Option<usize>,
    hold: Duration,
}

// ---------------------------------------------------------------------------
// PlaybackEngine
// ---------------------------------------------------------------------------

/// Displays chunks with fade transitions inside a design-space balloon.
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use persona_stage::playback::{
///     BalloonSurface, DesignSpace, PlaybackEngine, PlaybackEvent, ScreenRect, Viewport,
/// };
///
/// struct Null;
/// impl BalloonSurface for Null {
///     fn show_text(&mut self, _: &str) {}
///     fn set_opacity(&mut self, _: f32) {}
///     fn place_balloon(&mut self, _: ScreenRect) {}
///     fn set_top_padding(&mut self, _: f32) {}
///     fn text_height(&self, _: &str, _: f32) -> f32 { 0.0 }
/// }
///
/// let mut engine = PlaybackEngine::new(
///     DesignSpace::new(1024.0, 768.0),
///     Viewport::new(1024.0, 768.0),
///     Duration::from_millis(600),
/// );
/// let t0 = Instant::now();
/// engine.play(vec!["Hello.".into()], Duration::from_secs(1), t0, &mut Null);
/// let events = engine.tick(t0 + Duration::from_secs(10), &mut Null);
/// assert_eq!(events.last(), Some(&PlaybackEvent::Finished));
/// ```
pub struct PlaybackEngine {
    design: DesignSpace,
    viewport: Viewport,
    balloon: BalloonRect,
    screen_rect: ScreenRect,
    fade: Duration,
    session: Option<Session>,
    phase: PlaybackPhase,
    outbox: Vec<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create an idle engine.  `fade` is shared by fade-in and fade-out.
    pub fn new(design: DesignSpace, viewport: Viewport, fade: Duration) -> Self {
        let balloon = BalloonRect::default();
        Self {
            design,
            viewport,
            balloon,
            screen_rect: design.map(balloon, viewport),
            fade,
            session: None,
            phase: PlaybackPhase::Idle,
            outbox: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Index of the displayed chunk, `None` before the first one.
    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.index)
    }

    /// Balloon rectangle in viewport pixels.
    pub fn screen_rect(&self) -> ScreenRect {
        self.screen_rect
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_active()
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Set the balloon rectangle (design space) and re-map it.
    pub fn set_balloon(&mut self, balloon: BalloonRect, surface: &mut dyn BalloonSurface) {
        self.balloon = balloon;
        self.apply_geometry(surface);
    }

    /// The viewport changed size: re-map the balloon and recentre the text.
    pub fn resize(&mut self, viewport: Viewport, surface: &mut dyn BalloonSurface) {
        self.viewport = viewport;
        self.apply_geometry(surface);
    }

    fn apply_geometry(&mut self, surface: &mut dyn BalloonSurface) {
        self.screen_rect = self.design.map(self.balloon, self.viewport);
        surface.place_balloon(self.screen_rect);
        self.recentre(surface);
    }

    fn recentre(&self, surface: &mut dyn BalloonSurface) {
        let Some(text) = self.current_text() else {
            return;
        };
        let (wrap_width, inner_height) = self.screen_rect.inner_size(BALLOON_PADDING);
        let text_height = surface.text_height(text, wrap_width);
        surface.set_top_padding(centred_top_padding(inner_height, text_height));
    }

    fn current_text(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        session
            .index
            .and_then(|i| session.chunks.get(i))
            .map(String::as_str)
    }

    // -----------------------------------------------------------------------
    // Session control
    // -----------------------------------------------------------------------

    /// Start a session, replacing any running one.
    ///
    /// Each chunk is held for `hold` (at least [`MIN_HOLD`]).  An empty list
    /// finishes after [`EMPTY_SESSION_DELAY`] without any fade; `Finished`
    /// is only ever reported from [`tick`](Self::tick), never from here.
    pub fn play(
        &mut self,
        chunks: Vec<String>,
        hold: Duration,
        now: Instant,
        surface: &mut dyn BalloonSurface,
    ) {
        log::debug!("playback: starting session with {} chunks", chunks.len());

        let empty = chunks.is_empty();
        self.outbox.clear();
        self.session = Some(Session {
            chunks,
            index: None,
            hold: hold.max(MIN_HOLD),
        });
        self.apply_geometry(surface);

        if empty {
            surface.show_text("");
            self.phase = PlaybackPhase::Finishing {
                at: now + EMPTY_SESSION_DELAY,
            };
            return;
        }

        surface.set_opacity(0.0);
        self.show_chunk(0, now, surface);
    }

    /// Advance the state machine to `now`, returning the transitions that
    /// happened since the previous call.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn BalloonSurface) -> Vec<PlaybackEvent> {
        loop {
            match self.phase {
                PlaybackPhase::Idle => break,

                PlaybackPhase::Finishing { at } => {
                    if now >= at {
                        self.finish();
                    }
                    break;
                }

                PlaybackPhase::FadeIn { index, started } => {
                    let end = started + self.fade;
                    if now < end {
                        surface.set_opacity(ease_in_out_quad(self.fade_progress(started, now)));
                        break;
                    }
                    surface.set_opacity(1.0);
                    let hold = self.session.as_ref().map_or(MIN_HOLD, |s| s.hold);
                    self.phase = PlaybackPhase::Hold {
                        index,
                        until: end + hold,
                    };
                }

                PlaybackPhase::Hold { index, until } => {
                    if now < until {
                        break;
                    }
                    self.phase = PlaybackPhase::FadeOut {
                        index,
                        started: until,
                    };
                    self.outbox.push(PlaybackEvent::FadeOutStarted(index));
                }

                PlaybackPhase::FadeOut { index, started } => {
                    let end = started + self.fade;
                    if now < end {
                        surface.set_opacity(
                            1.0 - ease_in_out_quad(self.fade_progress(started, now)),
                        );
                        break;
                    }
                    surface.set_opacity(0.0);
                    let next = index + 1;
                    let remaining = self.session.as_ref().map_or(0, |s| s.chunks.len());
                    if next >= remaining {
                        self.finish();
                        break;
                    }
                    self.show_chunk(next, end, surface);
                }
            }
        }

        std::mem::take(&mut self.outbox)
    }

    /// Swap in chunk `index` and start fading it in at `at`.
    fn show_chunk(&mut self, index: usize, at: Instant, surface: &mut dyn BalloonSurface) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.index = Some(index);
        if let Some(text) = session.chunks.get(index) {
            surface.show_text(text);
        }
        self.recentre(surface);

        self.phase = PlaybackPhase::FadeIn { index, started: at };
        self.outbox.push(PlaybackEvent::FadeInStarted(index));
    }

    fn finish(&mut self) {
        log::debug!("playback: session finished");
        self.session = None;
        self.phase = PlaybackPhase::Idle;
        self.outbox.push(PlaybackEvent::Finished);
    }

    fn fade_progress(&self, started: Instant, now: Instant) -> f32 {
        if self.fade.is_zero() {
            return 1.0;
        }
        now.saturating_duration_since(started).as_secs_f32() / self.fade.as_secs_f32()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
