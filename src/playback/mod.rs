//! Timed chunk playback with fades over a background image.
//!
//! * [`PlaybackEngine`] — fade-in → hold → fade-out state machine, driven by
//!   the caller's clock.
//! * [`BalloonSurface`] — the render capability the engine draws through.
//! * [`DesignSpace`] / [`Viewport`] / [`ScreenRect`] — balloon geometry
//!   re-mapping.
//! * [`ease_in_out_quad`] — the fade curve.

pub mod easing;
pub mod engine;
pub mod geometry;

pub use easing::ease_in_out_quad;
pub use engine::{
    BalloonSurface, PlaybackEngine, PlaybackEvent, PlaybackPhase, BALLOON_PADDING,
    EMPTY_SESSION_DELAY, MIN_HOLD,
};
pub use geometry::{centred_top_padding, DesignSpace, ScreenRect, Viewport};
