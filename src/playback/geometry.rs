//! Design-space → viewport mapping for the speech balloon.

use crate::persona::BalloonRect;

/// Fixed reference resolution balloon rectangles are authored against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignSpace {
    pub width: f32,
    pub height: f32,
}

impl DesignSpace {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Scale `rect` to a viewport of `viewport` pixels.
    ///
    /// Each of x, y, width, height is mapped independently as
    /// `value / design_dimension * viewport_dimension` and truncated to whole
    /// pixels.
    ///
    /// ```rust
    /// use persona_stage::persona::BalloonRect;
    /// use persona_stage::playback::{DesignSpace, Viewport};
    ///
    /// let design = DesignSpace::new(1024.0, 768.0);
    /// let rect = design.map(BalloonRect::new(80.0, 80.0, 864.0, 560.0), Viewport::new(2048.0, 1536.0));
    /// assert_eq!((rect.x, rect.y, rect.width, rect.height), (160.0, 160.0, 1728.0, 1120.0));
    /// ```
    pub fn map(&self, rect: BalloonRect, viewport: Viewport) -> ScreenRect {
        let sx = viewport.width / self.width.max(1.0);
        let sy = viewport.height / self.height.max(1.0);
        ScreenRect {
            x: (rect.x * sx).floor(),
            y: (rect.y * sy).floor(),
            width: (rect.width * sx).floor(),
            height: (rect.height * sy).floor(),
        }
    }
}

/// Current drawable size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Balloon rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    /// Size left for text after `padding` on every side.
    pub fn inner_size(&self, padding: f32) -> (f32, f32) {
        (
            (self.width - 2.0 * padding).max(0.0),
            (self.height - 2.0 * padding).max(0.0),
        )
    }
}

/// Top offset that vertically centres a text block of `text_height` inside
/// a region of `region_height`.  Never negative.
pub fn centred_top_padding(region_height: f32, text_height: f32) -> f32 {
    ((region_height - text_height) / 2.0).max(0.0).floor()
}
