//! Viewport sizing and auto-fit.
//!
//! All viewport state is derived in one place: [`compute_viewport`] takes the
//! container size, content bounds and device class and returns the complete
//! [`ViewportState`]. The [`ViewportController`] only decides *when* to call it
//! (resize debounce, interaction guard).

use crate::bounds::ContentBounds;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Margin kept around fitted content on desktop.
pub const DESKTOP_FIT_MARGIN: f64 = 40.0;
/// Margin from the top-left corner on touch devices.
pub const TOUCH_MARGIN: f64 = 20.0;
/// Below this share of the viewport, content is top-left aligned instead of centered.
pub const ALIGN_FILL_RATIO: f64 = 0.8;
/// Extra stage padding past the content on mobile.
pub const MOBILE_STAGE_PADDING: f64 = 150.0;
/// Extra stage padding past the content on tablets.
pub const TABLET_STAGE_PADDING: f64 = 200.0;
/// Minimum scroll room added to the viewport on touch devices.
pub const TOUCH_STAGE_EXTRA: f64 = 300.0;
/// Size changes at or below this many pixels are ignored.
pub const SIZE_CHANGE_THRESHOLD: f64 = 10.0;
/// Delay between the last container resize and the recompute.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
/// Sane limits for the observed container size.
pub const MIN_CANVAS_SIZE: f64 = 100.0;
pub const MAX_CANVAS_SIZE: f64 = 8192.0;

/// Width below which a touch device is treated as a phone.
pub const MOBILE_BREAKPOINT: f64 = 768.0;
/// Width below which any device is treated as a tablet.
pub const TABLET_BREAKPOINT: f64 = 1024.0;

/// Device class driving the fit strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceClass {
    /// Classify from viewport width and touch capability.
    pub fn classify(viewport_width: f64, touch: bool) -> Self {
        if viewport_width < MOBILE_BREAKPOINT {
            DeviceClass::Mobile
        } else if viewport_width < TABLET_BREAKPOINT || touch {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn is_touch(self) -> bool {
        !matches!(self, DeviceClass::Desktop)
    }

    /// Stage padding past the content for touch devices.
    fn stage_padding(self) -> f64 {
        match self {
            DeviceClass::Mobile => MOBILE_STAGE_PADDING,
            DeviceClass::Tablet => TABLET_STAGE_PADDING,
            DeviceClass::Desktop => 0.0,
        }
    }
}

/// Translation and scale applied to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTransform {
    pub position: Point,
    pub scale: f64,
}

impl Default for StageTransform {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: 1.0,
        }
    }
}

/// Compute the stage transform that shows the given content.
pub fn auto_fit(bounds: Option<&ContentBounds>, canvas: Size, device: DeviceClass) -> StageTransform {
    let Some(bounds) = bounds else {
        return StageTransform::default();
    };

    if device.is_touch() {
        // Touch devices scroll natively instead of zooming out.
        return StageTransform {
            position: Point::new(TOUCH_MARGIN - bounds.min_x, TOUCH_MARGIN - bounds.min_y),
            scale: 1.0,
        };
    }

    let margin = DESKTOP_FIT_MARGIN;
    let avail_w = (canvas.width - margin * 2.0).max(1.0);
    let avail_h = (canvas.height - margin * 2.0).max(1.0);
    let scale_x = if bounds.width > 0.0 { avail_w / bounds.width } else { 1.0 };
    let scale_y = if bounds.height > 0.0 { avail_h / bounds.height } else { 1.0 };
    let scale = scale_x.min(scale_y).min(1.0);

    let scaled_w = bounds.width * scale;
    let scaled_h = bounds.height * scale;
    let small = scaled_w < canvas.width * ALIGN_FILL_RATIO && scaled_h < canvas.height * ALIGN_FILL_RATIO;

    let position = if small {
        Point::new(margin - bounds.min_x * scale, margin - bounds.min_y * scale)
    } else {
        Point::new(
            center_axis(bounds.min_x * scale, scaled_w, canvas.width, margin),
            center_axis(bounds.min_y * scale, scaled_h, canvas.height, margin),
        )
    };

    StageTransform { position, scale }
}

/// Center content of `extent` on one axis, then keep it inside the margins.
///
/// `offset` is the scaled content minimum. Returns the stage position.
fn center_axis(offset: f64, extent: f64, viewport: f64, margin: f64) -> f64 {
    let mut pos = (viewport - extent) / 2.0 - offset;
    if pos + offset + extent > viewport - margin {
        pos = viewport - margin - extent - offset;
    }
    if pos + offset < margin {
        pos = margin - offset;
    }
    pos
}

/// Clamp an observed container size to sane limits.
pub fn clamp_canvas_size(size: Size) -> Size {
    let clamp = |v: f64| {
        if v.is_finite() {
            v.clamp(MIN_CANVAS_SIZE, MAX_CANVAS_SIZE)
        } else {
            MIN_CANVAS_SIZE
        }
    };
    Size::new(clamp(size.width), clamp(size.height))
}

/// Whether `next` differs from `current` by more than `threshold` on either axis.
pub fn exceeds_threshold(current: Size, next: Size, threshold: f64) -> bool {
    (current.width - next.width).abs() > threshold || (current.height - next.height).abs() > threshold
}

/// Size of the drawable stage.
///
/// Desktop stages match the canvas. Touch stages are larger than the viewport
/// so the content can be scrolled.
pub fn stage_size(canvas: Size, bounds: Option<&ContentBounds>, device: DeviceClass) -> Size {
    if !device.is_touch() {
        return canvas;
    }
    let padding = device.stage_padding();
    let axis = |viewport: f64, content_max: f64| {
        let wanted = (viewport * 1.5)
            .max(content_max + padding)
            .max(viewport + TOUCH_STAGE_EXTRA);
        wanted.min(viewport * 3.0)
    };
    let (content_w, content_h) = bounds.map_or((0.0, 0.0), |b| (b.max_x, b.max_y));
    Size::new(axis(canvas.width, content_w), axis(canvas.height, content_h))
}

/// Derived viewport state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub canvas_size: Size,
    pub stage_size: Size,
    pub stage_position: Point,
    pub stage_scale: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            canvas_size: Size::ZERO,
            stage_size: Size::ZERO,
            stage_position: Point::ZERO,
            stage_scale: 1.0,
        }
    }
}

impl ViewportState {
    /// Convert a stage (screen) point to canvas coordinates.
    pub fn to_canvas(&self, stage_point: Point) -> Point {
        let scale = if self.stage_scale > 0.0 { self.stage_scale } else { 1.0 };
        Point::new(
            (stage_point.x - self.stage_position.x) / scale,
            (stage_point.y - self.stage_position.y) / scale,
        )
    }

    /// Convert a canvas point to stage (screen) coordinates.
    pub fn to_stage(&self, canvas_point: Point) -> Point {
        self.stage_position + canvas_point.to_vec2() * self.stage_scale
    }

    /// Stage translation as a vector.
    pub fn offset(&self) -> Vec2 {
        self.stage_position.to_vec2()
    }
}

/// Inputs of one viewport recompute.
#[derive(Debug, Clone, Copy)]
pub struct ViewportInputs<'a> {
    pub container: Size,
    pub bounds: Option<&'a ContentBounds>,
    pub device: DeviceClass,
    pub threshold: f64,
    pub auto_fit: bool,
}

/// Compute the full viewport state from all inputs at once.
///
/// Size changes within the threshold keep the previous size so a resize
/// observer and the size-driven layout cannot oscillate.
pub fn compute_viewport(previous: &ViewportState, inputs: &ViewportInputs<'_>) -> ViewportState {
    let mut canvas_size = clamp_canvas_size(inputs.container);
    if !exceeds_threshold(previous.canvas_size, canvas_size, inputs.threshold) {
        canvas_size = previous.canvas_size;
    }

    let mut stage = stage_size(canvas_size, inputs.bounds, inputs.device);
    if !exceeds_threshold(previous.stage_size, stage, inputs.threshold) {
        stage = previous.stage_size;
    }

    let transform = if inputs.auto_fit {
        auto_fit(inputs.bounds, canvas_size, inputs.device)
    } else {
        StageTransform {
            position: previous.stage_position,
            scale: previous.stage_scale,
        }
    };

    ViewportState {
        canvas_size,
        stage_size: stage,
        stage_position: transform.position,
        stage_scale: transform.scale,
    }
}

/// Owns the viewport state and schedules recomputes.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    device: DeviceClass,
    container: Size,
    bounds: Option<ContentBounds>,
    pending_resize: Option<Instant>,
    /// A recompute was requested while an interaction was in progress.
    deferred: bool,
    pub debounce: Duration,
    pub threshold: f64,
    pub auto_fit: bool,
}

impl ViewportController {
    /// Create a controller and compute the initial state immediately.
    pub fn new(container: Size, device: DeviceClass) -> Self {
        let mut controller = Self {
            state: ViewportState::default(),
            device,
            container,
            bounds: None,
            pending_resize: None,
            deferred: false,
            debounce: RESIZE_DEBOUNCE,
            threshold: SIZE_CHANGE_THRESHOLD,
            auto_fit: true,
        };
        controller.recompute();
        controller
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn bounds(&self) -> Option<&ContentBounds> {
        self.bounds.as_ref()
    }

    /// Record a container resize. The recompute happens in [`Self::tick`]
    /// once the debounce delay has passed without further resizes.
    pub fn on_container_resize(&mut self, size: Size, now: Instant) {
        if !exceeds_threshold(self.container, size, self.threshold) {
            return;
        }
        self.container = size;
        self.pending_resize = Some(now);
    }

    /// Change the device class (e.g. orientation change).
    pub fn set_device(&mut self, device: DeviceClass, interacting: bool) {
        if self.device != device {
            self.device = device;
            self.request(interacting);
        }
    }

    /// Content bounds changed.
    pub fn set_bounds(&mut self, bounds: Option<ContentBounds>, interacting: bool) {
        if self.bounds != bounds {
            self.bounds = bounds;
            self.request(interacting);
        }
    }

    /// Advance timers. Returns true if the state was recomputed.
    pub fn tick(&mut self, now: Instant, interacting: bool) -> bool {
        if let Some(since) = self.pending_resize {
            if now.saturating_duration_since(since) >= self.debounce {
                self.pending_resize = None;
                self.deferred = true;
            }
        }
        if self.deferred && !interacting {
            self.recompute();
            return true;
        }
        false
    }

    fn request(&mut self, interacting: bool) {
        if interacting {
            self.deferred = true;
        } else {
            self.recompute();
        }
    }

    /// Recompute the state right away.
    pub fn recompute(&mut self) {
        let inputs = ViewportInputs {
            container: self.container,
            bounds: self.bounds.as_ref(),
            device: self.device,
            threshold: self.threshold,
            auto_fit: self.auto_fit,
        };
        self.state = compute_viewport(&self.state, &inputs);
        self.deferred = false;
        log::debug!(
            "viewport: canvas {:?} stage {:?} scale {:.3}",
            self.state.canvas_size,
            self.state.stage_size,
            self.state.stage_scale
        );
    }
}
