//! Pan/zoom transform for the graph view
//!
//! World coordinates map to screen coordinates as `screen = world * scale +
//! translate`. The transform survives re-layouts; only [`GraphCommand::Reset`]
//! returns it to the identity.

use super::{Bounds, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Argument-less graph control actions, dispatched on the command bus by any UI
/// control (toolbar buttons, keyboard shortcuts, CLI flags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphCommand {
    ZoomIn,
    ZoomOut,
    Center,
    Fit,
    Reset,
}

impl GraphCommand {
    pub const ALL: [GraphCommand; 5] = [
        GraphCommand::ZoomIn,
        GraphCommand::ZoomOut,
        GraphCommand::Center,
        GraphCommand::Fit,
        GraphCommand::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphCommand::ZoomIn => "zoomIn",
            GraphCommand::ZoomOut => "zoomOut",
            GraphCommand::Center => "center",
            GraphCommand::Fit => "fit",
            GraphCommand::Reset => "reset",
        }
    }
}

impl fmt::Display for GraphCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphCommand::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown graph command '{}'", s))
    }
}

/// Viewport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Screen size in pixels
    pub width: f32,
    pub height: f32,
    /// Multiplicative zoom factor per zoom-in/zoom-out step
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Screen-space margin kept around the graph by `fit`
    pub fit_padding: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            zoom_step: 1.2,
            min_zoom: 0.1,
            max_zoom: 4.0,
            fit_padding: 40.0,
        }
    }
}

impl ViewportConfig {
    /// Repair zoom limits that would make clamping impossible: non-finite or
    /// non-positive values fall back to the defaults, inverted limits are swapped.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !usable(self.min_zoom) || !usable(self.max_zoom) {
            warn!(min_zoom = self.min_zoom, max_zoom = self.max_zoom, "invalid zoom limits, using defaults");
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        if self.min_zoom > self.max_zoom {
            warn!(min_zoom = self.min_zoom, max_zoom = self.max_zoom, "zoom limits inverted, swapping");
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if !usable(self.zoom_step) {
            warn!(zoom_step = self.zoom_step, "invalid zoom step, using default");
            self.zoom_step = defaults.zoom_step;
        }
        self
    }
}

/// Current pan/zoom state
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    config: ViewportConfig,
    scale: f32,
    translate: Position,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config: config.normalized(),
            scale: 1.0,
            translate: Position::default(),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translate(&self) -> Position {
        self.translate
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn is_default(&self) -> bool {
        self.scale == 1.0 && self.translate == Position::default()
    }

    pub fn world_to_screen(&self, world: Position) -> Position {
        Position::new(
            world.x * self.scale + self.translate.x,
            world.y * self.scale + self.translate.y,
        )
    }

    pub fn screen_to_world(&self, screen: Position) -> Position {
        Position::new(
            (screen.x - self.translate.x) / self.scale,
            (screen.y - self.translate.y) / self.scale,
        )
    }

    fn screen_center(&self) -> Position {
        Position::new(self.config.width / 2.0, self.config.height / 2.0)
    }

    /// Pan by a screen-space delta
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.translate.x += dx;
        self.translate.y += dy;
    }

    /// Multiply the scale by `factor`, keeping the world point under the screen
    /// center fixed
    pub fn zoom_by(&mut self, factor: f32) {
        let anchor = self.screen_center();
        let world = self.screen_to_world(anchor);
        self.scale = (self.scale * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        self.translate = Position::new(anchor.x - world.x * self.scale, anchor.y - world.y * self.scale);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / self.config.zoom_step);
    }

    /// Center the bounds on screen at the current scale
    pub fn center(&mut self, bounds: &Bounds) {
        let anchor = self.screen_center();
        let world = bounds.center();
        self.translate = Position::new(anchor.x - world.x * self.scale, anchor.y - world.y * self.scale);
    }

    /// Scale and translate so the whole bounds (plus padding) is visible
    pub fn fit(&mut self, bounds: &Bounds) {
        if bounds.is_empty() {
            self.reset();
            return;
        }
        let available_w = (self.config.width - 2.0 * self.config.fit_padding).max(1.0);
        let available_h = (self.config.height - 2.0 * self.config.fit_padding).max(1.0);
        let scale_x = available_w / bounds.width().max(1.0);
        let scale_y = available_h / bounds.height().max(1.0);
        self.scale = scale_x.min(scale_y).clamp(self.config.min_zoom, self.config.max_zoom);
        self.center(bounds);
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.translate = Position::default();
    }

    /// Apply a bus command against the current layout bounds
    pub fn apply(&mut self, command: GraphCommand, bounds: &Bounds) {
        match command {
            GraphCommand::ZoomIn => self.zoom_in(),
            GraphCommand::ZoomOut => self.zoom_out(),
            GraphCommand::Center => self.center(bounds),
            GraphCommand::Fit => self.fit(bounds),
            GraphCommand::Reset => self.reset(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}
