use serde::Serialize;

use crate::model::{Position, Team};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Running min/max accumulator over box corners.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Extent {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Extent {
    pub fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, rect: Rect) {
        self.min_x = self.min_x.min(rect.x);
        self.min_y = self.min_y.min(rect.y);
        self.max_x = self.max_x.max(rect.right());
        self.max_y = self.max_y.max(rect.bottom());
    }

    pub fn to_rect(self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        ))
    }
}

/// One position write produced by an alignment pass. The caller applies it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionUpdate {
    pub team: String,
    pub from: Position,
    pub to: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingKind {
    ValueStream,
    Platform,
}

/// Transient named cluster of teams. Members borrow from the owning team list.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    pub name: String,
    pub kind: GroupingKind,
    pub teams: Vec<&'a Team>,
}

#[derive(Debug, Clone)]
pub struct InnerGrouping<'a> {
    pub name: String,
    pub parent: String,
    pub teams: Vec<&'a Team>,
}

/// Pan/zoom applied when drawing: `screen = world * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Position,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Position::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
