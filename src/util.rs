use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

/// Plain serializable position handed to renderers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<Point> for Vec2 {
    fn from(value: Point) -> Self {
        vec2(value.x, value.y)
    }
}

/// Deterministic unit vector for separating two coincident points.
pub fn fallback_direction(first: usize, second: usize) -> Vec2 {
    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214 + 0.11) * TAU;
    vec2(angle.cos(), angle.sin())
}

/// Truncates `text` to `max_chars` characters, marking the cut with an ellipsis.
pub fn short_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut shortened = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

pub fn is_finite_vec(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}
