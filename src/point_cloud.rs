//! # Point Cloud Module
//!
//! Positions and colors of a generated shape, stored as two parallel flat
//! buffers the same way they are handed to the GPU: point `i` lives at
//! `positions[3i..3i + 3]` and `colors[3i..3i + 3]`.
//!
//! Clouds are built once per mount and never grow after generation; the
//! renderer only ever borrows them.

use crate::model_point::PointVertex;

/// Linear RGB with every component in `[0, 1]`.
pub type Color = [f32; 3];

pub const BLACK: Color = [0.05, 0.05, 0.05];
pub const PURPLE: Color = [0.545, 0.231, 0.741];

/// `a + (b - a) * t`, with `t` used as given.
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Same as [`lerp_color`] but with `t` clamped to `[0, 1]` first.
pub fn lerp_color_clamped(a: Color, b: Color, t: f32) -> Color {
    lerp_color(a, b, t.clamp(0.0, 1.0))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(points * 3),
            colors: Vec::with_capacity(points * 3),
        }
    }

    pub fn push(&mut self, position: [f32; 3], color: Color) {
        debug_assert!(
            color.iter().all(|c| (0.0..=1.0).contains(c)),
            "color component out of range: {color:?}"
        );
        self.positions.extend_from_slice(&position);
        self.colors.extend_from_slice(&color);
    }

    /// Appends every point of `other`, keeping its order.
    pub fn extend(&mut self, other: &PointCloud) {
        self.positions.extend_from_slice(&other.positions);
        self.colors.extend_from_slice(&other.colors);
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn color(&self, index: usize) -> Color {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }

    pub fn iter(&self) -> impl Iterator<Item = ([f32; 3], Color)> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.colors.chunks_exact(3))
            .map(|(p, c)| ([p[0], p[1], p[2]], [c[0], c[1], c[2]]))
    }

    /// Converts the cloud into GPU vertices that all share one point size.
    pub fn to_vertices(&self, size: f32) -> Vec<PointVertex> {
        self.iter()
            .map(|(position, color)| PointVertex {
                position,
                color,
                size,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_buffers_index_aligned() {
        let mut cloud = PointCloud::new();
        cloud.push([1.0, 2.0, 3.0], BLACK);
        cloud.push([-1.0, 0.5, 9.0], PURPLE);

        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.positions().len(), cloud.colors().len());
        assert_eq!(cloud.position(1), [-1.0, 0.5, 9.0]);
        assert_eq!(cloud.color(1), PURPLE);
    }

    #[test]
    fn extend_appends_in_order() {
        let mut a = PointCloud::new();
        a.push([0.0; 3], BLACK);
        let mut b = PointCloud::new();
        b.push([1.0; 3], PURPLE);

        a.extend(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.color(0), BLACK);
        assert_eq!(a.color(1), PURPLE);
    }

    #[test]
    fn lerp_color_endpoints_and_midpoint() {
        assert_eq!(lerp_color(BLACK, PURPLE, 0.0), BLACK);
        assert_eq!(lerp_color(BLACK, PURPLE, 1.0), PURPLE);
        let mid = lerp_color([0.0; 3], [1.0; 3], 0.5);
        assert_eq!(mid, [0.5; 3]);
    }

    #[test]
    fn clamped_lerp_never_leaves_the_endpoints() {
        assert_eq!(lerp_color_clamped(BLACK, PURPLE, 1.7), PURPLE);
        assert_eq!(lerp_color_clamped(BLACK, PURPLE, -0.3), BLACK);
    }

    #[test]
    fn vertices_carry_position_color_and_size() {
        let mut cloud = PointCloud::new();
        cloud.push([1.0, 2.0, 3.0], PURPLE);
        let vertices = cloud.to_vertices(0.07);
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].color, PURPLE);
        assert_eq!(vertices[0].size, 0.07);
    }
}
