//! Sampling rules shared by every shape generator.
//!
//! All random rules are generic over [`rand::Rng`] so callers can pass either
//! an entropy seeded generator or a fixed seed for reproducible output.

use rand::Rng;
use std::f32::consts::TAU;

/// World axis, used to pick which coordinate a face or disk holds fixed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Builds a point whose `self` coordinate is `fixed` and whose two remaining
    /// coordinates are `u` and `v`, in x-y-z order.
    pub fn compose(self, fixed: f32, u: f32, v: f32) -> [f32; 3] {
        match self {
            Axis::X => [fixed, u, v],
            Axis::Y => [u, fixed, v],
            Axis::Z => [u, v, fixed],
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two axes that span a face perpendicular to `self`, in x-y-z order.
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

/// Uniform value in `[-half_extent, half_extent)`.
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_extent: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * 2.0 * half_extent
}

/// Small lateral offset in `[-amount / 2, amount / 2)` for thick-line looks.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * amount
}

/// Axis aligned box given by its center and half extents.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisBox {
    pub center: [f32; 3],
    pub half: [f32; 3],
}

impl AxisBox {
    pub fn new(center: [f32; 3], half: [f32; 3]) -> Self {
        Self { center, half }
    }

    /// Uniform point on the face perpendicular to `axis`, on the `sign` side.
    pub fn face_point<R: Rng + ?Sized>(&self, rng: &mut R, axis: Axis, sign: f32) -> [f32; 3] {
        let (a, b) = axis.others();
        let u = self.center[a.index()] + symmetric(rng, self.half[a.index()]);
        let v = self.center[b.index()] + symmetric(rng, self.half[b.index()]);
        let fixed = self.center[axis.index()] + sign * self.half[axis.index()];
        axis.compose(fixed, u, v)
    }

    /// The 12 edges as start/end pairs: four along x, four along y, four along z.
    pub fn edges(&self) -> [([f32; 3], [f32; 3]); 12] {
        let [cx, cy, cz] = self.center;
        let [hx, hy, hz] = self.half;
        let (x0, x1) = (cx - hx, cx + hx);
        let (y0, y1) = (cy - hy, cy + hy);
        let (z0, z1) = (cz - hz, cz + hz);
        [
            ([x0, y0, z0], [x1, y0, z0]),
            ([x0, y1, z0], [x1, y1, z0]),
            ([x0, y0, z1], [x1, y0, z1]),
            ([x0, y1, z1], [x1, y1, z1]),
            ([x0, y0, z0], [x0, y1, z0]),
            ([x1, y0, z0], [x1, y1, z0]),
            ([x0, y0, z1], [x0, y1, z1]),
            ([x1, y0, z1], [x1, y1, z1]),
            ([x0, y0, z0], [x0, y0, z1]),
            ([x1, y0, z0], [x1, y0, z1]),
            ([x0, y1, z0], [x0, y1, z1]),
            ([x1, y1, z0], [x1, y1, z1]),
        ]
    }
}

/// Faces of a box in generation order: +Z, -Z, +Y, -Y, +X, -X.
pub const BOX_FACES: [(Axis, f32); 6] = [
    (Axis::Z, 1.0),
    (Axis::Z, -1.0),
    (Axis::Y, 1.0),
    (Axis::Y, -1.0),
    (Axis::X, 1.0),
    (Axis::X, -1.0),
];

/// `steps + 1` evenly spaced points from `start` to `end`, both included.
/// Yields the sweep fraction alongside each point.
pub fn segment(start: [f32; 3], end: [f32; 3], steps: usize) -> impl Iterator<Item = (f32, [f32; 3])> {
    let steps = steps.max(1);
    (0..=steps).map(move |i| {
        let t = i as f32 / steps as f32;
        (
            t,
            [
                start[0] + (end[0] - start[0]) * t,
                start[1] + (end[1] - start[1]) * t,
                start[2] + (end[2] - start[2]) * t,
            ],
        )
    })
}

/// Area-uniform point inside a disk of `radius`, as in-plane offsets `(u, v)`.
///
/// The radius is `sqrt(random) * R`; a plain `random * R` would crowd the center.
pub fn disk<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> (f32, f32) {
    let r = rng.gen::<f32>().sqrt() * radius;
    let angle = rng.gen::<f32>() * TAU;
    (angle.cos() * r, angle.sin() * r)
}

/// `count` evenly spaced offsets around a circle, starting at angle zero.
pub fn ring(radius: f32, count: usize) -> impl Iterator<Item = (f32, f32)> {
    (0..count).map(move |j| {
        let angle = j as f32 / count as f32 * TAU;
        (angle.cos() * radius, angle.sin() * radius)
    })
}

/// `count` evenly spaced sweep parameters from 0 to 1 inclusive.
pub fn sweep(count: usize) -> impl Iterator<Item = f32> {
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count).map(move |i| i as f32 / last)
}
