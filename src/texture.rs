//! Images synthesized at startup: the soft point sprite, the matcap used by
//! solid meshes and the vertical environment gradient they reflect.

use cgmath::{InnerSpace, Vector3};
use image::{Rgba, RgbaImage};

use crate::point_cloud::{lerp_color, Color};

pub const SPRITE_SIZE: u32 = 64;
pub const MATCAP_SIZE: u32 = 256;
pub const ENVIRONMENT_HEIGHT: u32 = 128;

/// Radial alpha stops of the point sprite as (radius fraction, alpha).
const SPRITE_STOPS: [(f32, f32); 3] = [(0.0, 1.0), (0.4, 0.8), (1.0, 0.0)];

/// Key light direction for the matcap, in view space.
const MATCAP_LIGHT: Vector3<f32> = Vector3::new(-0.4, 0.6, 0.7);
const MATCAP_SHININESS: f32 = 32.0;

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn rgba(color: Color, alpha: f32) -> Rgba<u8> {
    Rgba([to_byte(color[0]), to_byte(color[1]), to_byte(color[2]), to_byte(alpha)])
}

/// Sprite alpha at `radius` given as a fraction of the sprite half size.
pub fn sprite_alpha(radius: f32) -> f32 {
    if radius <= 0.0 {
        return SPRITE_STOPS[0].1;
    }
    for pair in SPRITE_STOPS.windows(2) {
        let ((r0, a0), (r1, a1)) = (pair[0], pair[1]);
        if radius <= r1 {
            return a0 + (a1 - a0) * (radius - r0) / (r1 - r0);
        }
    }
    0.0
}

/// White disc whose alpha falls off radially, used to round off point quads.
pub fn circle_sprite(size: u32) -> RgbaImage {
    let half = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - half;
        let dy = y as f32 + 0.5 - half;
        let radius = (dx * dx + dy * dy).sqrt() / half;
        rgba([1.0; 3], sprite_alpha(radius))
    })
}

/// Lit sphere as seen head on. Solid meshes look up their view space normal
/// in it, so a single texture stands in for the whole lighting setup.
pub fn matcap(size: u32, base: Color, highlight: Color) -> RgbaImage {
    let light = MATCAP_LIGHT.normalize();
    let half_vector = (light + Vector3::unit_z()).normalize();
    RgbaImage::from_fn(size, size, |x, y| {
        let mut nx = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
        let mut ny = 1.0 - (y as f32 + 0.5) / size as f32 * 2.0;
        let r2 = nx * nx + ny * ny;
        // Texels past the rim repeat the silhouette normal.
        if r2 > 1.0 {
            let r = r2.sqrt();
            nx /= r;
            ny /= r;
        }
        let nz = (1.0 - nx * nx - ny * ny).max(0.0).sqrt();
        let normal = Vector3::new(nx, ny, nz);

        let diffuse = normal.dot(light).max(0.0);
        let specular = normal.dot(half_vector).max(0.0).powf(MATCAP_SHININESS);
        let shaded = lerp_color([0.0; 3], base, 0.3 + 0.7 * diffuse);
        let color = lerp_color(shaded, highlight, specular);
        rgba(color, 1.0)
    })
}

/// One texel wide strip from `top` (row 0) to `bottom` (last row).
pub fn environment_gradient(height: u32, top: Color, bottom: Color) -> RgbaImage {
    let last = height.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(1, height, |_, y| rgba(lerp_color(top, bottom, y as f32 / last), 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud::PURPLE;
    use approx::assert_relative_eq;

    #[test]
    fn sprite_alpha_hits_each_stop() {
        assert_relative_eq!(sprite_alpha(0.0), 1.0);
        assert_relative_eq!(sprite_alpha(0.4), 0.8, epsilon = 1e-6);
        assert_relative_eq!(sprite_alpha(0.2), 0.9, epsilon = 1e-6);
        assert_relative_eq!(sprite_alpha(0.7), 0.4, epsilon = 1e-6);
        assert_relative_eq!(sprite_alpha(1.0), 0.0);
        assert_relative_eq!(sprite_alpha(1.3), 0.0);
    }

    #[test]
    fn sprite_is_opaque_in_the_middle_and_clear_in_the_corners() {
        let sprite = circle_sprite(SPRITE_SIZE);
        assert_eq!(sprite.dimensions(), (64, 64));
        assert!(sprite.get_pixel(32, 32)[3] > 245);
        assert_eq!(sprite.get_pixel(0, 0)[3], 0);
        assert_eq!(sprite.get_pixel(63, 63)[3], 0);
        assert_eq!(sprite.get_pixel(32, 32)[0], 255);
    }

    #[test]
    fn sprite_alpha_never_increases_outwards() {
        let sprite = circle_sprite(SPRITE_SIZE);
        let row: Vec<u8> = (32..64).map(|x| sprite.get_pixel(x, 32)[3]).collect();
        assert!(row.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn matcap_is_brightest_towards_the_light() {
        let image = matcap(MATCAP_SIZE, PURPLE, [1.0; 3]);
        let lit = image.get_pixel(90, 60);
        let shadow = image.get_pixel(200, 220);
        let luma = |p: &Rgba<u8>| p[0] as u32 + p[1] as u32 + p[2] as u32;
        assert!(luma(lit) > luma(shadow));
        assert_eq!(image.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn highlight_peaks_along_the_half_vector() {
        let half = (MATCAP_LIGHT.normalize() + Vector3::unit_z()).normalize();
        let x = ((half.x + 1.0) / 2.0 * MATCAP_SIZE as f32) as u32;
        let y = ((1.0 - half.y) / 2.0 * MATCAP_SIZE as f32) as u32;
        let image = matcap(MATCAP_SIZE, [0.0; 3], [1.0; 3]);
        assert!(image.get_pixel(x, y)[0] > 245);
        assert!(image.get_pixel(x + 40, y + 40)[0] < 128);
    }

    #[test]
    fn gradient_runs_from_top_to_bottom() {
        let image = environment_gradient(ENVIRONMENT_HEIGHT, [1.0; 3], [0.0; 3]);
        assert_eq!(image.dimensions(), (1, ENVIRONMENT_HEIGHT));
        assert_eq!(image.get_pixel(0, 0)[0], 255);
        assert_eq!(image.get_pixel(0, ENVIRONMENT_HEIGHT - 1)[0], 0);
    }
}
