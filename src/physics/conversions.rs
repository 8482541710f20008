use cgmath::Vector2;
use rapier2d::prelude::{Point, Real, Vector};

use crate::data_structures::octree::Aabb;

pub fn to_rapier_vec(v: Vector2<f32>) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

pub fn to_rapier_point(v: Vector2<f32>) -> Point<Real> {
    Point::new(v.x, v.y)
}

pub fn from_rapier_vec(v: &Vector<Real>) -> Vector2<f32> {
    Vector2::new(v.x, v.y)
}

pub fn from_rapier_point(p: &Point<Real>) -> Vector2<f32> {
    Vector2::new(p.x, p.y)
}

pub fn from_rapier_aabb(aabb: &rapier2d::parry::bounding_volume::Aabb) -> Aabb {
    Aabb::new(from_rapier_point(&aabb.mins), from_rapier_point(&aabb.maxs))
}

/// Rapier's debug colours are HSLA with hue in degrees.
pub fn hsla_to_rgba([h, s, l, a]: [f32; 4]) -> [f32; 4] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m, a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsla_primaries() {
        assert_eq!(hsla_to_rgba([0.0, 1.0, 0.5, 1.0]), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hsla_to_rgba([120.0, 1.0, 0.5, 1.0]), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hsla_to_rgba([240.0, 1.0, 0.5, 0.5]), [0.0, 0.0, 1.0, 0.5]);
    }

    #[test]
    fn hsla_grey_has_no_saturation() {
        let [r, g, b, _] = hsla_to_rgba([42.0, 0.0, 0.25, 1.0]);
        assert_eq!((r, g, b), (0.25, 0.25, 0.25));
    }
}
