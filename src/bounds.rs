use std::{iter::Sum, ops::Add};

use crate::{
    constants::RAY_EPSILON,
    geometry::{point::Point, vector::Vector, Axis, AXES},
    ray::Ray,
};

/// An axis aligned bounding box with `min <= max` componentwise.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// The identity for union: contains nothing, expands to anything.
    pub const EMPTY: Bounds = Bounds {
        min: Point(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        max: Point(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    pub fn new(a: Point, b: Point) -> Bounds {
        Bounds {
            min: a.min(&b),
            max: a.max(&b),
        }
    }

    pub fn centroid(&self) -> Point {
        self.min + (self.max - self.min) * 0.5
    }

    pub fn diagonal(&self) -> Vector {
        self.max - self.min
    }

    pub fn surface_area(&self) -> f64 {
        let d = self.diagonal();
        if d.x() < 0.0 {
            return 0.0;
        }
        2.0 * (d.x() * d.y() + d.y() * d.z() + d.z() * d.x())
    }

    /// The axis along which the bounds extend the furthest.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        let mut axis = Axis::X;
        for a in AXES {
            if d[a] > d[axis] {
                axis = a;
            }
        }
        axis
    }

    /// The position of `p` relative to the corners, (0,0,0) at min and
    /// (1,1,1) at max.
    pub fn offset(&self, p: &Point) -> Vector {
        let d = self.diagonal();
        let o = *p - self.min;
        Vector(
            if d.x() > 0.0 { o.x() / d.x() } else { 0.0 },
            if d.y() > 0.0 { o.y() / d.y() } else { 0.0 },
            if d.z() > 0.0 { o.z() / d.z() } else { 0.0 },
        )
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x() >= self.min.x()
            && p.x() <= self.max.x()
            && p.y() >= self.min.y()
            && p.y() <= self.max.y()
            && p.z() >= self.min.z()
            && p.z() <= self.max.z()
    }

    /// Slab test. Returns the distance at which the ray enters the bounds,
    /// or the exit distance when the origin is inside.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let inv = Vector(
            1.0 / ray.direction.x(),
            1.0 / ray.direction.y(),
            1.0 / ray.direction.z(),
        );
        self.intersect_inv(&ray.origin, &inv, ray.max_distance)
            .map(|(t0, t1)| if t0 > RAY_EPSILON { t0 } else { t1 })
    }

    /// Slab test with a precomputed reciprocal direction, as used by BVH
    /// traversal. Returns the (entry, exit) distances, entry clamped to 0.
    pub fn intersect_inv(
        &self,
        origin: &Point,
        inv_direction: &Vector,
        max_distance: f64,
    ) -> Option<(f64, f64)> {
        let mut t0: f64 = 0.0;
        let mut t1 = max_distance;
        for axis in AXES {
            let inv = inv_direction[axis];
            let mut near = (self.min[axis] - origin[axis]) * inv;
            let mut far = (self.max[axis] - origin[axis]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            // f64::min/max ignore a NaN operand, which handles the
            // 0 * infinity case when the origin lies on a slab plane
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

impl Add for Bounds {
    type Output = Bounds;

    fn add(self, rhs: Self) -> Self::Output {
        Bounds {
            min: self.min.min(&rhs.min),
            max: self.max.max(&rhs.max),
        }
    }
}

impl Sum for Bounds {
    fn sum<I: Iterator<Item = Bounds>>(iter: I) -> Bounds {
        iter.fold(Bounds::EMPTY, |acc, b| acc + b)
    }
}
