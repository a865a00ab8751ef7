use std::sync::Arc;

use crate::{
    color::Color,
    geometry::{normal::Normal, point::Point, vector::Vector},
    material::Material,
    primitive::Primitive,
};

/// A hit on a bare shape. The normal is the geometric surface normal as
/// defined by the shape (outward for spheres, per winding for polygons); it
/// has not been oriented against the ray yet.
#[derive(Debug, PartialEq)]
pub struct ShapeIntersection {
    pub location: Point,
    pub normal: Normal,
    pub uv: (f64, f64),
}

/// A hit on a primitive in the scene. The normal is oriented against the
/// incoming ray; `front_face` records whether it still equals the outward
/// geometric normal.
pub struct PrimitiveIntersection {
    pub distance: f64,
    pub location: Point,
    pub normal: Normal,
    pub front_face: bool,
    pub uv: (f64, f64),
    pub primitive: Arc<Primitive>,
}

impl PrimitiveIntersection {
    pub fn material(&self) -> &Material {
        &self.primitive.material
    }

    /// Radiance emitted at this hit towards `w_o`. Zero for back-face hits.
    #[allow(non_snake_case)]
    pub fn Le(&self, w_o: &Vector) -> Color {
        if let Some(light) = &self.primitive.area_light {
            light.L(self, w_o)
        } else {
            self.primitive.material.emission(self)
        }
    }
}
