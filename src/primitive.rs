use std::sync::Arc;

use crate::{
    bounds::Bounds,
    geometry::traits::DotProduct,
    intersection::PrimitiveIntersection,
    light::Light,
    material::Material,
    ray::Ray,
    shape::Shape,
};

/// A shape paired with its material and, for emitters, the area light that
/// shares the shape.
#[derive(Debug)]
pub struct Primitive {
    pub shape: Arc<Shape>,
    pub material: Arc<Material>,
    pub area_light: Option<Arc<Light>>,
}

impl Primitive {
    pub fn new(
        shape: Arc<Shape>,
        material: Arc<Material>,
        area_light: Option<Arc<Light>>,
    ) -> Primitive {
        Primitive {
            shape,
            material,
            area_light,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.shape.bounds()
    }

    pub fn get_area_light(&self) -> Option<&Arc<Light>> {
        self.area_light.as_ref()
    }

    // Should update the ray's max_distance if an intersection is found
    pub fn intersect(self: &Arc<Self>, ray: &mut Ray) -> Option<PrimitiveIntersection> {
        let intersection = self.shape.intersect(ray)?;
        let front_face = intersection.normal.dot(&ray.direction) < 0.0;
        Some(PrimitiveIntersection {
            distance: ray.max_distance,
            location: intersection.location,
            normal: if front_face {
                intersection.normal
            } else {
                -intersection.normal
            },
            front_face,
            uv: intersection.uv,
            primitive: Arc::clone(self),
        })
    }
}
