use crate::{
    bounds::Bounds,
    error::RenderError,
    geometry::{normal::Normal, point::Point, traits::DotProduct, vector::Vector, Axis},
    intersection::ShapeIntersection,
    ray::Ray,
    pdf::Pdf,
    sampling::samplers::Sample2d,
    shape::ShapeSample,
};

const MAX_FACES_PER_LEAF: usize = 4;
const TRAVERSAL_STACK_SIZE: usize = 64;

/// An indexed triangle mesh. Faces refer into the vertex (and optional
/// normal) arrays by index; an internal flat BVH over the faces accelerates
/// intersection.
#[derive(Debug)]
pub struct TriangleMesh {
    vertices: Vec<Point>,
    normals: Option<Vec<Normal>>,
    faces: Vec<[usize; 3]>,
    nodes: Vec<MeshNode>,
    // Face indices, reordered so every leaf covers a contiguous range
    ordered_faces: Vec<usize>,
    area_cdf: Vec<f64>,
    total_area: f64,
    bounds: Bounds,
}

#[derive(Debug)]
enum MeshNode {
    // The left child is the node immediately after the interior node
    Interior {
        bounds: Bounds,
        right_child: usize,
        split_axis: Axis,
    },
    Leaf {
        bounds: Bounds,
        start: usize,
        count: usize,
    },
}

struct FaceInfo {
    face: usize,
    bounds: Bounds,
    centroid: Point,
}

impl TriangleMesh {
    pub fn new(
        vertices: Vec<Point>,
        normals: Option<Vec<Normal>>,
        faces: Vec<[usize; 3]>,
    ) -> Result<TriangleMesh, RenderError> {
        if faces.is_empty() {
            return Err(RenderError::InvalidMesh("mesh has no faces".to_string()));
        }
        if let Some(normals) = &normals {
            if normals.len() != vertices.len() {
                return Err(RenderError::InvalidMesh(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    vertices.len()
                )));
            }
        }
        for (i, face) in faces.iter().enumerate() {
            for &v in face {
                if v >= vertices.len() {
                    return Err(RenderError::InvalidMesh(format!(
                        "face {} refers to vertex {} but the mesh has {}",
                        i,
                        v,
                        vertices.len()
                    )));
                }
            }
        }

        let mut mesh = TriangleMesh {
            vertices,
            normals,
            faces,
            nodes: Vec::new(),
            ordered_faces: Vec::new(),
            area_cdf: Vec::new(),
            total_area: 0.0,
            bounds: Bounds::EMPTY,
        };

        let mut face_infos: Vec<FaceInfo> = (0..mesh.faces.len())
            .map(|f| {
                let [v0, v1, v2] = mesh.face_vertices(f);
                let bounds = Bounds::new(v0, v1) + Bounds::new(v2, v2);
                FaceInfo {
                    face: f,
                    bounds,
                    centroid: bounds.centroid(),
                }
            })
            .collect();
        mesh.bounds = face_infos.iter().map(|f| f.bounds).sum();
        mesh.build_node(&mut face_infos);

        let mut running = 0.0;
        for f in 0..mesh.faces.len() {
            running += mesh.face_area(f);
            mesh.area_cdf.push(running);
        }
        mesh.total_area = running;

        Ok(mesh)
    }

    fn face_vertices(&self, face: usize) -> [Point; 3] {
        let [i0, i1, i2] = self.faces[face];
        [self.vertices[i0], self.vertices[i1], self.vertices[i2]]
    }

    fn face_area(&self, face: usize) -> f64 {
        let [v0, v1, v2] = self.face_vertices(face);
        (v1 - v0).cross(&(v2 - v0)).magnitude() * 0.5
    }

    /// Builds the subtree for `face_infos` and returns its node index.
    fn build_node(&mut self, face_infos: &mut [FaceInfo]) -> usize {
        let bounds: Bounds = face_infos.iter().map(|f| f.bounds).sum();

        if face_infos.len() <= MAX_FACES_PER_LEAF {
            return self.push_leaf(bounds, face_infos);
        }

        let centroid_bounds: Bounds = face_infos
            .iter()
            .map(|f| Bounds::new(f.centroid, f.centroid))
            .sum();
        let split_axis = centroid_bounds.maximum_extent();
        if centroid_bounds.min[split_axis] == centroid_bounds.max[split_axis] {
            return self.push_leaf(bounds, face_infos);
        }

        let mid = (face_infos.len() - 1) / 2;
        // Ties in centroid co-ordinate fall back to the face index so the
        // tree does not depend on the incoming order
        face_infos.select_nth_unstable_by(mid, |a, b| {
            a.centroid[split_axis]
                .total_cmp(&b.centroid[split_axis])
                .then(a.face.cmp(&b.face))
        });
        let (left, right) = face_infos.split_at_mut(mid + 1);

        let index = self.nodes.len();
        self.nodes.push(MeshNode::Interior {
            bounds,
            right_child: 0,
            split_axis,
        });
        self.build_node(left);
        let right_child = self.build_node(right);
        match &mut self.nodes[index] {
            MeshNode::Interior {
                right_child: slot, ..
            } => *slot = right_child,
            MeshNode::Leaf { .. } => unreachable!(),
        }
        index
    }

    fn push_leaf(&mut self, bounds: Bounds, face_infos: &[FaceInfo]) -> usize {
        let start = self.ordered_faces.len();
        self.ordered_faces.extend(face_infos.iter().map(|f| f.face));
        let index = self.nodes.len();
        self.nodes.push(MeshNode::Leaf {
            bounds,
            start,
            count: face_infos.len(),
        });
        index
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn area(&self) -> f64 {
        self.total_area
    }

    pub fn intersect(&self, ray: &mut Ray) -> Option<ShapeIntersection> {
        let inv_direction = Vector(
            1.0 / ray.direction.x(),
            1.0 / ray.direction.y(),
            1.0 / ray.direction.z(),
        );

        let mut stack = [0usize; TRAVERSAL_STACK_SIZE];
        let mut stack_len = 1;
        let mut closest: Option<ShapeIntersection> = None;

        while stack_len > 0 {
            stack_len -= 1;
            let node = &self.nodes[stack[stack_len]];
            let bounds = match node {
                MeshNode::Interior { bounds, .. } => bounds,
                MeshNode::Leaf { bounds, .. } => bounds,
            };
            if bounds
                .intersect_inv(&ray.origin, &inv_direction, ray.max_distance)
                .is_none()
            {
                continue;
            }

            match node {
                MeshNode::Leaf { start, count, .. } => {
                    for &face in &self.ordered_faces[*start..*start + *count] {
                        if let Some(hit) = self.intersect_face(face, ray) {
                            closest = Some(hit);
                        }
                    }
                }
                MeshNode::Interior {
                    right_child,
                    split_axis,
                    ..
                } => {
                    let left_child = stack[stack_len] + 1;
                    // Descend the near child first so the far child can be
                    // pruned against the tightened max_distance
                    let (near, far) = if ray.direction[*split_axis] < 0.0 {
                        (*right_child, left_child)
                    } else {
                        (left_child, *right_child)
                    };
                    stack[stack_len] = far;
                    stack[stack_len + 1] = near;
                    stack_len += 2;
                }
            }
        }

        closest
    }

    // Möller-Trumbore, http://www.graphics.cornell.edu/pubs/1997/MT97.pdf.
    // Back-face hits are reported; orientation is the material's concern.
    #[allow(non_snake_case)]
    fn intersect_face(&self, face: usize, ray: &mut Ray) -> Option<ShapeIntersection> {
        let [v0, v1, v2] = self.face_vertices(face);
        let e1 = v1 - v0;
        let e2 = v2 - v0;

        let P = ray.direction.cross(&e2);
        let denominator = P.dot(&e1);
        if denominator.abs() < 1e-12 {
            return None;
        }

        let T = ray.origin - v0;
        let inv_denominator = 1.0 / denominator;
        let u = P.dot(&T) * inv_denominator;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let Q = T.cross(&e1);
        let v = Q.dot(&ray.direction) * inv_denominator;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = Q.dot(&e2) * inv_denominator;
        let location = ray.update_max_distance(distance)?;
        Some(ShapeIntersection {
            location,
            normal: self.face_normal(face, u, v),
            uv: (u, v),
        })
    }

    fn face_normal(&self, face: usize, u: f64, v: f64) -> Normal {
        match &self.normals {
            Some(normals) => {
                let [i0, i1, i2] = self.faces[face];
                let n0: Vector = normals[i0].into();
                let n1: Vector = normals[i1].into();
                let n2: Vector = normals[i2].into();
                Normal::from((n0 * (1.0 - u - v) + n1 * u + n2 * v).normalized())
            }
            None => {
                let [v0, v1, v2] = self.face_vertices(face);
                Normal::from((v1 - v0).cross(&(v2 - v0)).normalized())
            }
        }
    }

    /// Picks a face proportional to area, remapping the sample so it stays
    /// uniform within the chosen face.
    fn sample_face(&self, u: f64) -> (usize, f64) {
        let target = u * self.total_area;
        let face = self
            .area_cdf
            .partition_point(|&cumulative| cumulative <= target)
            .min(self.faces.len() - 1);
        let low = if face == 0 { 0.0 } else { self.area_cdf[face - 1] };
        let width = self.area_cdf[face] - low;
        let remapped = if width > 0.0 {
            ((target - low) / width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (face, remapped)
    }

    pub fn sample_point(&self, sample: Sample2d) -> (Point, Normal, f64) {
        let (s, t) = sample.take();
        let (face, s) = self.sample_face(s);
        let (b0, b1) = sample_triangle_barycentrics(s, t);
        let [v0, v1, v2] = self.face_vertices(face);
        let location = v0 + (v1 - v0) * b0 + (v2 - v0) * b1;
        (
            location,
            self.face_normal(face, b0, b1),
            1.0 / self.total_area,
        )
    }

    pub fn sample_from(&self, sample: Sample2d, reference: &Point) -> ShapeSample {
        let (location, normal, area_pdf) = self.sample_point(sample);
        let d = location - *reference;
        let dist_squared = d.magnitude_squared();
        let w_i = d / dist_squared.sqrt();
        let cos_theta = normal.dot(&w_i).abs();
        let pdf = if cos_theta < 1e-12 {
            0.0
        } else {
            dist_squared * area_pdf / cos_theta
        };
        ShapeSample {
            location,
            normal,
            w_i,
            pdf: Pdf::NonDelta(pdf),
        }
    }
}

// Same mapping as sampling_fns::sample_triangle, on raw values because the
// face-selection remap has already consumed the Sample2d.
fn sample_triangle_barycentrics(s: f64, t: f64) -> (f64, f64) {
    let su = s.sqrt();
    (1.0 - su, t * su)
}
