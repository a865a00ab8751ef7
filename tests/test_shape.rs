mod sphere {
    use approx::assert_abs_diff_eq;
    use glint::{bounds::Bounds, n, p, ray::Ray, shape::Shape, v};
    use pretty_assertions::assert_eq;

    #[test]
    fn intersect_from_outside() {
        let s = Shape::new_sphere(p!(0, 0, 0), 2.0);
        let ray = &mut Ray::new(p!(-5, 0, 0), v!(1, 0, 0));
        let hit = s.intersect(ray).unwrap();
        assert_eq!(ray.max_distance, 3.0);
        assert_eq!(hit.location, p!(-2, 0, 0));
        assert_eq!(hit.normal, n!(-1, 0, 0));
    }

    #[test]
    fn intersect_from_inside() {
        let s = Shape::new_sphere(p!(0, 0, 0), 2.0);
        let ray = &mut Ray::new(p!(0, 0, 0), v!(0, 1, 0));
        let hit = s.intersect(ray).unwrap();
        assert_eq!(ray.max_distance, 2.0);
        assert_eq!(hit.location, p!(0, 2, 0));
        // Geometric normal is outward; orientation is the primitive's job
        assert_eq!(hit.normal, n!(0, 1, 0));
    }

    #[test]
    fn intersect_offset_center() {
        let s = Shape::new_sphere(p!(3, 1, 0), 1.0);
        let ray = &mut Ray::new(p!(3, 5, 0), v!(0, -1, 0));
        let hit = s.intersect(ray).unwrap();
        assert_abs_diff_eq!(ray.max_distance, 3.0, epsilon = 1e-9);
        assert_eq!(hit.normal, n!(0, 1, 0));
    }

    #[test]
    fn miss() {
        let s = Shape::new_sphere(p!(0, 0, 0), 1.0);
        assert!(s.intersect(&mut Ray::new(p!(0, 3, 0), v!(1, 0, 0))).is_none());
        // Sphere behind the ray
        assert!(s.intersect(&mut Ray::new(p!(3, 0, 0), v!(1, 0, 0))).is_none());
    }

    #[test]
    fn bounds() {
        assert_eq!(
            Shape::new_sphere(p!(-2, 3, 0), 1.0).bounds(),
            Bounds::new(p!(-3, 2, -1), p!(-1, 4, 1))
        );
    }

    #[test]
    fn area() {
        let s = Shape::new_sphere(p!(0, 0, 0), 2.0);
        assert_abs_diff_eq!(s.area(), 16.0 * std::f64::consts::PI, epsilon = 1e-9);
    }
}

mod quad {
    use approx::assert_abs_diff_eq;
    use glint::{bounds::Bounds, n, p, pdf::Pdf, ray::Ray, shape::Shape, v};
    use pretty_assertions::assert_eq;

    // Unit quad in the XZ plane with an upward normal
    fn quad() -> Shape {
        Shape::new_quad(p!(0, 0, 0), v!(0, 0, 1), v!(1, 0, 0))
    }

    #[test]
    fn normal_follows_winding() {
        match quad() {
            Shape::Quad { normal, area, .. } => {
                assert_eq!(normal, n!(0, 1, 0));
                assert_eq!(area, 1.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn intersect_and_uv() {
        let q = quad();
        let ray = &mut Ray::new(p!(0.25, 2.0, 0.75), v!(0, -1, 0));
        let hit = q.intersect(ray).unwrap();
        assert_eq!(ray.max_distance, 2.0);
        assert_eq!(hit.location, p!(0.25, 0, 0.75));
        assert_eq!(hit.normal, n!(0, 1, 0));
        // u follows e1 (z axis), v follows e2 (x axis)
        assert_abs_diff_eq!(hit.uv.0, 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(hit.uv.1, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn back_face_hit_is_reported() {
        let q = quad();
        let hit = q
            .intersect(&mut Ray::new(p!(0.5, -1.0, 0.5), v!(0, 1, 0)))
            .unwrap();
        // Geometric normal unchanged; the primitive orients it
        assert_eq!(hit.normal, n!(0, 1, 0));
    }

    #[test]
    fn miss_outside_edges() {
        let q = quad();
        assert!(q
            .intersect(&mut Ray::new(p!(1.5, 1.0, 0.5), v!(0, -1, 0)))
            .is_none());
        assert!(q
            .intersect(&mut Ray::new(p!(0.5, 1.0, -0.5), v!(0, -1, 0)))
            .is_none());
        // Parallel ray
        assert!(q
            .intersect(&mut Ray::new(p!(0.5, 1.0, 0.5), v!(1, 0, 0)))
            .is_none());
    }

    #[test]
    fn bounds() {
        assert_eq!(quad().bounds(), Bounds::new(p!(0, 0, 0), p!(1, 0, 1)));
    }

    #[test]
    fn sample_matches_pdf() {
        let q = quad();
        let reference = p!(0.5, 2.0, 0.5);
        let mut sampler = glint::sampling::samplers::TileSampler::new(11);

        for _ in 0..64 {
            let sample = q.sample_from(sampler.sample_2d(), &reference);
            assert_abs_diff_eq!(sample.w_i.magnitude(), 1.0, epsilon = 1e-9);
            // The sampled point lies on the quad
            assert_abs_diff_eq!(sample.location.y(), 0.0, epsilon = 1e-9);
            let sampled_pdf = match sample.pdf {
                Pdf::NonDelta(pdf) => pdf,
                Pdf::Delta => unreachable!(),
            };
            assert!(sampled_pdf > 0.0);
            // pdf_from agrees with the density of the drawn sample
            let queried = match q.pdf_from(&reference, &sample.w_i) {
                Pdf::NonDelta(pdf) => pdf,
                Pdf::Delta => unreachable!(),
            };
            assert_abs_diff_eq!(queried, sampled_pdf, epsilon = 1e-6 * sampled_pdf.max(1.0));
        }
    }
}

mod mesh {
    use approx::assert_abs_diff_eq;
    use glint::{error::RenderError, mesh::TriangleMesh, n, p, ray::Ray, v};
    use pretty_assertions::assert_eq;

    // Unit square in the XY plane, two triangles, facing +z
    fn square() -> TriangleMesh {
        TriangleMesh::new(
            vec![p!(0, 0, 0), p!(1, 0, 0), p!(1, 1, 0), p!(0, 1, 0)],
            None,
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn intersect_both_triangles() {
        let mesh = square();
        for (x, y) in [(0.9, 0.5), (0.1, 0.9)] {
            let ray = &mut Ray::new(p!(x, y, 2.0), v!(0, 0, -1));
            let hit = mesh.intersect(ray).expect("inside the square");
            assert_eq!(ray.max_distance, 2.0);
            assert_eq!(hit.normal, n!(0, 0, 1));
            assert_abs_diff_eq!(hit.location.z(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn miss_outside() {
        let mesh = square();
        assert!(mesh
            .intersect(&mut Ray::new(p!(1.5, 0.5, 2.0), v!(0, 0, -1)))
            .is_none());
    }

    #[test]
    fn closest_face_wins() {
        // Two stacked squares; the nearer one must be reported
        let mesh = TriangleMesh::new(
            vec![
                p!(0, 0, 0),
                p!(1, 0, 0),
                p!(1, 1, 0),
                p!(0, 1, 0),
                p!(0, 0, 1),
                p!(1, 0, 1),
                p!(1, 1, 1),
                p!(0, 1, 1),
            ],
            None,
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]],
        )
        .unwrap();
        let ray = &mut Ray::new(p!(0.5, 0.5, 3.0), v!(0, 0, -1));
        mesh.intersect(ray).unwrap();
        assert_abs_diff_eq!(ray.max_distance, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn interpolates_vertex_normals() {
        let tilted = v!(1, 0, 1).normalized();
        let mesh = TriangleMesh::new(
            vec![p!(0, 0, 0), p!(1, 0, 0), p!(0, 1, 0)],
            Some(vec![
                n!(0, 0, 1),
                glint::geometry::normal::Normal::from(tilted),
                n!(0, 0, 1),
            ]),
            vec![[0, 1, 2]],
        )
        .unwrap();

        // Near vertex 1 the normal leans towards its vertex normal
        let hit = mesh
            .intersect(&mut Ray::new(p!(0.9, 0.05, 2.0), v!(0, 0, -1)))
            .unwrap();
        assert!(hit.normal.x() > 0.5);

        // Near vertex 0 it stays close to +z
        let hit = mesh
            .intersect(&mut Ray::new(p!(0.05, 0.05, 2.0), v!(0, 0, -1)))
            .unwrap();
        assert!(hit.normal.z() > 0.95);
    }

    #[test]
    fn area_is_summed() {
        assert_abs_diff_eq!(square().area(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_bad_indices() {
        let result = TriangleMesh::new(vec![p!(0, 0, 0), p!(1, 0, 0)], None, vec![[0, 1, 2]]);
        assert!(matches!(result, Err(RenderError::InvalidMesh(_))));
    }

    #[test]
    fn rejects_mismatched_normals() {
        let result = TriangleMesh::new(
            vec![p!(0, 0, 0), p!(1, 0, 0), p!(0, 1, 0)],
            Some(vec![n!(0, 0, 1)]),
            vec![[0, 1, 2]],
        );
        assert!(matches!(result, Err(RenderError::InvalidMesh(_))));
    }

    #[test]
    fn many_faces_build_a_deep_bvh() {
        // A z-facing grid of quads, enough to force several BVH levels
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for i in 0..16 {
            for j in 0..16 {
                let base = vertices.len();
                let (x, y) = (i as f64 * 2.0, j as f64 * 2.0);
                vertices.push(p!(x, y, 0));
                vertices.push(p!(x + 1.0, y, 0));
                vertices.push(p!(x + 1.0, y + 1.0, 0));
                vertices.push(p!(x, y + 1.0, 0));
                faces.push([base, base + 1, base + 2]);
                faces.push([base, base + 2, base + 3]);
            }
        }
        let mesh = TriangleMesh::new(vertices, None, faces).unwrap();

        // Hit the middle of an arbitrary cell
        let ray = &mut Ray::new(p!(10.3, 6.4, 5.0), v!(0, 0, -1));
        let hit = mesh.intersect(ray).unwrap();
        assert_abs_diff_eq!(ray.max_distance, 5.0, epsilon = 1e-9);
        assert_eq!(hit.normal, n!(0, 0, 1));

        // A gap between cells misses
        assert!(mesh
            .intersect(&mut Ray::new(p!(1.5, 0.5, 5.0), v!(0, 0, -1)))
            .is_none());
    }
}
