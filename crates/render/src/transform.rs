use geom::{cross, m4, v3};

/// Depth range produced by [`viewport`], matching 8-bit depth images.
pub const DEPTH: f64 = 255.0;

/// The camera state of one frame. Vertex shaders map object-space positions
/// to screen space with `viewport * projection * model_view`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transform {
    pub model_view: m4,
    pub projection: m4,
    pub viewport: m4,
}

impl Default for Transform {
    fn default() -> Transform {
        Transform { model_view: m4::IDENTITY, projection: m4::IDENTITY, viewport: m4::IDENTITY }
    }
}

impl Transform {
    /// A perspective camera at `eye` looking at `center`, drawing into `rect`
    /// (`[x, y, w, h]` in pixels).
    pub fn camera(eye: v3, center: v3, up: v3, rect: [f64; 4]) -> Transform {
        let [x, y, w, h] = rect;
        Transform {
            model_view: look_at(eye, center, up),
            projection: projection(-1.0 / (eye - center).norm()),
            viewport: viewport(x, y, w, h),
        }
    }

    /// Object space to homogeneous screen space.
    pub fn to_screen(&self) -> m4 {
        self.viewport * self.projection * self.model_view
    }

    /// Object space to clip space, the frame in which shaders light surfaces.
    pub fn to_clip(&self) -> m4 {
        self.projection * self.model_view
    }
}

/// Camera basis with `z` along `eye - center`, followed by a shift of
/// `center` to the origin.
pub fn look_at(eye: v3, center: v3, up: v3) -> m4 {
    let z = (eye - center).to_unit();
    let x = cross(up, z).to_unit();
    let y = cross(z, x).to_unit();
    let mut basis = m4::IDENTITY;
    let mut shift = m4::IDENTITY;
    for i in 0..3 {
        basis[[0, i]] = x.xyz()[i];
        basis[[1, i]] = y.xyz()[i];
        basis[[2, i]] = z.xyz()[i];
        shift[[i, 3]] = -center.xyz()[i];
    }
    basis * shift
}

/// Maps the `[-1, 1]` cube onto `[x, x + w] x [y, y + h] x [0, DEPTH]`.
pub fn viewport(x: f64, y: f64, w: f64, h: f64) -> m4 {
    let mut m = m4::IDENTITY;
    m[[0, 3]] = x + w / 2.0;
    m[[1, 3]] = y + h / 2.0;
    m[[2, 3]] = DEPTH / 2.0;

    m[[0, 0]] = w / 2.0;
    m[[1, 1]] = h / 2.0;
    m[[2, 2]] = DEPTH / 2.0;
    m
}

/// Central projection: `w` becomes `1 + coeff * z`. Use `coeff = -1 / distance`
/// for a camera `distance` away from the origin.
pub fn projection(coeff: f64) -> m4 {
    let mut m = m4::IDENTITY;
    m[[3, 2]] = coeff;
    m
}

#[test]
fn test_look_at_from_z_axis_is_identity() {
    let m = look_at(v3(0.0, 0.0, 1.0), v3::ZERO, v3(0.0, 1.0, 0.0));
    assert_eq!(m, m4::IDENTITY);
}

#[test]
fn test_look_at_moves_center_to_origin() {
    let eye = v3(1.0, 5.0, 3.0);
    let center = v3(1.0, 2.0, 3.0);
    let m = look_at(eye, center, v3(0.0, 0.0, 1.0));
    let c = m.transform_point(center);
    assert!(c.norm() < 1e-12, "{c}");
    // The eye ends up on the positive z axis, at its distance from the center.
    let e = m.transform_point(eye);
    assert!((e - v3(0.0, 0.0, 3.0)).norm() < 1e-12, "{e}");
}

#[test]
fn test_viewport_maps_clip_cube() {
    let m = viewport(10.0, 20.0, 100.0, 50.0);
    assert_eq!(m.transform_point(v3(-1.0, -1.0, -1.0)), v3(10.0, 20.0, 0.0));
    assert_eq!(m.transform_point(v3(1.0, 1.0, 1.0)), v3(110.0, 70.0, DEPTH));
    assert_eq!(m.transform_point(v3::ZERO), v3(60.0, 45.0, DEPTH / 2.0));
}

#[test]
fn test_projection_sets_w() {
    let m = projection(-0.25);
    let p = m * v3(1.0, 2.0, 2.0).extend(1.0);
    assert_eq!(p.w, 0.5);
    assert_eq!(p.homogenize(), v3(2.0, 4.0, 4.0));
    // Farther points shrink.
    let far = (m * v3(1.0, 2.0, -2.0).extend(1.0)).homogenize();
    assert!(far.x < 1.0);
}
