use geom::{cross, v2, v3, v4};

use crate::{shader::Shader, Frame};

/// Twice-area (in square pixels) below which a triangle is treated as
/// degenerate. Also bounds `|w|`, per vertex and interpolated, before the
/// perspective divide.
pub const DEGENERATE_EPS: f64 = 1e-2;

/// Barycentric weights of `p` with respect to the screen-space triangle
/// `pts`. `None` for zero-area triangles.
pub fn barycentric(pts: [v2; 3], p: v2) -> Option<v3> {
    let [a, b, c] = pts;
    let ab = b - a;
    let ac = c - a;
    let pa = a - p;
    let u = cross(v3(ab.x, ac.x, pa.x), v3(ab.y, ac.y, pa.y));
    if u.z.abs() < DEGENERATE_EPS {
        return None;
    }
    Some(v3(1.0 - (u.x + u.y) / u.z, u.x / u.z, u.y / u.z))
}

/// Inclusive pixel bounds of the triangle, clipped to the frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundingBox {
    pub min: [u32; 2],
    pub max: [u32; 2],
}

impl BoundingBox {
    /// `None` when the triangle does not touch any pixel of a `dim` frame.
    pub fn clipped(pts: [v2; 3], dim: [u32; 2]) -> Option<BoundingBox> {
        let mut min = [0; 2];
        let mut max = [0; 2];
        for axis in 0..2 {
            let coords = pts.map(|p| if axis == 0 { p.x } else { p.y });
            let lo = coords.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0);
            let hi = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max).floor();
            let hi = hi.min(dim[axis] as f64 - 1.0);
            if !(lo <= hi) {
                return None;
            }
            min[axis] = lo as u32;
            max[axis] = hi as u32;
        }
        Some(BoundingBox { min, max })
    }

    pub fn contains(&self, [x, y]: [u32; 2]) -> bool {
        self.min[0] <= x && x <= self.max[0] && self.min[1] <= y && y <= self.max[1]
    }
}

/// Fills one triangle given in homogeneous screen space.
///
/// Pixels are sampled at their integer coordinates. A pixel is written when
/// the sample is inside the triangle (edges included), its interpolated depth
/// is strictly greater than the stored one, and the shader does not discard
/// it. With equal depths the triangle drawn
/// first keeps the pixel.
///
/// Returns the number of pixels written, or `None` if the triangle was
/// skipped as degenerate.
pub fn triangle<S: Shader + ?Sized>(
    clip: &[v4; 3],
    shader: &S,
    frame: &mut Frame<'_>,
) -> Option<usize> {
    if clip.iter().any(|it| !(it.w.abs() >= DEGENERATE_EPS)) {
        return None;
    }
    let pts = clip.map(|it| v2(it.x / it.w, it.y / it.w));
    // The twice-area term does not depend on the sample point.
    barycentric(pts, pts[0])?;

    let Some(bbox) = BoundingBox::clipped(pts, frame.dim()) else {
        return Some(0);
    };

    let z = v3(clip[0].z, clip[1].z, clip[2].z);
    let w = v3(clip[0].w, clip[1].w, clip[2].w);
    let mut written = 0;
    for y in bbox.min[1]..=bbox.max[1] {
        for x in bbox.min[0]..=bbox.max[0] {
            let Some(bar) = barycentric(pts, v2(x as f64, y as f64)) else { continue };
            if bar.x < 0.0 || bar.y < 0.0 || bar.z < 0.0 {
                continue;
            }
            // Vertices on both sides of the eye can still cancel out here.
            let denom = bar.dot(w);
            if !(denom.abs() >= DEGENERATE_EPS) {
                continue;
            }
            let depth = bar.dot(z) / denom;
            let idx = [x, y];
            if !(depth > frame.depth[idx]) {
                continue;
            }
            let Some(color) = shader.fragment(bar) else { continue };
            frame.depth[idx] = depth;
            frame.color[idx] = color;
            written += 1;
        }
    }
    Some(written)
}
