pub mod buf;
pub mod depth;
pub mod raster;
pub mod rgb;
pub mod shader;
pub mod tga;
pub mod transform;

pub use crate::{
    shader::{Mesh, Shader, TextureKind, Varying},
    transform::Transform,
};

/// Color and depth grids of one frame. Only the rasterizer writes to them.
pub struct Frame<'m> {
    color: rgb::Buf<'m>,
    depth: depth::Buf<'m>,
}

impl<'m> Frame<'m> {
    pub fn new(color: rgb::Buf<'m>, depth: depth::Buf<'m>) -> Frame<'m> {
        assert_eq!(color.dim(), depth.dim());
        Frame { color, depth }
    }
    pub fn dim(&self) -> buf::Idx {
        self.color.dim()
    }
    pub fn color(&self) -> &rgb::Buf<'m> {
        &self.color
    }
    pub fn depth(&self) -> &depth::Buf<'m> {
        &self.depth
    }
    /// Resets every pixel to `background` and "nothing drawn yet".
    pub fn clear(&mut self, background: rgb::Color) {
        self.color.fill(background);
        self.depth.fill(depth::EMPTY);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub faces: usize,
    pub degenerate: usize,
    pub pixels: usize,
}

/// Draws every face of `mesh` in order. Face order decides depth ties: the
/// earlier face keeps the pixel.
pub fn render<M, S>(
    mesh: &M,
    shader: &mut S,
    transform: &Transform,
    frame: &mut Frame<'_>,
) -> Stats
where
    M: Mesh + ?Sized,
    S: Shader + ?Sized,
{
    let mut stats = Stats::default();
    for face in 0..mesh.n_faces() {
        let clip = [0, 1, 2].map(|nth| shader.vertex(transform, face, nth));
        match raster::triangle(&clip, &*shader, frame) {
            Some(pixels) => {
                stats.faces += 1;
                stats.pixels += pixels;
            }
            None => stats.degenerate += 1,
        }
    }
    log::debug!(
        "drew {} faces ({} pixels), skipped {} degenerate",
        stats.faces,
        stats.pixels,
        stats.degenerate
    );
    stats
}

#[cfg(test)]
mod tests {
    use geom::{v2, v3, v4};

    use crate::{depth, rgb, Frame, Mesh, Shader, Stats, Transform, Varying};

    /// Two quads, the second behind the first, plus one sliver.
    struct Quads;

    const VERTS: [[f64; 3]; 12] = [
        [-0.5, -0.5, 0.2],
        [0.5, -0.5, 0.2],
        [0.5, 0.5, 0.2],
        [-0.5, -0.5, 0.2],
        [0.5, 0.5, 0.2],
        [-0.5, 0.5, 0.2],
        [-0.9, -0.9, -0.3],
        [0.1, -0.9, -0.3],
        [-0.9, 0.1, -0.3],
        [0.0, 0.0, 0.0],
        [0.3, 0.3, 0.0],
        [0.6, 0.6, 0.0],
    ];

    impl Mesh for Quads {
        fn n_faces(&self) -> usize {
            VERTS.len() / 3
        }
        fn vert(&self, face: usize, nth: usize) -> v3 {
            let [x, y, z] = VERTS[face * 3 + nth];
            v3(x, y, z)
        }
        fn normal(&self, _: usize, _: usize) -> v3 {
            v3(0.0, 0.0, 1.0)
        }
        fn uv(&self, _: usize, _: usize) -> v2 {
            v2::ZERO
        }
    }

    struct Depth {
        varying_z: Varying<f64>,
        calls: Vec<(usize, usize)>,
    }

    impl Shader for Depth {
        fn vertex(&mut self, transform: &Transform, face: usize, nth: usize) -> v4 {
            self.calls.push((face, nth));
            let v = Quads.vert(face, nth);
            self.varying_z.set(nth, v.z);
            transform.to_screen() * v.extend(1.0)
        }
        fn fragment(&self, bar: v3) -> Option<rgb::Color> {
            let z = self.varying_z.at(bar);
            Some(rgb::Color::new_gray((z * 100.0 + 100.0).round() as u8))
        }
    }

    fn draw() -> (Vec<rgb::Color>, Vec<f64>, Stats, Vec<(usize, usize)>) {
        let dim = [32, 32];
        let mut color = vec![rgb::Color::default(); 32 * 32];
        let mut depth = vec![0.0; 32 * 32];
        let mut frame =
            Frame::new(rgb::Buf::new(dim, &mut color), depth::Buf::new(dim, &mut depth));
        frame.clear(rgb::Color::new_black());
        let transform = Transform::camera(
            v3(0.0, 0.0, 3.0),
            v3::ZERO,
            v3(0.0, 1.0, 0.0),
            [0.0, 0.0, 32.0, 32.0],
        );
        let mut shader = Depth { varying_z: Varying::default(), calls: Vec::new() };
        let stats = super::render(&Quads, &mut shader, &transform, &mut frame);
        (color, depth, stats, shader.calls)
    }

    #[test]
    fn test_render_is_deterministic() {
        let (color1, depth1, stats1, _) = draw();
        let (color2, depth2, stats2, _) = draw();
        assert_eq!(color1, color2);
        let bits = |depth: &[f64]| depth.iter().map(|d| d.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&depth1), bits(&depth2));
        assert_eq!(stats1, stats2);
    }

    #[test]
    fn test_render_drives_vertex_stage_in_order() {
        let (color, _, stats, calls) = draw();
        let expected: Vec<_> = (0..4).flat_map(|f| (0..3).map(move |n| (f, n))).collect();
        assert_eq!(calls, expected);
        assert_eq!(stats.faces, 3);
        assert_eq!(stats.degenerate, 1);
        assert!(stats.pixels > 0);

        // The front quad (z = 0.2) hides the back triangle where they overlap.
        let front = rgb::Color::new_gray(120);
        let back = rgb::Color::new_gray(70);
        assert_eq!(color[16 + 16 * 32], front);
        assert_eq!(color[4 + 4 * 32], back);
        assert_eq!(color[31 + 31 * 32], rgb::Color::new_black());
    }
}
