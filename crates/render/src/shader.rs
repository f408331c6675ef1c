use std::ops;

use geom::{v2, v3, v4};

use crate::{
    rgb::{Color, Image},
    transform::Transform,
};

/// The programmable stages of the pipeline.
///
/// For every face the driver calls [`Shader::vertex`] for vertices 0, 1 and
/// 2, in this order, and then rasterizes the triangle, calling
/// [`Shader::fragment`] for each pixel that is inside it and nearer than
/// what is already drawn there.
pub trait Shader {
    /// Returns the homogeneous screen-space position of the `nth` vertex of
    /// `face`. Attributes the fragment stage needs go into a [`Varying`].
    fn vertex(&mut self, transform: &Transform, face: usize, nth: usize) -> v4;

    /// Shades a pixel given its barycentric weights. `None` discards it and
    /// leaves both buffers untouched.
    fn fragment(&self, bar: v3) -> Option<Color>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, displaydoc::Display)]
pub enum TextureKind {
    /// diffuse map
    Diffuse,
    /// normal map
    Normal,
    /// specular map
    Specular,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] =
        [TextureKind::Diffuse, TextureKind::Normal, TextureKind::Specular];
}

/// The consumed mesh interface, indexed by face and vertex-in-face.
///
/// Texture lookups return `None` when the mesh has no map of that kind.
/// Shaders that need a map check for it once, when they are built.
pub trait Mesh {
    fn n_faces(&self) -> usize;
    fn vert(&self, face: usize, nth: usize) -> v3;
    fn normal(&self, face: usize, nth: usize) -> v3;
    fn uv(&self, face: usize, nth: usize) -> v2;

    fn texture(&self, kind: TextureKind) -> Option<&Image> {
        let _ = kind;
        None
    }
    fn diffuse(&self, uv: v2) -> Option<Color> {
        Some(self.texture(TextureKind::Diffuse)?.sample(uv))
    }
    /// Decoded normal map texel, not normalized.
    fn normal_map(&self, uv: v2) -> Option<v3> {
        Some(decode_normal(self.texture(TextureKind::Normal)?.sample(uv)))
    }
    fn specular_exponent(&self, uv: v2) -> Option<f64> {
        Some(self.texture(TextureKind::Specular)?.sample(uv).r as f64)
    }
}

/// Decodes a normal map texel, each channel spanning `[-1, 1]`.
pub fn decode_normal(c: Color) -> v3 {
    let [x, y, z] = c.rgb().map(|it| it as f64 / 255.0 * 2.0 - 1.0);
    v3(x, y, z)
}

/// Per-triangle attribute storage, written by the vertex stage and blended
/// for the fragment stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct Varying<T> {
    values: [T; 3],
}

impl<T: Copy> Varying<T> {
    pub fn set(&mut self, nth: usize, value: T) {
        self.values[nth] = value;
    }
    pub fn get(&self, nth: usize) -> T {
        self.values[nth]
    }
    /// Screen-space linear blend, not corrected for perspective.
    pub fn at(&self, bar: v3) -> T
    where
        T: ops::Mul<f64, Output = T> + ops::Add<Output = T>,
    {
        let [a, b, c] = self.values;
        a * bar.x + b * bar.y + c * bar.z
    }
}

#[test]
fn test_decode_normal() {
    assert_eq!(decode_normal(Color::new(255, 0, 255)), v3(1.0, -1.0, 1.0));
}

#[test]
fn test_texture_lookups() {
    struct Textured(Image);

    impl Mesh for Textured {
        fn n_faces(&self) -> usize {
            0
        }
        fn vert(&self, _: usize, _: usize) -> v3 {
            v3::ZERO
        }
        fn normal(&self, _: usize, _: usize) -> v3 {
            v3::ZERO
        }
        fn uv(&self, _: usize, _: usize) -> v2 {
            v2::ZERO
        }
        fn texture(&self, kind: TextureKind) -> Option<&Image> {
            (kind == TextureKind::Specular).then_some(&self.0)
        }
    }

    let mesh = Textured(Image::filled([2, 2], Color::new(12, 0, 0)));
    assert_eq!(mesh.specular_exponent(v2(0.5, 0.5)), Some(12.0));
    assert_eq!(mesh.diffuse(v2(0.5, 0.5)), None);
    assert_eq!(mesh.normal_map(v2(0.5, 0.5)), None);
}

#[test]
fn test_varying_blend() {
    let mut uv = Varying::default();
    uv.set(0, v2(0.0, 0.0));
    uv.set(1, v2(1.0, 0.0));
    uv.set(2, v2(0.0, 1.0));
    assert_eq!(uv.at(v3(1.0, 0.0, 0.0)), v2(0.0, 0.0));
    assert_eq!(uv.at(v3(0.0, 0.5, 0.5)), v2(0.5, 0.5));
    assert_eq!(uv.get(1), v2(1.0, 0.0));

    let mut intensity = Varying::default();
    for (nth, value) in [0.0, 0.5, 1.0].into_iter().enumerate() {
        intensity.set(nth, value);
    }
    assert_eq!(intensity.at(v3(0.25, 0.5, 0.25)), 0.5);
}
