use std::str::FromStr;

use geom::{m4, v2, v3, v4};
use render::{rgb::Color, Mesh, Shader, TextureKind, Transform, Varying};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ShaderKind {
    Gouraud,
    Normal,
    Phong,
}

impl FromStr for ShaderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<ShaderKind, String> {
        match s {
            "gouraud" => Ok(ShaderKind::Gouraud),
            "normal" => Ok(ShaderKind::Normal),
            "phong" => Ok(ShaderKind::Phong),
            _ => Err(format!("unknown shader `{s}`, expected gouraud, normal or phong")),
        }
    }
}

#[derive(Debug, displaydoc::Display)]
pub(crate) enum ShaderError {
    /// the {0} shader needs a {1}
    MissingTexture(&'static str, TextureKind),
    /// camera transform is not invertible
    SingularTransform,
}

impl std::error::Error for ShaderError {}

pub(crate) fn new<'a, M: Mesh + ?Sized>(
    kind: ShaderKind,
    mesh: &'a M,
    transform: &Transform,
    light: v3,
    color: Color,
) -> Result<Box<dyn Shader + 'a>, ShaderError> {
    let res: Box<dyn Shader + 'a> = match kind {
        ShaderKind::Gouraud => Box::new(Gouraud::new(mesh, light, color)),
        ShaderKind::Normal => Box::new(NormalMapped::new(mesh, transform, light)?),
        ShaderKind::Phong => Box::new(Phong::new(mesh, transform, light)?),
    };
    Ok(res)
}

fn require<M: Mesh + ?Sized>(
    mesh: &M,
    shader: &'static str,
    kinds: &[TextureKind],
) -> Result<(), ShaderError> {
    match kinds.iter().find(|&&kind| mesh.texture(kind).is_none()) {
        Some(&kind) => Err(ShaderError::MissingTexture(shader, kind)),
        None => Ok(()),
    }
}

/// Lights vertices and blends the intensity across the face.
pub(crate) struct Gouraud<'a, M: ?Sized> {
    mesh: &'a M,
    light: v3,
    color: Color,
    intensity: Varying<f64>,
}

impl<'a, M: Mesh + ?Sized> Gouraud<'a, M> {
    pub(crate) fn new(mesh: &'a M, light: v3, color: Color) -> Gouraud<'a, M> {
        Gouraud { mesh, light: light.to_unit(), color, intensity: Varying::default() }
    }
}

impl<M: Mesh + ?Sized> Shader for Gouraud<'_, M> {
    fn vertex(&mut self, transform: &Transform, face: usize, nth: usize) -> v4 {
        let n = self.mesh.normal(face, nth).to_unit();
        self.intensity.set(nth, n.dot(self.light).max(0.0));
        transform.to_screen() * self.mesh.vert(face, nth).extend(1.0)
    }

    fn fragment(&self, bar: v3) -> Option<Color> {
        Some(self.color.scale(self.intensity.at(bar)))
    }
}

/// Diffuse lighting with normals read from a normal map.
pub(crate) struct NormalMapped<'a, M: ?Sized> {
    mesh: &'a M,
    /// Light direction in clip space.
    light: v3,
    /// Inverse transpose of `projection * model_view`.
    normal_transform: m4,
    uv: Varying<v2>,
}

impl<'a, M: Mesh + ?Sized> NormalMapped<'a, M> {
    pub(crate) fn new(
        mesh: &'a M,
        transform: &Transform,
        light: v3,
    ) -> Result<NormalMapped<'a, M>, ShaderError> {
        require(mesh, "normal", &[TextureKind::Diffuse, TextureKind::Normal])?;
        NormalMapped::unchecked(mesh, transform, light)
    }

    fn unchecked(
        mesh: &'a M,
        transform: &Transform,
        light: v3,
    ) -> Result<NormalMapped<'a, M>, ShaderError> {
        let m = transform.to_clip();
        let normal_transform = m.inverse_transpose().ok_or(ShaderError::SingularTransform)?;
        Ok(NormalMapped {
            mesh,
            light: m.transform_dir(light).to_unit(),
            normal_transform,
            uv: Varying::default(),
        })
    }

    /// Texture coordinate and clip-space unit normal at `bar`.
    fn surface(&self, bar: v3) -> Option<(v2, v3)> {
        let uv = self.uv.at(bar);
        let n = self.mesh.normal_map(uv)?;
        Some((uv, self.normal_transform.transform_dir(n).to_unit()))
    }
}

impl<M: Mesh + ?Sized> Shader for NormalMapped<'_, M> {
    fn vertex(&mut self, transform: &Transform, face: usize, nth: usize) -> v4 {
        self.uv.set(nth, self.mesh.uv(face, nth));
        transform.to_screen() * self.mesh.vert(face, nth).extend(1.0)
    }

    fn fragment(&self, bar: v3) -> Option<Color> {
        let (uv, n) = self.surface(bar)?;
        let diffuse = n.dot(self.light).max(0.0);
        Some(self.mesh.diffuse(uv)?.scale(diffuse))
    }
}

/// [`NormalMapped`] plus a specular highlight whose exponent comes from the
/// specular map.
pub(crate) struct Phong<'a, M: ?Sized> {
    base: NormalMapped<'a, M>,
}

const AMBIENT: f64 = 5.0;
const SPECULAR_WEIGHT: f64 = 0.6;

impl<'a, M: Mesh + ?Sized> Phong<'a, M> {
    pub(crate) fn new(
        mesh: &'a M,
        transform: &Transform,
        light: v3,
    ) -> Result<Phong<'a, M>, ShaderError> {
        require(mesh, "phong", &TextureKind::ALL)?;
        Ok(Phong { base: NormalMapped::unchecked(mesh, transform, light)? })
    }
}

impl<M: Mesh + ?Sized> Shader for Phong<'_, M> {
    fn vertex(&mut self, transform: &Transform, face: usize, nth: usize) -> v4 {
        self.base.vertex(transform, face, nth)
    }

    fn fragment(&self, bar: v3) -> Option<Color> {
        let (uv, n) = self.base.surface(bar)?;
        let l = self.base.light;
        let diffuse = n.dot(l).max(0.0);
        let reflected = (n * (n.dot(l) * 2.0) - l).to_unit();
        let specular = reflected.z.max(0.0).powf(self.base.mesh.specular_exponent(uv)?);
        let k = diffuse + SPECULAR_WEIGHT * specular;
        let channel = |it: u8| (AMBIENT + it as f64 * k).min(255.0).round() as u8;
        Some(Color::from_rgb(self.base.mesh.diffuse(uv)?.rgb().map(channel)))
    }
}

#[cfg(test)]
mod tests {
    use geom::v3;
    use model::Model;
    use render::{
        depth,
        rgb::{self, Color, Image},
        Frame, Shader, TextureKind, Transform,
    };

    use super::{new, Gouraud, NormalMapped, Phong, ShaderKind};

    const QUAD: &str = "\
v 0 0 0
v 12 0 0
v 12 12 0
v 0 12 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
vn 0 0 1
vn 0 1 0
vn 0 1 0
f 1/1/1 2/2/2 3/3/3 4/4/4
";

    const BASE: Color = Color::new(200, 100, 50);

    fn textured(normal: Color) -> Model {
        let mut model = Model::parse(QUAD).unwrap();
        model.set_texture(TextureKind::Diffuse, Some(Image::filled([4, 4], BASE)));
        model.set_texture(TextureKind::Normal, Some(Image::filled([4, 4], normal)));
        model
    }

    fn shade(shader: &mut dyn Shader, bar: v3) -> Option<Color> {
        let t = Transform::default();
        for nth in 0..3 {
            shader.vertex(&t, 0, nth);
        }
        shader.fragment(bar)
    }

    #[test]
    fn test_parse_shader_kind() {
        assert_eq!("phong".parse::<ShaderKind>(), Ok(ShaderKind::Phong));
        assert!("flat".parse::<ShaderKind>().is_err());
    }

    #[test]
    fn test_gouraud_blends_vertex_intensity() {
        let model = Model::parse(QUAD).unwrap();
        let mut shader = Gouraud::new(&model, v3(0.0, 0.0, 2.0), Color::new_white());
        // Vertices 0 and 1 face the light, vertex 2 is perpendicular to it.
        assert_eq!(shade(&mut shader, v3(1.0, 0.0, 0.0)), Some(Color::new_white()));
        assert_eq!(shade(&mut shader, v3(0.0, 0.0, 1.0)), Some(Color::new_black()));
        assert_eq!(shade(&mut shader, v3(0.5, 0.0, 0.5)), Some(Color::new_gray(128)));
    }

    #[test]
    fn test_gouraud_renders_mesh() {
        let model = Model::parse(&QUAD.replace("vn 0 1 0", "vn 0 0 1")).unwrap();
        let mut shader = Gouraud::new(&model, v3(0.0, 0.0, 1.0), Color::new(0, 200, 0));
        let mut color = vec![Color::new_black(); 16 * 16];
        let mut depth = vec![depth::EMPTY; 16 * 16];
        let mut frame =
            Frame::new(rgb::Buf::new([16, 16], &mut color), depth::Buf::new([16, 16], &mut depth));
        let stats = render::render(&model, &mut shader, &Transform::default(), &mut frame);
        assert_eq!(stats.faces, 2);
        assert_eq!(stats.degenerate, 0);
        assert_eq!(frame.color()[[8, 1]], Color::new(0, 200, 0));
        assert_eq!(frame.color()[[14, 14]], Color::new_black());
        assert_eq!(frame.depth()[[14, 14]], depth::EMPTY);
    }

    #[test]
    fn test_normal_map_lighting() {
        let model = textured(Color::new(128, 128, 255));
        let light = v3(0.0, 0.0, 1.0);
        let mut shader = NormalMapped::new(&model, &Transform::default(), light).unwrap();
        let bar = v3(1.0, 1.0, 1.0) / 3.0;
        assert_eq!(shade(&mut shader, bar), Some(BASE));

        let model = textured(Color::new(128, 128, 0));
        let mut shader = NormalMapped::new(&model, &Transform::default(), light).unwrap();
        assert_eq!(shade(&mut shader, bar), Some(Color::new_black()));
    }

    #[test]
    fn test_phong_adds_highlight() {
        let mut model = textured(Color::new(128, 128, 255));
        let specular = Image::filled([4, 4], Color::new_gray(10));
        model.set_texture(TextureKind::Specular, Some(specular));
        let mut shader = Phong::new(&model, &Transform::default(), v3(0.0, 0.0, 1.0)).unwrap();
        let c = shade(&mut shader, v3(1.0, 1.0, 1.0) / 3.0).unwrap();
        // 5 + c * (1 + 0.6), saturated.
        assert_eq!(c.r, 255);
        assert!((163..=166).contains(&c.g), "{c}");
        assert!((83..=86).contains(&c.b), "{c}");
    }

    #[test]
    fn test_textured_shaders_require_maps() {
        let light = v3(0.0, 0.0, 1.0);
        let plain = Model::parse(QUAD).unwrap();
        let t = Transform::default();
        assert!(new(ShaderKind::Gouraud, &plain, &t, light, Color::new_white()).is_ok());
        let err = |kind: ShaderKind, model: &Model| {
            match new(kind, model, &t, light, Color::new_white()) {
                Ok(_) => panic!("expected an error"),
                Err(err) => err.to_string(),
            }
        };
        assert_eq!(err(ShaderKind::Normal, &plain), "the normal shader needs a diffuse map");
        let model = textured(Color::new_white());
        assert_eq!(err(ShaderKind::Phong, &model), "the phong shader needs a specular map");
    }

    #[test]
    fn test_singular_transform() {
        let model = textured(Color::new_white());
        let mut t = Transform::default();
        t.projection[[3, 3]] = 0.0;
        t.projection[[3, 2]] = 0.0;
        let err = NormalMapped::new(&model, &t, v3(0.0, 0.0, 1.0)).err().unwrap();
        assert_eq!(err.to_string(), "camera transform is not invertible");
    }
}
