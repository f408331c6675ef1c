//! Triangle meshes read from Wavefront OBJ files, with optional texture maps.

mod obj;

use std::{fs, io, path::Path};

use geom::{cross, v2, v3};
use render::{rgb::Image, tga, Mesh, TextureKind};

pub use crate::obj::ParseObjError;

/// {0}
#[derive(Debug, displaydoc::Display)]
pub struct MeshLoadError(MeshLoadErrorRepr);

#[derive(Debug, displaydoc::Display)]
enum MeshLoadErrorRepr {
    /// failed to read mesh: {0}
    Read(io::Error),
    /// {0}
    Parse(ParseObjError),
    /// mesh has no faces
    Empty,
    /// failed to read texture `{0}`: {1}
    Texture(String, tga::Error),
}

impl std::error::Error for MeshLoadError {}

impl From<MeshLoadErrorRepr> for MeshLoadError {
    fn from(repr: MeshLoadErrorRepr) -> MeshLoadError {
        MeshLoadError(repr)
    }
}

#[derive(Default, Debug)]
pub struct Model {
    verts: Vec<v3>,
    uvs: Vec<v2>,
    normals: Vec<v3>,
    faces: Vec<Face>,
    textures: [Option<Image>; 3],
}

#[derive(Default, Clone, Copy, Debug)]
struct Face {
    v: [u32; 3],
    t: [Option<u32>; 3],
    n: [Option<u32>; 3],
}

impl Model {
    pub fn parse(s: &str) -> Result<Model, ParseObjError> {
        obj::parse(s)
    }

    /// Reads the mesh at `path` and the texture maps next to it. A mesh
    /// without faces is an error. Missing texture files are not.
    pub fn load(path: &Path) -> Result<Model, MeshLoadError> {
        let text = fs::read_to_string(path).map_err(MeshLoadErrorRepr::Read)?;
        let mut model = Model::parse(&text).map_err(MeshLoadErrorRepr::Parse)?;
        if model.faces.is_empty() {
            Err(MeshLoadErrorRepr::Empty)?
        }
        for kind in TextureKind::ALL {
            let texture = load_texture(path, kind)?;
            model.set_texture(kind, texture);
        }
        log::info!(
            "loaded {}: {} vertices, {} uvs, {} normals, {} faces",
            path.display(),
            model.verts.len(),
            model.uvs.len(),
            model.normals.len(),
            model.faces.len(),
        );
        Ok(model)
    }

    pub fn set_texture(&mut self, kind: TextureKind, texture: Option<Image>) {
        self.textures[kind as usize] = texture;
    }

    fn face_normal(&self, face: &Face) -> v3 {
        let [a, b, c] = face.v.map(|i| self.verts[i as usize]);
        let n = cross(b - a, c - a);
        if n.norm_squared() == 0.0 {
            return v3::ZERO;
        }
        n.to_unit()
    }
}

impl Mesh for Model {
    fn n_faces(&self) -> usize {
        self.faces.len()
    }

    fn vert(&self, face: usize, nth: usize) -> v3 {
        self.verts[self.faces[face].v[nth] as usize]
    }

    /// Falls back to the face normal when the file has none.
    fn normal(&self, face: usize, nth: usize) -> v3 {
        let f = &self.faces[face];
        match f.n[nth] {
            Some(i) => self.normals[i as usize],
            None => self.face_normal(f),
        }
    }

    fn uv(&self, face: usize, nth: usize) -> v2 {
        match self.faces[face].t[nth] {
            Some(i) => self.uvs[i as usize],
            None => v2::ZERO,
        }
    }

    fn texture(&self, kind: TextureKind) -> Option<&Image> {
        self.textures[kind as usize].as_ref()
    }
}

/// File name suffix appended to the mesh's file stem.
fn texture_suffix(kind: TextureKind) -> &'static str {
    match kind {
        TextureKind::Diffuse => "_diffuse.tga",
        TextureKind::Normal => "_nm.tga",
        TextureKind::Specular => "_spec.tga",
    }
}

fn load_texture(mesh: &Path, kind: TextureKind) -> Result<Option<Image>, MeshLoadError> {
    let Some(stem) = mesh.file_stem() else {
        return Ok(None);
    };
    let path = mesh.with_file_name(format!("{}{}", stem.to_string_lossy(), texture_suffix(kind)));
    match tga::load(&path) {
        Ok(image) => {
            log::info!("loaded {kind} {} ({}x{})", path.display(), image.width(), image.height());
            Ok(Some(image))
        }
        Err(err) if err.is_not_found() => {
            log::warn!("no {kind} at {}", path.display());
            Ok(None)
        }
        Err(err) => Err(MeshLoadErrorRepr::Texture(path.display().to_string(), err).into()),
    }
}
