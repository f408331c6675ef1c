use std::{
    num::{ParseFloatError, ParseIntError},
    str::SplitAsciiWhitespace,
};

use geom::{v2, v3};

use crate::{Face, Model};

/// line {line}: {kind}
#[derive(Debug, displaydoc::Display)]
pub struct ParseObjError {
    line: usize,
    kind: ErrorKind,
}

#[derive(Debug, displaydoc::Display)]
enum ErrorKind {
    /// unexpected end of line
    UnexpectedEol,
    /// invalid scalar: {0}
    ParseFloatError(ParseFloatError),
    /// invalid face vertex, expected `v`, `v/vt`, `v//vn` or `v/vt/vn`
    InvalidFace,
    /// invalid face index: {0}
    InvalidFaceIndex(ParseIntError),
    /// face index out of bounds
    FaceIndexOutOfBounds,
    /// face with fewer than three vertices
    TooFewVertices,
}

impl std::error::Error for ParseObjError {}

pub(crate) fn parse(input: &str) -> Result<Model, ParseObjError> {
    let mut res = Model::default();
    for (i, line) in input.lines().enumerate() {
        let mut p = Parser { words: line.split_ascii_whitespace() };
        statement(&mut p, &mut res).map_err(|kind| ParseObjError { line: i + 1, kind })?;
    }
    Ok(res)
}

struct Parser<'i> {
    words: SplitAsciiWhitespace<'i>,
}

impl<'i> Parser<'i> {
    fn next(&mut self) -> Result<&'i str, ErrorKind> {
        self.words.next().ok_or(ErrorKind::UnexpectedEol)
    }
}

fn statement(p: &mut Parser<'_>, res: &mut Model) -> Result<(), ErrorKind> {
    match p.words.next() {
        Some("v") => res.verts.push(vector(p)?),
        Some("vn") => res.normals.push(vector(p)?),
        Some("vt") => res.uvs.push(v2(scalar(p)?, scalar(p)?)),
        Some("f") => face(p, res)?,
        // Comments, groups, smoothing and material statements.
        _ => (),
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct Corner {
    v: u32,
    t: Option<u32>,
    n: Option<u32>,
}

fn face(p: &mut Parser<'_>, res: &mut Model) -> Result<(), ErrorKind> {
    let counts = [res.verts.len(), res.uvs.len(), res.normals.len()];
    let corners =
        p.words.by_ref().map(|it| corner(it, counts)).collect::<Result<Vec<_>, _>>()?;
    if corners.len() < 3 {
        Err(ErrorKind::TooFewVertices)?
    }
    for i in 1..corners.len() - 1 {
        let tri = [corners[0], corners[i], corners[i + 1]];
        res.faces.push(Face { v: tri.map(|c| c.v), t: tri.map(|c| c.t), n: tri.map(|c| c.n) });
    }
    Ok(())
}

fn corner(word: &str, [n_v, n_t, n_n]: [usize; 3]) -> Result<Corner, ErrorKind> {
    let mut parts = word.split('/');
    let v = index(parts.next(), n_v)?.ok_or(ErrorKind::InvalidFace)?;
    let t = index(parts.next(), n_t)?;
    let n = index(parts.next(), n_n)?;
    if parts.next().is_some() {
        Err(ErrorKind::InvalidFace)?
    }
    Ok(Corner { v, t, n })
}

/// 1-based, negative indices count back from the last element.
fn index(part: Option<&str>, len: usize) -> Result<Option<u32>, ErrorKind> {
    let Some(part) = part.filter(|it| !it.is_empty()) else {
        return Ok(None);
    };
    let i = part.parse::<i64>().map_err(ErrorKind::InvalidFaceIndex)?;
    let res = if i > 0 { i - 1 } else { len as i64 + i };
    if !(0 <= res && res < len as i64) {
        Err(ErrorKind::FaceIndexOutOfBounds)?
    }
    Ok(Some(res as u32))
}

fn scalar(p: &mut Parser<'_>) -> Result<f64, ErrorKind> {
    let t = p.next()?;
    let f = t.parse::<f64>().map_err(ErrorKind::ParseFloatError)?;
    Ok(f)
}

fn vector(p: &mut Parser<'_>) -> Result<v3, ErrorKind> {
    Ok(v3(scalar(p)?, scalar(p)?, scalar(p)?))
}

#[test]
fn test_parse_faces() {
    let obj = "\
# two triangles sharing an edge
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0 0
vt 1 1
vn 0 0 1
g quad
f 1/1/1 2/2/1 3/3/1
f 1//1 3//1 -1//-1
";
    let model = parse(obj).unwrap();
    assert_eq!((model.verts.len(), model.uvs.len(), model.normals.len()), (4, 3, 1));
    assert_eq!(model.faces.len(), 2);
    assert_eq!(model.faces[0].v, [0, 1, 2]);
    assert_eq!(model.faces[0].t, [Some(0), Some(1), Some(2)]);
    assert_eq!(model.faces[1].v, [0, 2, 3]);
    assert_eq!(model.faces[1].t, [None; 3]);
    assert_eq!(model.faces[1].n, [Some(0); 3]);
}

#[test]
fn test_fan_triangulation() {
    let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv -1 1 0\nf 1 2 3 4 5\n";
    let model = parse(obj).unwrap();
    let faces = model.faces.iter().map(|f| f.v).collect::<Vec<_>>();
    assert_eq!(faces, [[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
}

#[test]
fn test_parse_errors() {
    let err = |obj: &str| parse(obj).unwrap_err().to_string();
    assert_eq!(err("v 1 2"), "line 1: unexpected end of line");
    assert_eq!(err("v 0 0 0\nv 1 x 0"), "line 2: invalid scalar: invalid float literal");
    assert_eq!(err("v 0 0 0\nf 1 1"), "line 2: face with fewer than three vertices");
    assert_eq!(err("v 0 0 0\nf 1 1 2"), "line 2: face index out of bounds");
    assert_eq!(err("v 0 0 0\nf 0 1 1"), "line 2: face index out of bounds");
    assert_eq!(err("v 0 0 0\nf 1 1 1/1"), "line 2: face index out of bounds");
    assert!(err("v 0 0 0\nf 1 1 /1").starts_with("line 2: invalid face vertex"));
    assert_eq!(
        err("v 0 0 0\nf 1 1 a"),
        "line 2: invalid face index: invalid digit found in string"
    );
}
