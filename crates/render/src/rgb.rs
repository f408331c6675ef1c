mod color;

use geom::v2;

use crate::buf::Idx;

pub use self::color::{Color, ParseColorError};

pub type Buf<'m> = crate::buf::Buf<'m, Color>;

/// An owned color grid, used for decoded textures.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Image {
    dim: Idx,
    pixels: Vec<Color>,
}

impl Image {
    pub fn new(dim @ [dx, dy]: Idx, pixels: Vec<Color>) -> Image {
        assert!(dx as usize * dy as usize == pixels.len());
        Image { dim, pixels }
    }
    pub fn filled(dim @ [dx, dy]: Idx, color: Color) -> Image {
        Image { dim, pixels: vec![color; dx as usize * dy as usize] }
    }
    pub fn dim(&self) -> Idx {
        self.dim
    }
    pub fn width(&self) -> u32 {
        self.dim[0]
    }
    pub fn height(&self) -> u32 {
        self.dim[1]
    }
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
    pub fn as_buf(&mut self) -> Buf<'_> {
        Buf::new(self.dim, &mut self.pixels)
    }
    pub fn get(&self, [x, y]: Idx) -> Option<Color> {
        if !(x < self.dim[0] && y < self.dim[1]) {
            return None;
        }
        Some(self.pixels[x as usize + y as usize * self.dim[0] as usize])
    }

    /// Nearest-texel lookup. `uv` spans `[0, 1]` with `v` pointing up, out of
    /// range coordinates are clamped to the border.
    pub fn sample(&self, uv: v2) -> Color {
        let f = |t: f64, d: u32| {
            let max = d.saturating_sub(1) as f64;
            (t * d as f64).floor().clamp(0.0, max) as u32
        };
        let idx = [f(uv.x, self.dim[0]), f(uv.y, self.dim[1])];
        self.get(idx).unwrap_or_default()
    }
}

#[test]
fn test_sample_nearest() {
    let [a, b, c, d] = [1, 2, 3, 4].map(Color::new_gray);
    let img = Image::new([2, 2], vec![a, b, c, d]);
    assert_eq!(img.sample(v2(0.1, 0.1)), a);
    assert_eq!(img.sample(v2(0.9, 0.1)), b);
    assert_eq!(img.sample(v2(0.1, 0.9)), c);
    assert_eq!(img.sample(v2(0.5, 0.5)), d);
    assert_eq!(img.sample(v2(1.0, 1.0)), d);
    assert_eq!(img.sample(v2(-3.0, 7.0)), c);
}
