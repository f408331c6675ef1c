use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// {0}
#[derive(Debug, displaydoc::Display)]
pub struct ParseColorError(ParseColorErrorRepr);

#[derive(Debug, displaydoc::Display)]
enum ParseColorErrorRepr {
    /// expected `#rrggbb` or `#rgb`, got {0} digits
    InvalidLength(usize),
    /// invalid hex digit `{0}`
    InvalidDigit(char),
    /// color must start with `#`
    MissingHash,
}

impl std::error::Error for ParseColorError {}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }
    pub const fn new_gray(value: u8) -> Color {
        Color::new(value, value, value)
    }
    pub const fn new_black() -> Color {
        Color::new(0, 0, 0)
    }
    pub const fn new_white() -> Color {
        Color::new(!0, !0, !0)
    }
    pub fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Color {
        Color { r, g, b }
    }
    /// Multiplies every channel, saturating at 0 and 255.
    pub fn scale(self, k: f64) -> Color {
        Color::from_rgb(self.rgb().map(|c| (c as f64 * k).clamp(0.0, 255.0).round() as u8))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Color { r, g, b } = self;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#rrggbb` and the short `#rgb` form, where `#0a9` is `#00aa99`.
    fn from_str(s: &str) -> Result<Color, ParseColorError> {
        let digits = s.strip_prefix('#').ok_or(ParseColorErrorRepr::MissingHash)?;
        let mut nibbles = Vec::with_capacity(6);
        for c in digits.chars() {
            let n = c.to_digit(16).ok_or(ParseColorErrorRepr::InvalidDigit(c))?;
            nibbles.push(n as u8);
        }
        let channel = |hi: u8, lo: u8| hi << 4 | lo;
        match *nibbles.as_slice() {
            [r1, r0, g1, g0, b1, b0] => {
                Ok(Color::new(channel(r1, r0), channel(g1, g0), channel(b1, b0)))
            }
            [r, g, b] => Ok(Color::new(channel(r, r), channel(g, g), channel(b, b))),
            _ => Err(ParseColorErrorRepr::InvalidLength(nibbles.len()).into()),
        }
    }
}

impl From<ParseColorErrorRepr> for ParseColorError {
    fn from(repr: ParseColorErrorRepr) -> ParseColorError {
        ParseColorError(repr)
    }
}

#[test]
fn test_color_text() {
    let c: Color = "#00aa9f".parse().unwrap();
    assert_eq!(c, Color::new(0x00, 0xaa, 0x9f));
    assert_eq!(c.to_string(), "#00aa9f");
    assert_eq!("#0a9".parse::<Color>().unwrap(), Color::new(0x00, 0xaa, 0x99));
    let err = |s: &str| s.parse::<Color>().unwrap_err().to_string();
    assert_eq!(err("00aa9f"), "color must start with `#`");
    assert_eq!(err("#00aa9g"), "invalid hex digit `g`");
    assert_eq!(err("#00aa"), "expected `#rrggbb` or `#rgb`, got 4 digits");
}

#[test]
fn test_scale_saturates() {
    let c = Color::new(100, 200, 0);
    assert_eq!(c.scale(0.5), Color::new(50, 100, 0));
    assert_eq!(c.scale(2.0), Color::new(200, 255, 0));
    assert_eq!(c.scale(-1.0), Color::new_black());
}
