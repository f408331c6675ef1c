//! Depth grid. Larger values are nearer to the camera.

use crate::rgb::Color;

pub type Buf<'m> = crate::buf::Buf<'m, f64>;

/// Sentinel for cells no fragment has been written to.
pub const EMPTY: f64 = f64::NEG_INFINITY;

/// Quantizes a depth value in the viewport's `0..=DEPTH` range for 8-bit output.
pub fn to_gray(depth: f64) -> Color {
    if depth == EMPTY {
        return Color::new_black();
    }
    Color::new_gray(depth.clamp(0.0, 255.0).round() as u8)
}

#[test]
fn test_to_gray() {
    assert_eq!(to_gray(EMPTY), Color::new_black());
    assert_eq!(to_gray(127.6), Color::new_gray(128));
    assert_eq!(to_gray(300.0), Color::new_white());
    assert_eq!(to_gray(-2.0), Color::new_black());
}
