mod mat;

use std::{fmt, num::ParseFloatError, ops, str::FromStr};

pub use crate::mat::m4;

/// {0}
#[derive(Debug, displaydoc::Display)]
pub struct ParseVectorError(ParseVectorErrorRepr);

#[derive(Debug, displaydoc::Display)]
enum ParseVectorErrorRepr {
    /// {0}
    ParseFloatError(ParseFloatError),
    /// expected three coma-separated coordinates
    InvalidFormat,
}

macro_rules! vector {
    ($name:ident, $n:literal, $($f:ident),+) => {
        #[derive(Clone, Copy, PartialEq, Debug, Default)]
        #[allow(non_camel_case_types)]
        pub struct $name {
            $(pub $f: f64,)+
        }

        pub const fn $name($($f: f64),+) -> $name {
            $name { $($f),+ }
        }

        impl $name {
            pub const ZERO: $name = $name { $($f: 0.0),+ };

            pub fn to_array(self) -> [f64; $n] {
                [$(self.$f),+]
            }
            pub fn from_array([$($f),+]: [f64; $n]) -> $name {
                $name { $($f),+ }
            }
            pub fn dot(self, rhs: $name) -> f64 {
                let mut res = 0.0;
                $(res += self.$f * rhs.$f;)+
                res
            }
            pub fn norm(self) -> f64 {
                self.norm_squared().sqrt()
            }
            pub fn norm_squared(self) -> f64 {
                self.dot(self)
            }
            /// Zero vectors have no direction: the result is NaN.
            pub fn to_unit(self) -> $name {
                self / self.norm()
            }
        }

        impl ops::Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                $name { $($f: -self.$f),+ }
            }
        }

        impl ops::Add for $name {
            type Output = $name;

            fn add(self, rhs: $name) -> $name {
                $name { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl ops::Sub for $name {
            type Output = $name;

            fn sub(self, rhs: $name) -> $name {
                $name { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl ops::Div<f64> for $name {
            type Output = $name;

            fn div(self, c: f64) -> $name {
                let r = 1.0 / c;
                $name { $($f: self.$f * r),+ }
            }
        }

        impl ops::Mul<f64> for $name {
            type Output = $name;

            fn mul(self, c: f64) -> $name {
                $name { $($f: self.$f * c),+ }
            }
        }

        impl ops::Mul<$name> for f64 {
            type Output = $name;

            fn mul(self, v: $name) -> $name {
                v * self
            }
        }
    };
}

vector!(v2, 2, x, y);
vector!(v3, 3, x, y, z);
vector!(v4, 4, x, y, z, w);

impl v3 {
    pub fn xyz(self) -> [f64; 3] {
        self.to_array()
    }
    /// Homogeneous embedding: `w = 1` for points, `w = 0` for directions.
    pub fn extend(self, w: f64) -> v4 {
        v4(self.x, self.y, self.z, w)
    }
}

impl v4 {
    pub fn truncate(self) -> v3 {
        v3(self.x, self.y, self.z)
    }
    /// Perspective divide.
    pub fn homogenize(self) -> v3 {
        self.truncate() / self.w
    }
}

pub fn cross(lhs: v3, rhs: v3) -> v3 {
    let [lx, ly, lz] = lhs.xyz();
    let [rx, ry, rz] = rhs.xyz();
    v3(ly * rz - lz * ry, -(lx * rz - lz * rx), lx * ry - ly * rx)
}

impl fmt::Display for v3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.xyz();
        write!(f, "{x},{y},{z}")
    }
}

impl FromStr for v3 {
    type Err = ParseVectorError;

    fn from_str(s: &str) -> Result<v3, ParseVectorError> {
        let [x, y, z] = split_n::<3>(s, ',')
            .ok_or(ParseVectorErrorRepr::InvalidFormat)?
            .map(|it| it.trim().parse::<f64>().map_err(ParseVectorErrorRepr::ParseFloatError));
        Ok(v3(x?, y?, z?))
    }
}

impl From<ParseVectorErrorRepr> for ParseVectorError {
    fn from(repr: ParseVectorErrorRepr) -> ParseVectorError {
        ParseVectorError(repr)
    }
}

fn split_n<const N: usize>(s: &str, p: char) -> Option<[&str; N]> {
    let mut components = s.split(p);
    let mut res = [""; N];
    for slot in res.iter_mut() {
        *slot = components.next()?;
    }
    if components.next().is_some() {
        return None;
    }
    Some(res)
}

#[test]
fn test_cross_is_right_handed() {
    let x = v3(1.0, 0.0, 0.0);
    let y = v3(0.0, 1.0, 0.0);
    assert_eq!(cross(x, y), v3(0.0, 0.0, 1.0));
    assert_eq!(cross(y, x), v3(0.0, 0.0, -1.0));
    assert_eq!(cross(x, x), v3::ZERO);
}

#[test]
fn test_vector_ops() {
    let a = v3(1.0, 2.0, 2.0);
    assert_eq!(a.norm(), 3.0);
    assert_eq!(a.to_unit() * 3.0, a);
    assert_eq!(a - a, v3::ZERO);
    assert_eq!(2.0 * v2(1.0, -1.0), v2(2.0, -2.0));
    assert_eq!(v4(2.0, 4.0, 6.0, 2.0).homogenize(), v3(1.0, 2.0, 3.0));
    assert_eq!(a.extend(1.0).truncate(), a);
}

#[test]
fn test_parse_vector() {
    assert_eq!("1,1,3".parse::<v3>().unwrap(), v3(1.0, 1.0, 3.0));
    assert_eq!(" 0, -1 ,0.5".parse::<v3>().unwrap(), v3(0.0, -1.0, 0.5));
    assert!("1,1".parse::<v3>().is_err());
    assert!("1,1,1,1".parse::<v3>().is_err());
    let err = "1,x,3".parse::<v3>().unwrap_err();
    assert_eq!(err.to_string(), "invalid float literal");
}
