use std::ops;

use crate::{v3, v4};

/// Row-major 4x4 matrix, indexed as `m[[row, col]]`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(non_camel_case_types)]
pub struct m4 {
    rows: [[f64; 4]; 4],
}

const SINGULAR_EPS: f64 = 1e-12;

impl m4 {
    pub const IDENTITY: m4 = m4::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub const fn from_rows(rows: [[f64; 4]; 4]) -> m4 {
        m4 { rows }
    }

    pub fn transpose(self) -> m4 {
        let mut res = self;
        for i in 0..4 {
            for j in 0..4 {
                res.rows[i][j] = self.rows[j][i];
            }
        }
        res
    }

    /// Gauss-Jordan elimination with partial pivoting. `None` for singular matrices.
    pub fn inverse(self) -> Option<m4> {
        let mut a = self.rows;
        let mut inv = m4::IDENTITY.rows;
        for col in 0..4 {
            let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
            if a[pivot][col].abs() < SINGULAR_EPS {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let p = a[col][col];
            for k in 0..4 {
                a[col][k] /= p;
                inv[col][k] /= p;
            }
            for row in 0..4 {
                let f = a[row][col];
                if row == col || f == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= f * a[col][k];
                    inv[row][k] -= f * inv[col][k];
                }
            }
        }
        Some(m4 { rows: inv })
    }

    /// Maps normals so that they stay orthogonal to surfaces transformed by `self`.
    pub fn inverse_transpose(self) -> Option<m4> {
        self.inverse().map(m4::transpose)
    }

    /// Applies the transform to a point, dropping the homogeneous coordinate.
    pub fn transform_point(self, p: v3) -> v3 {
        (self * p.extend(1.0)).homogenize()
    }

    /// Applies the transform to a direction (`w = 0`).
    pub fn transform_dir(self, d: v3) -> v3 {
        (self * d.extend(0.0)).truncate()
    }
}

impl ops::Index<[usize; 2]> for m4 {
    type Output = f64;

    fn index(&self, [row, col]: [usize; 2]) -> &f64 {
        &self.rows[row][col]
    }
}

impl ops::IndexMut<[usize; 2]> for m4 {
    fn index_mut(&mut self, [row, col]: [usize; 2]) -> &mut f64 {
        &mut self.rows[row][col]
    }
}

impl ops::Mul for m4 {
    type Output = m4;

    fn mul(self, rhs: m4) -> m4 {
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        m4 { rows }
    }
}

impl ops::Mul<v4> for m4 {
    type Output = v4;

    fn mul(self, v: v4) -> v4 {
        let v = v.to_array();
        v4::from_array(self.rows.map(|row| (0..4).map(|k| row[k] * v[k]).sum::<f64>()))
    }
}

#[cfg(test)]
fn assert_close(lhs: m4, rhs: m4) {
    for i in 0..4 {
        for j in 0..4 {
            assert!((lhs[[i, j]] - rhs[[i, j]]).abs() < 1e-9, "{lhs:?}\n!=\n{rhs:?}");
        }
    }
}

#[test]
fn test_inverse() {
    let m = m4::from_rows([
        [2.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 3.0, -2.0],
        [0.0, 1.0, 0.0, 4.0],
        [0.0, 0.0, -0.5, 1.0],
    ]);
    let inv = m.inverse().unwrap();
    assert_close(m * inv, m4::IDENTITY);
    assert_close(inv * m, m4::IDENTITY);
    assert_eq!(m4::IDENTITY.inverse(), Some(m4::IDENTITY));
}

#[test]
fn test_singular_has_no_inverse() {
    let mut m = m4::IDENTITY;
    m[[2, 2]] = 0.0;
    assert_eq!(m.inverse(), None);
}

#[test]
fn test_multiplication_is_not_commutative() {
    let mut scale = m4::IDENTITY;
    scale[[0, 0]] = 2.0;
    let mut shift = m4::IDENTITY;
    shift[[0, 3]] = 1.0;
    let p = v3(1.0, 0.0, 0.0);
    assert_eq!((scale * shift).transform_point(p), v3(4.0, 0.0, 0.0));
    assert_eq!((shift * scale).transform_point(p), v3(3.0, 0.0, 0.0));
}

#[test]
fn test_inverse_transpose_keeps_normals_orthogonal() {
    let mut stretch = m4::IDENTITY;
    stretch[[0, 0]] = 4.0;
    // Surface with normal (1, 1, 0) contains tangent (1, -1, 0).
    let tangent = stretch.transform_dir(v3(1.0, -1.0, 0.0));
    let naive = stretch.transform_dir(v3(1.0, 1.0, 0.0));
    let normal = stretch.inverse_transpose().unwrap().transform_dir(v3(1.0, 1.0, 0.0));
    assert!(naive.dot(tangent).abs() > 1.0);
    assert!(normal.dot(tangent).abs() < 1e-12);
}
