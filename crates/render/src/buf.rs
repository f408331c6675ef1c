use std::ops;

/// Pixel coordinate `[x, y]`, `y = 0` is the bottom row.
pub type Idx = [u32; 2];

/// A `width x height` grid borrowed from caller-owned storage.
pub struct Buf<'m, T> {
    dim: Idx,
    buf: &'m mut [T],
}

impl<'m, T> Buf<'m, T> {
    pub fn new(dim @ [dx, dy]: Idx, buf: &'m mut [T]) -> Buf<'m, T> {
        assert!(dx as usize * dy as usize == buf.len());
        Buf { dim, buf }
    }
    pub fn by_row(&self) -> impl Iterator<Item = Idx> {
        let [dx, dy] = self.dim;
        (0..dy).flat_map(move |y| (0..dx).map(move |x| [x, y]))
    }
    pub fn buf(&self) -> &[T] {
        &*self.buf
    }
    pub fn buf_mut(&mut self) -> &mut [T] {
        &mut *self.buf
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
    pub fn get(&self, idx: Idx) -> Option<&T> {
        let l = self.linear(idx)?;
        self.buf.get(l)
    }
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.buf.fill(value)
    }
    fn linear(&self, idx: Idx) -> Option<usize> {
        if !(idx[0] < self.dim[0] && idx[1] < self.dim[1]) {
            return None;
        }
        Some(idx[0] as usize + idx[1] as usize * self.dim[0] as usize)
    }
}

impl<'m, T> ops::Index<Idx> for Buf<'m, T> {
    type Output = T;

    fn index(&self, index: Idx) -> &T {
        let l = self.linear(index).unwrap();
        &self.buf()[l]
    }
}

impl<'m, T> ops::IndexMut<Idx> for Buf<'m, T> {
    fn index_mut(&mut self, index: Idx) -> &mut T {
        let l = self.linear(index).unwrap();
        &mut self.buf_mut()[l]
    }
}

#[test]
fn test_row_major_layout() {
    let mut cells = [0u8; 6];
    let mut buf = Buf::new([3, 2], &mut cells);
    buf[[2, 1]] = 7;
    buf[[0, 1]] = 5;
    assert_eq!(buf.get([3, 0]), None);
    assert_eq!(buf.get([0, 2]), None);
    assert_eq!(buf.by_row().take(4).collect::<Vec<_>>(), [[0, 0], [1, 0], [2, 0], [0, 1]]);
    assert_eq!(cells, [0, 0, 0, 5, 0, 7]);
}
