//! Truevision TGA images.
//!
//! Writing produces uncompressed 24-bit color or 8-bit grayscale files.
//! Reading also accepts run-length encoded data and 32-bit pixels (alpha is
//! dropped). In memory `y = 0` is the bottom row regardless of the origin
//! stored in the file.

use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

use crate::rgb::{self, Color, Image};

/// {0}
#[derive(Debug, displaydoc::Display)]
pub struct Error(ErrorRepr);

#[derive(Debug, displaydoc::Display)]
enum ErrorRepr {
    /// {0}
    Io(io::Error),
    /// unsupported image type {0}
    UnsupportedType(u8),
    /// unsupported pixel depth: {0} bits
    UnsupportedDepth(u8),
    /// image dimensions {0}x{1} out of range
    InvalidDim(u32, u32),
    /// run-length packet overflows the image
    CorruptRle,
    /// image data ends after {0} of {1} bytes
    Truncated(usize, usize),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            ErrorRepr::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorRepr> for Error {
    fn from(repr: ErrorRepr) -> Error {
        Error(repr)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error(ErrorRepr::Io(err))
    }
}

impl Error {
    /// True when the underlying file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(&self.0, ErrorRepr::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    Rgb,
    /// Stores the red channel only.
    Grayscale,
}

const HEADER_LEN: usize = 18;
const TOP_LEFT: u8 = 0x20;

const TYPE_TRUE_COLOR: u8 = 2;
const TYPE_GRAYSCALE: u8 = 3;
const TYPE_RLE_TRUE_COLOR: u8 = 10;
const TYPE_RLE_GRAYSCALE: u8 = 11;

/// Writes `buf` with the top row first, so viewers show `y = 0` at the bottom.
pub fn write(buf: &rgb::Buf<'_>, format: Format, w: &mut dyn Write) -> Result<(), Error> {
    let [width, height] = buf.dim();
    let (Ok(w16), Ok(h16)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(ErrorRepr::InvalidDim(width, height).into());
    };
    let (image_type, bpp) = match format {
        Format::Rgb => (TYPE_TRUE_COLOR, 24),
        Format::Grayscale => (TYPE_GRAYSCALE, 8),
    };

    let mut header = [0u8; HEADER_LEN];
    header[2] = image_type;
    header[12..14].copy_from_slice(&w16.to_le_bytes());
    header[14..16].copy_from_slice(&h16.to_le_bytes());
    header[16] = bpp;
    header[17] = TOP_LEFT;

    let mut data = Vec::with_capacity(width as usize * height as usize * (bpp as usize / 8));
    for y in (0..height).rev() {
        for x in 0..width {
            let Color { r, g, b } = buf[[x, y]];
            match format {
                Format::Rgb => data.extend_from_slice(&[b, g, r]),
                Format::Grayscale => data.push(r),
            }
        }
    }
    w.write_all(&header)?;
    w.write_all(&data)?;
    w.flush()?;
    Ok(())
}

pub fn read(r: &mut dyn Read) -> Result<Image, Error> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header)?;
    let id_len = header[0] as u64;
    let color_map_type = header[1];
    let image_type = header[2];
    let color_map_len = u16::from_le_bytes([header[5], header[6]]) as u64;
    let color_map_bits = header[7] as u64;
    let width = u16::from_le_bytes([header[12], header[13]]) as u32;
    let height = u16::from_le_bytes([header[14], header[15]]) as u32;
    let bpp = header[16];
    let descriptor = header[17];

    let rle = match image_type {
        TYPE_TRUE_COLOR | TYPE_GRAYSCALE => false,
        TYPE_RLE_TRUE_COLOR | TYPE_RLE_GRAYSCALE => true,
        _ => Err(ErrorRepr::UnsupportedType(image_type))?,
    };
    let bytes_pp = match (image_type, bpp) {
        (TYPE_TRUE_COLOR | TYPE_RLE_TRUE_COLOR, 24) => 3,
        (TYPE_TRUE_COLOR | TYPE_RLE_TRUE_COLOR, 32) => 4,
        (TYPE_GRAYSCALE | TYPE_RLE_GRAYSCALE, 8) => 1,
        _ => Err(ErrorRepr::UnsupportedDepth(bpp))?,
    };
    if width == 0 || height == 0 {
        Err(ErrorRepr::InvalidDim(width, height))?
    }

    let color_map_size =
        if color_map_type != 0 { color_map_len * color_map_bits.div_ceil(8) } else { 0 };
    io::copy(&mut Read::take(&mut *r, id_len + color_map_size), &mut io::sink())?;

    let n_pixels = width as usize * height as usize;
    // Sizes come from the header, so the buffers grow with the data actually read.
    let data = if rle {
        read_rle(r, n_pixels, bytes_pp)?
    } else {
        let len = n_pixels * bytes_pp;
        let mut data = Vec::new();
        Read::take(&mut *r, len as u64).read_to_end(&mut data)?;
        if data.len() < len {
            Err(ErrorRepr::Truncated(data.len(), len))?
        }
        data
    };

    let mut pixels: Vec<Color> = data
        .chunks_exact(bytes_pp)
        .map(|px| match *px {
            [v] => Color::new_gray(v),
            [b, g, red, ..] => Color::new(red, g, b),
            _ => unreachable!(),
        })
        .collect();
    if descriptor & TOP_LEFT != 0 {
        flip_rows(&mut pixels, width as usize);
    }
    Ok(Image::new([width, height], pixels))
}

pub fn load(path: &Path) -> Result<Image, Error> {
    let file = File::open(path)?;
    read(&mut BufReader::new(file))
}

fn read_rle(r: &mut dyn Read, n_pixels: usize, bytes_pp: usize) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();
    let mut pixel = [0u8; 4];
    let pixel = &mut pixel[..bytes_pp];
    while data.len() < n_pixels * bytes_pp {
        let mut packet = [0u8; 1];
        r.read_exact(&mut packet)?;
        let packet = packet[0];
        let count = (packet & 0x7f) as usize + 1;
        if data.len() + count * bytes_pp > n_pixels * bytes_pp {
            Err(ErrorRepr::CorruptRle)?
        }
        if packet & 0x80 == 0 {
            let start = data.len();
            data.resize(start + count * bytes_pp, 0);
            r.read_exact(&mut data[start..])?;
        } else {
            r.read_exact(pixel)?;
            for _ in 0..count {
                data.extend_from_slice(pixel);
            }
        }
    }
    Ok(data)
}

fn flip_rows(pixels: &mut [Color], width: usize) {
    let height = pixels.len() / width;
    for y in 0..height / 2 {
        let (top, bottom) = pixels.split_at_mut((height - 1 - y) * width);
        top[y * width..(y + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
}

#[cfg(test)]
mod tests {
    use super::{read, write, Format, HEADER_LEN};
    use crate::rgb::{Color, Image};

    fn header(image_type: u8, width: u16, height: u16, bpp: u8, descriptor: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[2] = image_type;
        h[12..14].copy_from_slice(&width.to_le_bytes());
        h[14..16].copy_from_slice(&height.to_le_bytes());
        h[16] = bpp;
        h[17] = descriptor;
        h
    }

    #[test]
    fn test_write_flips_rows_and_swaps_channels() {
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        // Bottom row red, top row blue.
        let mut img = Image::new([2, 2], vec![red, red, blue, blue]);
        let mut out = Vec::new();
        write(&img.as_buf(), Format::Rgb, &mut out).unwrap();

        assert_eq!(out[..HEADER_LEN], header(2, 2, 2, 24, 0x20)[..]);
        assert_eq!(out[HEADER_LEN..], [255, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 255]);

        let back = read(&mut out.as_slice()).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_write_grayscale() {
        let mut img = Image::new([3, 1], [7, 8, 9].map(Color::new_gray).to_vec());
        let mut out = Vec::new();
        write(&img.as_buf(), Format::Grayscale, &mut out).unwrap();
        assert_eq!(out.len(), HEADER_LEN + 3);
        assert_eq!(out[2], 3);
        assert_eq!(out[HEADER_LEN..], [7, 8, 9]);
    }

    #[test]
    fn test_read_bottom_left_origin() {
        let mut data = header(3, 1, 2, 8, 0);
        data.extend([10, 20]);
        let img = read(&mut data.as_slice()).unwrap();
        assert_eq!(img.get([0, 0]), Some(Color::new_gray(10)));
        assert_eq!(img.get([0, 1]), Some(Color::new_gray(20)));
    }

    #[test]
    fn test_read_rle_with_alpha() {
        let mut data = header(10, 3, 1, 32, 0x20);
        // A run of two blue pixels followed by one raw green pixel.
        data.extend([0x81, 255, 0, 0, 128]);
        data.extend([0x00, 0, 255, 0, 128]);
        let img = read(&mut data.as_slice()).unwrap();
        let blue = Color::new(0, 0, 255);
        assert_eq!(img.pixels(), [blue, blue, Color::new(0, 255, 0)]);
    }

    #[test]
    fn test_read_errors() {
        let mut data = header(10, 1, 1, 24, 0);
        data.extend([0x85, 1, 2, 3]);
        let err = |data: Vec<u8>| read(&mut data.as_slice()).unwrap_err().to_string();
        assert_eq!(err(data), "run-length packet overflows the image");
        assert_eq!(err(header(1, 1, 1, 8, 0)), "unsupported image type 1");
        assert_eq!(err(header(2, 1, 1, 16, 0)), "unsupported pixel depth: 16 bits");
        assert_eq!(err(header(2, 0, 4, 24, 0)), "image dimensions 0x4 out of range");

        let mut data = header(2, 2, 2, 24, 0);
        data.extend([0; 5]);
        assert_eq!(err(data), "image data ends after 5 of 12 bytes");
    }

    #[test]
    fn test_huge_header_without_data() {
        let err = |data: Vec<u8>| read(&mut data.as_slice()).unwrap_err().to_string();
        let huge = header(2, u16::MAX, u16::MAX, 32, 0);
        let len = 65535usize * 65535 * 4;
        assert_eq!(err(huge), format!("image data ends after 0 of {len} bytes"));

        let mut huge_rle = header(10, u16::MAX, u16::MAX, 24, 0);
        huge_rle.extend([0xff, 1, 2, 3]);
        assert!(read(&mut huge_rle.as_slice()).is_err());
    }
}
