//! Netpbm output for scanned images.
//!
//! 8-bit scans become P5 (gray) or P6 (color), line art P4. The encoder's
//! P5/P6 writers are 8-bit only, so 16-bit scans are written as PAM (P7)
//! with a 65535 maxval.

use std::io::Write;

use eyre::WrapErr;
use image::ExtendedColorType;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};

fn subtype(channels: u32, depth: u32) -> PnmSubtype {
    match (channels, depth) {
        (1, 1) => PnmSubtype::Bitmap(SampleEncoding::Binary),
        (1, _) => PnmSubtype::Graymap(SampleEncoding::Binary),
        _ => PnmSubtype::Pixmap(SampleEncoding::Binary),
    }
}

fn color_type(channels: u32, depth: u32) -> ExtendedColorType {
    match (channels, depth) {
        (1, 16) => ExtendedColorType::L16,
        (1, _) => ExtendedColorType::L8,
        (_, 16) => ExtendedColorType::Rgb16,
        _ => ExtendedColorType::Rgb8,
    }
}

/// Expand MSB-first line art, where a set bit is black, to one byte per pixel.
fn unpack_bits(data: &[u8], pixels: usize) -> Vec<u8> {
    let stride = pixels.div_ceil(8);
    data.chunks(stride.max(1))
        .flat_map(|line| {
            (0..pixels).map(move |x| {
                let bit = line.get(x / 8).map_or(0, |b| (b >> (7 - x % 8)) & 1);
                if bit == 1 { 0 } else { 255 }
            })
        })
        .collect()
}

/// Encode a whole image in the byte layout the scanner delivers it.
///
/// 16-bit samples arrive little-endian and are written big-endian, as
/// Netpbm requires.
pub fn encode<W: Write>(
    w: W,
    data: &[u8],
    pixels: u32,
    lines: u32,
    channels: u32,
    depth: u32,
) -> eyre::Result<()> {
    let color = color_type(channels, depth);
    let result = match depth {
        1 => {
            let samples = unpack_bits(data, pixels as usize);
            PnmEncoder::new(w)
                .with_subtype(subtype(channels, depth))
                .encode(samples.as_slice(), pixels, lines, color)
        }
        16 => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|s| u16::from_le_bytes([s[0], s[1]]))
                .collect();
            PnmEncoder::new(w)
                .with_dynamic_header()
                .encode(samples.as_slice(), pixels, lines, color)
        }
        _ => PnmEncoder::new(w)
            .with_subtype(subtype(channels, depth))
            .encode(data, pixels, lines, color),
    };
    result.wrap_err_with(|| format!("encoding {pixels}x{lines} image"))
}
