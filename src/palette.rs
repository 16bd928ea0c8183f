//! Palette bit depth conversion.
//!
//! Palettes are stored as flat `R, G, B` byte sequences, 3 bytes per
//! entry, in palette index order.  VGA DAC palettes such as the ones
//! embedded in MPSShow records use 6 bits per component (0-63),
//! Windows Bitmaps use 8 bits per component (0-255), and some EGA era
//! tools use 4 bits per component (0-15).

use std::io::Write;

use ::{MpsError,MpsResult,NUM_COLS};

/// Size of a full palette in bytes.
pub const SIZE_OF_PALETTE: usize = 3 * NUM_COLS;

/// Number of bits per palette component.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum BitDepth {
    Four,
    Six,
    Eight,
}

impl BitDepth {
    /// Map a bit count to a depth.  Only 4, 6 and 8 are supported.
    pub fn from_bits(bits: u32) -> Option<BitDepth> {
        match bits {
            4 => Some(BitDepth::Four),
            6 => Some(BitDepth::Six),
            8 => Some(BitDepth::Eight),
            _ => None,
        }
    }

    /// Number of bits per component.
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Four => 4,
            BitDepth::Six => 6,
            BitDepth::Eight => 8,
        }
    }

    /// Largest component value at this depth.
    pub fn max_value(self) -> u8 {
        match self {
            BitDepth::Four => 15,
            BitDepth::Six => 63,
            BitDepth::Eight => 255,
        }
    }
}

/// Rescale a single component.
///
/// Computes `floor(v * max_out / max_in)` with integer truncation, so
/// results match the output of the original DOS era tools exactly.
/// Values above the source maximum are clamped to it first.
///
/// # Examples
///
/// ```
/// use mpsshow::BitDepth;
/// use mpsshow::palette::convert_component;
///
/// assert_eq!(convert_component(63, BitDepth::Six, BitDepth::Eight), 255);
/// assert_eq!(convert_component(32, BitDepth::Six, BitDepth::Eight), 129);
/// assert_eq!(convert_component(255, BitDepth::Eight, BitDepth::Four), 15);
/// ```
pub fn convert_component(v: u8, from: BitDepth, to: BitDepth)
        -> u8 {
    let max_in = from.max_value() as u32;
    let max_out = to.max_value() as u32;
    let v = if (v as u32) > max_in { max_in } else { v as u32 };

    (v * max_out / max_in) as u8
}

/// Rescale a palette from one bit depth to another, writing into a
/// separate buffer.
pub fn convert_palette(
        src: &[u8], from: BitDepth, dst: &mut [u8], to: BitDepth)
        -> MpsResult<()> {
    if src.len() % 3 != 0 {
        return Err(MpsError::InvalidArgument("palette length not a multiple of 3"));
    }
    if src.len() != dst.len() {
        return Err(MpsError::InvalidArgument("palette lengths differ"));
    }

    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = convert_component(s, from, to);
    }

    Ok(())
}

/// Rescale a palette from one bit depth to another, in place.
pub fn convert_palette_in_place(
        pal: &mut [u8], from: BitDepth, to: BitDepth)
        -> MpsResult<()> {
    if pal.len() % 3 != 0 {
        return Err(MpsError::InvalidArgument("palette length not a multiple of 3"));
    }

    for e in pal.iter_mut() {
        *e = convert_component(*e, from, to);
    }

    Ok(())
}

/// Write the raw palette bytes, as the palette extractor does.
///
/// Returns the number of bytes written.
pub fn write_palette<W: Write>(pal: &[u8], w: &mut W)
        -> MpsResult<usize> {
    if pal.len() != SIZE_OF_PALETTE {
        return Err(MpsError::InvalidArgument("palette must have 256 entries"));
    }

    w.write_all(pal)?;
    Ok(pal.len())
}
