//! This crate provides routines for reading MicroProse MPSShow
//! slideshow containers, decoding their run-length encoded slides,
//! and exporting them as Windows Bitmap files.

extern crate byteorder;
extern crate libc;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;

pub use errcode::MpsError;
pub use errcode::MpsResult;
pub use mps::{DirectoryRecord,ErrorPolicy,MpsFile,MpsFileWriter,SaveReport};
pub use palette::BitDepth;

pub mod bmp;
pub mod codec;
pub mod errcode;
pub mod ffi;
pub mod mps;
pub mod palette;
mod raster;

/// Width of an MPSShow slide, in pixels.
pub const SCREEN_W: usize = 320;

/// Height of an MPSShow slide, in pixels.
pub const SCREEN_H: usize = 200;

/// Number of entries in a palette.
pub const NUM_COLS: usize = 256;

/// Raster, an 8-bit indexed image stored row by row without padding.
pub struct Raster<'a> {
    w: usize,
    h: usize,
    buf: &'a [u8],
}

/// Mutable raster, the destination for decoded slides.
pub struct RasterMut<'a> {
    w: usize,
    h: usize,
    buf: &'a mut [u8],
}
