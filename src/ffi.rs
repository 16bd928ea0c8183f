//! Foreign function interface.
//!
//! Every function returns 0 on success, or the status code of the
//! failure (see `MpsError::code`).  Null pointers give status 1.

use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;
use std::ptr;
use std::slice;
use libc::{c_char,c_uint,size_t};

use ::{MpsError,MpsFile,MpsResult,Raster,RasterMut};
use ::bmp::{encode_bmp,save_bmp};
use ::codec::{decode_rle,encode_rle};
use ::palette::{BitDepth,SIZE_OF_PALETTE,convert_palette,convert_palette_in_place};

/// Dummy opaque structure, equivalent to Raster<'a>.
pub struct CRaster;

/// Dummy opaque structure, equivalent to RasterMut<'a>.
pub struct CRasterMut;

/// Status for a null or otherwise unusable argument.
const STATUS_BAD_INPUT: c_uint = 1;

// Log with "file:line - " prefix, for more informative error messages.
macro_rules! printerrorln {
    ($e:expr) => {
        error!("{}:{} - {}", file!(), line!(), $e);
    };
}

unsafe fn raster_ref<'a>(src: *const CRaster)
        -> &'a Raster<'a> {
    &*(src as *const Raster)
}

unsafe fn raster_mut_ref<'a>(dst: *mut CRasterMut)
        -> &'a mut RasterMut<'a> {
    &mut *(dst as *mut RasterMut)
}

fn status(file: &'static str, line: u32, res: MpsResult<()>)
        -> c_uint {
    match res {
        Ok(_) => 0,
        Err(e) => {
            error!("{}:{} - {}", file, line, e);
            e.code()
        },
    }
}

fn run_encoder<F>(file: &'static str, line: u32,
        encoder: F,
        out_buf: *mut u8, max_len: size_t, out_len: *mut size_t)
        -> c_uint
        where F: FnOnce(&mut Cursor<Vec<u8>>) -> MpsResult<usize> {
    let mut buf: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    match encoder(&mut buf) {
        Ok(len) => {
            unsafe{ ptr::write(out_len, len) };
            if len <= max_len {
                let dst_slice = unsafe{ slice::from_raw_parts_mut(out_buf, max_len) };
                dst_slice[0..len].copy_from_slice(&buf.get_ref()[0..len]);
                0
            } else {
                error!("{}:{} - output buffer too small, {} bytes required", file, line, len);
                MpsError::ExceededLimit.code()
            }
        },
        Err(e) => {
            error!("{}:{} - {}", file, line, e);
            e.code()
        },
    }
}

fn depth_from_bits(bits: c_uint)
        -> MpsResult<BitDepth> {
    match BitDepth::from_bits(bits) {
        Some(d) => Ok(d),
        None => Err(MpsError::InvalidArgument("bit depth must be 4, 6 or 8")),
    }
}

/*--------------------------------------------------------------*/
/* Codecs                                                       */
/*--------------------------------------------------------------*/

/// Decode an MPSShow slide image.
///
/// The number of pixels written is stored in `out_pixels`, if it is
/// not null.
#[no_mangle]
pub extern "C" fn mpsrs_decode_rle(
        src: *const u8, src_len: size_t, dst: *mut CRasterMut,
        out_pixels: *mut size_t)
        -> c_uint {
    if src.is_null() || dst.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let src_slice = unsafe{ slice::from_raw_parts(src, src_len) };
    let dst_raster = unsafe{ raster_mut_ref(dst) };
    let res = decode_rle(src_slice, dst_raster).map(|n| {
        if !out_pixels.is_null() {
            unsafe{ ptr::write(out_pixels, n) };
        }
    });

    status(file!(), line!(), res)
}

/// Encode an MPSShow slide image.
#[no_mangle]
pub extern "C" fn mpsrs_encode_rle(
        next: *const CRaster,
        out_buf: *mut u8, max_len: size_t, out_len: *mut size_t)
        -> c_uint {
    if next.is_null() || out_buf.is_null() || out_len.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let next_raster = unsafe{ raster_ref(next) };
    run_encoder(file!(), line!(),
            |w| encode_rle(next_raster, w),
            out_buf, max_len, out_len)
}

/// Rescale palette components from one bit depth to another.
///
/// `src` and `dst` may be the same buffer, but must not otherwise
/// overlap.
#[no_mangle]
pub extern "C" fn mpsrs_convert_palette(
        src: *const u8, dst: *mut u8, len: size_t,
        from_bits: c_uint, to_bits: c_uint)
        -> c_uint {
    if src.is_null() || dst.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let res = depth_from_bits(from_bits).and_then(|from| {
        let to = depth_from_bits(to_bits)?;
        if src == dst as *const u8 {
            let pal = unsafe{ slice::from_raw_parts_mut(dst, len) };
            convert_palette_in_place(pal, from, to)
        } else {
            let src_slice = unsafe{ slice::from_raw_parts(src, len) };
            let dst_slice = unsafe{ slice::from_raw_parts_mut(dst, len) };
            convert_palette(src_slice, from, dst_slice, to)
        }
    });

    status(file!(), line!(), res)
}

/// Encode a raster as a Windows Bitmap, into the caller's buffer.
///
/// The size of the bitmap is stored in `out_len` even when the buffer
/// is too small, so the caller can retry with a larger one.
#[no_mangle]
pub extern "C" fn mpsrs_encode_bmp(
        src: *const CRaster, pal: *const u8, pal_len: size_t,
        out_buf: *mut u8, max_len: size_t, out_len: *mut size_t)
        -> c_uint {
    if src.is_null() || pal.is_null() || out_buf.is_null() || out_len.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let src_raster = unsafe{ raster_ref(src) };
    let pal_slice = unsafe{ slice::from_raw_parts(pal, pal_len) };
    run_encoder(file!(), line!(),
            |w| encode_bmp(src_raster, pal_slice, w),
            out_buf, max_len, out_len)
}

/// Save a raster as a Windows Bitmap file.
#[no_mangle]
pub extern "C" fn mpsrs_save_bmp(
        filename: *const c_char,
        src: *const CRaster, pal: *const u8, pal_len: size_t)
        -> c_uint {
    if filename.is_null() || src.is_null() || pal.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let cstr = unsafe{ CStr::from_ptr(filename) };
    let s = match cstr.to_str() {
        Ok(s) => s,
        Err(e) => {
            printerrorln!(e);
            return STATUS_BAD_INPUT;
        },
    };

    let src_raster = unsafe{ raster_ref(src) };
    let pal_slice = unsafe{ slice::from_raw_parts(pal, pal_len) };
    let res = save_bmp(Path::new(s), src_raster, pal_slice).map(|_| ());
    status(file!(), line!(), res)
}

/*--------------------------------------------------------------*/
/* MPS                                                          */
/*--------------------------------------------------------------*/

/// Open an MPSShow container file.
#[no_mangle]
pub extern "C" fn mpsrs_open(filename: *const c_char)
        -> *mut MpsFile {
    if filename.is_null() {
        printerrorln!("bad input parameters");
        return ptr::null_mut();
    }

    let cstr = unsafe{ CStr::from_ptr(filename) };
    match cstr.to_str() {
        Ok(s) => match MpsFile::open(Path::new(s)) {
            Ok(f) => Box::into_raw(Box::new(f)),
            Err(e) => {
                printerrorln!(e);
                ptr::null_mut()
            },
        },
        Err(e) => {
            printerrorln!(e);
            ptr::null_mut()
        },
    }
}

/// Close an MPSShow container file.
#[no_mangle]
pub extern "C" fn mpsrs_close(mps: *mut MpsFile) {
    if mps.is_null() {
        return;
    }

    let _mps = unsafe{ Box::from_raw(mps) };
}

/// Get the number of slides.
#[no_mangle]
pub extern "C" fn mpsrs_slide_count(mps: *const MpsFile)
        -> c_uint {
    if mps.is_null() {
        printerrorln!("bad input parameters");
        return 0;
    }

    let mps = unsafe{ &*mps };
    mps.len() as c_uint
}

/// Decode a slide, indexed from 0, into the raster.
#[no_mangle]
pub extern "C" fn mpsrs_read_image(
        mps: *mut MpsFile, index: size_t, dst: *mut CRasterMut)
        -> c_uint {
    if mps.is_null() || dst.is_null() {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let mps = unsafe{ &mut *mps };
    let dst_raster = unsafe{ raster_mut_ref(dst) };
    let res = mps.read_image(index, dst_raster).map(|_| ());
    status(file!(), line!(), res)
}

/// Copy a slide's palette at the given bit depth into a 768 byte
/// buffer.
#[no_mangle]
pub extern "C" fn mpsrs_palette(
        mps: *const MpsFile, index: size_t, bits: c_uint,
        out_buf: *mut u8, max_len: size_t)
        -> c_uint {
    if mps.is_null() || out_buf.is_null() || max_len < SIZE_OF_PALETTE {
        printerrorln!("bad input parameters");
        return STATUS_BAD_INPUT;
    }

    let mps = unsafe{ &*mps };
    let res = depth_from_bits(bits)
        .and_then(|depth| mps.palette(index, depth))
        .map(|pal| {
            let dst_slice = unsafe{ slice::from_raw_parts_mut(out_buf, SIZE_OF_PALETTE) };
            dst_slice.copy_from_slice(&pal);
        });

    status(file!(), line!(), res)
}

/*--------------------------------------------------------------*/
/* Raster                                                       */
/*--------------------------------------------------------------*/

/// Allocate a new raster over the caller's buffer.
///
/// Returns null if the buffer is smaller than `w * h`.
#[no_mangle]
pub extern "C" fn mpsrs_raster_alloc(
        w: size_t, h: size_t, buf: *const u8, buf_len: size_t)
        -> *mut CRaster {
    if buf.is_null() || w.checked_mul(h).map_or(true, |n| n > buf_len) {
        printerrorln!("bad input parameters");
        return ptr::null_mut();
    }

    let buf_slice = unsafe{ slice::from_raw_parts(buf, buf_len) };
    let raster = Raster::new(w, h, buf_slice);
    Box::into_raw(Box::new(raster)) as *mut CRaster
}

/// Allocate a new mutable raster over the caller's buffer.
///
/// Returns null if the buffer is smaller than `w * h`.
#[no_mangle]
pub extern "C" fn mpsrs_raster_mut_alloc(
        w: size_t, h: size_t, buf: *mut u8, buf_len: size_t)
        -> *mut CRasterMut {
    if buf.is_null() || w.checked_mul(h).map_or(true, |n| n > buf_len) {
        printerrorln!("bad input parameters");
        return ptr::null_mut();
    }

    let buf_slice = unsafe{ slice::from_raw_parts_mut(buf, buf_len) };
    let raster = RasterMut::new(w, h, buf_slice);
    Box::into_raw(Box::new(raster)) as *mut CRasterMut
}

/// Free a previously allocated raster.
#[no_mangle]
pub extern "C" fn mpsrs_raster_free(raster: *mut CRaster) {
    if raster.is_null() {
        return;
    }

    let _raster = unsafe{ Box::from_raw(raster as *mut Raster) };
}

/// Free a previously allocated raster.
#[no_mangle]
pub extern "C" fn mpsrs_raster_mut_free(raster: *mut CRasterMut) {
    if raster.is_null() {
        return;
    }

    let _raster = unsafe{ Box::from_raw(raster as *mut RasterMut) };
}

#[cfg(test)]
mod tests {
    use std::ptr;
    use super::*;

    #[test]
    fn test_null_inputs() {
        let mut len = 0;
        assert_eq!(mpsrs_decode_rle(ptr::null(), 0, ptr::null_mut(), ptr::null_mut()), 1);
        assert_eq!(mpsrs_encode_rle(ptr::null(), ptr::null_mut(), 0, &mut len), 1);
        assert_eq!(mpsrs_convert_palette(ptr::null(), ptr::null_mut(), 0, 6, 8), 1);
        assert!(mpsrs_open(ptr::null()).is_null());
        assert_eq!(mpsrs_slide_count(ptr::null()), 0);
    }

    #[test]
    fn test_raster_too_small() {
        let buf = [0u8; 10];
        assert!(mpsrs_raster_alloc(4, 4, buf.as_ptr(), buf.len()).is_null());
    }

    #[test]
    fn test_decode_encode() {
        let src = [ 3, 0x11, 1, 0x22 ];
        let mut buf = [0u8; 4];
        let mut pixels = 0;

        let dst = mpsrs_raster_mut_alloc(4, 1, buf.as_mut_ptr(), buf.len());
        assert!(!dst.is_null());
        assert_eq!(mpsrs_decode_rle(src.as_ptr(), src.len(), dst, &mut pixels), 0);
        mpsrs_raster_mut_free(dst);

        assert_eq!(pixels, 4);
        assert_eq!(buf, [0x11, 0x11, 0x11, 0x22]);

        let next = mpsrs_raster_alloc(4, 1, buf.as_ptr(), buf.len());
        let mut out = [0u8; 4];
        let mut len = 0;
        assert_eq!(mpsrs_encode_rle(next, out.as_mut_ptr(), out.len(), &mut len), 0);
        assert_eq!(len, 4);
        assert_eq!(out, src);

        // Too small, but the required size is reported.
        assert_eq!(mpsrs_encode_rle(next, out.as_mut_ptr(), 2, &mut len), 9);
        assert_eq!(len, 4);
        mpsrs_raster_free(next);
    }

    #[test]
    fn test_decode_overflow_status() {
        let src = [ 5, 0x11 ];
        let mut buf = [0u8; 4];

        let dst = mpsrs_raster_mut_alloc(4, 1, buf.as_mut_ptr(), buf.len());
        assert_eq!(mpsrs_decode_rle(src.as_ptr(), src.len(), dst, ptr::null_mut()), 7);
        mpsrs_raster_mut_free(dst);
    }

    #[test]
    fn test_convert_palette_in_place() {
        let mut pal = [ 0u8, 32, 63 ];
        let p = pal.as_mut_ptr();
        assert_eq!(mpsrs_convert_palette(p as *const u8, p, pal.len(), 6, 8), 0);
        assert_eq!(pal, [0, 129, 255]);

        let mut out = [0u8; 3];
        assert_eq!(mpsrs_convert_palette(pal.as_ptr(), out.as_mut_ptr(), 3, 8, 4), 0);
        assert_eq!(out, [0, 7, 15]);

        assert_eq!(mpsrs_convert_palette(pal.as_ptr(), out.as_mut_ptr(), 3, 5, 8), 1);
    }

    #[test]
    fn test_encode_bmp() {
        let buf = [0u8; 4 * 2];
        let pal = [0u8; 768];
        let mut out = vec![0u8; 2000];
        let mut len = 0;

        let src = mpsrs_raster_alloc(4, 2, buf.as_ptr(), buf.len());
        assert_eq!(mpsrs_encode_bmp(src, pal.as_ptr(), pal.len(),
                out.as_mut_ptr(), out.len(), &mut len), 0);
        mpsrs_raster_free(src);

        assert_eq!(len, 1086);
        assert_eq!(&out[0..2], b"BM");
    }
}
