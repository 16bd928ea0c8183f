//! Windows Bitmap encoder for 8-bit indexed images.

use std::fs::File;
use std::io::{BufWriter,Write};
use std::path::Path;
use byteorder::LittleEndian as LE;
use byteorder::WriteBytesExt;

use ::{MpsError,MpsResult,NUM_COLS,Raster};
use ::palette::SIZE_OF_PALETTE;

/// Magic for a BMP file, "BM".
pub const BMP_MAGIC: [u8; 2] = *b"BM";

/// Size of the BMP file header on disk.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      2 |   magic  | File format identifier.  Always "BM".
///        2 |      4 |   size   | The size of the entire file, including this header.
///        6 |      2 | reserved | Set to 0.
///        8 |      2 | reserved | Set to 0.
///       10 |      4 |  offset  | Offset from the beginning of the file to the pixel data.
pub const SIZE_OF_FILE_HEADER: usize = 14;

/// Size of the BITMAPINFOHEADER on disk.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      4 |   size   | Size of this header, 40.
///        4 |      4 |   width  | Image width in pixels.
///        8 |      4 |  height  | Image height in pixels.  Positive, so rows are stored bottom-up.
///       12 |      2 |  planes  | Always 1.
///       14 |      2 |   depth  | Bits per pixel, 8.
///       16 |      4 | compress | Compression, 0 for none.
///       20 |      4 |  imgsize | Size of the pixel data, including row padding.
///       24 |      4 |   xres   | Horizontal resolution in pixels per metre.
///       28 |      4 |   yres   | Vertical resolution in pixels per metre.
///       32 |      4 |  colours | Number of palette entries, 256.
///       36 |      4 | important| Number of important colours, 0 for all.
pub const SIZE_OF_INFO_HEADER: usize = 40;

/// Size of the BMP palette on disk: 256 entries of blue, green, red,
/// and a reserved byte.
pub const SIZE_OF_BMP_PALETTE: usize = 4 * NUM_COLS;

/// Offset of the pixel data from the start of the file.
pub const PIXEL_DATA_OFFSET: usize =
    SIZE_OF_FILE_HEADER + SIZE_OF_INFO_HEADER + SIZE_OF_BMP_PALETTE;

/// 96 DPI expressed in pixels per metre.
pub const BMP_PIXELS_PER_METER: u32 = 3780;

/// Bytes per row in the pixel data, padded out to 32 bits.
pub fn bmp_stride(w: usize) -> usize {
    (w + 3) & !3
}

/// Total size of the BMP file for an image of the given dimensions.
pub fn bmp_file_size(w: usize, h: usize) -> usize {
    PIXEL_DATA_OFFSET + bmp_stride(w) * h
}

/// Encode an 8-bit indexed image as a BMP.
///
/// The palette must hold 256 entries at 8 bits per component, as
/// produced by `convert_palette`.  Returns the number of bytes
/// written, which is also the file size.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
///
/// let buf = [0; 4 * 2];
/// let pal = [0; 3 * 256];
/// let mut out = Cursor::new(Vec::new());
///
/// let raster = mpsshow::Raster::new(4, 2, &buf);
/// let size = mpsshow::bmp::encode_bmp(&raster, &pal, &mut out).unwrap();
/// assert_eq!(size, 1086);
/// ```
pub fn encode_bmp<W: Write>(
        src: &Raster, pal: &[u8], w: &mut W)
        -> MpsResult<usize> {
    let (stride, size) = check_bmp_args(src, pal)?;

    // Scanline buffer, zero padded to the stride.
    let mut line: Vec<u8> = Vec::new();
    if line.try_reserve_exact(stride).is_err() {
        return Err(MpsError::AllocationFailure);
    }
    line.resize(stride, 0);

    write_bmp_header(src.w as u32, src.h as u32, size as u32, w)?;

    for c in pal.chunks(3) {
        w.write_all(&[c[2], c[1], c[0], 0])?;
    }

    // Rows are stored bottom to top.
    for row in src.pixels().chunks(src.w).rev() {
        line[0..src.w].copy_from_slice(row);
        w.write_all(&line)?;
    }

    Ok(size)
}

/// Save an 8-bit indexed image to a BMP file.
///
/// The arguments are checked before the file is created.  If writing
/// fails part way, the file is left incomplete.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// let buf = [0; 320 * 200];
/// let pal = [0; 3 * 256];
/// let raster = mpsshow::Raster::new(320, 200, &buf);
///
/// mpsshow::bmp::save_bmp(Path::new("slide.bmp"), &raster, &pal);
/// ```
pub fn save_bmp(filename: &Path, src: &Raster, pal: &[u8])
        -> MpsResult<usize> {
    check_bmp_args(src, pal)?;

    let file = match File::create(filename) {
        Ok(f) => f,
        Err(e) => return Err(MpsError::CreateFailed(filename.to_path_buf(), e)),
    };

    let mut w = BufWriter::new(file);
    let size = encode_bmp(src, pal, &mut w)?;
    w.flush()?;

    debug!("Wrote {} bytes to {}", size, filename.to_string_lossy());
    Ok(size)
}

/*--------------------------------------------------------------*/

/// Validate the encoder's inputs, returning the stride and file size.
fn check_bmp_args(src: &Raster, pal: &[u8])
        -> MpsResult<(usize, usize)> {
    if src.w == 0 || src.h == 0 {
        return Err(MpsError::InvalidArgument("image has no pixels"));
    }
    if pal.len() != SIZE_OF_PALETTE {
        return Err(MpsError::InvalidArgument("palette must have 256 entries"));
    }
    if src.w > ::std::i32::MAX as usize || src.h > ::std::i32::MAX as usize {
        return Err(MpsError::InvalidArgument("image too large"));
    }

    let stride = bmp_stride(src.w);
    let size = stride.checked_mul(src.h)
        .and_then(|n| n.checked_add(PIXEL_DATA_OFFSET));
    match size {
        Some(size) if size <= ::std::u32::MAX as usize => Ok((stride, size)),
        _ => Err(MpsError::InvalidArgument("image too large")),
    }
}

/// Write the file header and info header.
fn write_bmp_header<W: Write>(
        width: u32, height: u32, size: u32, w: &mut W)
        -> MpsResult<()> {
    let image_size = size - PIXEL_DATA_OFFSET as u32;

    w.write_all(&BMP_MAGIC)?;
    w.write_u32::<LE>(size)?;
    w.write_u16::<LE>(0)?; // reserved
    w.write_u16::<LE>(0)?; // reserved
    w.write_u32::<LE>(PIXEL_DATA_OFFSET as u32)?;

    w.write_u32::<LE>(SIZE_OF_INFO_HEADER as u32)?;
    w.write_u32::<LE>(width)?;
    w.write_u32::<LE>(height)?;
    w.write_u16::<LE>(1)?; // planes
    w.write_u16::<LE>(8)?; // bits per pixel
    w.write_u32::<LE>(0)?; // uncompressed
    w.write_u32::<LE>(image_size)?;
    w.write_u32::<LE>(BMP_PIXELS_PER_METER)?;
    w.write_u32::<LE>(BMP_PIXELS_PER_METER)?;
    w.write_u32::<LE>(NUM_COLS as u32)?;
    w.write_u32::<LE>(0)?; // all colours are important
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io::{self,Cursor,Write};
    use byteorder::LittleEndian as LE;
    use byteorder::ReadBytesExt;
    use ::{MpsError,Raster};
    use super::*;

    fn test_palette() -> Vec<u8> {
        let mut pal = vec![0; 3 * 256];
        for (i, c) in pal.chunks_mut(3).enumerate() {
            c[0] = i as u8;         // red
            c[1] = 0x80;            // green
            c[2] = 255 - i as u8;   // blue
        }
        pal
    }

    #[test]
    fn test_stride() {
        assert_eq!(bmp_stride(1), 4);
        assert_eq!(bmp_stride(4), 4);
        assert_eq!(bmp_stride(5), 8);
        assert_eq!(bmp_stride(320), 320);
        assert_eq!(bmp_file_size(320, 200), 1078 + 64000);
    }

    #[test]
    fn test_encode_bmp_4x2() {
        let buf = [
            0x01, 0x02, 0x03, 0x04,     // top row
            0x05, 0x06, 0x07, 0x08 ];   // bottom row
        let pal = test_palette();
        let mut w = Cursor::new(Vec::new());

        let res = encode_bmp(&Raster::new(4, 2, &buf), &pal, &mut w);
        assert_eq!(res.expect("size"), 1086);

        let out = w.into_inner();
        assert_eq!(out.len(), 1086);

        let mut r = Cursor::new(&out[..]);
        assert_eq!(r.read_u8().unwrap(), b'B');
        assert_eq!(r.read_u8().unwrap(), b'M');
        assert_eq!(r.read_u32::<LE>().unwrap(), 1086);  // size
        assert_eq!(r.read_u16::<LE>().unwrap(), 0);
        assert_eq!(r.read_u16::<LE>().unwrap(), 0);
        assert_eq!(r.read_u32::<LE>().unwrap(), 1078);  // offset
        assert_eq!(r.read_u32::<LE>().unwrap(), 40);
        assert_eq!(r.read_u32::<LE>().unwrap(), 4);     // width
        assert_eq!(r.read_u32::<LE>().unwrap(), 2);     // height
        assert_eq!(r.read_u16::<LE>().unwrap(), 1);     // planes
        assert_eq!(r.read_u16::<LE>().unwrap(), 8);     // depth
        assert_eq!(r.read_u32::<LE>().unwrap(), 0);     // compression
        assert_eq!(r.read_u32::<LE>().unwrap(), 8);     // image size
        assert_eq!(r.read_u32::<LE>().unwrap(), 3780);
        assert_eq!(r.read_u32::<LE>().unwrap(), 3780);
        assert_eq!(r.read_u32::<LE>().unwrap(), 256);
        assert_eq!(r.read_u32::<LE>().unwrap(), 0);

        // Palette entries are blue, green, red, reserved.
        assert_eq!(&out[54..58], &[0xFF, 0x80, 0x00, 0x00]);
        assert_eq!(&out[58..62], &[0xFE, 0x80, 0x01, 0x00]);
        assert_eq!(&out[1074..1078], &[0x00, 0x80, 0xFF, 0x00]);

        // Bottom row first.
        assert_eq!(&out[1078..1082], &[0x05, 0x06, 0x07, 0x08]);
        assert_eq!(&out[1082..1086], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_encode_bmp_padding() {
        let buf = [
            0x01, 0x02, 0x03,
            0x04, 0x05, 0x06,
            0x07, 0x08, 0x09 ];
        let pal = test_palette();
        let mut w = Cursor::new(Vec::new());

        let size = encode_bmp(&Raster::new(3, 3, &buf), &pal, &mut w).expect("size");
        assert_eq!(size, 1078 + 12);

        let out = w.into_inner();
        assert_eq!(&out[1078..], &[
            0x07, 0x08, 0x09, 0x00,
            0x04, 0x05, 0x06, 0x00,
            0x01, 0x02, 0x03, 0x00 ]);
    }

    #[test]
    fn test_encode_bmp_bad_args() {
        let buf = [0; 8];
        let pal = test_palette();
        let mut w = Cursor::new(Vec::new());

        match encode_bmp(&Raster::new(0, 2, &buf), &pal, &mut w) {
            Err(MpsError::InvalidArgument(_)) => (),
            _ => panic!("expected invalid argument"),
        }
        match encode_bmp(&Raster::new(4, 2, &buf), &pal[0..765], &mut w) {
            Err(MpsError::InvalidArgument(_)) => (),
            _ => panic!("expected invalid argument"),
        }
        assert!(w.get_ref().is_empty());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_bmp_write_failure() {
        let buf = [0; 8];
        let pal = test_palette();

        match encode_bmp(&Raster::new(4, 2, &buf), &pal, &mut FailingWriter) {
            Err(MpsError::Io(_)) => (),
            _ => panic!("expected io error"),
        }
    }

    #[test]
    fn test_save_bmp() {
        let buf = [0x11; 5 * 3];
        let pal = test_palette();
        let path = env::temp_dir().join("mpsshow_test_save_bmp.bmp");

        let size = save_bmp(&path, &Raster::new(5, 3, &buf), &pal).expect("save");
        assert_eq!(size, 1078 + 8 * 3);
        assert_eq!(fs::metadata(&path).expect("metadata").len(), size as u64);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_bmp_create_failure() {
        let buf = [0; 8];
        let pal = test_palette();
        let path = env::temp_dir().join("mpsshow_no_such_dir").join("x").join("out.bmp");

        match save_bmp(&path, &Raster::new(4, 2, &buf), &pal) {
            Err(MpsError::CreateFailed(p, _)) => assert_eq!(p, path),
            _ => panic!("expected create failure"),
        }
    }
}
