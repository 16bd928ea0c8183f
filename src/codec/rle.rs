//! Codec for MPSShow slide images.

use std::cmp::min;
use std::io::Write;
use byteorder::WriteBytesExt;

use ::{MpsError,MpsResult,Raster,RasterMut};
use super::GroupByValue;

/// Longest run a single packet can describe.
pub const MAX_RUN_LENGTH: usize = ::std::u8::MAX as usize;

/// Decode an MPSShow slide image.
///
/// The data is a sequence of two byte packets.  The first byte of
/// each packet is a count, the second is a colour index which is to
/// be replicated count times.  A count of zero writes nothing.
/// Packets are consumed until the input is exhausted; the image is
/// not required to fill the raster, pixels past the end of the
/// stream are left untouched.
///
/// Returns the number of pixels written.
pub fn decode_rle(src: &[u8], dst: &mut RasterMut)
        -> MpsResult<usize> {
    let capacity = dst.capacity();
    let buf = dst.pixels_mut();
    let mut x0 = 0;

    for packet in src.chunks(2) {
        if packet.len() < 2 {
            warn!("RLE stream has odd length {}, ignoring final byte", src.len());
            break;
        }

        let start = x0;
        let end = start + packet[0] as usize;
        if end > capacity {
            return Err(MpsError::DecompressionOverflow { capacity: capacity });
        }

        let c = packet[1];
        for e in &mut buf[start..end] {
            *e = c;
        }

        x0 = end;
    }

    if x0 < capacity {
        debug!("RLE stream filled {} of {} pixels", x0, capacity);
    }

    Ok(x0)
}

/// Encode an MPSShow slide image.
///
/// Returns the number of bytes written.
pub fn encode_rle<W: Write>(
        next: &Raster, w: &mut W)
        -> MpsResult<usize> {
    let mut size = 0;

    for run in GroupByValue::new(next.pixels()) {
        let mut len = run.len;
        while len > 0 {
            let l = min(len, MAX_RUN_LENGTH);
            w.write_u8(l as u8)?;
            w.write_u8(run.value)?;

            len = len - l;
            size = size + 2;
        }
    }

    Ok(size)
}
