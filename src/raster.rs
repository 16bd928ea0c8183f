//! Raster implementation.

use ::{Raster,RasterMut};

impl<'a> Raster<'a> {
    /// Allocate a new raster for the given screen buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// const SCREEN_W: usize = 320;
    /// const SCREEN_H: usize = 200;
    /// let buf = [0; SCREEN_W * SCREEN_H];
    ///
    /// mpsshow::Raster::new(SCREEN_W, SCREEN_H, &buf);
    /// ```
    pub fn new(w: usize, h: usize, buf: &'a [u8])
            -> Self {
        assert!(w * h <= buf.len());

        Raster {
            w: w,
            h: h,
            buf: buf,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.w
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.h
    }

    /// The pixels, `width * height` bytes, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.buf[0..(self.w * self.h)]
    }
}

impl<'a> RasterMut<'a> {
    /// Allocate a new mutable raster for the given screen buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// const SCREEN_W: usize = 320;
    /// const SCREEN_H: usize = 200;
    /// let mut buf = [0; SCREEN_W * SCREEN_H];
    ///
    /// mpsshow::RasterMut::new(SCREEN_W, SCREEN_H, &mut buf);
    /// ```
    pub fn new(w: usize, h: usize, buf: &'a mut [u8])
            -> Self {
        assert!(w * h <= buf.len());

        RasterMut {
            w: w,
            h: h,
            buf: buf,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.w
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.h
    }

    /// Number of pixels the raster can hold.
    pub fn capacity(&self) -> usize {
        self.w * self.h
    }

    /// Set every pixel to colour index 0.
    pub fn reset(&mut self) {
        let end = self.capacity();
        for e in &mut self.buf[0..end] {
            *e = 0;
        }
    }

    /// The pixels, `width * height` bytes, top row first.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let end = self.capacity();
        &mut self.buf[0..end]
    }

    /// Borrow as an immutable raster.
    pub fn as_raster(&self) -> Raster {
        Raster::new(self.w, self.h, &self.buf[..])
    }
}
