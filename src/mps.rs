//! MPSShow container implementation.

use std::cmp::min;
use std::fmt;
use std::fs::File;
use std::io::{self,Cursor,Read,Seek,SeekFrom,Write};
use std::path::{Path,PathBuf};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{MpsError,MpsResult,Raster,RasterMut,SCREEN_H,SCREEN_W};
use ::bmp::save_bmp;
use ::codec::{decode_rle,encode_rle};
use ::palette::{BitDepth,SIZE_OF_PALETTE,convert_palette,write_palette};

/// Size of a directory record on disk.
///
/// An MPSShow container starts with a single byte holding the number
/// of slides, 1 to 255, followed by one directory record per slide.
/// The compressed images follow the directory, located by each
/// record's offset and length.  All values are little-endian, and
/// there is no padding between fields.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      1 | namelen  | Length of the name, at most 9.
///        1 |      9 |   name   | Name of the slide, without extension.
///       10 |      1 | desclen  | Length of the description, at most 25.
///       11 |     25 |   desc   | Brief description of the slide.
///       36 |      4 |  offset  | Absolute offset of the compressed image in the file.
///       40 |      2 |   mode   | Unknown, usually 0x13.  Possibly the video mode.
///       42 |      2 |    len   | Length of the compressed image.
///       44 |      4 |  opaque  | Unknown, appears to be uninitialised.
///       48 |    768 |  palette | 256 R, G, B entries, 0-63 per component.
///      816 |     19 |  trailer | Unknown, possibly show control data.
pub const SIZE_OF_RECORD: usize = 835;

/// Size of the name field.
pub const SIZE_OF_NAME: usize = 9;

/// Size of the description field.
pub const SIZE_OF_DESCRIPTION: usize = 25;

/// Size of the unknown data following the palette.
pub const SIZE_OF_TRAILER: usize = 19;

/// Mode found in every known container.
pub const DEFAULT_MODE: u16 = 0x13;

/// Largest number of slides a container can hold.
pub const MAX_SLIDES: usize = ::std::u8::MAX as usize;

/// Directory record describing a single slide.
///
/// The length prefixes, mode, opaque value and trailer are kept
/// verbatim so that a record can be written back unchanged.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct DirectoryRecord {
    name_len: u8,
    name: [u8; SIZE_OF_NAME],
    desc_len: u8,
    desc: [u8; SIZE_OF_DESCRIPTION],
    offset: u32,
    mode: u16,
    len: u16,
    opaque: u32,
    pal: [u8; SIZE_OF_PALETTE],
    trailer: [u8; SIZE_OF_TRAILER],
}

/// What to do when one slide of a batch fails.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum ErrorPolicy {
    /// Stop at the first failure.
    Abort,
    /// Log the failure and carry on with the next slide.
    Skip,
}

/// Result of saving every slide.
#[derive(Debug)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: Vec<(usize, MpsError)>,
}

/// MPSShow container, with a reader.
///
/// The directory is read once, when the container is opened.
pub struct MpsFile<R = File> {
    records: Vec<DirectoryRecord>,
    reader: R,
}

/// MPSShow container writer.
///
/// Slides are compressed as they are added, and the whole container
/// is written when the writer is finished.
pub struct MpsFileWriter<W: Write + Seek> {
    slides: Vec<(DirectoryRecord, Vec<u8>)>,
    writer: Option<W>,
}

/*--------------------------------------------------------------*/

impl DirectoryRecord {
    /// Create a record for a new slide.
    ///
    /// The palette must hold 256 entries at 6 bits per component.
    ///
    /// # Examples
    ///
    /// ```
    /// let pal = [0; 3 * 256];
    /// let rec = mpsshow::DirectoryRecord::new(b"TITLE", b"Opening screen", &pal).unwrap();
    ///
    /// assert_eq!(rec.name(), b"TITLE");
    /// ```
    pub fn new(name: &[u8], description: &[u8], pal: &[u8])
            -> MpsResult<Self> {
        if name.len() > SIZE_OF_NAME {
            return Err(MpsError::InvalidArgument("name longer than 9 bytes"));
        }
        if description.len() > SIZE_OF_DESCRIPTION {
            return Err(MpsError::InvalidArgument("description longer than 25 bytes"));
        }
        if pal.len() != SIZE_OF_PALETTE {
            return Err(MpsError::InvalidArgument("palette must have 256 entries"));
        }

        let mut rec = DirectoryRecord {
            name_len: name.len() as u8,
            name: [0; SIZE_OF_NAME],
            desc_len: description.len() as u8,
            desc: [0; SIZE_OF_DESCRIPTION],
            offset: 0,
            mode: DEFAULT_MODE,
            len: 0,
            opaque: 0,
            pal: [0; SIZE_OF_PALETTE],
            trailer: [0; SIZE_OF_TRAILER],
        };

        rec.name[0..name.len()].copy_from_slice(name);
        rec.desc[0..description.len()].copy_from_slice(description);
        rec.pal.copy_from_slice(pal);
        Ok(rec)
    }

    /// Decode a record from its on-disk form.
    pub fn from_bytes(buf: &[u8])
            -> MpsResult<Self> {
        if buf.len() < SIZE_OF_RECORD {
            return Err(MpsError::TruncatedRead {
                expected: SIZE_OF_RECORD,
                actual: buf.len(),
            });
        }

        let mut r = Cursor::new(&buf[0..SIZE_OF_RECORD]);
        let mut name = [0; SIZE_OF_NAME];
        let mut desc = [0; SIZE_OF_DESCRIPTION];
        let mut pal = [0; SIZE_OF_PALETTE];
        let mut trailer = [0; SIZE_OF_TRAILER];

        let name_len = r.read_u8()?;
        r.read_exact(&mut name)?;
        let desc_len = r.read_u8()?;
        r.read_exact(&mut desc)?;
        let offset = r.read_u32::<LE>()?;
        let mode = r.read_u16::<LE>()?;
        let len = r.read_u16::<LE>()?;
        let opaque = r.read_u32::<LE>()?;
        r.read_exact(&mut pal)?;
        r.read_exact(&mut trailer)?;

        if name_len as usize > SIZE_OF_NAME {
            warn!("Record name length {} exceeds {}", name_len, SIZE_OF_NAME);
        }
        if desc_len as usize > SIZE_OF_DESCRIPTION {
            warn!("Record description length {} exceeds {}", desc_len, SIZE_OF_DESCRIPTION);
        }

        Ok(DirectoryRecord {
            name_len: name_len,
            name: name,
            desc_len: desc_len,
            desc: desc,
            offset: offset,
            mode: mode,
            len: len,
            opaque: opaque,
            pal: pal,
            trailer: trailer,
        })
    }

    /// Write the record in its on-disk form.
    pub fn write<W: Write>(&self, w: &mut W)
            -> MpsResult<()> {
        w.write_u8(self.name_len)?;
        w.write_all(&self.name)?;
        w.write_u8(self.desc_len)?;
        w.write_all(&self.desc)?;
        w.write_u32::<LE>(self.offset)?;
        w.write_u16::<LE>(self.mode)?;
        w.write_u16::<LE>(self.len)?;
        w.write_u32::<LE>(self.opaque)?;
        w.write_all(&self.pal)?;
        w.write_all(&self.trailer)?;
        Ok(())
    }

    /// Get the slide name, without extension.
    pub fn name(&self) -> &[u8] {
        let n = min(self.name_len as usize, SIZE_OF_NAME);
        &self.name[0..n]
    }

    /// Get the slide name as a string.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name()).into_owned()
    }

    /// Get the slide description.
    pub fn description(&self) -> &[u8] {
        let n = min(self.desc_len as usize, SIZE_OF_DESCRIPTION);
        &self.desc[0..n]
    }

    /// Get the slide description as a string.
    pub fn description_lossy(&self) -> String {
        String::from_utf8_lossy(self.description()).into_owned()
    }

    /// Absolute offset of the compressed image.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length of the compressed image.
    pub fn compressed_len(&self) -> u16 {
        self.len
    }

    /// Get the mode.
    pub fn mode(&self) -> u16 {
        self.mode
    }

    /// Set the mode.
    pub fn set_mode(&mut self, mode: u16) {
        self.mode = mode;
    }

    /// Get the unknown 32-bit value.
    pub fn opaque(&self) -> u32 {
        self.opaque
    }

    /// Set the unknown 32-bit value.
    pub fn set_opaque(&mut self, opaque: u32) {
        self.opaque = opaque;
    }

    /// Get the palette, 6 bits per component.
    pub fn palette(&self) -> &[u8] {
        &self.pal[..]
    }

    /// Get the unknown data following the palette.
    pub fn trailer(&self) -> &[u8; SIZE_OF_TRAILER] {
        &self.trailer
    }

    /// Set the unknown data following the palette.
    pub fn set_trailer(&mut self, trailer: &[u8; SIZE_OF_TRAILER]) {
        self.trailer = *trailer;
    }
}

impl fmt::Display for DirectoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>9} - {:<25} ofs:{:06x} len:{:<6} mode:{:02x}h [{:08x}]",
                self.name_lossy(), self.description_lossy(),
                self.offset, self.len, self.mode, self.opaque)
    }
}

/*--------------------------------------------------------------*/

impl MpsFile<File> {
    /// Open an MPSShow container file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    ///
    /// mpsshow::MpsFile::open(Path::new("F15STORM.MPS"));
    /// ```
    pub fn open(filename: &Path)
            -> MpsResult<Self> {
        if !filename.exists() {
            return Err(MpsError::NoFile);
        } else if !filename.is_file() {
            return Err(MpsError::NotARegularFile);
        }

        let file = File::open(filename)?;
        MpsFile::new(file)
    }
}

impl<R: Read + Seek> MpsFile<R> {
    /// Read the directory from a stream positioned at the start of
    /// the container.
    ///
    /// Image offsets are absolute positions in the stream, so a
    /// container embedded in a larger file should be read from that
    /// file rather than from a copy.
    pub fn new(mut reader: R)
            -> MpsResult<Self> {
        let records = read_directory(&mut reader)?;
        debug!("Read directory of {} slides", records.len());

        Ok(MpsFile {
            records: records,
            reader: reader,
        })
    }

    /// Get the number of slides.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Get all the directory records.
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    /// Get the directory record for a slide, indexed from 0.
    pub fn record(&self, index: usize)
            -> MpsResult<&DirectoryRecord> {
        match self.records.get(index) {
            Some(rec) => Ok(rec),
            None => Err(MpsError::InvalidIndex(index, self.records.len())),
        }
    }

    /// Read a slide's compressed image data.
    pub fn read_compressed(&mut self, index: usize)
            -> MpsResult<Vec<u8>> {
        let (offset, len) = {
            let rec = self.record(index)?;
            (rec.offset as u64, rec.len as usize)
        };

        let mut buf = Vec::new();
        if buf.try_reserve_exact(len).is_err() {
            return Err(MpsError::AllocationFailure);
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let actual = self.reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if actual != len {
            return Err(MpsError::TruncatedRead { expected: len, actual: actual });
        }

        Ok(buf)
    }

    /// Decode a slide into the raster.
    ///
    /// The raster is cleared first, so any pixels the image does not
    /// cover are left as colour index 0.
    ///
    /// Returns the number of pixels decoded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    ///
    /// if let Ok(ref mut mps) = mpsshow::MpsFile::open(Path::new("F15STORM.MPS")) {
    ///     const SCREEN_W: usize = 320;
    ///     const SCREEN_H: usize = 200;
    ///     let mut buf = [0; SCREEN_W * SCREEN_H];
    ///     let mut raster = mpsshow::RasterMut::new(SCREEN_W, SCREEN_H, &mut buf);
    ///
    ///     let res = mps.read_image(0, &mut raster);
    /// }
    /// ```
    pub fn read_image(&mut self, index: usize, dst: &mut RasterMut)
            -> MpsResult<usize> {
        let src = self.read_compressed(index)?;

        dst.reset();
        let n = decode_rle(&src, dst)?;
        debug!("Slide {} - {} bytes decoded to {} pixels", index, src.len(), n);
        Ok(n)
    }

    /// Get a slide's palette at the given bit depth.
    pub fn palette(&self, index: usize, depth: BitDepth)
            -> MpsResult<Vec<u8>> {
        let rec = self.record(index)?;
        let mut pal = vec![0; SIZE_OF_PALETTE];
        convert_palette(&rec.pal, BitDepth::Six, &mut pal, depth)?;
        Ok(pal)
    }

    /// Decode a slide and save it as a BMP file.
    ///
    /// Returns the size of the file written.
    pub fn save_bmp(&mut self, index: usize, filename: &Path)
            -> MpsResult<usize> {
        let mut buf = alloc_zeroed(SCREEN_W * SCREEN_H)?;
        self.read_image(index, &mut RasterMut::new(SCREEN_W, SCREEN_H, &mut buf))?;

        let pal = self.palette(index, BitDepth::Eight)?;
        save_bmp(filename, &Raster::new(SCREEN_W, SCREEN_H, &buf), &pal)
    }

    /// Save a slide's raw 6-bit palette.
    pub fn save_palette(&self, index: usize, filename: &Path)
            -> MpsResult<usize> {
        let rec = self.record(index)?;
        let mut file = match File::create(filename) {
            Ok(f) => f,
            Err(e) => return Err(MpsError::CreateFailed(filename.to_path_buf(), e)),
        };

        write_palette(&rec.pal, &mut file)
    }

    /// Save every slide as a BMP file, named by the given function.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::{Path,PathBuf};
    /// use mpsshow::{ErrorPolicy,MpsFile};
    ///
    /// if let Ok(ref mut mps) = MpsFile::open(Path::new("F15STORM.MPS")) {
    ///     let res = mps.save_all(ErrorPolicy::Skip,
    ///             |_, rec| PathBuf::from(format!("{}.BMP", rec.name_lossy())));
    /// }
    /// ```
    pub fn save_all<F>(&mut self, policy: ErrorPolicy, mut naming: F)
            -> MpsResult<SaveReport>
            where F: FnMut(usize, &DirectoryRecord) -> PathBuf {
        let mut report = SaveReport {
            saved: 0,
            failed: Vec::new(),
        };

        for index in 0..self.records.len() {
            let filename = naming(index, &self.records[index]);

            match self.save_bmp(index, &filename) {
                Ok(_) => {
                    info!("Saved {}", filename.to_string_lossy());
                    report.saved = report.saved + 1;
                },
                Err(e) => {
                    if policy == ErrorPolicy::Abort {
                        return Err(e);
                    }

                    warn!("Skipping slide {} - {}", index, e);
                    report.failed.push((index, e));
                },
            }
        }

        Ok(report)
    }

    /// Release the container, returning the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/*--------------------------------------------------------------*/

impl MpsFileWriter<File> {
    /// Create an MPSShow container file.
    pub fn create(filename: &Path)
            -> MpsResult<Self> {
        match File::create(filename) {
            Ok(file) => Ok(MpsFileWriter::new(file)),
            Err(e) => Err(MpsError::CreateFailed(filename.to_path_buf(), e)),
        }
    }
}

impl<W: Write + Seek> MpsFileWriter<W> {
    /// Create a writer that starts the container at the stream's
    /// current position.
    pub fn new(writer: W) -> Self {
        MpsFileWriter {
            slides: Vec::new(),
            writer: Some(writer),
        }
    }

    /// Compress a slide and add it to the container.
    ///
    /// The record's offset and length are filled in when the
    /// container is written.
    pub fn add_slide(&mut self, record: DirectoryRecord, src: &Raster)
            -> MpsResult<()> {
        if src.width() != SCREEN_W || src.height() != SCREEN_H {
            return Err(MpsError::InvalidArgument("slide must be 320x200"));
        }
        if self.slides.len() >= MAX_SLIDES {
            return Err(MpsError::ExceededLimit);
        }

        let mut enc = Cursor::new(Vec::new());
        let size = encode_rle(src, &mut enc)?;
        if size > ::std::u16::MAX as usize {
            return Err(MpsError::ExceededLimit);
        }

        self.slides.push((record, enc.into_inner()));
        Ok(())
    }

    /// Write the container, returning the underlying writer.
    pub fn finish(mut self)
            -> MpsResult<W> {
        let mut w = match self.writer.take() {
            Some(w) => w,
            None => return Err(MpsError::InvalidArgument("writer already finished")),
        };

        let pos0 = w.seek(SeekFrom::Current(0))?;
        let mut offset = pos0 + 1 + (self.slides.len() * SIZE_OF_RECORD) as u64;

        let mut records = Vec::with_capacity(self.slides.len());
        for &(ref rec, ref data) in self.slides.iter() {
            if offset + data.len() as u64 > ::std::u32::MAX as u64 {
                return Err(MpsError::ExceededLimit);
            }

            let mut rec = rec.clone();
            rec.offset = offset as u32;
            rec.len = data.len() as u16;
            records.push(rec);

            offset = offset + data.len() as u64;
        }

        write_directory(&records, &mut w)?;
        for &(_, ref data) in self.slides.iter() {
            w.write_all(data)?;
        }
        w.flush()?;

        Ok(w)
    }
}

impl<W: Write + Seek> Drop for MpsFileWriter<W> {
    /// A method called when the value goes out of scope.
    fn drop(&mut self) {
        if self.writer.is_some() {
            warn!("Container writer with {} slides was not finished",
                    self.slides.len());
        }
    }
}

/*--------------------------------------------------------------*/

/// Read the slide count and directory records.
///
/// Fails if the count is zero or missing, or if the stream ends
/// before all the records have been read.
pub fn read_directory<R: Read>(r: &mut R)
        -> MpsResult<Vec<DirectoryRecord>> {
    let count = match r.read_u8() {
        Ok(0) => return Err(MpsError::MalformedHeader),
        Ok(n) => n as usize,
        Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof =>
            return Err(MpsError::MalformedHeader),
        Err(e) => return Err(MpsError::Io(e)),
    };

    let expected = count * SIZE_OF_RECORD;
    let mut buf = Vec::new();
    if buf.try_reserve_exact(expected).is_err() {
        return Err(MpsError::AllocationFailure);
    }

    let actual = r.by_ref().take(expected as u64).read_to_end(&mut buf)?;
    if actual != expected {
        return Err(MpsError::TruncatedRead { expected: expected, actual: actual });
    }

    let mut records = Vec::with_capacity(count);
    for chunk in buf.chunks(SIZE_OF_RECORD) {
        records.push(DirectoryRecord::from_bytes(chunk)?);
    }

    Ok(records)
}

/// Write the slide count and directory records.
///
/// Returns the number of bytes written.
pub fn write_directory<W: Write>(records: &[DirectoryRecord], w: &mut W)
        -> MpsResult<usize> {
    if records.is_empty() {
        return Err(MpsError::InvalidArgument("container needs at least one slide"));
    } else if records.len() > MAX_SLIDES {
        return Err(MpsError::ExceededLimit);
    }

    w.write_u8(records.len() as u8)?;
    for rec in records {
        rec.write(w)?;
    }

    Ok(1 + records.len() * SIZE_OF_RECORD)
}

/// Allocate a zeroed buffer, reporting failure instead of aborting.
fn alloc_zeroed(len: usize)
        -> MpsResult<Vec<u8>> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(len).is_err() {
        return Err(MpsError::AllocationFailure);
    }

    buf.resize(len, 0);
    Ok(buf)
}
