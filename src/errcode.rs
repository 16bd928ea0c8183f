//! MPSShow error codes.

use std::io;
use std::path::PathBuf;

pub type MpsResult<T> = Result<T, MpsError>;

quick_error! {
    #[derive(Debug)]
    pub enum MpsError {
        NoFile {
            description("No file")
            display("File not found")
        }
        NotARegularFile {
            description("Not a regular file")
            display("Not a regular file")
        }
        AllocationFailure {
            description("Allocation failure")
            display("Unable to allocate memory")
        }
        /// The record count is zero or missing.
        MalformedHeader {
            description("Malformed header")
            display("Malformed header")
        }
        TruncatedRead { expected: usize, actual: usize } {
            description("Truncated read")
            display("Truncated read - expected {} bytes, got {}", expected, actual)
        }
        /// The RLE stream produced more pixels than the raster holds.
        DecompressionOverflow { capacity: usize } {
            description("Decompression overflow")
            display("Decompression overflow - raster holds {} pixels", capacity)
        }
        InvalidIndex(index: usize, count: usize) {
            description("Invalid index")
            display("Index {} out of range, container holds {} records", index, count)
        }
        InvalidArgument(what: &'static str) {
            description("Invalid argument")
            display("Invalid argument - {}", what)
        }
        ExceededLimit {
            description("Exceeded limit")
            display("Exceeded limit")
        }
        CreateFailed(path: PathBuf, err: io::Error) {
            cause(err)
            display("Unable to create {} - {}", path.display(), err)
        }
        Io(err: io::Error) {
            from()
            cause(err)
            display("IO error: {}", err)
        }
    }
}

impl MpsError {
    /// Numeric status reported through the C interface.  0 is
    /// reserved for success.
    pub fn code(&self) -> u32 {
        use self::MpsError::*;
        match *self {
            InvalidArgument(..) | NoFile | NotARegularFile => 1,
            CreateFailed(..) => 2,
            AllocationFailure => 3,
            Io(..) => 4,
            MalformedHeader => 5,
            TruncatedRead { .. } => 6,
            DecompressionOverflow { .. } => 7,
            InvalidIndex(..) => 8,
            ExceededLimit => 9,
        }
    }
}
