//! MPSShow slide encoding and decoding subroutines.

macro_rules! module {
    ($e:ident) => {
        pub use self::$e::*;
        mod $e;
    };
}

module!(rle);

/*--------------------------------------------------------------*/

/// Result of a GroupByValue operation: a length and the repeated
/// value.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
struct Run {
    len: usize,
    value: u8,
}

/// An iterator that groups the buffer into runs of the same value.
///
/// This is suitable for compressing memset type codecs,
/// e.g. the MPSShow slide RLE.
struct GroupByValue<'a> {
    buf: &'a [u8],
    idx: usize,
}

/*--------------------------------------------------------------*/

impl<'a> GroupByValue<'a> {
    /// Create a new GroupByValue iterator.
    fn new(buf: &'a [u8]) -> Self {
        GroupByValue {
            buf: buf,
            idx: 0,
        }
    }
}

impl<'a> Iterator for GroupByValue<'a> {
    type Item = Run;

    /// Advances the iterator and returns the next value.
    fn next(&mut self) -> Option<Run> {
        let len = self.buf.len();
        let start = self.idx;
        let mut i = self.idx;

        if i >= len {
            return None;
        }

        let c = self.buf[start];
        while (i < len) && (self.buf[i] == c) {
            i = i + 1;
        }

        self.idx = i;
        Some(Run {
            len: i - start,
            value: c,
        })
    }
}
