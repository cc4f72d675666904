// src/readers/regionreader.rs

//! Implements a [`RegionReader`], the random-access driver: it owns the
//! memory-mapped bytes of one log file and emits the byte range framed by
//! two [`binary_search`]es.
//!
//! [`binary_search`]: crate::readers::linesearch::binary_search

use std::fs::File;
use std::io::Write;

use crate::common::{Count, EpochSecs, FPath, FileSz, GrepError, NLu8, ResultS3, ResultS4, CHUNKSZ};
use crate::data::datetime::DateTimeMatcher;
use crate::readers::linesearch::binary_search;

use ::memmap2::Mmap;
#[cfg(unix)]
use ::memmap2::UncheckedAdvice;
use ::si_trace_print::{defn, defo, defx};

/// [`RegionReader::slice_into`] result; the found value counts emitted
/// bytes
pub type ResultS4Slice = ResultS4<Count, GrepError>;

/// Reader of one log file as a single read-only byte region.
///
/// Opens and memory-maps the file on construction; the mapping is released
/// on drop. A zero-length file is held as an empty region without a
/// mapping (`mmap(2)` rejects zero-length mappings).
pub struct RegionReader {
    path: FPath,
    filesz: FileSz,
    mmap: Option<Mmap>,
}

impl RegionReader {
    /// Open and map the file at `path`.
    pub fn open(path: &FPath) -> Result<RegionReader, GrepError> {
        defn!("({:?})", path);
        let file: File = File::open(path)?;
        let filesz: FileSz = file.metadata()?.len();
        let mmap: Option<Mmap> = match filesz {
            0 => None,
            _ => Some(unsafe { Mmap::map(&file)? }),
        };
        defx!("filesz {}", filesz);

        Ok(RegionReader {
            path: path.clone(),
            filesz,
            mmap,
        })
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    pub const fn filesz(&self) -> FileSz {
        self.filesz
    }

    /// The mapped bytes; empty for a zero-length file.
    pub fn data(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Emit to `out` every line of the region whose timestamp is within
    /// `[start, stop)`.
    ///
    /// Two binary searches frame the range: `p0` for `start`, then `p1`
    /// for `stop` beginning at `p0`. A miss on the second search takes the
    /// range to the end of the region (an unparseable tail after in-range
    /// lines is emitted with them). The range is written in [`CHUNKSZ`]
    /// chunks; pages wholly behind the write cursor are advised away to
    /// bound resident memory on large scans.
    ///
    /// A final `'\n'` is synthesized if and only if the emitted range was
    /// non-empty, reached the end of the region, and the region did not
    /// end with `'\n'`.
    ///
    /// The found count is the number of bytes written.
    pub fn slice_into<W: Write>(
        &self,
        start: EpochSecs,
        stop: EpochSecs,
        matcher: &DateTimeMatcher,
        out: &mut W,
    ) -> ResultS4Slice {
        defn!("({:?}, start {}, stop {})", self.path, start, stop);
        let data: &[u8] = self.data();
        let size: usize = data.len();
        if size == 0 {
            defx!("empty file");
            return ResultS4::Done;
        }
        let p0: usize = match binary_search(data, 0, start, matcher) {
            ResultS4::Found(at) => at,
            ResultS4::Done => {
                defx!("no line at or after start");
                return ResultS4::Done;
            }
            ResultS4::Null => {
                // the whole region is one undelimited line; emit it whole
                // if its timestamp is in range
                defx!("region is a single line");
                return self.slice_single_line(start, stop, matcher, out);
            }
            ResultS4::Err(err) => return ResultS4::Err(err),
        };
        let p1: usize = match binary_search(data, p0, stop, matcher) {
            ResultS4::Found(at) => at,
            // no line at or after stop; the range runs to the end
            ResultS4::Done | ResultS4::Null => size,
            ResultS4::Err(err) => return ResultS4::Err(err),
        };
        defo!("emit range [{}, {})", p0, p1);

        self.emit_range(data, p0, p1, out)
    }

    /// Emit `data[lbound..ubound)` in chunks, advising away pages behind
    /// the write cursor, and synthesize the final `'\n'` when warranted.
    fn emit_range<W: Write>(
        &self,
        data: &[u8],
        lbound: usize,
        ubound: usize,
        out: &mut W,
    ) -> ResultS4Slice {
        let size: usize = data.len();
        let page_mask: usize = !(page_size() - 1);
        let emitted: Count = (ubound - lbound) as Count;
        let mut lbound: usize = lbound;
        let mut lbound_aligned: usize = lbound & page_mask;
        while lbound < ubound {
            let len: usize = std::cmp::min(CHUNKSZ, ubound - lbound);
            if let Err(err) = out.write_all(&data[lbound..lbound + len]) {
                return ResultS4::Err(GrepError::Io(err));
            }
            lbound += len;
            if lbound_aligned + CHUNKSZ < lbound {
                let ubound_aligned: usize = lbound & page_mask;
                if lbound_aligned < ubound_aligned {
                    self.advise_done(lbound_aligned, ubound_aligned - lbound_aligned);
                }
                lbound_aligned = ubound_aligned;
            }
        }
        if ubound == size && emitted > 0 && data[size - 1] != NLu8 {
            if let Err(err) = out.write_all(b"\n") {
                return ResultS4::Err(GrepError::Io(err));
            }
            return ResultS4::Found(emitted + 1);
        }

        ResultS4::Found(emitted)
    }

    /// The single-undelimited-line region: extract directly and emit the
    /// whole region, `'\n'`-terminated, when its timestamp is in range.
    fn slice_single_line<W: Write>(
        &self,
        start: EpochSecs,
        stop: EpochSecs,
        matcher: &DateTimeMatcher,
        out: &mut W,
    ) -> ResultS4Slice {
        let data: &[u8] = self.data();
        match matcher.get_timestamp(data) {
            ResultS3::Found(epoch) if epoch >= start && epoch < stop => {
                self.emit_range(data, 0, data.len(), out)
            }
            ResultS3::Err(err) => ResultS4::Err(err),
            _ => ResultS4::Null,
        }
    }

    /// Advise the operating system that the mapped range is no longer
    /// needed. Release-behind is an optimization; failure is ignored, and
    /// systems without the primitive skip it.
    #[allow(unused_variables)]
    fn advise_done(&self, offset: usize, len: usize) {
        #[cfg(unix)]
        if let Some(mmap) = &self.mmap {
            let _ = unsafe { mmap.unchecked_advise_range(UncheckedAdvice::DontNeed, offset, len) };
        }
    }
}

/// Page size for release-behind alignment.
fn page_size() -> usize {
    #[cfg(unix)]
    {
        let sz: i64 = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as i64;
        if sz > 0 {
            return sz as usize;
        }
    }
    4096
}
