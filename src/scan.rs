use crate::error::IoError;
use crate::io::ByteSource;

/// Default window size for streaming scans, in bytes.
pub const SCAN_WINDOW: usize = 8192;

/// Streaming substring search over a [`ByteSource`].
///
/// Scans a byte stream in fixed-size windows, carrying the last `carry`
/// bytes of each window to the head of the next so a marker that straddles
/// a window boundary is still found. Matches are reported as absolute file
/// offsets, in order, with no duplicates.
///
/// Markers are literal ASCII byte strings. A scanner can also carry a set
/// of exclusion patterns: longer strings that begin with the marker and
/// disqualify a match (e.g. `<Bin:External` when scanning for `<Bin`). When
/// a candidate sits too close to the window edge to judge in-buffer, the
/// scanner probes the source directly at the candidate offset.
#[derive(Debug, Clone)]
pub struct MarkerScanner<'a> {
    pattern: &'a [u8],
    carry: usize,
    excludes: &'a [&'a [u8]],
    window: usize,
}

impl<'a> MarkerScanner<'a> {
    /// Create a scanner for `pattern` with the given carry length.
    ///
    /// `carry` must be at least `pattern.len() - 1`, otherwise a match
    /// spanning a window boundary could be lost.
    pub fn new(pattern: &'a [u8], carry: usize) -> Self {
        Self::with_excludes(pattern, carry, &[])
    }

    /// Create a scanner that rejects matches which are actually an
    /// occurrence of one of `excludes`. Every exclusion must begin with
    /// `pattern`.
    pub fn with_excludes(pattern: &'a [u8], carry: usize, excludes: &'a [&'a [u8]]) -> Self {
        assert!(!pattern.is_empty(), "scan pattern must not be empty");
        assert!(
            carry + 1 >= pattern.len(),
            "carry must be at least pattern length - 1"
        );
        debug_assert!(excludes.iter().all(|e| e.starts_with(pattern)));

        Self {
            pattern,
            carry,
            excludes,
            window: SCAN_WINDOW,
        }
    }

    /// Override the window size. Mainly useful for exercising boundary
    /// behavior with small buffers.
    pub fn window_size(mut self, size: usize) -> Self {
        assert!(size > self.carry, "window must be larger than the carry");
        self.window = size;
        self
    }

    /// Begin a scan session at `start`.
    pub fn session<'s, S: ByteSource + ?Sized>(
        &'s self,
        source: &'s S,
        start: u64,
    ) -> ScanSession<'s, S> {
        ScanSession {
            scanner: self,
            source,
            size: source.size(),
            buf: Vec::with_capacity(self.window),
            pos: start,
            has_carry: false,
        }
    }

    /// Find the first accepted match at or after `start`.
    ///
    /// Returns `None` if the scan exhausts the file without a match.
    pub fn find_first<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        start: u64,
    ) -> Result<Option<u64>, IoError> {
        let mut session = self.session(source, start);
        while let Some(hits) = session.next_window()? {
            if let Some(&first) = hits.first() {
                return Ok(Some(first));
            }
        }
        Ok(None)
    }

    /// Find every accepted match at or after `start`, in file order.
    pub fn find_all<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        start: u64,
    ) -> Result<Vec<u64>, IoError> {
        let mut session = self.session(source, start);
        let mut all = Vec::new();
        while let Some(hits) = session.next_window()? {
            all.extend(hits);
        }
        Ok(all)
    }

    /// Record every accepted match in `window` into `out` as absolute
    /// offsets. Matches that end within the carried prefix were already
    /// reported by the previous window and are suppressed.
    fn scan_window<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        window: &[u8],
        window_start: u64,
        carried: usize,
        out: &mut Vec<u64>,
    ) -> Result<(), IoError> {
        let plen = self.pattern.len();
        if window.len() < plen {
            return Ok(());
        }

        let mut from = 0;
        while let Some(found) = find_sub(&window[from..], self.pattern) {
            let at = from + found;
            from = at + 1;

            if at + plen <= carried {
                continue;
            }

            let abs = window_start + at as u64;
            if self.is_excluded(source, window, at, abs)? {
                continue;
            }

            out.push(abs);
        }

        Ok(())
    }

    /// Check whether the candidate at `at` is an occurrence of one of the
    /// exclusion patterns. Falls back to a direct source probe when the
    /// window does not hold enough bytes past the candidate.
    fn is_excluded<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        window: &[u8],
        at: usize,
        abs: u64,
    ) -> Result<bool, IoError> {
        for exclude in self.excludes {
            if at + exclude.len() <= window.len() {
                if &window[at..at + exclude.len()] == *exclude {
                    return Ok(true);
                }
            } else {
                let available = source.size().saturating_sub(abs);
                if available < exclude.len() as u64 {
                    // File ends before the exclusion could complete.
                    continue;
                }
                let probe = source.read_exact_at(abs, exclude.len())?;
                if &probe[..] == *exclude {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// One in-progress scan over a source.
///
/// Windows are consumed one at a time with [`next_window`]; consecutive
/// windows overlap by the scanner's carry length. [`skip`] jumps the read
/// position forward, which drops the carry (the skipped-over bytes were
/// never scanned, so there is nothing to dedup against).
///
/// [`next_window`]: ScanSession::next_window
/// [`skip`]: ScanSession::skip
pub struct ScanSession<'s, S: ?Sized> {
    scanner: &'s MarkerScanner<'s>,
    source: &'s S,
    size: u64,
    buf: Vec<u8>,
    /// Next fresh read position in the file.
    pos: u64,
    has_carry: bool,
}

impl<'s, S: ByteSource + ?Sized> ScanSession<'s, S> {
    /// Absolute offset of the next fresh read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Advance the read position by `n` bytes without scanning them.
    pub fn skip(&mut self, n: u64) {
        if n > 0 {
            self.pos += n;
            self.buf.clear();
            self.has_carry = false;
        }
    }

    /// Read and scan the next window, returning the accepted match offsets
    /// within it (possibly empty). Returns `None` once the file is
    /// exhausted.
    pub fn next_window(&mut self) -> Result<Option<Vec<u64>>, IoError> {
        if self.pos >= self.size {
            return Ok(None);
        }

        let carried = if self.has_carry {
            self.scanner.carry.min(self.buf.len())
        } else {
            0
        };

        // Move the carried tail to the head, then fill with fresh bytes.
        if carried > 0 {
            let keep_from = self.buf.len() - carried;
            self.buf.copy_within(keep_from.., 0);
        }
        self.buf.truncate(carried);

        let fresh = (self.scanner.window - carried).min((self.size - self.pos) as usize);
        let chunk = self.source.read_exact_at(self.pos, fresh)?;
        self.buf.extend_from_slice(&chunk);

        let window_start = self.pos - carried as u64;
        self.pos += fresh as u64;
        self.has_carry = true;

        let mut hits = Vec::new();
        self.scanner
            .scan_window(self.source, &self.buf, window_start, carried, &mut hits)?;
        Ok(Some(hits))
    }
}

fn find_sub(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
