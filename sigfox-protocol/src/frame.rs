//! Response framing for the Wisol line protocol.
//!
//! Bytes arrive one at a time from the UART. A response is complete once
//! `expected_markers` marker characters (CR by default) have been seen since
//! the last completed response. Line feeds are dropped, since the modem ends
//! every line with CR LF.
//!
//! Unlike a wrap-around buffer, the framer never overwrites unread data: a
//! response longer than the buffer yields [`FramerError::Overflow`] once and
//! the rest of that response is discarded up to its terminator.

use heapless::Vec;

/// Character marking the end of one modem response
pub const END_OF_RESPONSE: u8 = b'\r';

/// Line feed, dropped by the framer unless it is the marker itself
pub const LINE_FEED: u8 = b'\n';

/// Largest response the framer buffers
pub const MAX_RESPONSE_LEN: usize = 64;

/// One complete modem response, without its terminator
pub type Response = Vec<u8, MAX_RESPONSE_LEN>;

/// Errors that can occur while framing responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramerError {
    /// Response exceeded the line buffer; it was discarded
    Overflow,
    /// A response completed before the previous one was consumed
    QueueFull,
    /// No completion target installed
    NoTarget,
}

/// State machine assembling modem responses
#[derive(Debug, Clone)]
pub struct LineFramer<const N: usize = MAX_RESPONSE_LEN> {
    buffer: Vec<u8, N>,
    marker: u8,
    expected_markers: u8,
    seen_markers: u8,
    /// Current response overflowed, drop bytes until its terminator
    discarding: bool,
}

impl<const N: usize> Default for LineFramer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineFramer<N> {
    /// Create a framer expecting single-line responses ended by CR
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            marker: END_OF_RESPONSE,
            expected_markers: 1,
            seen_markers: 0,
            discarding: false,
        }
    }

    /// Set the marker character ending a response
    pub fn set_marker(&mut self, marker: u8) {
        self.marker = marker;
    }

    /// Set how many markers make up one complete response
    ///
    /// Zero is treated as one.
    pub fn set_expected_markers(&mut self, count: u8) {
        self.expected_markers = count;
    }

    /// Marker count at which a response is complete
    pub fn threshold(&self) -> u8 {
        self.expected_markers.max(1)
    }

    /// Bytes buffered for the response in progress
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop any partial response
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.seen_markers = 0;
        self.discarding = false;
    }

    /// Feed a single byte to the framer
    ///
    /// Returns `Ok(Some(response))` exactly once per completed response,
    /// `Ok(None)` when more bytes are needed, or `Err(Overflow)` the first
    /// time a response outgrows the buffer.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Vec<u8, N>>, FramerError> {
        if byte == LINE_FEED && self.marker != LINE_FEED {
            return Ok(None);
        }

        if byte == self.marker {
            self.seen_markers = self.seen_markers.saturating_add(1);
            if self.seen_markers >= self.threshold() {
                let discarded = self.discarding;
                let response = core::mem::take(&mut self.buffer);
                self.reset();
                return Ok(if discarded { None } else { Some(response) });
            }
            // Embedded marker of a multi-line response, keep it
        }

        if self.discarding {
            return Ok(None);
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(FramerError::Overflow);
        }

        Ok(None)
    }

    /// Feed multiple bytes to the framer
    ///
    /// Returns the first complete response found, if any.
    /// Remaining bytes after a complete response are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Vec<u8, N>>, FramerError> {
        for &byte in bytes {
            if let Some(response) = self.feed(byte)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ok_completes_on_third_byte() {
        let mut framer: LineFramer = LineFramer::new();

        assert_eq!(framer.feed(b'O'), Ok(None));
        assert_eq!(framer.feed(b'K'), Ok(None));
        let response = framer.feed(b'\r').unwrap().unwrap();

        assert_eq!(&response[..], b"OK");
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_line_feed_is_dropped() {
        let mut framer: LineFramer = LineFramer::new();

        let first = framer.feed_bytes(b"OK\r").unwrap().unwrap();
        assert_eq!(&first[..], b"OK");

        // Trailing LF of the previous line must not leak into the next one
        let second = framer.feed_bytes(b"\n1234ABCD\r\n").unwrap().unwrap();
        assert_eq!(&second[..], b"1234ABCD");
    }

    #[test]
    fn test_multi_marker_response() {
        let mut framer: LineFramer = LineFramer::new();
        framer.set_expected_markers(2);

        assert_eq!(framer.feed_bytes(b"OK\r\n"), Ok(None));
        let response = framer.feed_bytes(b"RX=01 02\r\n").unwrap().unwrap();

        assert_eq!(&response[..], b"OK\rRX=01 02");
    }

    #[test]
    fn test_zero_expected_markers_acts_as_one() {
        let mut framer: LineFramer = LineFramer::new();
        framer.set_expected_markers(0);

        let response = framer.feed_bytes(b"OK\r").unwrap().unwrap();
        assert_eq!(&response[..], b"OK");
    }

    #[test]
    fn test_custom_marker() {
        let mut framer: LineFramer = LineFramer::new();
        framer.set_marker(b'\n');

        let response = framer.feed_bytes(b"OK\n").unwrap().unwrap();
        assert_eq!(&response[..], b"OK");
    }

    #[test]
    fn test_overflow_reported_once_then_resyncs() {
        let mut framer: LineFramer<4> = LineFramer::new();

        assert_eq!(framer.feed_bytes(b"ABCD"), Ok(None));
        assert_eq!(framer.feed(b'E'), Err(FramerError::Overflow));
        // Rest of the oversized response is dropped silently
        assert_eq!(framer.feed_bytes(b"FGH"), Ok(None));
        // Its terminator completes nothing
        assert_eq!(framer.feed(b'\r'), Ok(None));

        let response = framer.feed_bytes(b"OK\r").unwrap().unwrap();
        assert_eq!(&response[..], b"OK");
    }

    #[test]
    fn test_empty_response() {
        let mut framer: LineFramer = LineFramer::new();
        let response = framer.feed(b'\r').unwrap().unwrap();
        assert!(response.is_empty());
    }

    proptest! {
        #[test]
        fn prop_one_completion_per_terminator(text in "[ -~]{0,64}") {
            let mut framer: LineFramer = LineFramer::new();
            let bytes = text.as_bytes();

            for &byte in bytes {
                prop_assert_eq!(framer.feed(byte), Ok(None));
            }
            let response = framer.feed(b'\r').unwrap();
            prop_assert!(response.is_some());
            prop_assert_eq!(&response.unwrap()[..], bytes);
        }

        #[test]
        fn prop_completions_match_terminators(lines in proptest::collection::vec("[ -~]{0,16}", 1..8)) {
            let mut framer: LineFramer = LineFramer::new();
            let mut completions = 0;

            for line in &lines {
                for &byte in line.as_bytes().iter().chain(b"\r\n") {
                    if framer.feed(byte).unwrap().is_some() {
                        completions += 1;
                    }
                }
            }
            prop_assert_eq!(completions, lines.len());
        }
    }
}
