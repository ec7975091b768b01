//! Frame buffer for accumulating partial socket reads.
//!
//! Uses `bytes::BytesMut` for buffer management. The wire carries 4-byte
//! big-endian length prefixes, so there is no header state machine: while at
//! least 4 buffered bytes are available the length is peeked, and the frame
//! is extracted once the full payload has arrived. One read may complete
//! several frames; a frame may take several reads.

use bytes::{Buf, BytesMut};

use super::fieldset::Fieldset;
use crate::error::{Result, TwsError};

/// Maximum accepted frame payload length.
pub const DEFAULT_MAX_FRAME_LEN: u32 = 0x00FF_FFFF;

/// Buffer that turns a raw byte stream into decoded fieldsets.
pub struct FrameBuffer {
    buffer: BytesMut,
    max_frame_len: u32,
}

impl FrameBuffer {
    /// Create a frame buffer with default limits.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a frame buffer with a custom maximum payload length.
    pub fn with_max_frame_len(max_frame_len: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            max_frame_len,
        }
    }

    /// Push bytes from a socket read and extract all complete fieldsets.
    ///
    /// Partial data is retained for the next push. Returns an empty vector
    /// while a frame is still incomplete.
    ///
    /// # Errors
    ///
    /// Rejects frames whose declared length exceeds the configured maximum
    /// and payloads that are not valid ASCII/UTF-8.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Fieldset>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(fields) = self.try_extract_one()? {
            frames.push(fields);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Fieldset>> {
        if self.buffer.len() < 4 {
            return Ok(None);
        }

        // Peek the length without consuming it; the prefix stays buffered
        // until the whole frame has arrived.
        let len = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]);

        if len > self.max_frame_len {
            return Err(TwsError::Protocol(format!(
                "frame length {} exceeds maximum {}",
                len, self.max_frame_len
            )));
        }

        let total = 4 + len as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        self.buffer.advance(4);
        let payload = self.buffer.split_to(len as usize);

        let text = std::str::from_utf8(&payload)
            .map_err(|_| TwsError::Protocol("frame payload is not valid ASCII".into()))?;

        let mut fields: Vec<String> = text.split('\0').map(str::to_string).collect();
        // The payload always ends with NUL, so the final token is empty.
        match fields.pop() {
            Some(last) if last.is_empty() => {}
            _ => {
                return Err(TwsError::Protocol(
                    "frame payload missing trailing NUL".into(),
                ))
            }
        }

        Ok(Some(fields))
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    fn fields(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let bytes = encode_frame(&fields(&["9", "1", "42"]));

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames, vec![fields(&["9", "1", "42"])]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let mut bytes = encode_frame(&fields(&["49", "1"]));
        bytes.extend(encode_frame(&fields(&["15", "1", "DU123456"])));
        bytes.extend(encode_frame(&fields(&["9", "1", "7"])));

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], fields(&["49", "1"]));
        assert_eq!(frames[1], fields(&["15", "1", "DU123456"]));
        assert_eq!(frames[2], fields(&["9", "1", "7"]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_across_reads() {
        let mut buffer = FrameBuffer::new();
        let bytes = encode_frame(&fields(&["4", "2", "5", "200", "No security found"]));

        // Length prefix split in two deliveries, payload in a third.
        assert!(buffer.push(&bytes[..2]).unwrap().is_empty());
        assert!(buffer.push(&bytes[2..6]).unwrap().is_empty());
        let frames = buffer.push(&bytes[6..]).unwrap();

        assert_eq!(frames, vec![fields(&["4", "2", "5", "200", "No security found"])]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = encode_frame(&fields(&["1", "6", "9", "4", "182.5", "300", "1"]));

        let mut all = Vec::new();
        for b in &bytes {
            all.extend(buffer.push(std::slice::from_ref(b)).unwrap());
        }

        assert_eq!(all, vec![fields(&["1", "6", "9", "4", "182.5", "300", "1"])]);
    }

    #[test]
    fn test_empty_tokens_preserved() {
        let mut buffer = FrameBuffer::new();
        let bytes = encode_frame(&fields(&["3", "", "", "LMT"]));

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames, vec![fields(&["3", "", "", "LMT"])]);
    }

    #[test]
    fn test_complete_plus_partial() {
        let mut buffer = FrameBuffer::new();
        let first = encode_frame(&fields(&["49", "1", "1590000000"]));
        let second = encode_frame(&fields(&["9", "1", "11"]));

        let mut data = first.clone();
        data.extend_from_slice(&second[..3]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);

        let frames = buffer.push(&second[3..]).unwrap();
        assert_eq!(frames, vec![fields(&["9", "1", "11"])]);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buffer = FrameBuffer::with_max_frame_len(16);
        let bytes = encode_frame(&fields(&["this payload is longer than sixteen bytes"]));

        assert!(matches!(buffer.push(&bytes), Err(TwsError::Protocol(_))));
    }

    #[test]
    fn test_handshake_server_version_frame() {
        // The version negotiation frame is an ordinary frame: two tokens.
        let mut buffer = FrameBuffer::new();
        let bytes = encode_frame(&fields(&["151", "20260806 10:00:00 EST"]));

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][0], "151");
    }
}
