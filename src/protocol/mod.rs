//! Wire-level protocol: fieldset tokens and length-prefixed framing.
//!
//! A frame on the wire is a 4-byte big-endian length followed by that many
//! ASCII bytes. The payload is a sequence of NUL-separated tokens with a
//! trailing NUL; token position is the only structure there is.

mod fieldset;
mod frame_buffer;

pub use fieldset::{
    encode_frame, encode_string_frame, FieldCursor, Fieldset, FieldsetBuilder,
};
pub use frame_buffer::{FrameBuffer, DEFAULT_MAX_FRAME_LEN};

/// Literal preamble sent before the version-range handshake frame.
pub const HANDSHAKE_PREFIX: &[u8] = b"API\0";
