//! Codec Module
//!
//! Envelope format for stored values and the compression threshold policy.
//!
//! A stored value is either a gzip stream, which always begins with
//! [`GZIP_MAGIC`], or raw serialized bytes. Readers must accept both forms
//! forever: entries written below the threshold, or before compression was
//! enabled, never carry the header.

mod gzip;
mod threshold;

pub use gzip::{compress, decompress, is_compressed};
pub use threshold::{should_compress, Threshold};

// == Public Constants ==
/// First two bytes of every compressed envelope (RFC 1952 ID1, ID2).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Stored form of an explicitly cached null.
///
/// Contains 0xC0, which never occurs in UTF-8, so neither the JSON nor the
/// string serializer can produce it. Never compressed.
pub const NULL_VALUE: &[u8] = &[0x00, 0xC0, b'n', b'u', b'l', b'l', 0xC0, 0x00];
