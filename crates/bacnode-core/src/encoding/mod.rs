/// Encode/decode helpers for primitive BACnet values.
pub mod primitives;
/// Zero-copy byte reader for decoding property payloads.
pub mod reader;
/// BACnet tag system (application, context, opening/closing).
pub mod tag;
/// Byte writer for encoding into a caller-owned buffer.
pub mod writer;
