//! BACnet vocabulary and application value codec for the bacnode object model.
//!
//! `bacnode-core` holds everything the object layer needs to talk about
//! BACnet values without owning any object state: identifiers, the standard
//! enumerations, wildcard-aware dates and times, the owned [`DataValue`]
//! model and the tag-level encoder/decoder used to move values in and out of
//! ReadProperty/WriteProperty payloads.
//!
//! # Feature flags
//!
//! - **`std`** (default) — enables `std::error::Error` implementations.
//! - **`serde`** — derives `Serialize`/`Deserialize` on the plain value types.
//!
//! [`DataValue`]: types::DataValue

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Tag system and the byte-level reader/writer pair.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Identifiers, enumerations, dates and the owned value model.
pub mod types;
/// Application-tagged encoding and decoding of [`types::DataValue`].
pub mod value_codec;

pub use error::{DecodeError, EncodeError};

/// Largest APDU a BACnet/IP device accepts; property encodings never exceed it.
pub const MAX_APDU: usize = 1476;
