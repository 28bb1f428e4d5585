//! # filecfg-codec — Instance ⇄ Generic Map
//!
//! Converts typed record instances into the plain string-keyed maps format
//! handlers serialize, and back.
//!
//! ## Encode
//!
//! [`Codec::encode`] walks a record's fields in declaration order, recursing
//! by [`TypeShape`](filecfg_core::TypeShape): nested records become nested
//! maps, sequences and sets map element-wise, mappings map their values,
//! and enum members become their underlying value. A field with a custom
//! encoder hook bypasses all of this.
//!
//! ## Decode
//!
//! [`Codec::decode`] mirrors encode and is lenient about shape mismatches,
//! which pass through unchanged for the validator to report. Scalars are
//! coerced only where no information is lost (see [`coerce`]).
//!
//! ## Crate Policy
//!
//! - Depends only on `filecfg-core` internally.
//! - Shapes always come from the shared [`ShapeCache`](filecfg_core::ShapeCache),
//!   never from a private classifier call.

pub mod codec;
pub mod coerce;
pub mod error;

pub use codec::{Codec, GenericMap};
pub use coerce::coerce_scalar;
pub use error::CodecError;
