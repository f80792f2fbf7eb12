/*! `bitformat`: arbitrary-length bit sequences and a declarative bit-format
schema layer.

This crate is built from three tightly coupled layers, leaves first:

- [`bits`]: an immutable/mutable pair of arbitrary-length, sub-byte
  addressable bit sequences ([`bits::Bits`] and [`bits::MutableBits`]), with
  slicing, search, bitwise algebra, and packed bit I/O.
- [`dtype`]: a typed codec ([`dtype::Dtype`]) that packs and unpacks native
  values — unsigned/signed integers of arbitrary width, IEEE floats, bools,
  raw bit/byte/hex/bin/oct strings, and padding — into and out of a
  [`bits::Bits`], with configurable endianness.
- [`schema`]: a declarative schema tree ([`schema::Node`]) and interpreter
  ([`schema::Schema`]) that walks a fixed taxonomy of field nodes against a
  bit stream, binding names in an [`expr::Environment`] as it goes.

The bit order is fixed at MSB0 (bit zero is the most significant bit of the
first storage byte); LSB0 support is flagged as future work and is not part
of this crate's contract.

# Layout

```text
bits::   buffer, view (Bits), builder (MutableBits), search/bitwise algebra
dtype::  Dtype, Endian, pack/unpack, dtype grammar
expr::   Expr, Environment, expression grammar
schema:: Node, Schema (interpreter), typed value tree
array::  BitArray, a homogeneous Dtype-typed sequence backed by MutableBits
options: process-wide, set-once display/behaviour options
error::  the crate's closed error taxonomy
```
!*/

#![forbid(unsafe_op_in_unsafe_fn)]

pub mod array;
pub mod bits;
pub mod dtype;
pub mod error;
pub mod expr;
pub mod options;
pub mod schema;

pub mod prelude {
	//! Convenience re-export of the types most programs need.
	pub use crate::{
		array::BitArray,
		bits::{Bits, MutableBits},
		dtype::{Dtype, Endian},
		error::{Error, Result},
		expr::{Environment, Expr},
		schema::{Field, Format, If, Let, Node, Pass, Repeat, Schema},
	};
}

pub use crate::error::{Error, Result};
