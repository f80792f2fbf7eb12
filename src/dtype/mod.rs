/*! The typed codec layer: packs and unpacks native values into and out of a
[`crate::bits::Bits`].

This is a closed taxonomy of dtype *kinds* (`UINT`, `INT`, `FLOAT`,
`BOOL`, `BYTES`, `HEX`, `BIN`, `OCT`, `BITS`, `PAD`), assembled into
three *shapes* (single, array, tuple), each with a
`pack`/`unpack`/`to_string` contract.

This is modelled as tagged variants rather than an open trait
hierarchy: [`Dtype`] dispatches on its own shape and kind fields instead
of delegating to per-kind trait objects, which keeps the taxonomy
closed and makes exhaustiveness checked by the compiler.
!*/

pub mod endian;
pub mod grammar;
pub mod pack;
pub mod value;

use std::fmt::{self, Display, Formatter};

use crate::bits::Bits;
use crate::error::{Error, Result};
use crate::expr::{Environment, Expr};

pub use endian::Endian;
pub use value::Value;

/// The closed set of dtype kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
	Uint,
	Int,
	Float,
	Bool,
	Bytes,
	Hex,
	Bin,
	Oct,
	Bits,
	Pad,
}

impl Kind {
	/// The keyword used in the dtype grammar.
	pub fn keyword(self) -> &'static str {
		match self {
			Self::Uint => "uint",
			Self::Int => "int",
			Self::Float => "float",
			Self::Bool => "bool",
			Self::Bytes => "bytes",
			Self::Hex => "hex",
			Self::Bin => "bin",
			Self::Oct => "oct",
			Self::Bits => "bits",
			Self::Pad => "pad",
		}
	}

	/// The short alias accepted by the grammar (`u`, `i`, `f`), if any.
	pub fn short_alias(self) -> Option<&'static str> {
		match self {
			Self::Uint => Some("u"),
			Self::Int => Some("i"),
			Self::Float => Some("f"),
			_ => None,
		}
	}

	/// Whether this kind's bit width is implicit rather than declared
	/// (`BOOL` is always exactly 1 bit).
	pub fn implicit_size(self) -> Option<usize> {
		match self {
			Self::Bool => Some(1),
			_ => None,
		}
	}

	/// The multiplier between a kind's "digit/byte count" and its bit size
	/// (e.g. `hex8` is 8 hex digits = 32 bits).
	pub fn unit_bits(self) -> usize {
		match self {
			Self::Bytes => 8,
			Self::Hex => 4,
			Self::Oct => 3,
			_ => 1,
		}
	}
}

/// A bit size that is either known at construction or computed from an
/// expression evaluated against the current interpreter environment.
#[derive(Clone, Debug)]
pub enum Size {
	/// A fixed, already-known bit count.
	Const(usize),
	/// A bit count computed by evaluating an expression.
	Expr(Expr),
}

impl Size {
	pub(crate) fn resolve(&self, env: &Environment) -> Result<usize> {
		match self {
			Size::Const(n) => Ok(*n),
			Size::Expr(expr) => {
				let v = expr.eval(env)?;
				let n = v.as_int().ok_or_else(|| Error::bad_dtype("size expression did not evaluate to an integer"))?;
				if n < 0 {
					return Err(Error::out_of_range("dtype size expression evaluated to a negative count"));
				}
				Ok(n as usize)
			},
		}
	}
}

/// The implicit endianness a byte-multiple `UINT`/`INT` width takes when
/// none is given explicitly; non-byte-multiple widths carry none at all.
fn default_endian(size: usize) -> Endian {
	if size % 8 == 0 { Endian::Be } else { Endian::None }
}

/// A dtype: one of three shapes over the closed kind taxonomy.
#[derive(Clone, Debug)]
pub enum Dtype {
	/// One value of one kind. `size: None` means "consume the remaining
	/// bits" and is only valid when unpacking.
	Single { kind: Kind, size: Option<Size>, endian: Endian },
	/// A fixed-width item dtype repeated `count` times (`count: None`
	/// means "to end of available bits", unpack-only).
	Array { item: Box<Dtype>, count: Option<Size> },
	/// An ordered, heterogeneous sequence of dtypes.
	Tuple(Vec<Dtype>),
}

impl Dtype {
	/// A `UINT` dtype of the given bit width. Byte-multiple widths default
	/// to big-endian; others carry no endianness.
	pub fn uint(size: usize) -> Self {
		Self::Single { kind: Kind::Uint, size: Some(Size::Const(size)), endian: default_endian(size) }
	}

	/// An `INT` dtype of the given bit width. Byte-multiple widths default
	/// to big-endian; others carry no endianness.
	pub fn int(size: usize) -> Self {
		Self::Single { kind: Kind::Int, size: Some(Size::Const(size)), endian: default_endian(size) }
	}

	/// A `FLOAT` dtype; `size` must be 16, 32, or 64.
	pub fn float(size: usize) -> Result<Self> {
		if !matches!(size, 16 | 32 | 64) {
			return Err(Error::bad_dtype(format!("float size must be 16, 32, or 64, got {}", size)));
		}
		Ok(Self::Single { kind: Kind::Float, size: Some(Size::Const(size)), endian: Endian::Be })
	}

	/// The `BOOL` dtype.
	pub fn bool() -> Self {
		Self::Single { kind: Kind::Bool, size: Some(Size::Const(1)), endian: Endian::None }
	}

	/// A `BYTES` dtype of `k` bytes (`8*k` bits).
	pub fn bytes(k: usize) -> Self {
		Self::Single { kind: Kind::Bytes, size: Some(Size::Const(8 * k)), endian: Endian::None }
	}

	/// A `HEX` dtype of `k` hex digits (`4*k` bits).
	pub fn hex(k: usize) -> Self {
		Self::Single { kind: Kind::Hex, size: Some(Size::Const(4 * k)), endian: Endian::None }
	}

	/// A `BIN` dtype of `n` bits.
	pub fn bin(n: usize) -> Self {
		Self::Single { kind: Kind::Bin, size: Some(Size::Const(n)), endian: Endian::None }
	}

	/// An `OCT` dtype of `k` octal digits (`3*k` bits).
	pub fn oct(k: usize) -> Self {
		Self::Single { kind: Kind::Oct, size: Some(Size::Const(3 * k)), endian: Endian::None }
	}

	/// A `BITS` dtype of `n` bits (identity packing).
	pub fn bits(n: usize) -> Self {
		Self::Single { kind: Kind::Bits, size: Some(Size::Const(n)), endian: Endian::None }
	}

	/// A `PAD` dtype of `n` bits.
	pub fn pad(n: usize) -> Self {
		Self::Single { kind: Kind::Pad, size: Some(Size::Const(n)), endian: Endian::None }
	}

	/// Sets the endianness of a `Single` dtype; a no-op on `Array`/`Tuple`.
	pub fn with_endian(mut self, endian: Endian) -> Self {
		if let Self::Single { endian: e, .. } = &mut self {
			*e = endian;
		}
		self
	}

	/// An array dtype: `count` repetitions of `item`.
	pub fn array(item: Dtype, count: Option<usize>) -> Self {
		Self::Array { item: Box::new(item), count: count.map(Size::Const) }
	}

	/// A tuple dtype.
	pub fn tuple(items: Vec<Dtype>) -> Self {
		Self::Tuple(items)
	}

	/// Parses a dtype from its grammar text. Only accepts
	/// `{ expr }` size expressions textually; see [`grammar::parse_dtype`].
	pub fn parse(input: &str) -> Result<Self> {
		grammar::parse_dtype_str(input)
	}

	/// Validates kind/size/endianness consistency:
	/// a non-`None` endian modifier on a kind whose bit size is not a
	/// multiple of 8 is `BadDtype`.
	fn validate_single(kind: Kind, size: Option<usize>, endian: Endian) -> Result<()> {
		let is_numeric = matches!(kind, Kind::Uint | Kind::Int | Kind::Float);
		if !is_numeric && endian != Endian::None {
			return Err(Error::bad_dtype(format!("{:?} does not carry an endianness attribute", kind)));
		}
		if let Some(n) = size {
			if matches!(kind, Kind::Uint | Kind::Int) && n > 128 {
				return Err(Error::bad_dtype(format!(
					"{:?} of size {} exceeds the 128-bit native width ceiling; use BITS for wider fields",
					kind, n
				)));
			}
			if is_numeric && endian != Endian::None && n % 8 != 0 {
				return Err(Error::bad_dtype(format!(
					"{:?} of size {} is not byte-multiple and cannot take an endian modifier",
					kind, n
				)));
			}
			if matches!(kind, Kind::Bool) && n != 1 {
				return Err(Error::bad_dtype("bool must be exactly 1 bit"));
			}
			if matches!(kind, Kind::Float) && !matches!(n, 16 | 32 | 64) {
				return Err(Error::bad_dtype(format!("float size must be 16, 32, or 64, got {}", n)));
			}
			if matches!(kind, Kind::Hex) && n % 4 != 0 {
				return Err(Error::bad_dtype("hex size must be a multiple of 4 bits"));
			}
			if matches!(kind, Kind::Oct) && n % 3 != 0 {
				return Err(Error::bad_dtype("oct size must be a multiple of 3 bits"));
			}
			if matches!(kind, Kind::Bytes) && n % 8 != 0 {
				return Err(Error::bad_dtype("bytes size must be a multiple of 8 bits"));
			}
		}
		if matches!(kind, Kind::Uint | Kind::Int) && size.map_or(false, |n| n % 8 == 0) && endian == Endian::None {
			// byte-multiple UINT/INT defaults to BE elsewhere; `None` here
			// is only reached if the caller explicitly asked for it, and
			// that's only valid when the size isn't a multiple of 8.
			return Err(Error::bad_dtype("byte-multiple uint/int requires an endian modifier other than none"));
		}
		Ok(())
	}

	/// Resolves every `Expr`-valued size in this dtype against `env`,
	/// producing a fully concrete [`ResolvedDtype`] ready for `pack`/
	/// `unpack`.
	pub fn resolve(&self, env: &Environment) -> Result<ResolvedDtype> {
		match self {
			Dtype::Single { kind, size, endian } => {
				let resolved_size = match size {
					Some(s) => Some(s.resolve(env)?),
					None => None,
				};
				let size_for_validation = resolved_size.or_else(|| kind.implicit_size());
				Self::validate_single(*kind, size_for_validation, *endian)?;
				Ok(ResolvedDtype::Single {
					kind: *kind,
					size: resolved_size.or_else(|| kind.implicit_size()),
					endian: *endian,
				})
			},
			Dtype::Array { item, count } => {
				let resolved_item = item.resolve(env)?;
				let resolved_count = match count {
					Some(c) => Some(c.resolve(env)?),
					None => None,
				};
				Ok(ResolvedDtype::Array { item: Box::new(resolved_item), count: resolved_count })
			},
			Dtype::Tuple(items) => {
				let resolved = items.iter().map(|d| d.resolve(env)).collect::<Result<Vec<_>>>()?;
				Ok(ResolvedDtype::Tuple(resolved))
			},
		}
	}

	/// Packs `value` using an empty environment; fails with
	/// [`Error::UnresolvedName`] if any size expression is not constant.
	pub fn pack(&self, value: &Value) -> Result<Bits> {
		self.resolve(&Environment::new())?.pack(value)
	}

	/// Unpacks `bits` using an empty environment.
	pub fn unpack(&self, bits: &Bits) -> Result<Value> {
		self.resolve(&Environment::new())?.unpack(bits)
	}

	/// The dtype's bit size, if it does not depend on an unevaluated
	/// expression.
	pub fn const_size(&self) -> Option<usize> {
		match self {
			Dtype::Single { size: Some(Size::Const(n)), .. } => Some(*n),
			Dtype::Single { size: None, kind, .. } => kind.implicit_size(),
			Dtype::Array { item, count: Some(Size::Const(c)) } => item.const_size().map(|s| s * c),
			Dtype::Tuple(items) => items.iter().map(Dtype::const_size).collect::<Option<Vec<_>>>().map(|sizes| sizes.iter().sum()),
			_ => None,
		}
	}
}

impl Display for Dtype {
	fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
		match self {
			Dtype::Single { kind, size, endian } => {
				write!(fmt, "{}{}", kind.keyword(), endian)?;
				match size {
					Some(Size::Const(n)) => write!(fmt, "{}", n),
					Some(Size::Expr(e)) => write!(fmt, "{{{}}}", e),
					None => Ok(()),
				}
			},
			Dtype::Array { item, count } => {
				write!(fmt, "[{};", item)?;
				match count {
					Some(Size::Const(n)) => write!(fmt, "{}]", n),
					Some(Size::Expr(e)) => write!(fmt, "{{{}}}]", e),
					None => write!(fmt, "]"),
				}
			},
			Dtype::Tuple(items) => {
				write!(fmt, "(")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(fmt, ", ")?;
					}
					write!(fmt, "{}", item)?;
				}
				write!(fmt, ")")
			},
		}
	}
}

/// A [`Dtype`] with every size expression already evaluated to a concrete
/// bit count; this is what `pack`/`unpack` actually operate on.
#[derive(Clone, Debug)]
pub enum ResolvedDtype {
	Single { kind: Kind, size: Option<usize>, endian: Endian },
	Array { item: Box<ResolvedDtype>, count: Option<usize> },
	Tuple(Vec<ResolvedDtype>),
}

impl ResolvedDtype {
	/// The dtype's bit size, if not "consume the remainder".
	pub fn size(&self) -> Option<usize> {
		match self {
			ResolvedDtype::Single { size, .. } => *size,
			ResolvedDtype::Array { item, count } => count.and_then(|c| item.size().map(|s| s * c)),
			ResolvedDtype::Tuple(items) => items.iter().map(|d| d.size()).collect::<Option<Vec<_>>>().map(|v| v.iter().sum()),
		}
	}

	pub fn pack(&self, value: &Value) -> Result<Bits> {
		pack::pack(self, value)
	}

	pub fn unpack(&self, bits: &Bits) -> Result<Value> {
		pack::unpack(self, bits)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_multiple_uint_defaults_to_be() {
		let d = Dtype::uint(16);
		let v = Value::UInt(0x1234);
		let bits = d.pack(&v).unwrap();
		assert_eq!(bits.to_bytes(), vec![0x12, 0x34]);
	}

	#[test]
	fn non_byte_multiple_requires_none_endian() {
		let d = Dtype::Single { kind: Kind::Uint, size: Some(Size::Const(7)), endian: Endian::Le };
		assert!(d.pack(&Value::UInt(5)).is_err());
	}

	#[test]
	fn float_size_must_be_standard() {
		assert!(Dtype::float(24).is_err());
		assert!(Dtype::float(32).is_ok());
	}

	#[test]
	fn uint_wider_than_128_bits_is_rejected_instead_of_panicking() {
		let d = Dtype::uint(200);
		let err = d.pack(&Value::UInt(5)).unwrap_err();
		assert!(matches!(err, Error::BadDtype(_)));
		let err = d.unpack(&Bits::zeros(200)).unwrap_err();
		assert!(matches!(err, Error::BadDtype(_)));
	}

	#[test]
	fn int_wider_than_128_bits_is_rejected() {
		let d = Dtype::int(129);
		assert!(matches!(d.pack(&Value::Int(5)).unwrap_err(), Error::BadDtype(_)));
	}
}
