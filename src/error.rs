/*! The crate's closed error taxonomy.

Every error is a plain data-carrying enum variant with a hand-written
[`Display`] implementation; there is no `thiserror`/`anyhow` dependency.
Every operation that can fail in this crate returns [`Result<T>`], and
the interpreter never swallows an error raised by a lower layer.
!*/

use core::fmt::{self, Display, Formatter};

/// The crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// The closed set of failure modes this crate can report.
///
/// This taxonomy is fixed by design: every fallible operation in
/// `bits`, `dtype`, `expr`, and `schema` maps onto one of these variants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// A schema or bit-literal string was rejected by its grammar.
	BadSyntax {
		/// What was being parsed (`"bit literal"`, `"dtype"`, `"expression"`, ...).
		what: &'static str,
		/// The offending text.
		input: String,
		/// A short human-readable reason.
		reason: String,
	},
	/// A dtype's kind, size, and endianness are mutually inconsistent.
	BadDtype(String),
	/// A value does not fit its dtype, or an index/count is out of bounds.
	OutOfRange(String),
	/// Two bit sequences were required to have equal length but did not.
	LengthMismatch {
		/// The length expected by the operation.
		expected: usize,
		/// The length actually supplied.
		actual: usize,
	},
	/// An operation required byte (or k-byte) alignment and the operand
	/// wasn't aligned.
	Alignment(String),
	/// A parse reached the end of the available bits before it was done.
	ShortInput {
		/// Bits requested.
		needed: usize,
		/// Bits actually remaining.
		available: usize,
	},
	/// A `const`-marked field's bits did not equal its declared value.
	ConstMismatch {
		/// The field's name, if any.
		name: Option<String>,
	},
	/// An expression referenced a name that is not yet bound.
	UnresolvedName(String),
	/// Division by zero or a comparable arithmetic failure.
	Arithmetic(String),
	/// A structural problem in a schema tree, e.g. duplicate sibling names.
	SchemaError(String),
}

impl Display for Error {
	fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
		match self {
			Self::BadSyntax { what, input, reason } => {
				write!(fmt, "bad {} syntax in {:?}: {}", what, input, reason)
			},
			Self::BadDtype(msg) => write!(fmt, "bad dtype: {}", msg),
			Self::OutOfRange(msg) => write!(fmt, "out of range: {}", msg),
			Self::LengthMismatch { expected, actual } => write!(
				fmt,
				"length mismatch: expected {} bits, got {}",
				expected, actual
			),
			Self::Alignment(msg) => write!(fmt, "alignment error: {}", msg),
			Self::ShortInput { needed, available } => write!(
				fmt,
				"short input: needed {} more bits, only {} available",
				needed, available
			),
			Self::ConstMismatch { name } => match name {
				Some(name) => write!(fmt, "const field {:?} did not match", name),
				None => write!(fmt, "const field did not match"),
			},
			Self::UnresolvedName(name) => write!(fmt, "unresolved name {:?}", name),
			Self::Arithmetic(msg) => write!(fmt, "arithmetic error: {}", msg),
			Self::SchemaError(msg) => write!(fmt, "schema error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl Error {
	pub(crate) fn bad_syntax(what: &'static str, input: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::BadSyntax { what, input: input.into(), reason: reason.into() }
	}

	pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
		Self::OutOfRange(msg.into())
	}

	pub(crate) fn bad_dtype(msg: impl Into<String>) -> Self {
		Self::BadDtype(msg.into())
	}

	pub(crate) fn alignment(msg: impl Into<String>) -> Self {
		Self::Alignment(msg.into())
	}

	pub(crate) fn schema(msg: impl Into<String>) -> Self {
		Self::SchemaError(msg.into())
	}

	pub(crate) fn arithmetic(msg: impl Into<String>) -> Self {
		Self::Arithmetic(msg.into())
	}
}
