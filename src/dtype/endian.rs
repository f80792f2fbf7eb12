/*! Byte-order modifiers for numeric dtypes.
!*/

use std::fmt::{self, Display, Formatter};

/// The byte order used to pack/unpack a numeric dtype's bytes.
///
/// `None` is required for bit sizes that are not a multiple of 8; `Native`
/// packs with the host's byte order (only meaningful for byte-multiple
/// sizes, same as `Be`/`Le`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Endian {
	/// Big-endian (most significant byte first). The default for
	/// byte-multiple `UINT`/`INT` sizes when no suffix is given.
	#[default]
	Be,
	/// Little-endian (least significant byte first).
	Le,
	/// The host's native byte order.
	Native,
	/// No byte order: required for `UINT`/`INT` sizes that are not a
	/// multiple of 8, and implicit for `BOOL`/`BYTES`/`HEX`/`BIN`/`OCT`/
	/// `BITS`/`PAD`.
	None,
}

impl Endian {
	pub(crate) fn suffix(self) -> &'static str {
		match self {
			Self::Be => "_be",
			Self::Le => "_le",
			Self::Native => "_ne",
			Self::None => "",
		}
	}
}

impl Display for Endian {
	fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
		write!(fmt, "{}", self.suffix())
	}
}
