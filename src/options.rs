/*! Process-wide, set-once display and behaviour options: a registry
initialised once at program start and never mutated after.

Unlike the dtype/schema taxonomies, which are immutable *by construction*
(no shared mutable state at all), this one genuinely needs process-wide
reach — human-readable formatting is a cross-cutting concern every
[`crate::dtype::Value::Hex`]/`Bin`/`Oct` display call would otherwise need
threaded through it by hand. [`std::sync::OnceLock`] gives that reach
without interior mutability: the slot is written at most once, so every
read afterward sees the same value with no locking.
!*/

use std::sync::OnceLock;

/// Process-wide preferences for rendering dtype values as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
	/// Emit `HEX` digits as uppercase (`AB`) rather than lowercase (`ab`).
	pub hex_uppercase: bool,
	/// Insert a separator every `n` digits when displaying `BIN`/`HEX`/`OCT`
	/// strings (`None` disables grouping).
	pub digit_group_size: Option<usize>,
	/// The separator character used between groups.
	pub digit_group_separator: char,
}

impl Options {
	/// The library's built-in defaults: lowercase hex, no digit grouping.
	pub const fn defaults() -> Self {
		Self { hex_uppercase: false, digit_group_size: None, digit_group_separator: '_' }
	}
}

impl Default for Options {
	fn default() -> Self {
		Self::defaults()
	}
}

static GLOBAL: OnceLock<Options> = OnceLock::new();

/// Installs `options` as the process-wide options, if none has been
/// installed yet. Returns the value that ended up active: `options`
/// itself on success, or whatever a prior caller installed if this is
/// not the first call.
pub fn set_global(options: Options) -> Options {
	*GLOBAL.get_or_init(|| options)
}

/// The active process-wide options, defaulting to [`Options::defaults`]
/// if nothing has been installed yet. The first call to either this or
/// [`set_global`] fixes the value for the rest of the process.
pub fn global() -> Options {
	*GLOBAL.get_or_init(Options::defaults)
}

/// Formats a string of hex/bin/oct digits per the active [`Options`]:
/// case folding for hex, and digit grouping for all three.
pub(crate) fn format_digits(digits: &str, is_hex: bool) -> String {
	let opts = global();
	let cased: String = if is_hex && opts.hex_uppercase {
		digits.to_ascii_uppercase()
	} else if is_hex {
		digits.to_ascii_lowercase()
	} else {
		digits.to_string()
	};
	match opts.digit_group_size {
		Some(n) if n > 0 => group_digits(&cased, n, opts.digit_group_separator),
		_ => cased,
	}
}

fn group_digits(digits: &str, group: usize, sep: char) -> String {
	let chars: Vec<char> = digits.chars().collect();
	let mut out = String::with_capacity(chars.len() + chars.len() / group);
	for (i, c) in chars.iter().enumerate() {
		if i > 0 && (chars.len() - i) % group == 0 {
			out.push(sep);
		}
		out.push(*c);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_lowercase_ungrouped() {
		let opts = Options::defaults();
		assert!(!opts.hex_uppercase);
		assert_eq!(opts.digit_group_size, None);
	}

	#[test]
	fn group_digits_inserts_separator_from_the_right() {
		assert_eq!(group_digits("1234567", 4, '_'), "123_4567");
		assert_eq!(group_digits("abcd", 4, '_'), "abcd");
	}
}
