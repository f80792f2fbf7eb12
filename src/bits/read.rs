/*! The read-only surface shared by [`Bits`](super::Bits) and
[`MutableBits`](super::MutableBits).

Two distinct concrete types share one read-only trait rather than
dispatching dynamically across a base class. All search, counting, and
bitwise-algebra default methods live here once, instead of being
duplicated on both concrete types.
!*/

use crate::bits::iter::{Chunks, FindAll};
use crate::bits::raw;
use crate::bits::view::Bits;
use crate::error::{Error, Result};

/// A type that can be read as a logical sequence of bits.
///
/// Implementors need only provide [`BitRead::bit_len`] and
/// [`BitRead::raw_parts`]; every other method has a default implementation
/// built from those two.
pub trait BitRead {
	/// The number of live bits.
	fn bit_len(&self) -> usize;

	/// The backing byte slice and the bit offset of the first live bit
	/// within it. The slice may contain trailing bits past `bit_len` that
	/// are not part of the logical sequence.
	fn raw_parts(&self) -> (&[u8], u8);

	/// Whether there are no live bits.
	fn is_empty(&self) -> bool {
		self.bit_len() == 0
	}

	/// Reads the bit at logical index `i`.
	fn bit_at(&self, i: usize) -> Result<bool> {
		if i >= self.bit_len() {
			return Err(Error::out_of_range(format!(
				"bit index {} out of range for length {}",
				i,
				self.bit_len()
			)));
		}
		let (bytes, offset) = self.raw_parts();
		Ok(raw::get_bit(bytes, offset, i))
	}

	/// Packs the logical bits into a left-aligned, zero-padded byte vector.
	fn to_bytes(&self) -> Vec<u8> {
		let (bytes, offset) = self.raw_parts();
		raw::pack_to_bytes(bytes, offset, self.bit_len())
	}

	/// A lazy sequence of `k`-bit windows; the last chunk may be short.
	fn chunks(&self, k: usize) -> Chunks<'_>
	where
		Self: Sized,
	{
		let (bytes, offset) = self.raw_parts();
		Chunks::new(bytes, offset, self.bit_len(), k)
	}

	/// Counts set bits (`value == true`) or clear bits (`value == false`).
	fn count(&self, value: bool) -> usize {
		let (bytes, offset) = self.raw_parts();
		(0 .. self.bit_len())
			.filter(|&i| raw::get_bit(bytes, offset, i) == value)
			.count()
	}

	/// The lowest index `i >= start` such that `self[i .. i+len(pat)] ==
	/// pat`. When `byte_aligned`, `i` must additionally be a multiple of 8.
	fn find<P: BitRead + ?Sized>(&self, pat: &P, start: usize, byte_aligned: bool) -> Option<usize> {
		find_impl(self, pat, start, byte_aligned, false)
	}

	/// Symmetric to [`BitRead::find`], searching from the high end down.
	fn rfind<P: BitRead + ?Sized>(&self, pat: &P, start: usize, byte_aligned: bool) -> Option<usize> {
		find_impl(self, pat, start, byte_aligned, true)
	}

	/// All non-overlapping matches of `pat`, low to high.
	fn find_all<P: BitRead + ?Sized>(&self, pat: &P, byte_aligned: bool) -> FindAll<'_, P>
	where
		Self: Sized,
	{
		FindAll::new(self.to_bits(), pat, byte_aligned, false)
	}

	/// All non-overlapping matches of `pat`, high to low.
	fn rfind_all<P: BitRead + ?Sized>(&self, pat: &P, byte_aligned: bool) -> FindAll<'_, P>
	where
		Self: Sized,
	{
		FindAll::new(self.to_bits(), pat, byte_aligned, true)
	}

	/// A snapshot of this sequence as an owned, immutable [`Bits`].
	fn to_bits(&self) -> Bits {
		let (bytes, offset) = self.raw_parts();
		Bits::from_raw_window(bytes, offset, self.bit_len())
	}

	/// Bitwise AND; operands must have equal length.
	fn and<O: BitRead + ?Sized>(&self, rhs: &O) -> Result<Bits> {
		bitwise(self, rhs, |a, b| a & b)
	}

	/// Bitwise OR; operands must have equal length.
	fn or<O: BitRead + ?Sized>(&self, rhs: &O) -> Result<Bits> {
		bitwise(self, rhs, |a, b| a | b)
	}

	/// Bitwise XOR; operands must have equal length.
	fn xor<O: BitRead + ?Sized>(&self, rhs: &O) -> Result<Bits> {
		bitwise(self, rhs, |a, b| a ^ b)
	}

	/// Bitwise NOT.
	fn not(&self) -> Bits {
		let (bytes, offset) = self.raw_parts();
		let len = self.bit_len();
		let mut out = raw::pack_to_bytes(bytes, offset, len);
		for byte in out.iter_mut() {
			*byte = !*byte;
		}
		// pack_to_bytes already left-aligned and zero-padded `self`; the
		// complement of the zero padding bits is not observable because
		// Bits::from_raw_window below only exposes the first `len` bits.
		Bits::from_raw_window(&out, 0, len)
	}
}

fn bitwise<S, O>(lhs: &S, rhs: &O, op: impl Fn(u8, u8) -> u8) -> Result<Bits>
where
	S: BitRead + ?Sized,
	O: BitRead + ?Sized,
{
	if lhs.bit_len() != rhs.bit_len() {
		return Err(Error::LengthMismatch { expected: lhs.bit_len(), actual: rhs.bit_len() });
	}
	let len = lhs.bit_len();
	let a = lhs.to_bytes();
	let b = rhs.to_bytes();
	let out: Vec<u8> = a.iter().zip(b.iter()).map(|(&x, &y)| op(x, y)).collect();
	Ok(Bits::from_raw_window(&out, 0, len))
}

fn find_impl<S, P>(hay: &S, pat: &P, start: usize, byte_aligned: bool, from_end: bool) -> Option<usize>
where
	S: BitRead + ?Sized,
	P: BitRead + ?Sized,
{
	let hay_len = hay.bit_len();
	let pat_len = pat.bit_len();
	if pat_len == 0 || pat_len > hay_len {
		return None;
	}
	let (hbytes, hoffset) = hay.raw_parts();
	let (pbytes, poffset) = pat.raw_parts();
	let step = if byte_aligned { 8 } else { 1 };
	let first = if byte_aligned { (start + 7) / 8 * 8 } else { start };
	let last = hay_len - pat_len;
	if first > last {
		return None;
	}
	let candidates: Box<dyn Iterator<Item = usize>> = if from_end {
		Box::new((first ..= last).step_by(step).rev())
	} else {
		Box::new((first ..= last).step_by(step))
	};
	for i in candidates {
		if match_at(hbytes, hoffset, i, pbytes, poffset, pat_len) {
			return Some(i);
		}
	}
	None
}

fn match_at(hbytes: &[u8], hoffset: u8, start: usize, pbytes: &[u8], poffset: u8, pat_len: usize) -> bool {
	(0 .. pat_len).all(|k| raw::get_bit(hbytes, hoffset, start + k) == raw::get_bit(pbytes, poffset, k))
}
