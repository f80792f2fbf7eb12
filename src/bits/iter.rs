/*! Lazy, forward-only iterators over a bit sequence.

`chunks` and `find_all`/`rfind_all` are exposed as finite, forward-only,
non-restartable iterators that borrow (or, for `find_all`, snapshot)
their source; they are not restartable generators.
!*/

use crate::bits::raw;
use crate::bits::read::BitRead;
use crate::bits::view::Bits;

/// Lazy sequence of `k`-bit windows over a bit sequence; the final chunk
/// may be shorter than `k` if the length isn't a multiple of it.
pub struct Chunks<'a> {
	bytes: &'a [u8],
	offset: u8,
	len: usize,
	k: usize,
	pos: usize,
}

impl<'a> Chunks<'a> {
	pub(crate) fn new(bytes: &'a [u8], offset: u8, len: usize, k: usize) -> Self {
		assert!(k > 0, "chunk size must be non-zero");
		Self { bytes, offset, len, k, pos: 0 }
	}
}

impl<'a> Iterator for Chunks<'a> {
	type Item = Bits;

	fn next(&mut self) -> Option<Bits> {
		if self.pos >= self.len {
			return None;
		}
		let take = self.k.min(self.len - self.pos);
		let start = self.offset as usize + self.pos;
		let sub_offset = (start % 8) as u8;
		let byte_start = start / 8;
		let needed_bytes = raw::byte_len_for(sub_offset, take);
		let window = &self.bytes[byte_start .. byte_start + needed_bytes];
		self.pos += take;
		Some(Bits::from_raw_window(window, sub_offset, take))
	}
}

impl<'a> core::iter::FusedIterator for Chunks<'a> {}

/// Lazy sequence of non-overlapping matches of a pattern.
///
/// Snapshots the haystack at construction time (as an owned [`Bits`]); later
/// mutation of a [`super::MutableBits`] source does not retroactively change
/// an in-flight iterator, since the iterator owns its own copy rather than
/// borrowing a live, mutable one.
pub struct FindAll<'p, P: BitRead + ?Sized> {
	hay: Bits,
	pat: &'p P,
	byte_aligned: bool,
	rev: bool,
	low: usize,
	high: usize,
	done: bool,
}

impl<'p, P: BitRead + ?Sized> FindAll<'p, P> {
	pub(crate) fn new(hay: Bits, pat: &'p P, byte_aligned: bool, rev: bool) -> Self {
		let high = hay.bit_len();
		Self { hay, pat, byte_aligned, rev, low: 0, high, done: false }
	}
}

impl<'p, P: BitRead + ?Sized> Iterator for FindAll<'p, P> {
	type Item = usize;

	fn next(&mut self) -> Option<usize> {
		if self.done || self.low > self.high {
			return None;
		}
		let pat_len = self.pat.bit_len();
		if self.rev {
			let window = self.hay.slice(0, self.high).ok()?;
			let found = window.rfind(self.pat, 0, self.byte_aligned)?;
			self.high = found;
			Some(found)
		} else {
			let found = self.hay.find(self.pat, self.low, self.byte_aligned)?;
			self.low = found + pat_len.max(1);
			Some(found)
		}
	}
}

impl<'p, P: BitRead + ?Sized> core::iter::FusedIterator for FindAll<'p, P> {}
