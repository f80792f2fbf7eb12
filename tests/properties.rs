//! Universal invariants, checked as `proptest` properties rather than a
//! hand-rolled fuzzer.

use bitformat::dtype::Value as DtypeValue;
use bitformat::prelude::*;
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_bytes() -> impl Strategy<Value = Vec<u8>> {
	vec(any::<u8>(), 1 .. 9)
}

proptest! {
	/// 1. `b.slice(i,j) ++ b.slice(j,k) == b.slice(i,k)`.
	#[test]
	fn slice_concat_is_associative(bytes in arb_bytes(), seed in 0usize .. 1000) {
		let b = Bits::from_bytes(&bytes, None).unwrap();
		let len = b.bit_len();
		let i = seed % (len + 1);
		let j = i + (seed / 7) % (len - i + 1);
		let k = j + (seed / 13) % (len - j + 1);
		let lhs = Bits::concat([b.slice(i, j).unwrap(), b.slice(j, k).unwrap()]);
		let rhs = b.slice(i, k).unwrap();
		prop_assert_eq!(lhs, rhs);
	}

	/// 2. `uint(n).unpack(uint(n).pack(v)) == v`.
	#[test]
	fn uint_pack_unpack_round_trips(size in 1usize .. 64, raw in any::<u64>()) {
		let v = (raw as u128) & ((1u128 << size) - 1);
		let dtype = Dtype::uint(size);
		let packed = dtype.pack(&DtypeValue::UInt(v)).unwrap();
		prop_assert_eq!(packed.bit_len(), size);
		prop_assert_eq!(dtype.unpack(&packed).unwrap(), DtypeValue::UInt(v));
	}

	/// 2 (signed). `int(n).unpack(int(n).pack(v)) == v` for `v` in range.
	#[test]
	fn int_pack_unpack_round_trips(size in 2usize .. 64, raw in any::<i64>()) {
		let half = 1i128 << (size as u32 - 1);
		let v = (raw as i128).rem_euclid(2 * half) - half;
		let dtype = Dtype::int(size);
		let packed = dtype.pack(&DtypeValue::Int(v)).unwrap();
		prop_assert_eq!(packed.bit_len(), size);
		prop_assert_eq!(dtype.unpack(&packed).unwrap(), DtypeValue::Int(v));
	}

	/// 3. `Bits::from_bytes(b.to_bytes()) == b` for byte-aligned `b`.
	#[test]
	fn from_bytes_to_bytes_round_trips(bytes in arb_bytes()) {
		let b = Bits::from_bytes(&bytes, None).unwrap();
		let round = Bits::from_bytes(&b.to_bytes(), None).unwrap();
		prop_assert_eq!(round, b);
	}

	/// 4. `count(True) + count(False) == len`.
	#[test]
	fn count_true_and_false_partition_the_length(bytes in arb_bytes()) {
		let b = Bits::from_bytes(&bytes, None).unwrap();
		prop_assert_eq!(b.count(true) + b.count(false), b.bit_len());
	}

	/// 5. `rol(n) . ror(n) == identity`; `reverse . reverse == identity`.
	#[test]
	fn rotate_and_reverse_are_invertible(bytes in arb_bytes(), n in 0i64 .. 64) {
		let original = Bits::from_bytes(&bytes, None).unwrap();

		let mut rotated = MutableBits::from_bits(&original);
		rotated.rol(n);
		rotated.ror(n);
		prop_assert_eq!(rotated.to_bits(), original.clone());

		let mut reversed = MutableBits::from_bits(&original);
		reversed.reverse();
		reversed.reverse();
		prop_assert_eq!(reversed.to_bits(), original);
	}

	/// 6. `find` returns the least matching index, and that index really
	/// does match.
	#[test]
	fn find_returns_the_least_matching_index(bytes in arb_bytes(), needle_bits in 1usize .. 9) {
		let hay = Bits::from_bytes(&bytes, None).unwrap();
		let pat = hay.slice(0, needle_bits.min(hay.bit_len())).unwrap();
		if let Some(i) = hay.find(&pat, 0, false) {
			prop_assert_eq!(hay.slice(i, i + pat.bit_len()).unwrap(), pat.clone());
			for j in 0 .. i {
				prop_assert_ne!(hay.slice(j, j + pat.bit_len()).unwrap(), pat.clone());
			}
		}
	}

	/// 7. `and`/`or`/`xor` are commutative; `xor(a,a)` is all zeros;
	/// `not(not(a)) == a`.
	#[test]
	fn bitwise_algebra_laws_hold(a_bytes in arb_bytes(), b_bytes in arb_bytes()) {
		let len = a_bytes.len().min(b_bytes.len()) * 8;
		let a = Bits::from_bytes(&a_bytes, None).unwrap().slice(0, len).unwrap();
		let b = Bits::from_bytes(&b_bytes, None).unwrap().slice(0, len).unwrap();

		prop_assert_eq!(a.and(&b).unwrap(), b.and(&a).unwrap());
		prop_assert_eq!(a.or(&b).unwrap(), b.or(&a).unwrap());
		prop_assert_eq!(a.xor(&b).unwrap(), b.xor(&a).unwrap());
		prop_assert_eq!(a.xor(&a).unwrap(), Bits::zeros(len));
		prop_assert_eq!(a.not().not(), a.clone());
	}

	/// 8. Schema round-trip for a fixed-width two-field schema: packing and
	/// re-parsing consumes exactly the packed length and recovers the
	/// original values.
	#[test]
	fn schema_round_trips_fixed_width_values(a in 0u128 .. 256, b in 0u128 .. 65536) {
		let mut schema = Schema::new(vec![
			Field::named("a", Dtype::uint(8)).into(),
			Field::named("b", Dtype::uint(16)).into(),
		])
		.unwrap();

		let packed = schema.pack([DtypeValue::UInt(a), DtypeValue::UInt(b)]).unwrap();
		let consumed = schema.parse(&packed, 0).unwrap();
		prop_assert_eq!(consumed, packed.bit_len());

		let unpacked = schema.unpack();
		prop_assert_eq!(unpacked.field("a").unwrap().as_value(), Some(&DtypeValue::UInt(a)));
		prop_assert_eq!(unpacked.field("b").unwrap().as_value(), Some(&DtypeValue::UInt(b)));
		prop_assert_eq!(schema.to_bits().unwrap(), packed);
	}
}
