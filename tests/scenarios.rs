//! End-to-end scenarios: each test drives the public API the way a
//! caller would, rather than reaching into interpreter internals.

use bitformat::dtype;
use bitformat::dtype::{Dtype, Endian};
use bitformat::prelude::*;
use bitformat::schema::Bound;

#[test]
fn s1_binary_literal_plus_unsigned_concatenation() {
	let bits = bitformat::bits::parse_bit_source("0b001, u32=90, 0x5e").unwrap();
	assert_eq!(bits.bit_len(), 3 + 32 + 8);
	// Padded to 48 bits (6 bytes) for a direct byte comparison: "001" then
	// the 32-bit big-endian encoding of 90 then the byte 0x5e, zero-padded
	// at the tail to the next byte boundary.
	let mut padded = bits.to_bytes();
	padded.resize(6, 0);
	assert_eq!(padded, vec![0x20, 0x00, 0x00, 0x0B, 0x4B, 0xC0]);
}

#[test]
fn s2_signed_round_trip_and_reinterpretation() {
	let signed = Dtype::int(7);
	let packed = signed.pack(&dtype::Value::Int(-31)).unwrap();
	assert_eq!(packed.to_bytes(), vec![0b1100_0010]);
	assert_eq!(signed.unpack(&packed).unwrap(), dtype::Value::Int(-31));

	let unsigned = Dtype::uint(7);
	assert_eq!(unsigned.unpack(&packed).unwrap(), dtype::Value::UInt(97));
}

#[test]
fn s3_float_endianness() {
	let be = Dtype::float(32).unwrap();
	let le = be.clone().with_endian(Endian::Le);
	let be_bits = be.pack(&dtype::Value::Float(13.5)).unwrap();
	let le_bits = le.pack(&dtype::Value::Float(13.5)).unwrap();

	let mut reversed = be_bits.to_bytes();
	reversed.reverse();
	assert_eq!(le_bits.to_bytes(), reversed);
}

#[test]
fn s4_schema_with_expression_driven_array() {
	let array_dtype = Dtype::Array {
		item: Box::new(Dtype::uint(8)),
		count: Some(bitformat::dtype::Size::Expr(Expr::parse("w * h").unwrap())),
	};
	let mut schema = Schema::new(vec![
		Field::named("w", Dtype::uint(12)).into(),
		Field::named("h", Dtype::uint(12)).into(),
		Field::named("pixels", array_dtype).into(),
	])
	.unwrap();

	let values = vec![
		dtype::Value::UInt(2),
		dtype::Value::UInt(3),
		dtype::Value::Array((0u128 .. 6).map(dtype::Value::UInt).collect()),
	];
	let bits = schema.pack(values).unwrap();
	assert_eq!(bits.bit_len(), 12 + 12 + 6 * 8);

	let consumed = schema.parse(&bits, 0).unwrap();
	assert_eq!(consumed, bits.bit_len());
	let unpacked = schema.unpack();
	assert_eq!(
		unpacked.field("pixels").unwrap().as_value().unwrap(),
		&dtype::Value::Array((0u128 .. 6).map(dtype::Value::UInt).collect())
	);
}

#[test]
fn s5_const_match_and_mismatch() {
	let build = || {
		Schema::new(vec![
			Field::constant(Some("code".into()), Dtype::hex(8), dtype::Value::Hex("000001b3".into())).into(),
			Field::named("size", Dtype::uint(12)).into(),
		])
		.unwrap()
	};

	let good = Bits::from_bytes(&[0x00, 0x00, 0x01, 0xb3, 0x12, 0x30], None).unwrap();
	let mut schema = build();
	schema.parse(&good, 0).unwrap();
	assert_eq!(schema.unpack().field("size").unwrap().as_value(), Some(&dtype::Value::UInt(0x123)));

	let mut corrupted = good.to_bytes();
	corrupted[0] = 0x01;
	let bad = Bits::from_bytes(&corrupted, None).unwrap();
	let mut schema = build();
	let err = schema.parse(&bad, 0).unwrap_err();
	assert!(matches!(err, Error::ConstMismatch { .. }));
	assert_eq!(schema.unpack().field("size").unwrap().as_value(), None);
}

#[test]
fn s6_if_else_branch_recording_round_trips() {
	let build = || {
		Schema::new(vec![
			Field::named("flag", Dtype::bool()).into(),
			If::new(
				Expr::parse("flag").unwrap(),
				Format::new(vec![Field::named("x", Dtype::uint(8)).into()]).unwrap().into(),
				Some(Format::new(vec![Field::named("y", Dtype::uint(16)).into()]).unwrap().into()),
			)
			.into(),
		])
		.unwrap()
	};

	let mut source = MutableBits::new();
	source.append_bit(true);
	source.append(&Bits::from_bytes(&[0x2a], None).unwrap());
	let input = source.to_bits();

	let mut schema = build();
	let consumed = schema.parse(&input, 0).unwrap();
	assert_eq!(consumed, 9);

	let unpacked = schema.unpack();
	let Bound::Format(children) = &unpacked else { panic!("expected a Format") };
	assert_eq!(children[0].1.as_value(), Some(&dtype::Value::Bool(true)));
	let Bound::If { taken, inner } = &children[1].1 else { panic!("expected an If") };
	assert!(*taken);
	assert_eq!(inner.field("x").unwrap().as_value(), Some(&dtype::Value::UInt(42)));
	assert!(inner.field("y").is_none());

	assert_eq!(schema.to_bits().unwrap(), input);
}
