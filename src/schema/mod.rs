/*! The schema tree and interpreter (components G and H): an immutable
AST of field nodes walked by [`Schema`] against a bit stream
or a value sequence.

```text
schema::Node     the closed node taxonomy: Field, Format, If, Repeat, Let, Pass
schema::Schema   the interpreter: build / pack / parse / unpack / clear / to_bits
schema::Bound    the structured value tree a parse/pack produces
```

This module implements the schema *tree* and its *programmatic*
constructors; it does not parse a surface schema-source-text grammar
(that front-end is out of scope here — see DESIGN.md). The dtype
grammar's size expressions and the expression grammar text *are* in
scope here because a `Dtype`'s size can embed an arbitrary expression,
and both are implemented in [`crate::dtype::grammar`] and
[`crate::expr::grammar`] respectively.
!*/

mod interp;
mod node;
mod value;

pub use interp::Schema;
pub use node::{Field, Format, If, Let, Node, Pass, Repeat};
pub use value::Bound;

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bits::{BitRead, Bits, MutableBits};
	use crate::dtype::{Dtype, Value};
	use crate::error::Error;
	use crate::expr::Expr;

	fn uint_field(name: &str, size: usize) -> Node {
		Node::Field(Field::named(name, Dtype::uint(size)))
	}

	#[test]
	fn s4_schema_with_expression_driven_array() {
		// "(w: u12, h: u12, pixels: [u8; {w * h}])"
		let pixels_dtype = Dtype::array(Dtype::uint(8), None);
		let pixels_dtype = match pixels_dtype {
			Dtype::Array { item, .. } => Dtype::Array { item, count: Some(crate::dtype::Size::Expr(Expr::parse("w * h").unwrap())) },
			_ => unreachable!(),
		};
		let mut schema = Schema::new(vec![
			uint_field("w", 12),
			uint_field("h", 12),
			Node::Field(Field::named("pixels", pixels_dtype)),
		])
		.unwrap();

		let values = vec![
			Value::UInt(2),
			Value::UInt(3),
			Value::Array((0 .. 6).map(|i| Value::UInt(i)).collect()),
		];
		let bits = schema.pack(values).unwrap();
		assert_eq!(bits.bit_len(), 12 + 12 + 48);

		let mut reparsed = Schema::new(vec![
			uint_field("w", 12),
			uint_field("h", 12),
			Node::Field(Field::named(
				"pixels",
				Dtype::Array { item: Box::new(Dtype::uint(8)), count: Some(crate::dtype::Size::Expr(Expr::parse("w * h").unwrap())) },
			)),
		])
		.unwrap();
		let consumed = reparsed.parse(&bits, 0).unwrap();
		assert_eq!(consumed, bits.bit_len());
		let unpacked = reparsed.unpack();
		let pixels = unpacked.field("pixels").unwrap().as_value().unwrap();
		assert_eq!(pixels, &Value::Array((0 .. 6).map(Value::UInt).collect()));
	}

	#[test]
	fn s5_const_match_and_mismatch() {
		// "(code: const hex8 = 0x000001b3, size: u12)"
		let make = || {
			Schema::new(vec![
				Node::Field(Field::constant(Some("code".into()), Dtype::hex(8), Value::Hex("000001b3".into()))),
				uint_field("size", 12),
			])
			.unwrap()
		};

		let good = Bits::from_bytes(&[0x00, 0x00, 0x01, 0xb3, 0x12, 0x30], None).unwrap();
		let mut schema = make();
		assert!(schema.parse(&good, 0).is_ok());
		let unpacked = schema.unpack();
		assert_eq!(unpacked.field("size").unwrap().as_value(), Some(&Value::UInt(0x123)));

		let mut bad_bytes = good.to_bytes();
		bad_bytes[3] = 0x01;
		let bad = Bits::from_bytes(&bad_bytes, None).unwrap();
		let mut schema = make();
		let err = schema.parse(&bad, 0).unwrap_err();
		assert!(matches!(err, Error::ConstMismatch { .. }));
		// no binding for `size` survives a failed parse
		assert_eq!(schema.unpack().field("size").unwrap().as_value(), None);
	}

	#[test]
	fn s6_if_else_branch_recording_round_trips() {
		// "(flag: bool, if {flag}: (x: u8) else: (y: u16))"
		let make = || {
			Schema::new(vec![
				Node::Field(Field::named("flag", Dtype::bool())),
				Node::If(If::new(
					Expr::parse("flag").unwrap(),
					Node::Format(Format::new(vec![uint_field("x", 8)]).unwrap()),
					Some(Node::Format(Format::new(vec![uint_field("y", 16)]).unwrap())),
				)),
			])
			.unwrap()
		};

		let mut mb = MutableBits::new();
		mb.append_bit(true);
		mb.append(&Bits::from_bytes(&[0x2a], None).unwrap());
		let input = mb.to_bits();

		let mut schema = make();
		let consumed = schema.parse(&input, 0).unwrap();
		assert_eq!(consumed, 9);

		let unpacked = schema.unpack();
		let Bound::Format(children) = &unpacked else { panic!("expected Format") };
		assert_eq!(children[0].1.as_value(), Some(&Value::Bool(true)));
		let Bound::If { taken, inner } = &children[1].1 else { panic!("expected If") };
		assert!(*taken);
		assert_eq!(inner.field("x").unwrap().as_value(), Some(&Value::UInt(42)));
		assert_eq!(inner.field("y"), None);

		let rebuilt = schema.to_bits().unwrap();
		assert_eq!(rebuilt, input);
	}

	#[test]
	fn repeat_zero_count_binds_nothing_and_emits_nothing() {
		let body = Node::Field(Field::new(Dtype::uint(8)));
		let mut schema = Schema::new(vec![Node::Repeat(Repeat::new(Expr::Int(0), body))]).unwrap();
		let bits = Bits::new();
		assert_eq!(schema.parse(&bits, 0).unwrap(), 0);
		assert_eq!(schema.to_bits().unwrap(), Bits::new());
	}

	#[test]
	fn negative_repeat_count_is_out_of_range() {
		let body = Node::Field(Field::new(Dtype::uint(8)));
		let mut schema = Schema::new(vec![Node::Repeat(Repeat::new(Expr::Int(-1), body))]).unwrap();
		let bits = Bits::zeros(8);
		assert!(matches!(schema.parse(&bits, 0), Err(Error::OutOfRange(_))));
	}

	#[test]
	fn named_format_exposes_dotted_access() {
		// "(header: (size: u8), body: [u8; {header.size}])"
		let header = Node::Format(Format::named("header", vec![uint_field("size", 8)]).unwrap());
		let body = Node::Field(Field::named(
			"body",
			Dtype::Array { item: Box::new(Dtype::uint(8)), count: Some(crate::dtype::Size::Expr(Expr::parse("header.size").unwrap())) },
		));
		let mut schema = Schema::new(vec![header, body]).unwrap();
		let values = vec![Value::UInt(3), Value::Array((0 .. 3).map(Value::UInt).collect())];
		let bits = schema.pack(values).unwrap();
		assert_eq!(bits.bit_len(), 8 + 24);
	}

	#[test]
	fn clear_resets_non_const_fields_but_keeps_const_ones() {
		let mut schema = Schema::new(vec![
			Node::Field(Field::constant(Some("magic".into()), Dtype::uint(8), Value::UInt(7))),
			uint_field("n", 8),
		])
		.unwrap();
		schema.pack(vec![Value::UInt(9)]).unwrap();
		schema.clear();
		let unpacked = schema.unpack();
		assert_eq!(unpacked.field("magic").unwrap().as_value(), Some(&Value::UInt(7)));
		assert_eq!(unpacked.field("n").unwrap().as_value(), None);
	}
}
