/*! The bit-source string grammar: the text shorthand used to
build a [`super::Bits`] directly, without going through a dtype/schema.

```text
bit_source := item ("," item)*
item       := "0b" binary_digit+
            | "0o" octal_digit+
            | "0x" hex_digit+
            | dtype_literal
dtype_literal := single_dtype ("=" value_text)?
```

A bare `single_dtype` with no `=value` only makes sense for `pad`, which
contributes that many zero bits. Every other kind requires a value.
`bits` is the one kind whose value text is itself a nested `bit_source`.

Reuses the dtype grammar's `single` parser (`crate::dtype::grammar`) so
`u12=300` and `f32_le=1.5` are parsed the same way a schema's dtype
strings are.
!*/

use nom::branch::alt;
use nom::bytes::complete::{is_a, tag};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{map, map_res, opt, recognize};
use nom::multi::separated_list1;
use nom::number::complete::recognize_float;
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::dtype::{grammar as dtype_grammar, Dtype, Kind, Value as DtypeValue};
use crate::error::Error;

use super::builder::MutableBits;
use super::view::Bits;
use super::read::BitRead;

type PResult<'a, T> = IResult<&'a str, T>;

fn ws<'a, F, T>(mut inner: F) -> impl FnMut(&'a str) -> PResult<'a, T>
where
	F: FnMut(&'a str) -> PResult<'a, T>,
{
	move |input| {
		let (input, _) = multispace0(input)?;
		let (input, v) = inner(input)?;
		let (input, _) = multispace0(input)?;
		Ok((input, v))
	}
}

fn bin_literal(input: &str) -> PResult<Bits> {
	let (input, digits) = preceded(tag("0b"), is_a("01"))(input)?;
	let mut b = MutableBits::new();
	for c in digits.chars() {
		b.append_bit(c == '1');
	}
	Ok((input, b.to_bits()))
}

fn oct_literal(input: &str) -> PResult<Bits> {
	let (input, digits) = preceded(tag("0o"), is_a("01234567"))(input)?;
	let mut b = MutableBits::new();
	for c in digits.chars() {
		let v = c.to_digit(8).expect("is_a(\"01234567\") guarantees a valid octal digit");
		for shift in (0 .. 3).rev() {
			b.append_bit((v >> shift) & 1 == 1);
		}
	}
	Ok((input, b.to_bits()))
}

fn hex_literal(input: &str) -> PResult<Bits> {
	let (input, digits) = preceded(tag("0x"), is_a("0123456789abcdefABCDEF"))(input)?;
	let mut b = MutableBits::new();
	for c in digits.chars() {
		let v = c.to_digit(16).expect("is_a(hex digits) guarantees a valid hex digit");
		for shift in (0 .. 4).rev() {
			b.append_bit((v >> shift) & 1 == 1);
		}
	}
	Ok((input, b.to_bits()))
}

fn int_text(input: &str) -> PResult<i128> {
	map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i128>())(input)
}

fn float_text(input: &str) -> PResult<f64> {
	map_res(recognize_float, |s: &str| s.parse::<f64>())(input)
}

fn digits_text(chars: &'static str) -> impl Fn(&str) -> IResult<&str, &str> {
	move |input| is_a(chars)(input)
}

/// Parses the `=value` text appropriate to `kind` and packs it through
/// `dtype`, or, for `bits`, splices the nested bit source in directly.
fn dtype_literal(input: &str) -> PResult<Bits> {
	let (input, dtype) = dtype_grammar::single(input)?;
	let kind = match &dtype {
		Dtype::Single { kind, .. } => *kind,
		_ => unreachable!("dtype_grammar::single only ever returns Dtype::Single"),
	};
	if matches!(kind, Kind::Pad) {
		let resolved = dtype.resolve(&crate::expr::Environment::new()).map_err(to_nom_err(input))?;
		let n = resolved.size().unwrap_or(0);
		return Ok((input, Bits::zeros(n)));
	}
	let (input, _) = char('=')(input)?;
	match kind {
		Kind::Bits => {
			let (input, nested) = item(input)?;
			Ok((input, nested))
		},
		Kind::Uint => {
			let (input, v) = int_text(input)?;
			if v < 0 {
				let err = Error::out_of_range(format!("uint literal cannot be negative: {}", v));
				return Err(to_nom_err(input)(err));
			}
			pack(input, &dtype, &DtypeValue::UInt(v as u128))
		},
		Kind::Int => {
			let (input, v) = int_text(input)?;
			pack(input, &dtype, &DtypeValue::Int(v))
		},
		Kind::Float => {
			let (input, v) = float_text(input)?;
			pack(input, &dtype, &DtypeValue::Float(v))
		},
		Kind::Bool => {
			let (input, v) = alt((map(tag("true"), |_| true), map(tag("false"), |_| false), map(char('1'), |_| true), map(char('0'), |_| false)))(input)?;
			pack(input, &dtype, &DtypeValue::Bool(v))
		},
		Kind::Bytes => {
			let (input, digits) = is_a("0123456789abcdefABCDEF")(input)?;
			let bytes = decode_hex(digits).map_err(to_nom_err(input))?;
			pack(input, &dtype, &DtypeValue::Bytes(bytes))
		},
		Kind::Hex => {
			let (input, digits) = digits_text("0123456789abcdefABCDEF")(input)?;
			pack(input, &dtype, &DtypeValue::Hex(digits.to_string()))
		},
		Kind::Bin => {
			let (input, digits) = digits_text("01")(input)?;
			pack(input, &dtype, &DtypeValue::Bin(digits.to_string()))
		},
		Kind::Oct => {
			let (input, digits) = digits_text("01234567")(input)?;
			pack(input, &dtype, &DtypeValue::Oct(digits.to_string()))
		},
		Kind::Pad => unreachable!("handled above"),
	}
}

fn pack<'a>(input: &'a str, dtype: &Dtype, value: &DtypeValue) -> PResult<'a, Bits> {
	let bits = dtype.pack(value).map_err(to_nom_err(input))?;
	Ok((input, bits))
}

fn decode_hex(digits: &str) -> crate::error::Result<Vec<u8>> {
	if digits.len() % 2 != 0 {
		return Err(Error::bad_syntax("bit_source", digits, "bytes literal needs an even number of hex digits"));
	}
	(0 .. digits.len())
		.step_by(2)
		.map(|i| u8::from_str_radix(&digits[i .. i + 2], 16).map_err(|e| Error::bad_syntax("bit_source", digits, e.to_string())))
		.collect()
}

fn to_nom_err<'a>(input: &'a str) -> impl FnOnce(crate::error::Error) -> nom::Err<nom::error::Error<&'a str>> {
	move |_| nom::Err::Failure(nom::error::Error { input, code: nom::error::ErrorKind::Verify })
}

fn item(input: &str) -> PResult<Bits> {
	alt((bin_literal, oct_literal, hex_literal, dtype_literal))(input)
}

/// Parses a full bit-source string, concatenating comma-separated items.
pub fn parse_bit_source(input: &str) -> crate::error::Result<Bits> {
	let trimmed = input.trim();
	match separated_list1(ws(char(',')), ws(item))(trimmed) {
		Ok((rest, parts)) if rest.is_empty() => Ok(Bits::concat(parts)),
		Ok(_) => Err(Error::bad_syntax("bit_source", input, "trailing characters after last item")),
		Err(e) => Err(Error::bad_syntax("bit_source", input, e.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_binary_literal() {
		let b = parse_bit_source("0b1010").unwrap();
		assert_eq!(b.to_bytes(), vec![0b1010_0000]);
		assert_eq!(b.bit_len(), 4);
	}

	#[test]
	fn parses_hex_literal() {
		let b = parse_bit_source("0xff00").unwrap();
		assert_eq!(b.to_bytes(), vec![0xff, 0x00]);
	}

	#[test]
	fn parses_typed_uint_literal() {
		let b = parse_bit_source("u8=3").unwrap();
		assert_eq!(b.to_bytes(), vec![3]);
	}

	#[test]
	fn parses_comma_separated_concatenation() {
		let b = parse_bit_source("0b11, u6=5, 0xf").unwrap();
		assert_eq!(b.bit_len(), 1 + 6 + 4);
	}

	#[test]
	fn pad_literal_contributes_zero_bits() {
		let b = parse_bit_source("pad4").unwrap();
		assert_eq!(b.to_bytes(), vec![0b0000_0000]);
		assert_eq!(b.bit_len(), 4);
	}

	#[test]
	fn negative_uint_literal_is_rejected_not_clamped() {
		assert!(parse_bit_source("u8=-5").is_err());
	}
}
