/*! The dtype grammar:

```text
single := kind [ "_" endian ] [ size_expr ]
array  := "[" single ";" count_expr? "]"
tuple  := "(" dtype ("," dtype)* ")"
size_expr := integer | "{" expr "}"
```

Implemented with `nom`, the same parser-combinator crate reached for by
other codec grammars of similar shape (wire-format and bytecode
readers).
!*/

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{map, opt, value};
use nom::multi::separated_list1;
use nom::sequence::{delimited, terminated, tuple as nom_tuple};
use nom::IResult;

use crate::error::Error;
use crate::expr::grammar::expr as expr_parser;

use super::{Dtype, Endian, Kind, Size};

type PResult<'a, T> = IResult<&'a str, T>;

fn ws<'a, F, T>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, T>
where
	F: FnMut(&'a str) -> PResult<'a, T>,
{
	delimited(multispace0, inner, multispace0)
}

fn kind(input: &str) -> PResult<Kind> {
	alt((
		value(Kind::Uint, alt((tag("uint"), tag("u")))),
		value(Kind::Int, alt((tag("int"), tag("i")))),
		value(Kind::Float, alt((tag("float"), tag("f")))),
		value(Kind::Bool, tag("bool")),
		value(Kind::Bytes, tag("bytes")),
		value(Kind::Hex, tag("hex")),
		value(Kind::Bin, tag("bin")),
		value(Kind::Oct, tag("oct")),
		value(Kind::Bits, tag("bits")),
		value(Kind::Pad, tag("pad")),
	))(input)
}

fn endian_suffix(input: &str) -> PResult<Endian> {
	alt((
		value(Endian::Be, tag("_be")),
		value(Endian::Le, tag("_le")),
		value(Endian::Native, tag("_ne")),
	))(input)
}

fn integer(input: &str) -> PResult<usize> {
	map(digit1, |s: &str| s.parse().unwrap())(input)
}

fn braced_expr(input: &str) -> PResult<Size> {
	map(delimited(char('{'), ws(expr_parser), char('}')), Size::Expr)(input)
}

fn size_expr(input: &str) -> PResult<Size> {
	alt((map(integer, Size::Const), braced_expr))(input)
}

pub(crate) fn single(input: &str) -> PResult<Dtype> {
	let (input, k) = kind(input)?;
	let (input, endian) = opt(endian_suffix)(input)?;
	let (input, size) = opt(size_expr)(input)?;
	let endian = endian.unwrap_or(if matches!(k, Kind::Uint | Kind::Int) {
		match &size {
			Some(Size::Const(n)) if n % 8 == 0 => Endian::Be,
			_ => Endian::None,
		}
	} else {
		Endian::None
	});
	Ok((input, Dtype::Single { kind: k, size, endian }))
}

fn array(input: &str) -> PResult<Dtype> {
	let (input, _) = char('[')(input)?;
	let (input, item) = ws(single)(input)?;
	let (input, _) = char(';')(input)?;
	let (input, count) = opt(ws(size_expr))(input)?;
	let (input, _) = char(']')(input)?;
	Ok((input, Dtype::Array { item: Box::new(item), count }))
}

fn tuple(input: &str) -> PResult<Dtype> {
	let items_with_trailing_comma = terminated(separated_list1(ws(char(',')), ws(dtype)), opt(ws(char(','))));
	let (input, items) = delimited(char('('), items_with_trailing_comma, char(')'))(input)?;
	Ok((input, Dtype::Tuple(items)))
}

pub(crate) fn dtype(input: &str) -> PResult<Dtype> {
	alt((array, tuple, single))(input)
}

/// Parses a full dtype string, requiring the entire input to be consumed.
pub fn parse_dtype_str(input: &str) -> crate::error::Result<Dtype> {
	let trimmed = input.trim();
	match nom_tuple((ws(dtype), nom::combinator::eof))(trimmed) {
		Ok((_, d)) => Ok(d),
		Err(e) => Err(Error::bad_syntax("dtype", input, e.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_plain_uint() {
		let d = parse_dtype_str("u12").unwrap();
		matches!(d, Dtype::Single { kind: Kind::Uint, .. });
		assert_eq!(d.const_size(), Some(12));
	}

	#[test]
	fn parses_endian_suffix() {
		let d = parse_dtype_str("f64_le").unwrap();
		if let Dtype::Single { endian, size, .. } = d {
			assert_eq!(endian, Endian::Le);
			assert_eq!(size.map(|s| matches!(s, Size::Const(64))), Some(true));
		} else {
			panic!("expected single");
		}
	}

	#[test]
	fn parses_array_with_braced_count() {
		let d = parse_dtype_str("[u8; {w * h}]").unwrap();
		matches!(d, Dtype::Array { .. });
	}

	#[test]
	fn parses_tuple() {
		let d = parse_dtype_str("(u8, i8, bool)").unwrap();
		if let Dtype::Tuple(items) = d {
			assert_eq!(items.len(), 3);
		} else {
			panic!("expected tuple");
		}
	}

	#[test]
	fn parses_tuple_with_trailing_comma() {
		let d = parse_dtype_str("(u8, i8,)").unwrap();
		if let Dtype::Tuple(items) = d {
			assert_eq!(items.len(), 2);
		} else {
			panic!("expected tuple");
		}
	}
}
