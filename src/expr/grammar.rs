/*! The expression grammar: the text syntax embedded in
`{ ... }` size expressions and bound by `let` statements.

```text
expr       := conditional
conditional:= or_expr ( "if" or_expr "else" conditional )?
or_expr    := and_expr ( "||" and_expr )*
and_expr   := bit_or ( "&&" bit_or )*
bit_or     := bit_xor ( "|" bit_xor )*
bit_xor    := bit_and ( "^" bit_and )*
bit_and    := shift ( "&" shift )*
shift      := cmp ( ("<<"|">>") cmp )*
cmp        := additive ( ("=="|"!="|"<="|">="|"<"|">") additive )*
additive   := term ( ("+"|"-") term )*
term       := unary ( ("*"|"/"|"//"|"%") unary )*
unary      := ("-"|"~"|"!")? postfix
postfix    := atom ( "[" expr "]" | "." name )*
atom       := integer | name | "(" expr ")"
```

Implemented with `nom`, mirroring the layered precedence-climbing style
the dtype grammar next door uses for its own, simpler syntax.
!*/

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0};
use nom::combinator::{map, opt, recognize, value};
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, tuple as nom_tuple};
use nom::IResult;

use crate::error::Error;

use super::{BinOp, Expr, UnOp};

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

fn identifier(input: &str) -> PResult<&str> {
	recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_"))))))(input)
}

fn integer_lit(input: &str) -> PResult<Expr> {
	map(digit1, |s: &str| Expr::Int(s.parse().expect("digit1 yields a valid integer")))(input)
}

fn name_lit(input: &str) -> PResult<Expr> {
	map(identifier, |s: &str| Expr::Name(s.to_string()))(input)
}

fn atom(input: &str) -> PResult<Expr> {
	alt((integer_lit, name_lit, delimited(char('('), ws(expr), char(')'))))(input)
}

enum Trailer {
	Index(Expr),
	Field(String),
}

fn trailer(input: &str) -> PResult<Trailer> {
	alt((
		map(delimited(char('['), ws(expr), char(']')), Trailer::Index),
		map(preceded(char('.'), identifier), |n: &str| Trailer::Field(n.to_string())),
	))(input)
}

fn postfix(input: &str) -> PResult<Expr> {
	let (input, base) = atom(input)?;
	let (input, trailers) = many0(trailer)(input)?;
	let expr = trailers.into_iter().fold(base, |acc, t| match t {
		Trailer::Index(i) => Expr::Index(Box::new(acc), Box::new(i)),
		Trailer::Field(n) => Expr::Field(Box::new(acc), n),
	});
	Ok((input, expr))
}

fn unary(input: &str) -> PResult<Expr> {
	alt((
		map(preceded(ws(char('-')), unary), |e| Expr::Unary(UnOp::Neg, Box::new(e))),
		map(preceded(ws(char('~')), unary), |e| Expr::Unary(UnOp::BitNot, Box::new(e))),
		map(preceded(ws(char('!')), unary), |e| Expr::Unary(UnOp::Not, Box::new(e))),
		postfix,
	))(input)
}

macro_rules! left_assoc_level {
	($name:ident, $next:ident, [ $( ($tag:expr, $op:expr) ),+ $(,)? ]) => {
		fn $name(input: &str) -> PResult<Expr> {
			let (input, first) = $next(input)?;
			fold_many0(
				pair(ws(alt(( $( value($op, tag($tag)) ),+ ))), $next),
				move || first.clone(),
				|acc, (op, rhs)| Expr::Binary(op, Box::new(acc), Box::new(rhs)),
			)(input)
		}
	};
}

left_assoc_level!(term, unary, [("//", BinOp::FloorDiv), ("/", BinOp::Div), ("*", BinOp::Mul), ("%", BinOp::Mod)]);
left_assoc_level!(additive, term, [("+", BinOp::Add), ("-", BinOp::Sub)]);
left_assoc_level!(shift, additive, [("<<", BinOp::Shl), (">>", BinOp::Shr)]);
left_assoc_level!(
	cmp,
	shift,
	[
		("==", BinOp::Eq),
		("!=", BinOp::Ne),
		("<=", BinOp::Le),
		(">=", BinOp::Ge),
		("<", BinOp::Lt),
		(">", BinOp::Gt),
	]
);
left_assoc_level!(bit_and, cmp, [("&", BinOp::BitAnd)]);
left_assoc_level!(bit_xor, bit_and, [("^", BinOp::BitXor)]);
left_assoc_level!(bit_or, bit_xor, [("|", BinOp::BitOr)]);
left_assoc_level!(and_expr, bit_or, [("&&", BinOp::And)]);
left_assoc_level!(or_expr, and_expr, [("||", BinOp::Or)]);

fn conditional(input: &str) -> PResult<Expr> {
	let (input, then) = or_expr(input)?;
	let (input, tail) = opt(nom_tuple((ws(tag("if")), or_expr, ws(tag("else")), conditional)))(input)?;
	match tail {
		Some((_, cond, _, or_else)) => {
			Ok((input, Expr::Cond { cond: Box::new(cond), then: Box::new(then), or_else: Box::new(or_else) }))
		},
		None => Ok((input, then)),
	}
}

pub(crate) fn expr(input: &str) -> PResult<Expr> {
	ws(conditional)(input)
}

/// Parses a full expression string, requiring the entire input to be
/// consumed.
pub fn parse_expr_str(input: &str) -> crate::error::Result<Expr> {
	match nom_tuple((expr, nom::combinator::eof))(input) {
		Ok((_, e)) => Ok(e),
		Err(e) => Err(Error::bad_syntax("expr", input, e.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::{Environment, Value};

	#[test]
	fn parses_arithmetic_with_precedence() {
		let e = parse_expr_str("1 + 2 * 3").unwrap();
		assert_eq!(e.eval(&Environment::new()).unwrap(), Value::Int(7));
	}

	#[test]
	fn parses_parenthesized_grouping() {
		let e = parse_expr_str("(1 + 2) * 3").unwrap();
		assert_eq!(e.eval(&Environment::new()).unwrap(), Value::Int(9));
	}

	#[test]
	fn parses_name_reference() {
		let e = parse_expr_str("w * h").unwrap();
		let mut env = Environment::new();
		env.bind("w", Value::Int(3));
		env.bind("h", Value::Int(4));
		assert_eq!(e.eval(&env).unwrap(), Value::Int(12));
	}

	#[test]
	fn parses_field_and_index_trailers() {
		let e = parse_expr_str("header.count - items[0]").unwrap();
		let mut env = Environment::new();
		env.bind("header", Value::Struct(vec![("count".to_string(), Value::Int(10))]));
		env.bind("items", Value::Array(vec![Value::Int(3)]));
		assert_eq!(e.eval(&env).unwrap(), Value::Int(7));
	}
}
