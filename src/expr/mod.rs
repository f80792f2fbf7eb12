/*! The expression evaluator (component F): an immutable AST of arithmetic,
indexing, comparison, and conditional expressions, evaluated against a
name environment.
!*/

pub mod env;
pub mod grammar;

use std::fmt::{self, Display, Formatter};

pub use env::Environment;

use crate::error::{Error, Result};

/// A decoded, already-bound value usable inside an expression: either a
/// scalar produced by evaluation, or a structured value bound by a field
/// somewhere in the schema (so `lengths[0]` and `header.size` can be
/// looked up and indexed).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Int(i128),
	Float(f64),
	Bool(bool),
	Array(Vec<Value>),
	Struct(Vec<(String, Value)>),
}

impl Value {
	pub fn as_int(&self) -> Option<i128> {
		match self {
			Value::Int(i) => Some(*i),
			Value::Bool(b) => Some(*b as i128),
			Value::Float(f) if f.fract() == 0.0 => Some(*f as i128),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			Value::Int(i) => Some(*i as f64),
			Value::Bool(b) => Some(*b as i32 as f64),
			_ => None,
		}
	}

	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Bool(b) => *b,
			Value::Int(i) => *i != 0,
			Value::Float(f) => *f != 0.0,
			Value::Array(a) => !a.is_empty(),
			Value::Struct(_) => true,
		}
	}

	fn field(&self, name: &str) -> Result<Value> {
		match self {
			Value::Struct(fields) => fields
				.iter()
				.find(|(n, _)| n == name)
				.map(|(_, v)| v.clone())
				.ok_or_else(|| Error::UnresolvedName(name.to_string())),
			_ => Err(Error::UnresolvedName(name.to_string())),
		}
	}

	fn index(&self, i: i128) -> Result<Value> {
		match self {
			Value::Array(items) => {
				let idx = if i < 0 { items.len() as i128 + i } else { i };
				items
					.get(usize::try_from(idx).unwrap_or(usize::MAX))
					.cloned()
					.ok_or_else(|| Error::out_of_range(format!("index {} out of range for length {}", i, items.len())))
			},
			_ => Err(Error::bad_dtype("index applied to a non-array value")),
		}
	}
}

impl Display for Value {
	fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
		match self {
			Value::Int(i) => write!(fmt, "{}", i),
			Value::Float(f) => write!(fmt, "{}", f),
			Value::Bool(b) => write!(fmt, "{}", b),
			Value::Array(items) => {
				write!(fmt, "[")?;
				for (i, v) in items.iter().enumerate() {
					if i > 0 {
						write!(fmt, ", ")?;
					}
					write!(fmt, "{}", v)?;
				}
				write!(fmt, "]")
			},
			Value::Struct(_) => write!(fmt, "<struct>"),
		}
	}
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
	Add,
	Sub,
	Mul,
	Div,
	FloorDiv,
	Mod,
	Shl,
	Shr,
	BitAnd,
	BitOr,
	BitXor,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	And,
	Or,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
	Neg,
	BitNot,
	Not,
}

/// A name-path segment: either a plain name (`w`) or a dotted field access
/// (`.size` in `header.size`).
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
	Int(i128),
	Name(String),
	Binary(BinOp, Box<Expr>, Box<Expr>),
	Unary(UnOp, Box<Expr>),
	Index(Box<Expr>, Box<Expr>),
	Field(Box<Expr>, String),
	Cond { cond: Box<Expr>, then: Box<Expr>, or_else: Box<Expr> },
}

impl Expr {
	/// Parses an expression from text, the `{ ... }` contents of a dtype
	/// size expression.
	pub fn parse(input: &str) -> Result<Self> {
		grammar::parse_expr_str(input)
	}

	/// Evaluates this expression against `env`. Eager: the whole
	/// subexpression is evaluated at once, and an unbound dependency
	/// raises [`Error::UnresolvedName`] rather than being treated as a
	/// forward reference.
	pub fn eval(&self, env: &Environment) -> Result<Value> {
		match self {
			Expr::Int(i) => Ok(Value::Int(*i)),
			Expr::Name(name) => env.lookup(name),
			Expr::Unary(op, inner) => eval_unary(*op, inner.eval(env)?),
			Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs.eval(env)?, rhs.eval(env)?),
			Expr::Index(base, idx) => {
				let base = base.eval(env)?;
				let idx = idx.eval(env)?.as_int().ok_or_else(|| Error::bad_dtype("index must be an integer"))?;
				base.index(idx)
			},
			Expr::Field(base, name) => base.eval(env)?.field(name),
			Expr::Cond { cond, then, or_else } => {
				if cond.eval(env)?.is_truthy() { then.eval(env) } else { or_else.eval(env) }
			},
		}
	}
}

fn eval_unary(op: UnOp, v: Value) -> Result<Value> {
	match op {
		UnOp::Neg => match v {
			Value::Int(i) => Ok(Value::Int(-i)),
			Value::Float(f) => Ok(Value::Float(-f)),
			_ => Err(Error::bad_dtype("unary `-` requires a number")),
		},
		UnOp::BitNot => {
			let i = v.as_int().ok_or_else(|| Error::bad_dtype("unary `~` requires an integer"))?;
			Ok(Value::Int(!i))
		},
		UnOp::Not => Ok(Value::Bool(!v.is_truthy())),
	}
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
	use BinOp::*;
	if matches!(op, And | Or) {
		return Ok(Value::Bool(match op {
			And => lhs.is_truthy() && rhs.is_truthy(),
			Or => lhs.is_truthy() || rhs.is_truthy(),
			_ => unreachable!(),
		}));
	}
	if matches!(op, Eq | Ne | Lt | Le | Gt | Ge) {
		let ord = compare(&lhs, &rhs)?;
		let result = match op {
			Eq => ord == std::cmp::Ordering::Equal,
			Ne => ord != std::cmp::Ordering::Equal,
			Lt => ord == std::cmp::Ordering::Less,
			Le => ord != std::cmp::Ordering::Greater,
			Gt => ord == std::cmp::Ordering::Greater,
			Ge => ord != std::cmp::Ordering::Less,
			_ => unreachable!(),
		};
		return Ok(Value::Int(result as i128));
	}
	if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
		if !matches!(lhs, Value::Float(_)) && !matches!(rhs, Value::Float(_)) {
			return int_binary(op, a, b).map(Value::Int);
		}
	}
	let a = lhs.as_float().ok_or_else(|| Error::bad_dtype("binary op requires a number"))?;
	let b = rhs.as_float().ok_or_else(|| Error::bad_dtype("binary op requires a number"))?;
	float_binary(op, a, b).map(Value::Float)
}

fn compare(lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering> {
	if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
		if !matches!(lhs, Value::Float(_)) && !matches!(rhs, Value::Float(_)) {
			return Ok(a.cmp(&b));
		}
	}
	let a = lhs.as_float().ok_or_else(|| Error::bad_dtype("comparison requires a number"))?;
	let b = rhs.as_float().ok_or_else(|| Error::bad_dtype("comparison requires a number"))?;
	a.partial_cmp(&b).ok_or_else(|| Error::arithmetic("comparison produced NaN"))
}

fn int_binary(op: BinOp, a: i128, b: i128) -> Result<i128> {
	use BinOp::*;
	Ok(match op {
		Add => a.checked_add(b).ok_or_else(|| Error::arithmetic("overflow in +"))?,
		Sub => a.checked_sub(b).ok_or_else(|| Error::arithmetic("overflow in -"))?,
		Mul => a.checked_mul(b).ok_or_else(|| Error::arithmetic("overflow in *"))?,
		Div | FloorDiv => {
			if b == 0 {
				return Err(Error::arithmetic("division by zero"));
			}
			a.div_euclid(b)
		},
		Mod => {
			if b == 0 {
				return Err(Error::arithmetic("modulo by zero"));
			}
			a.rem_euclid(b)
		},
		Shl => a.checked_shl(b as u32).ok_or_else(|| Error::arithmetic("overflow in <<"))?,
		Shr => a.checked_shr(b as u32).ok_or_else(|| Error::arithmetic("overflow in >>"))?,
		BitAnd => a & b,
		BitOr => a | b,
		BitXor => a ^ b,
		_ => unreachable!("handled by caller"),
	})
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Result<f64> {
	use BinOp::*;
	Ok(match op {
		Add => a + b,
		Sub => a - b,
		Mul => a * b,
		Div => {
			if b == 0.0 {
				return Err(Error::arithmetic("division by zero"));
			}
			a / b
		},
		FloorDiv => {
			if b == 0.0 {
				return Err(Error::arithmetic("division by zero"));
			}
			(a / b).floor()
		},
		Mod => {
			if b == 0.0 {
				return Err(Error::arithmetic("modulo by zero"));
			}
			a.rem_euclid(b)
		},
		_ => return Err(Error::bad_dtype("bitwise/shift operators require integer operands")),
	})
}

impl Display for Expr {
	fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
		match self {
			Expr::Int(i) => write!(fmt, "{}", i),
			Expr::Name(n) => write!(fmt, "{}", n),
			Expr::Unary(op, e) => write!(fmt, "{}{}", unop_str(*op), e),
			Expr::Binary(op, l, r) => write!(fmt, "{} {} {}", l, binop_str(*op), r),
			Expr::Index(b, i) => write!(fmt, "{}[{}]", b, i),
			Expr::Field(b, n) => write!(fmt, "{}.{}", b, n),
			Expr::Cond { cond, then, or_else } => write!(fmt, "{} if {} else {}", then, cond, or_else),
		}
	}
}

fn unop_str(op: UnOp) -> &'static str {
	match op {
		UnOp::Neg => "-",
		UnOp::BitNot => "~",
		UnOp::Not => "!",
	}
}

fn binop_str(op: BinOp) -> &'static str {
	use BinOp::*;
	match op {
		Add => "+",
		Sub => "-",
		Mul => "*",
		Div => "/",
		FloorDiv => "//",
		Mod => "%",
		Shl => "<<",
		Shr => ">>",
		BitAnd => "&",
		BitOr => "|",
		BitXor => "^",
		Eq => "==",
		Ne => "!=",
		Lt => "<",
		Le => "<=",
		Gt => ">",
		Ge => ">=",
		And => "&&",
		Or => "||",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn arithmetic_precedence() {
		let e = Expr::parse("w * h + 1").unwrap();
		let mut env = Environment::new();
		env.bind("w", Value::Int(2));
		env.bind("h", Value::Int(3));
		assert_eq!(e.eval(&env).unwrap(), Value::Int(7));
	}

	#[test]
	fn division_by_zero_is_arithmetic_error() {
		let e = Expr::parse("1 / 0").unwrap();
		assert!(matches!(e.eval(&Environment::new()), Err(Error::Arithmetic(_))));
	}

	#[test]
	fn unresolved_name_errors() {
		let e = Expr::parse("missing + 1").unwrap();
		assert!(matches!(e.eval(&Environment::new()), Err(Error::UnresolvedName(_))));
	}

	#[test]
	fn conditional_expression() {
		let e = Expr::parse("1 if x else 2").unwrap();
		let mut env = Environment::new();
		env.bind("x", Value::Int(0));
		assert_eq!(e.eval(&env).unwrap(), Value::Int(2));
	}

	#[test]
	fn indexing() {
		let e = Expr::parse("lengths[0]").unwrap();
		let mut env = Environment::new();
		env.bind("lengths", Value::Array(vec![Value::Int(5), Value::Int(6)]));
		assert_eq!(e.eval(&env).unwrap(), Value::Int(5));
	}
}
