/*! The schema tree (component G): a closed, acyclic set of field-node
kinds.

Every node kind gets its own struct so each can carry the fields its
textual grammar gives it; [`Node`] is the tagged union the interpreter
in [`super::interp`] walks. The tree is built once at
construction and never mutated afterward — only the per-invocation
[`super::Bound`] state that parallels it changes.
!*/

use std::collections::HashSet;

use crate::dtype::{Dtype, Value as DtypeValue};
use crate::error::{Error, Result};
use crate::expr::Expr;

/// One value of one dtype, with an optional name and an optional
/// const-value marker.
#[derive(Clone, Debug)]
pub struct Field {
	/// The name this field binds in its enclosing [`Format`]'s scope, if
	/// any (unnamed fields still occupy bits but bind no name).
	pub name: Option<String>,
	pub dtype: Dtype,
	/// When set, this is a *const field*: its value is fixed at
	/// construction, parsing requires the input bits to equal it exactly
	/// (else [`Error::ConstMismatch`]), and building never pulls a value
	/// for it from the caller's input sequence.
	pub const_value: Option<DtypeValue>,
}

impl Field {
	/// An unnamed, non-const field.
	pub fn new(dtype: Dtype) -> Self {
		Self { name: None, dtype, const_value: None }
	}

	/// A named, non-const field.
	pub fn named(name: impl Into<String>, dtype: Dtype) -> Self {
		Self { name: Some(name.into()), dtype, const_value: None }
	}

	/// A const field, optionally named.
	pub fn constant(name: Option<String>, dtype: Dtype, value: DtypeValue) -> Self {
		Self { name, dtype, const_value: Some(value) }
	}
}

/// An ordered list of child nodes, with an optional name.
///
/// A *named* format is a namespace: while its children are being walked
/// they bind into a scope private to this format, and once the format
/// completes, the whole set of its directly-named children is exposed to
/// the enclosing scope as a single struct value under this format's name
/// (so `header.size` resolves from a sibling's size expression). An
/// *unnamed* format is purely a grouping construct — the shape `if`/
/// `repeat` bodies need to hold more than one child — and its children
/// bind straight into the enclosing scope, as if written inline there.
#[derive(Clone, Debug)]
pub struct Format {
	pub name: Option<String>,
	pub children: Vec<Node>,
}

impl Format {
	/// An unnamed format grouping `children`.
	pub fn new(children: Vec<Node>) -> Result<Self> {
		Self::with_name(None, children)
	}

	/// A named format grouping `children`.
	pub fn named(name: impl Into<String>, children: Vec<Node>) -> Result<Self> {
		Self::with_name(Some(name.into()), children)
	}

	fn with_name(name: Option<String>, children: Vec<Node>) -> Result<Self> {
		check_unique_siblings(&children)?;
		Ok(Self { name, children })
	}
}

fn check_unique_siblings(children: &[Node]) -> Result<()> {
	let mut seen = HashSet::new();
	for child in children {
		if let Some(name) = child.binding_name() {
			if !seen.insert(name) {
				return Err(Error::schema(format!("duplicate sibling name {:?}", name)));
			}
		}
	}
	Ok(())
}

/// A conditional branch.
#[derive(Clone, Debug)]
pub struct If {
	pub cond: Expr,
	pub then_branch: Box<Node>,
	pub else_branch: Option<Box<Node>>,
}

impl If {
	pub fn new(cond: Expr, then_branch: Node, else_branch: Option<Node>) -> Self {
		Self { cond, then_branch: Box::new(then_branch), else_branch: else_branch.map(Box::new) }
	}
}

/// A fixed-count loop over a body node.
///
/// The loop index is exposed to the body's environment under the implicit
/// name `_`, shadowed by any same-named binding the body introduces.
#[derive(Clone, Debug)]
pub struct Repeat {
	pub count: Expr,
	pub body: Box<Node>,
}

impl Repeat {
	pub fn new(count: Expr, body: Node) -> Self {
		Self { count, body: Box::new(body) }
	}
}

/// Binds `name` to the value of `expr` without consuming or emitting any
/// bits. Visible to subsequent siblings in the enclosing [`Format`] but
/// not to siblings that came before it (see DESIGN.md).
#[derive(Clone, Debug)]
pub struct Let {
	pub name: String,
	pub expr: Expr,
}

impl Let {
	pub fn new(name: impl Into<String>, expr: Expr) -> Self {
		Self { name: name.into(), expr }
	}
}

/// The identity node: consumes no bits, binds no name, emits nothing on
/// build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pass;

/// The closed set of schema node kinds.
#[derive(Clone, Debug)]
pub enum Node {
	Field(Field),
	Format(Format),
	If(If),
	Repeat(Repeat),
	Let(Let),
	Pass(Pass),
}

impl Node {
	/// The name this node binds into its enclosing [`Format`]'s scope, if
	/// any. Used both for the construction-time duplicate-name check and
	/// by the interpreter to label a child's [`super::Bound`] entry.
	pub(crate) fn binding_name(&self) -> Option<&str> {
		match self {
			Node::Field(f) => f.name.as_deref(),
			Node::Format(f) => f.name.as_deref(),
			Node::Let(l) => Some(l.name.as_str()),
			Node::If(_) | Node::Repeat(_) | Node::Pass(_) => None,
		}
	}
}

impl From<Field> for Node {
	fn from(f: Field) -> Self {
		Node::Field(f)
	}
}

impl From<Format> for Node {
	fn from(f: Format) -> Self {
		Node::Format(f)
	}
}

impl From<If> for Node {
	fn from(f: If) -> Self {
		Node::If(f)
	}
}

impl From<Repeat> for Node {
	fn from(f: Repeat) -> Self {
		Node::Repeat(f)
	}
}

impl From<Let> for Node {
	fn from(f: Let) -> Self {
		Node::Let(f)
	}
}

impl From<Pass> for Node {
	fn from(f: Pass) -> Self {
		Node::Pass(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dtype::Dtype;

	#[test]
	fn duplicate_sibling_names_rejected() {
		let children = vec![Node::Field(Field::named("a", Dtype::uint(8))), Node::Field(Field::named("a", Dtype::uint(8)))];
		assert!(matches!(Format::new(children), Err(Error::SchemaError(_))));
	}

	#[test]
	fn distinct_sibling_names_accepted() {
		let children = vec![Node::Field(Field::named("a", Dtype::uint(8))), Node::Field(Field::named("b", Dtype::uint(8)))];
		assert!(Format::new(children).is_ok());
	}

	#[test]
	fn unnamed_fields_never_collide() {
		let children = vec![Node::Field(Field::new(Dtype::uint(8))), Node::Field(Field::new(Dtype::uint(8)))];
		assert!(Format::new(children).is_ok());
	}
}
