/*! The schema interpreter (component H): walks a [`Node`] tree against a
bit stream or a value sequence, maintaining an [`Environment`] as it goes
.

Three walks share the same tree shape but pull from different sources:
`parse_*` pulls bits off a cursor and decodes values; `build_*` pulls
values off a caller-supplied iterator and encodes bits; `emit_*` replays
an already-bound [`Bound`] tree to reassemble bits (`to_bits`). They are
kept as separate functions rather than unified behind one trait: the
three sources (cursor, iterator, existing tree) don't share an interface
worth inventing, and each walk is short enough that the duplication reads
more clearly than the abstraction would.
!*/

use crate::bits::{Bits, BitRead, MutableBits};
use crate::dtype::Value as DtypeValue;
use crate::error::{Error, Result};
use crate::expr::{Environment, Value as ExprValue};

use super::node::{Field, Format, If, Let, Node, Pass, Repeat};
use super::value::Bound;

/// A read cursor over a [`Bits`], advanced as the interpreter consumes
/// fields. Not exposed publicly: a standalone read-position "reader"
/// type is out of scope for this crate, so this type stays a private
/// implementation detail of the walk below.
struct Cursor<'a> {
	bits: &'a Bits,
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn new(bits: &'a Bits, pos: usize) -> Self {
		Self { bits, pos }
	}

	fn remaining(&self) -> usize {
		self.bits.bit_len() - self.pos
	}

	fn take(&mut self, n: usize) -> Result<Bits> {
		if n > self.remaining() {
			return Err(Error::ShortInput { needed: n, available: self.remaining() });
		}
		let slice = self.bits.slice(self.pos, self.pos + n)?;
		self.pos += n;
		Ok(slice)
	}
}

// ---------------------------------------------------------------- parse

fn parse_node(node: &Node, cursor: &mut Cursor, env: &mut Environment) -> Result<Bound> {
	match node {
		Node::Field(field) => parse_field(field, cursor, env),
		Node::Format(format) => Ok(Bound::Format(parse_format(format, cursor, env)?)),
		Node::If(iff) => parse_if(iff, cursor, env),
		Node::Repeat(rep) => parse_repeat(rep, cursor, env),
		Node::Let(l) => parse_let(l, env),
		Node::Pass(Pass) => Ok(Bound::Pass),
	}
}

fn parse_field(field: &Field, cursor: &mut Cursor, env: &mut Environment) -> Result<Bound> {
	let resolved = field.dtype.resolve(env)?;
	let value = match &field.const_value {
		Some(expected) => {
			let size = resolved
				.size()
				.ok_or_else(|| Error::bad_dtype("a const field's dtype must have a concrete bit size"))?;
			let bits = cursor.take(size)?;
			let declared = resolved.pack(expected)?;
			if bits != declared {
				return Err(Error::ConstMismatch { name: field.name.clone() });
			}
			expected.clone()
		},
		None => {
			let bits = match resolved.size() {
				Some(n) => cursor.take(n)?,
				None => cursor.take(cursor.remaining())?,
			};
			resolved.unpack(&bits)?
		},
	};
	if let Some(name) = &field.name {
		env.bind(name.clone(), ExprValue::from(&value));
	}
	Ok(Bound::Value(value))
}

fn parse_format(format: &Format, cursor: &mut Cursor, env: &mut Environment) -> Result<Vec<(Option<String>, Bound)>> {
	let scoped = format.name.is_some();
	if scoped {
		env.push_scope();
	}
	let mut children = Vec::with_capacity(format.children.len());
	for child in &format.children {
		let bound = parse_node(child, cursor, env)?;
		children.push((child.binding_name().map(str::to_string), bound));
	}
	if let Some(name) = &format.name {
		let fields = env.drain_scope();
		env.bind(name.clone(), ExprValue::Struct(fields));
	}
	Ok(children)
}

fn parse_if(iff: &If, cursor: &mut Cursor, env: &mut Environment) -> Result<Bound> {
	if iff.cond.eval(env)?.is_truthy() {
		let inner = parse_node(&iff.then_branch, cursor, env)?;
		Ok(Bound::If { taken: true, inner: Box::new(inner) })
	} else {
		let inner = match &iff.else_branch {
			Some(branch) => parse_node(branch, cursor, env)?,
			None => Bound::Unbound,
		};
		Ok(Bound::If { taken: false, inner: Box::new(inner) })
	}
}

fn parse_repeat(rep: &Repeat, cursor: &mut Cursor, env: &mut Environment) -> Result<Bound> {
	let n = repeat_count(rep, env)?;
	let mut items = Vec::with_capacity(n);
	for i in 0 .. n {
		env.push_scope();
		env.bind("_", ExprValue::Int(i as i128));
		let bound = parse_node(&rep.body, cursor, env);
		env.pop_scope();
		items.push(bound?);
	}
	Ok(Bound::Repeat(items))
}

fn parse_let(l: &Let, env: &mut Environment) -> Result<Bound> {
	let value = l.expr.eval(env)?;
	env.bind(l.name.clone(), value.clone());
	Ok(Bound::Let(value))
}

fn repeat_count(rep: &Repeat, env: &mut Environment) -> Result<usize> {
	let value = rep.count.eval(env)?;
	let n = value.as_int().ok_or_else(|| Error::out_of_range("repeat count did not evaluate to an integer"))?;
	if n < 0 {
		return Err(Error::out_of_range("repeat count must be non-negative"));
	}
	Ok(n as usize)
}

// ---------------------------------------------------------------- build

fn build_node(node: &Node, values: &mut dyn Iterator<Item = DtypeValue>, env: &mut Environment, out: &mut MutableBits) -> Result<Bound> {
	match node {
		Node::Field(field) => build_field(field, values, env, out),
		Node::Format(format) => Ok(Bound::Format(build_format(format, values, env, out)?)),
		Node::If(iff) => build_if(iff, values, env, out),
		Node::Repeat(rep) => build_repeat(rep, values, env, out),
		Node::Let(l) => parse_let(l, env),
		Node::Pass(Pass) => Ok(Bound::Pass),
	}
}

fn build_field(field: &Field, values: &mut dyn Iterator<Item = DtypeValue>, env: &mut Environment, out: &mut MutableBits) -> Result<Bound> {
	let resolved = field.dtype.resolve(env)?;
	let value = match &field.const_value {
		Some(v) => v.clone(),
		None => values
			.next()
			.ok_or_else(|| Error::out_of_range("not enough values supplied to build this schema"))?,
	};
	out.append(&resolved.pack(&value)?);
	if let Some(name) = &field.name {
		env.bind(name.clone(), ExprValue::from(&value));
	}
	Ok(Bound::Value(value))
}

fn build_format(
	format: &Format,
	values: &mut dyn Iterator<Item = DtypeValue>,
	env: &mut Environment,
	out: &mut MutableBits,
) -> Result<Vec<(Option<String>, Bound)>> {
	let scoped = format.name.is_some();
	if scoped {
		env.push_scope();
	}
	let mut children = Vec::with_capacity(format.children.len());
	for child in &format.children {
		let bound = build_node(child, values, env, out)?;
		children.push((child.binding_name().map(str::to_string), bound));
	}
	if let Some(name) = &format.name {
		let fields = env.drain_scope();
		env.bind(name.clone(), ExprValue::Struct(fields));
	}
	Ok(children)
}

fn build_if(iff: &If, values: &mut dyn Iterator<Item = DtypeValue>, env: &mut Environment, out: &mut MutableBits) -> Result<Bound> {
	if iff.cond.eval(env)?.is_truthy() {
		let inner = build_node(&iff.then_branch, values, env, out)?;
		Ok(Bound::If { taken: true, inner: Box::new(inner) })
	} else {
		let inner = match &iff.else_branch {
			Some(branch) => build_node(branch, values, env, out)?,
			None => Bound::Unbound,
		};
		Ok(Bound::If { taken: false, inner: Box::new(inner) })
	}
}

fn build_repeat(rep: &Repeat, values: &mut dyn Iterator<Item = DtypeValue>, env: &mut Environment, out: &mut MutableBits) -> Result<Bound> {
	let n = repeat_count(rep, env)?;
	let mut items = Vec::with_capacity(n);
	for i in 0 .. n {
		env.push_scope();
		env.bind("_", ExprValue::Int(i as i128));
		let bound = build_node(&rep.body, values, env, out);
		env.pop_scope();
		items.push(bound?);
	}
	Ok(Bound::Repeat(items))
}

// ----------------------------------------------------------------- emit

/// Replays a `Bound` tree back to bits, re-packing each field's stored
/// value. Branches not taken and zero-count
/// repeats contribute nothing, matching how they were left unbound.
fn emit_node(node: &Node, bound: &Bound, env: &mut Environment, out: &mut MutableBits) -> Result<()> {
	match (node, bound) {
		(Node::Field(field), Bound::Value(value)) => {
			let resolved = field.dtype.resolve(env)?;
			out.append(&resolved.pack(value)?);
			if let Some(name) = &field.name {
				env.bind(name.clone(), ExprValue::from(value));
			}
			Ok(())
		},
		(Node::Format(format), Bound::Format(children)) => emit_format(format, children, env, out),
		(Node::If(iff), Bound::If { taken, inner }) => {
			if *taken {
				emit_node(&iff.then_branch, inner, env, out)
			} else if let Some(branch) = &iff.else_branch {
				emit_node(branch, inner, env, out)
			} else {
				Ok(())
			}
		},
		(Node::Repeat(rep), Bound::Repeat(items)) => {
			for (i, item) in items.iter().enumerate() {
				env.push_scope();
				env.bind("_", ExprValue::Int(i as i128));
				let result = emit_node(&rep.body, item, env, out);
				env.pop_scope();
				result?;
			}
			Ok(())
		},
		(Node::Let(l), Bound::Let(value)) => {
			env.bind(l.name.clone(), value.clone());
			Ok(())
		},
		(Node::Pass(Pass), Bound::Pass) => Ok(()),
		(_, Bound::Unbound) => Err(Error::schema("cannot serialise a node that has not been bound")),
		_ => Err(Error::schema("schema node and bound state shape mismatch")),
	}
}

fn emit_format(format: &Format, children: &[(Option<String>, Bound)], env: &mut Environment, out: &mut MutableBits) -> Result<()> {
	if format.children.len() != children.len() {
		return Err(Error::schema("bound state does not match this format's shape"));
	}
	let scoped = format.name.is_some();
	if scoped {
		env.push_scope();
	}
	for (child, (_, bound)) in format.children.iter().zip(children) {
		emit_node(child, bound, env, out)?;
	}
	if let Some(name) = &format.name {
		let fields = env.drain_scope();
		env.bind(name.clone(), ExprValue::Struct(fields));
	}
	Ok(())
}

// --------------------------------------------------------------- reset

fn reset_node(node: &Node) -> Bound {
	match node {
		Node::Field(field) => match &field.const_value {
			Some(v) => Bound::Value(v.clone()),
			None => Bound::Unbound,
		},
		Node::Format(format) => Bound::Format(reset_format(format)),
		Node::If(_) => Bound::If { taken: false, inner: Box::new(Bound::Unbound) },
		Node::Repeat(_) => Bound::Repeat(Vec::new()),
		Node::Let(_) => Bound::Unbound,
		Node::Pass(Pass) => Bound::Pass,
	}
}

pub(super) fn reset_format(format: &Format) -> Vec<(Option<String>, Bound)> {
	format.children.iter().map(|child| (child.binding_name().map(str::to_string), reset_node(child))).collect()
}

// --------------------------------------------------------------- Schema

/// The interpreter-facing handle on a schema tree: an immutable [`Format`]
/// root plus the mutable [`Bound`] state produced by the last parse/build.
///
/// Cloning a [`Schema`] clones its root tree (cheap relative to a parse)
/// and resets state to unbound; this is the supported way to run two
/// concurrent parses against "the same" schema, since each invocation
/// then owns its own environment and result state.
#[derive(Clone, Debug)]
pub struct Schema {
	root: Format,
	state: Vec<(Option<String>, Bound)>,
}

impl Schema {
	/// Builds a schema whose root is an unnamed [`Format`] over `children`.
	/// Fails with [`Error::SchemaError`] if two direct children bind the
	/// same name.
	pub fn new(children: Vec<Node>) -> Result<Self> {
		let root = Format::new(children)?;
		let state = reset_format(&root);
		Ok(Self { root, state })
	}

	/// Builds a schema whose root is a named [`Format`].
	pub fn named(name: impl Into<String>, children: Vec<Node>) -> Result<Self> {
		let root = Format::named(name, children)?;
		let state = reset_format(&root);
		Ok(Self { root, state })
	}

	/// The root format's children, in document order.
	pub fn children(&self) -> &[Node] {
		&self.root.children
	}

	/// Consumes `values` and emits the corresponding bits, without
	/// retaining any state for later inspection.
	pub fn build(&self, values: impl IntoIterator<Item = DtypeValue>) -> Result<Bits> {
		let mut iter = values.into_iter();
		let mut env = Environment::new();
		let mut out = MutableBits::new();
		build_format(&self.root, &mut iter, &mut env, &mut out)?;
		Ok(out.to_bits())
	}

	/// Like [`Schema::build`], but also binds every child node so the
	/// result can be inspected with [`Schema::unpack`] afterward.
	/// Returns the root's bits.
	pub fn pack(&mut self, values: impl IntoIterator<Item = DtypeValue>) -> Result<Bits> {
		let mut iter = values.into_iter();
		let mut env = Environment::new();
		let mut out = MutableBits::new();
		let state = build_format(&self.root, &mut iter, &mut env, &mut out)?;
		self.state = state;
		Ok(out.to_bits())
	}

	/// Binds every child node from `bits` starting at `offset`, returning
	/// the number of bits consumed. On error, the partially-applied state
	/// from this call is discarded, leaving the cursor position and
	/// bindings as they were *before* the failing step — for a
	/// from-scratch parse, simply the pre-parse state already held.
	pub fn parse(&mut self, bits: &Bits, offset: usize) -> Result<usize> {
		let mut cursor = Cursor::new(bits, offset);
		let mut env = Environment::new();
		let state = parse_format(&self.root, &mut cursor, &mut env)?;
		self.state = state;
		Ok(cursor.pos - offset)
	}

	/// The structured value tree bound by the last successful `parse` or
	/// `pack`.
	pub fn unpack(&self) -> Bound {
		Bound::Format(self.state.clone())
	}

	/// Resets every non-const node to unbound. Const fields keep their
	/// declared value.
	pub fn clear(&mut self) {
		self.state = reset_format(&self.root);
	}

	/// Reassembles bits from the current bound state. Fails with
	/// [`Error::SchemaError`] if any node that must contribute bits is
	/// unbound.
	pub fn to_bits(&self) -> Result<Bits> {
		let mut env = Environment::new();
		let mut out = MutableBits::new();
		emit_format(&self.root, &self.state, &mut env, &mut out)?;
		Ok(out.to_bits())
	}
}
