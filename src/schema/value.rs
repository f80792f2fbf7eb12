/*! The structured value tree a parsed/built [`super::Schema`] exposes.

[`Bound`] mirrors the shape of the [`super::Node`] tree it was produced
from: one variant per node kind, carrying that kind's runtime state. It
is the one mutable part of an otherwise-immutable schema: a [`Schema`]
holds exactly one `Bound` tree, replaced wholesale by `parse`/`pack` and
read by `unpack`/`to_bits`.
!*/

use crate::dtype::Value as DtypeValue;
use crate::expr::Value as ExprValue;

/// The per-invocation state of one schema node.
#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
	/// Not yet populated: the untaken branch of an `If`, every iteration
	/// of a zero-count `Repeat`, or any node since the last [`super::Schema::clear`].
	Unbound,
	/// A `Field`'s decoded or supplied value.
	Value(DtypeValue),
	/// A `Format`'s children, in document order, each labelled with its
	/// binding name if it has one.
	Format(Vec<(Option<String>, Bound)>),
	/// An `If`'s recorded branch: which side was taken, and that side's
	/// state. Recording `taken` is what makes `to_bits` deterministic
	/// without re-evaluating the condition.
	If { taken: bool, inner: Box<Bound> },
	/// A `Repeat`'s per-iteration states, in iteration order.
	Repeat(Vec<Bound>),
	/// A `Let`'s evaluated value.
	Let(ExprValue),
	/// A `Pass`: always this one value.
	Pass,
}

impl Bound {
	/// The decoded value of a `Field` node, if this is one.
	pub fn as_value(&self) -> Option<&DtypeValue> {
		match self {
			Bound::Value(v) => Some(v),
			_ => None,
		}
	}

	/// Looks up a direct child of a `Format` node by name.
	pub fn field(&self, name: &str) -> Option<&Bound> {
		match self {
			Bound::Format(children) => {
				children.iter().find(|(n, _)| n.as_deref() == Some(name)).map(|(_, b)| b)
			},
			_ => None,
		}
	}

	/// Whether this node (and everything nested inside it) was populated
	/// by a parse or build.
	pub fn is_bound(&self) -> bool {
		match self {
			Bound::Unbound => false,
			Bound::Value(_) | Bound::Let(_) | Bound::Pass => true,
			Bound::Format(children) => children.iter().all(|(_, b)| b.is_bound()),
			// An `If` is resolved once a branch has been chosen, even
			// though the untaken side is intentionally left `Unbound`.
			Bound::If { .. } => true,
			Bound::Repeat(items) => items.iter().all(Bound::is_bound),
		}
	}
}
