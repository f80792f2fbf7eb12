/*! The name environment an [`super::Expr`] is evaluated against.

A schema is a tree of nested formats; each format instance pushes its own
scope onto the stack as it binds fields. Lookups search from the
innermost scope outward so a `repeat` expression can see both its own
loop variable and every name bound by an enclosing format, but never the
siblings of an enclosing format.
!*/

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::Value;

#[derive(Default)]
struct Scope {
	names: HashMap<String, Value>,
}

/// A stack of nested scopes, innermost last.
#[derive(Default)]
pub struct Environment {
	scopes: Vec<Scope>,
}

impl Environment {
	pub fn new() -> Self {
		Environment { scopes: vec![Scope::default()] }
	}

	/// Pushes a fresh, empty scope (entering a nested format).
	pub fn push_scope(&mut self) {
		self.scopes.push(Scope::default());
	}

	/// Pops the innermost scope (leaving a nested format).
	pub fn pop_scope(&mut self) {
		if self.scopes.len() > 1 {
			self.scopes.pop();
		}
	}

	/// Binds `name` in the innermost scope, shadowing any outer binding of
	/// the same name for the remainder of that scope's lifetime.
	pub fn bind(&mut self, name: impl Into<String>, value: Value) {
		let scope = self.scopes.last_mut().expect("Environment always has a scope");
		scope.names.insert(name.into(), value);
	}

	/// Looks up `name`, searching from the innermost scope outward.
	pub fn lookup(&self, name: &str) -> Result<Value> {
		for scope in self.scopes.iter().rev() {
			if let Some(v) = scope.names.get(name) {
				return Ok(v.clone());
			}
		}
		Err(Error::UnresolvedName(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.scopes.iter().rev().any(|s| s.names.contains_key(name))
	}

	/// Pops the innermost scope and returns its direct bindings, in
	/// insertion order is not guaranteed (a `HashMap` backs each scope).
	/// Used when a named [`crate::schema::Format`] finishes: its own
	/// scope is drained into a struct value exposed to the enclosing
	/// scope under its name.
	pub(crate) fn drain_scope(&mut self) -> Vec<(String, Value)> {
		let scope = if self.scopes.len() > 1 {
			self.scopes.pop().expect("checked len > 1")
		} else {
			std::mem::take(self.scopes.last_mut().expect("Environment always has a scope"))
		};
		scope.names.into_iter().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inner_scope_shadows_outer() {
		let mut env = Environment::new();
		env.bind("n", Value::Int(1));
		env.push_scope();
		env.bind("n", Value::Int(2));
		assert_eq!(env.lookup("n").unwrap(), Value::Int(2));
		env.pop_scope();
		assert_eq!(env.lookup("n").unwrap(), Value::Int(1));
	}

	#[test]
	fn enclosing_scope_is_visible_from_nested_scope() {
		let mut env = Environment::new();
		env.bind("w", Value::Int(4));
		env.push_scope();
		assert_eq!(env.lookup("w").unwrap(), Value::Int(4));
	}

	#[test]
	fn missing_name_is_unresolved() {
		let env = Environment::new();
		assert!(matches!(env.lookup("missing"), Err(Error::UnresolvedName(_))));
	}
}
