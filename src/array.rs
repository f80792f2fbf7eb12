/*! A typed array (component I): a logical sequence of values of one
fixed-width [`Dtype`], backed by a [`MutableBits`] builder whose length
is always `items * item_size`.

Unlike a schema [`crate::schema::Schema`], a `BitArray` has no tree of
named nodes — it is a flat, homogeneous, mutable sequence, closer in
spirit to a plain bit-vector than to the interpreter layer built on top
of it.
!*/

use crate::bits::{BitRead, Bits, MutableBits};
use crate::dtype::{Dtype, Value};
use crate::error::{Error, Result};

/// A homogeneous, mutable sequence of one fixed-width dtype's values.
///
/// `dtype` must resolve to a constant bit size (`Dtype::const_size`)
/// with no unresolved size expression; array and tuple dtypes are
/// allowed as the item type as long as every nested size is constant.
#[derive(Clone, Debug)]
pub struct BitArray {
	dtype: Dtype,
	item_size: usize,
	storage: MutableBits,
}

impl BitArray {
	/// An empty array of `dtype`-typed items.
	pub fn new(dtype: Dtype) -> Result<Self> {
		let item_size = item_size(&dtype)?;
		Ok(Self { dtype, item_size, storage: MutableBits::new() })
	}

	/// An array built from existing bits, which must hold a whole number
	/// of `dtype`-sized items.
	pub fn from_bits(dtype: Dtype, bits: &impl BitRead) -> Result<Self> {
		let item_size = item_size(&dtype)?;
		check_length(bits.bit_len(), item_size)?;
		Ok(Self { dtype, item_size, storage: MutableBits::from_bits(bits) })
	}

	/// The number of items currently held.
	pub fn len(&self) -> usize {
		if self.item_size == 0 { 0 } else { self.storage.bit_len() / self.item_size }
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The item dtype.
	pub fn dtype(&self) -> &Dtype {
		&self.dtype
	}

	fn item_bits(&self, index: usize) -> Result<Bits> {
		let n = self.len();
		if index >= n {
			return Err(Error::out_of_range(format!("index {} out of range for length {}", index, n)));
		}
		let start = index * self.item_size;
		self.storage.clone().to_bits().slice(start, start + self.item_size)
	}

	/// Decodes the item at `index`.
	pub fn get(&self, index: usize) -> Result<Value> {
		let bits = self.item_bits(index)?;
		self.dtype.unpack(&bits)
	}

	/// Appends `value`, encoded with this array's dtype.
	pub fn append(&mut self, value: &Value) -> Result<()> {
		let encoded = self.dtype.pack(value)?;
		self.storage.append(&encoded);
		Ok(())
	}

	/// Appends every value of `iter` in order.
	pub fn extend(&mut self, iter: impl IntoIterator<Item = Value>) -> Result<()> {
		for value in iter {
			self.append(&value)?;
		}
		Ok(())
	}

	/// Inserts `value` at logical item index `index`, shifting later
	/// items up by one.
	pub fn insert(&mut self, index: usize, value: &Value) -> Result<()> {
		let n = self.len();
		if index > n {
			return Err(Error::out_of_range(format!("insert index {} out of range for length {}", index, n)));
		}
		let encoded = self.dtype.pack(value)?;
		self.storage.insert(index * self.item_size, &encoded)?;
		Ok(())
	}

	/// Removes and decodes the item at `index`; a negative index counts
	/// from the end, defaulting to the last item.
	pub fn pop(&mut self, index: Option<i64>) -> Result<Value> {
		let n = self.len();
		if n == 0 {
			return Err(Error::out_of_range("pop from an empty array"));
		}
		let i = resolve_index(index.unwrap_or(-1), n)?;
		let value = self.get(i)?;
		let whole = self.storage.clone().to_bits();
		let start = i * self.item_size;
		let end = start + self.item_size;
		let mut rebuilt = MutableBits::from_bits(&whole.slice(0, start)?);
		rebuilt.append(&whole.slice(end, whole.bit_len())?);
		self.storage = rebuilt;
		Ok(value)
	}

	/// Reinterprets the underlying bits as `new`, without re-encoding any
	/// values. Fails if the total bit length is not a whole multiple of
	/// `new`'s item size.
	pub fn set_dtype(&mut self, new: Dtype) -> Result<()> {
		let new_item_size = item_size(&new)?;
		check_length(self.storage.bit_len(), new_item_size)?;
		self.dtype = new;
		self.item_size = new_item_size;
		Ok(())
	}

	/// The raw backing bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.storage.to_bytes()
	}

	/// Decodes every item, in order.
	pub fn unpack(&self) -> Result<Vec<Value>> {
		(0 .. self.len()).map(|i| self.get(i)).collect()
	}

	/// Adds `rhs` to every item in place; fails if any item's dtype does
	/// not support addition (non-numeric kinds such as `BYTES`/`HEX`).
	pub fn add_assign(&mut self, rhs: &Value) -> Result<()> {
		self.map_in_place(rhs, elementwise_add)
	}

	/// Subtracts `rhs` from every item in place.
	pub fn sub_assign(&mut self, rhs: &Value) -> Result<()> {
		self.map_in_place(rhs, elementwise_sub)
	}

	/// Multiplies every item by `rhs` in place.
	pub fn mul_assign(&mut self, rhs: &Value) -> Result<()> {
		self.map_in_place(rhs, elementwise_mul)
	}

	/// Divides every item by `rhs` in place.
	pub fn div_assign(&mut self, rhs: &Value) -> Result<()> {
		self.map_in_place(rhs, elementwise_div)
	}

	fn map_in_place(&mut self, rhs: &Value, op: fn(&Value, &Value) -> Result<Value>) -> Result<()> {
		let values: Vec<Value> = self.unpack()?.iter().map(|v| op(v, rhs)).collect::<Result<_>>()?;
		let mut rebuilt = MutableBits::new();
		for v in &values {
			rebuilt.append(&self.dtype.pack(v)?);
		}
		self.storage = rebuilt;
		Ok(())
	}
}

fn item_size(dtype: &Dtype) -> Result<usize> {
	dtype
		.const_size()
		.ok_or_else(|| Error::bad_dtype("array item dtype must have a constant bit size"))
}

fn check_length(total_bits: usize, item_size: usize) -> Result<()> {
	if item_size == 0 {
		return Err(Error::bad_dtype("array item dtype must have a non-zero bit size"));
	}
	if total_bits % item_size != 0 {
		return Err(Error::LengthMismatch { expected: item_size, actual: total_bits });
	}
	Ok(())
}

fn resolve_index(index: i64, len: usize) -> Result<usize> {
	let resolved = if index < 0 { index + len as i64 } else { index };
	if resolved < 0 || resolved as usize >= len {
		return Err(Error::out_of_range(format!("index {} out of range for length {}", index, len)));
	}
	Ok(resolved as usize)
}

fn elementwise_add(a: &Value, b: &Value) -> Result<Value> {
	numeric_op(a, b, |x, y| x.checked_add(y), |x, y| x + y, |x, y| x + y)
}

fn elementwise_sub(a: &Value, b: &Value) -> Result<Value> {
	numeric_op(a, b, |x, y| x.checked_sub(y), |x, y| x - y, |x, y| x - y)
}

fn elementwise_mul(a: &Value, b: &Value) -> Result<Value> {
	numeric_op(a, b, |x, y| x.checked_mul(y), |x, y| x * y, |x, y| x * y)
}

fn elementwise_div(a: &Value, b: &Value) -> Result<Value> {
	numeric_op(
		a,
		b,
		|x, y| if y == 0 { None } else { x.checked_div(y) },
		|x, y| x / y,
		|x, y| x / y,
	)
}

/// Dispatches a scalar arithmetic op across the numeric dtype kinds,
/// failing with [`Error::BadDtype`] for kinds that don't support it.
fn numeric_op(
	a: &Value,
	b: &Value,
	int_op: fn(i128, i128) -> Option<i128>,
	uint_op: fn(u128, u128) -> u128,
	float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
	match (a, b) {
		(Value::UInt(x), _) => {
			let y = b.as_int().ok_or_else(|| Error::bad_dtype("operand is not numeric"))?;
			let y = u128::try_from(y).map_err(|_| Error::out_of_range("negative operand against an unsigned array"))?;
			Ok(Value::UInt(uint_op(*x, y)))
		},
		(Value::Int(x), _) => {
			let y = b.as_int().ok_or_else(|| Error::bad_dtype("operand is not numeric"))?;
			int_op(*x, y).map(Value::Int).ok_or_else(|| Error::Arithmetic("integer overflow in elementwise op".into()))
		},
		(Value::Float(x), _) => {
			let y = match b {
				Value::Float(f) => *f,
				_ => b.as_int().ok_or_else(|| Error::bad_dtype("operand is not numeric"))? as f64,
			};
			Ok(Value::Float(float_op(*x, y)))
		},
		_ => Err(Error::bad_dtype("elementwise arithmetic requires a numeric dtype")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn append_and_get_round_trip() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.append(&Value::UInt(1)).unwrap();
		arr.append(&Value::UInt(2)).unwrap();
		assert_eq!(arr.len(), 2);
		assert_eq!(arr.get(0).unwrap(), Value::UInt(1));
		assert_eq!(arr.get(1).unwrap(), Value::UInt(2));
	}

	#[test]
	fn pop_default_removes_last() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.extend([Value::UInt(1), Value::UInt(2), Value::UInt(3)]).unwrap();
		let popped = arr.pop(None).unwrap();
		assert_eq!(popped, Value::UInt(3));
		assert_eq!(arr.len(), 2);
	}

	#[test]
	fn pop_negative_index_counts_from_end() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.extend([Value::UInt(1), Value::UInt(2), Value::UInt(3)]).unwrap();
		let popped = arr.pop(Some(-2)).unwrap();
		assert_eq!(popped, Value::UInt(2));
		assert_eq!(arr.unpack().unwrap(), vec![Value::UInt(1), Value::UInt(3)]);
	}

	#[test]
	fn insert_shifts_later_items() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.extend([Value::UInt(1), Value::UInt(3)]).unwrap();
		arr.insert(1, &Value::UInt(2)).unwrap();
		assert_eq!(arr.unpack().unwrap(), vec![Value::UInt(1), Value::UInt(2), Value::UInt(3)]);
	}

	#[test]
	fn set_dtype_requires_length_compatibility() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.extend([Value::UInt(1), Value::UInt(2), Value::UInt(3)]).unwrap();
		assert!(arr.set_dtype(Dtype::uint(16)).is_err());
		arr.append(&Value::UInt(4)).unwrap();
		assert!(arr.set_dtype(Dtype::uint(16)).is_ok());
		assert_eq!(arr.len(), 2);
	}

	#[test]
	fn add_assign_is_elementwise() {
		let mut arr = BitArray::new(Dtype::uint(8)).unwrap();
		arr.extend([Value::UInt(1), Value::UInt(2)]).unwrap();
		arr.add_assign(&Value::UInt(10)).unwrap();
		assert_eq!(arr.unpack().unwrap(), vec![Value::UInt(11), Value::UInt(12)]);
	}

	#[test]
	fn div_assign_rejects_non_numeric_dtype() {
		let mut arr = BitArray::new(Dtype::bytes(1)).unwrap();
		arr.append(&Value::Bytes(vec![4])).unwrap();
		assert!(arr.div_assign(&Value::UInt(2)).is_err());
	}

	#[test]
	fn empty_array_length_is_zero() {
		let arr = BitArray::new(Dtype::uint(8)).unwrap();
		assert_eq!(arr.len(), 0);
		assert!(arr.is_empty());
	}
}
