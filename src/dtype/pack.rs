/*! `pack`/`unpack` implementations for [`super::ResolvedDtype`].
!*/

use crate::bits::{Bits, BitRead, MutableBits};
use crate::error::{Error, Result};

use super::{Endian, Kind, ResolvedDtype, Value};

pub(super) fn pack(dtype: &ResolvedDtype, value: &Value) -> Result<Bits> {
	match dtype {
		ResolvedDtype::Single { kind, size, endian } => pack_single(*kind, *size, *endian, value),
		ResolvedDtype::Array { item, count } => pack_array(item, *count, value),
		ResolvedDtype::Tuple(items) => pack_tuple(items, value),
	}
}

pub(super) fn unpack(dtype: &ResolvedDtype, bits: &Bits) -> Result<Value> {
	match dtype {
		ResolvedDtype::Single { kind, size, endian } => unpack_single(*kind, *size, *endian, bits),
		ResolvedDtype::Array { item, count } => unpack_array(item, *count, bits),
		ResolvedDtype::Tuple(items) => unpack_tuple(items, bits),
	}
}

fn require_size(size: Option<usize>, kind: Kind) -> Result<usize> {
	size.ok_or_else(|| Error::bad_dtype(format!("{:?} has no declared size and cannot be packed", kind)))
}

fn pack_single(kind: Kind, size: Option<usize>, endian: Endian, value: &Value) -> Result<Bits> {
	match kind {
		Kind::Uint => {
			let n = require_size(size, kind)?;
			let Value::UInt(v) = value else { return Err(type_mismatch(kind, value)) };
			pack_uint(*v, n, endian)
		},
		Kind::Int => {
			let n = require_size(size, kind)?;
			let Value::Int(v) = value else { return Err(type_mismatch(kind, value)) };
			pack_int(*v, n, endian)
		},
		Kind::Float => {
			let n = require_size(size, kind)?;
			let Value::Float(v) = value else { return Err(type_mismatch(kind, value)) };
			pack_float(*v, n, endian)
		},
		Kind::Bool => {
			let Value::Bool(v) = value else { return Err(type_mismatch(kind, value)) };
			Ok(Bits::from_bools([*v]))
		},
		Kind::Bytes => {
			let Value::Bytes(v) = value else { return Err(type_mismatch(kind, value)) };
			let n = require_size(size, kind)?;
			if v.len() * 8 != n {
				return Err(Error::out_of_range(format!("expected {} bytes, got {}", n / 8, v.len())));
			}
			Bits::from_bytes(v, Some(n))
		},
		Kind::Hex => {
			let Value::Hex(s) = value else { return Err(type_mismatch(kind, value)) };
			let n = require_size(size, kind)?;
			pack_hex(s, n)
		},
		Kind::Bin => {
			let Value::Bin(s) = value else { return Err(type_mismatch(kind, value)) };
			let n = require_size(size, kind)?;
			pack_bin(s, n)
		},
		Kind::Oct => {
			let Value::Oct(s) = value else { return Err(type_mismatch(kind, value)) };
			let n = require_size(size, kind)?;
			pack_oct(s, n)
		},
		Kind::Bits => {
			let Value::Bits(b) = value else { return Err(type_mismatch(kind, value)) };
			let n = require_size(size, kind)?;
			if b.bit_len() != n {
				return Err(Error::LengthMismatch { expected: n, actual: b.bit_len() });
			}
			Ok(b.clone())
		},
		Kind::Pad => {
			let n = require_size(size, kind)?;
			Ok(Bits::zeros(n))
		},
	}
}

fn type_mismatch(kind: Kind, value: &Value) -> Error {
	Error::bad_dtype(format!("value {:?} does not match dtype kind {:?}", value, kind))
}

/// Whether `endian` stores its least-significant byte first. `Native`
/// resolves to whatever the build's target actually is, same as
/// [`u128::to_ne_bytes`].
fn is_little_endian(endian: Endian) -> bool {
	match endian {
		Endian::Le => true,
		Endian::Be => false,
		Endian::Native => cfg!(target_endian = "little"),
		Endian::None => false,
	}
}

fn pack_uint(v: u128, n: usize, endian: Endian) -> Result<Bits> {
	if n < 128 && v >= (1u128 << n) {
		return Err(Error::out_of_range(format!("value {} does not fit in {} bits", v, n)));
	}
	if matches!(endian, Endian::Le | Endian::Native) {
		if n % 8 != 0 {
			return Err(Error::bad_dtype("little-endian/native uint requires a byte-multiple size"));
		}
		let nbytes = n / 8;
		let be = v.to_be_bytes();
		let mut bytes: Vec<u8> = be[16 - nbytes ..].to_vec();
		if is_little_endian(endian) {
			bytes.reverse();
		}
		Bits::from_bytes(&bytes, Some(n))
	} else {
		let mut mb = MutableBits::zeros(n);
		for i in 0 .. n {
			let bit = (v >> (n - 1 - i)) & 1 == 1;
			mb.set(bit, [i]).ok();
		}
		Ok(mb.to_bits())
	}
}

fn pack_int(v: i128, n: usize, endian: Endian) -> Result<Bits> {
	if n < 128 {
		let min = -(1i128 << (n - 1));
		let max = (1i128 << (n - 1)) - 1;
		if v < min || v > max {
			return Err(Error::out_of_range(format!("value {} does not fit in {}-bit two's complement", v, n)));
		}
	}
	let mask = if n >= 128 { u128::MAX } else { (1u128 << n) - 1 };
	let bits_val = (v as u128) & mask;
	pack_uint(bits_val, n, endian)
}

fn pack_float(v: f64, n: usize, endian: Endian) -> Result<Bits> {
	let be_bytes: Vec<u8> = match n {
		16 => half_bits(v as f32).to_be_bytes().to_vec(),
		32 => (v as f32).to_be_bytes().to_vec(),
		64 => v.to_be_bytes().to_vec(),
		_ => return Err(Error::bad_dtype("float size must be 16, 32, or 64")),
	};
	let bytes = if is_little_endian(endian) { be_bytes.into_iter().rev().collect() } else { be_bytes };
	Bits::from_bytes(&bytes, Some(n))
}

/// A minimal IEEE-754 binary16 encoder (round-to-nearest-even via the `f32`
/// intermediate), used only for the `float16` dtype.
fn half_bits(v: f32) -> u16 {
	let bits = v.to_bits();
	let sign = (bits >> 16) & 0x8000;
	let exp = ((bits >> 23) & 0xff) as i32 - 127 + 15;
	let mantissa = bits & 0x007f_ffff;
	if ((bits >> 23) & 0xff) == 0xff {
		// infinity / NaN
		let nan_bit = if mantissa != 0 { 0x0200 } else { 0 };
		return (sign | 0x7c00 | nan_bit) as u16;
	}
	if exp <= 0 {
		return sign as u16;
	}
	if exp >= 0x1f {
		return (sign | 0x7c00) as u16;
	}
	(sign | ((exp as u32) << 10) | (mantissa >> 13)) as u16
}

fn half_to_f32(bits: u16) -> f32 {
	let sign = (bits & 0x8000) as u32;
	let exp = ((bits >> 10) & 0x1f) as u32;
	let mantissa = (bits & 0x03ff) as u32;
	let out: u32 = if exp == 0 {
		(sign << 16) | (mantissa << 13)
	} else if exp == 0x1f {
		(sign << 16) | 0x7f80_0000 | (mantissa << 13)
	} else {
		(sign << 16) | ((exp + 127 - 15) << 23) | (mantissa << 13)
	};
	f32::from_bits(out)
}

fn pack_hex(s: &str, n: usize) -> Result<Bits> {
	if s.len() * 4 != n {
		return Err(Error::out_of_range(format!("expected {} hex digits, got {}", n / 4, s.len())));
	}
	let mut mb = MutableBits::zeros(0);
	for c in s.chars() {
		let d = c.to_digit(16).ok_or_else(|| Error::bad_syntax("hex", s, format!("invalid hex digit {:?}", c)))?;
		for i in (0 .. 4).rev() {
			mb.append_bit((d >> i) & 1 == 1);
		}
	}
	Ok(mb.to_bits())
}

fn pack_bin(s: &str, n: usize) -> Result<Bits> {
	if s.len() != n {
		return Err(Error::out_of_range(format!("expected {} bin characters, got {}", n, s.len())));
	}
	let mut mb = MutableBits::zeros(0);
	for c in s.chars() {
		match c {
			'0' => mb.append_bit(false),
			'1' => mb.append_bit(true),
			_ => return Err(Error::bad_syntax("bin", s, format!("invalid bin digit {:?}", c))),
		};
	}
	Ok(mb.to_bits())
}

fn pack_oct(s: &str, n: usize) -> Result<Bits> {
	if s.len() * 3 != n {
		return Err(Error::out_of_range(format!("expected {} octal digits, got {}", n / 3, s.len())));
	}
	let mut mb = MutableBits::zeros(0);
	for c in s.chars() {
		let d = c.to_digit(8).ok_or_else(|| Error::bad_syntax("oct", s, format!("invalid octal digit {:?}", c)))?;
		for i in (0 .. 3).rev() {
			mb.append_bit((d >> i) & 1 == 1);
		}
	}
	Ok(mb.to_bits())
}

fn unpack_single(kind: Kind, size: Option<usize>, endian: Endian, bits: &Bits) -> Result<Value> {
	let n = size.unwrap_or_else(|| bits.bit_len());
	if size.is_some() && bits.bit_len() != n {
		return Err(Error::LengthMismatch { expected: n, actual: bits.bit_len() });
	}
	match kind {
		Kind::Uint => Ok(Value::UInt(unpack_uint(bits, endian)?)),
		Kind::Int => Ok(Value::Int(unpack_int(bits, endian)?)),
		Kind::Float => Ok(Value::Float(unpack_float(bits, n, endian)?)),
		Kind::Bool => {
			if bits.bit_len() != 1 {
				return Err(Error::LengthMismatch { expected: 1, actual: bits.bit_len() });
			}
			Ok(Value::Bool(bits.bit_at(0)?))
		},
		Kind::Bytes => Ok(Value::Bytes(bits.to_bytes())),
		Kind::Hex => Ok(Value::Hex(to_hex_string(bits))),
		Kind::Bin => Ok(Value::Bin(to_bin_string(bits))),
		Kind::Oct => Ok(Value::Oct(to_oct_string(bits)?)),
		Kind::Bits => Ok(Value::Bits(bits.clone())),
		Kind::Pad => Ok(Value::Pad),
	}
}

fn unpack_uint(bits: &Bits, endian: Endian) -> Result<u128> {
	let n = bits.bit_len();
	if n > 128 {
		return Err(Error::out_of_range("uint wider than 128 bits cannot be materialized as a native integer"));
	}
	if matches!(endian, Endian::Le | Endian::Native) {
		if n % 8 != 0 {
			return Err(Error::bad_dtype("little-endian/native uint requires a byte-multiple size"));
		}
		let mut bytes = bits.to_bytes();
		if is_little_endian(endian) {
			bytes.reverse();
		}
		let mut padded = [0u8; 16];
		padded[16 - bytes.len() ..].copy_from_slice(&bytes);
		Ok(u128::from_be_bytes(padded))
	} else {
		let mut v: u128 = 0;
		for i in 0 .. n {
			v = (v << 1) | bits.bit_at(i)? as u128;
		}
		Ok(v)
	}
}

fn unpack_int(bits: &Bits, endian: Endian) -> Result<i128> {
	let n = bits.bit_len();
	let raw = unpack_uint(bits, endian)?;
	if n >= 128 {
		return Ok(raw as i128);
	}
	let sign_bit = 1u128 << (n - 1);
	if raw & sign_bit != 0 {
		Ok((raw as i128) - (1i128 << n))
	} else {
		Ok(raw as i128)
	}
}

fn unpack_float(bits: &Bits, n: usize, endian: Endian) -> Result<f64> {
	let mut bytes = bits.to_bytes();
	if is_little_endian(endian) {
		bytes.reverse();
	}
	match n {
		16 => {
			let raw = u16::from_be_bytes([bytes[0], bytes[1]]);
			Ok(half_to_f32(raw) as f64)
		},
		32 => Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64),
		64 => Ok(f64::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]])),
		_ => Err(Error::bad_dtype("float size must be 16, 32, or 64")),
	}
}

fn to_hex_string(bits: &Bits) -> String {
	let n = bits.bit_len();
	let digits = (n + 3) / 4;
	let mut s = String::with_capacity(digits);
	for d in 0 .. digits {
		let mut v = 0u8;
		for k in 0 .. 4 {
			let i = d * 4 + k;
			let bit = if i < n { bits.bit_at(i).unwrap_or(false) } else { false };
			v = (v << 1) | bit as u8;
		}
		s.push(std::char::from_digit(v as u32, 16).unwrap());
	}
	s
}

fn to_bin_string(bits: &Bits) -> String {
	(0 .. bits.bit_len()).map(|i| if bits.bit_at(i).unwrap_or(false) { '1' } else { '0' }).collect()
}

fn to_oct_string(bits: &Bits) -> Result<String> {
	let n = bits.bit_len();
	if n % 3 != 0 {
		return Err(Error::bad_dtype("oct requires a size that is a multiple of 3 bits"));
	}
	let digits = n / 3;
	let mut s = String::with_capacity(digits);
	for d in 0 .. digits {
		let mut v = 0u8;
		for k in 0 .. 3 {
			let i = d * 3 + k;
			v = (v << 1) | bits.bit_at(i)? as u8;
		}
		s.push(std::char::from_digit(v as u32, 8).unwrap());
	}
	Ok(s)
}

fn pack_array(item: &ResolvedDtype, count: Option<usize>, value: &Value) -> Result<Bits> {
	let Value::Array(values) = value else { return Err(Error::bad_dtype("array dtype requires an array value")) };
	if let Some(c) = count {
		if values.len() != c {
			return Err(Error::out_of_range(format!("array dtype expects {} items, got {}", c, values.len())));
		}
	}
	let mut mb = MutableBits::zeros(0);
	for v in values {
		mb.append(&item.pack(v)?);
	}
	Ok(mb.to_bits())
}

fn unpack_array(item: &ResolvedDtype, count: Option<usize>, bits: &Bits) -> Result<Value> {
	let item_size = item.size().ok_or_else(|| Error::bad_dtype("array item dtype must have a fixed size"))?;
	let available = bits.bit_len();
	let n = match count {
		Some(c) => c,
		None => {
			if item_size == 0 || available % item_size != 0 {
				return Err(Error::ShortInput { needed: item_size, available });
			}
			available / item_size
		},
	};
	let needed = n * item_size;
	if needed > available {
		return Err(Error::ShortInput { needed, available });
	}
	let mut out = Vec::with_capacity(n);
	for i in 0 .. n {
		let chunk = bits.slice(i * item_size, (i + 1) * item_size)?;
		out.push(item.unpack(&chunk)?);
	}
	Ok(Value::Array(out))
}

fn pack_tuple(items: &[ResolvedDtype], value: &Value) -> Result<Bits> {
	let Value::Tuple(values) = value else { return Err(Error::bad_dtype("tuple dtype requires a tuple value")) };
	if values.len() != items.len() {
		return Err(Error::out_of_range(format!("tuple dtype expects {} items, got {}", items.len(), values.len())));
	}
	let mut mb = MutableBits::zeros(0);
	for (d, v) in items.iter().zip(values) {
		mb.append(&d.pack(v)?);
	}
	Ok(mb.to_bits())
}

fn unpack_tuple(items: &[ResolvedDtype], bits: &Bits) -> Result<Value> {
	let mut pos = 0usize;
	let mut out = Vec::with_capacity(items.len());
	for d in items {
		let size = d.size().ok_or_else(|| Error::bad_dtype("tuple element dtype must have a fixed size"))?;
		if pos + size > bits.bit_len() {
			return Err(Error::ShortInput { needed: size, available: bits.bit_len() - pos });
		}
		let chunk = bits.slice(pos, pos + size)?;
		out.push(d.unpack(&chunk)?);
		pos += size;
	}
	Ok(Value::Tuple(out))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dtype::Dtype;

	#[test]
	fn signed_round_trip_s2() {
		let d = Dtype::int(7);
		let bits = d.pack(&Value::Int(-31)).unwrap();
		assert_eq!(bits.to_bytes(), vec![0b1100_0010]);
		let v = d.unpack(&bits).unwrap();
		assert_eq!(v, Value::Int(-31));
		let as_uint = Dtype::uint(7).unpack(&bits).unwrap();
		assert_eq!(as_uint, Value::UInt(97));
	}

	#[test]
	fn float_endianness_s3() {
		let be = Dtype::float(32).unwrap();
		let le = be.clone().with_endian(Endian::Le);
		let be_bits = be.pack(&Value::Float(13.5)).unwrap();
		let le_bits = le.pack(&Value::Float(13.5)).unwrap();
		let mut reversed = be_bits.to_bytes();
		reversed.reverse();
		assert_eq!(le_bits.to_bytes(), reversed);
	}

	#[test]
	fn native_endian_round_trips_and_matches_build_target() {
		let d = Dtype::uint(16).with_endian(Endian::Native);
		let bits = d.pack(&Value::UInt(0x1234)).unwrap();
		assert_eq!(d.unpack(&bits).unwrap(), Value::UInt(0x1234));
		let expect_le = cfg!(target_endian = "little");
		assert_eq!(bits.to_bytes() == vec![0x34, 0x12], expect_le);
	}

	#[test]
	fn hex_round_trip() {
		let d = Dtype::hex(4);
		let bits = d.pack(&Value::Hex("beef".into())).unwrap();
		assert_eq!(bits.to_bytes(), vec![0xbe, 0xef]);
		assert_eq!(d.unpack(&bits).unwrap(), Value::Hex("beef".into()));
	}
}
