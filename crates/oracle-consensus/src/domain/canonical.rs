//! Canonical JSON serialization and SHA-256 digests.
//!
//! The canonical form is the wire contract external verifiers recompute:
//! - object keys sorted by the UTF-8 bytes of the key
//! - no insignificant whitespace
//! - integers as plain decimal, floats per the ECMAScript Number-to-String
//!   rules over the shortest round-trip digits (`1.0 -> 1`, `1e21 -> 1e+21`)
//! - strings with the minimal JSON escape set, non-ASCII emitted raw
//! - non-finite floats rejected, never coerced to `null`

use std::fmt;

use serde::ser::{self, Serialize};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::domain::error::{OracleError, Result};

/// Serialize `value` to canonical JSON text.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

/// Convert any serializable value into a `serde_json::Value`, failing on
/// non-finite floats and on shapes JSON cannot express (non-string map keys).
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value
        .serialize(FiniteGuard)
        .map_err(|e| OracleError::NonCanonical(e.0))?;
    serde_json::to_value(value).map_err(|e| OracleError::NonCanonical(e.to_string()))
}

/// Canonical JSON text of any serializable value.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    canonical_json(&to_canonical_value(value)?)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 hex digest of the canonical form of `value`.
pub fn compute_digest(value: &Value) -> Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Canonical bytes and their SHA-256 hex digest.
pub fn hashable<T: Serialize + ?Sized>(value: &T) -> Result<(Vec<u8>, String)> {
    let bytes = to_canonical_json(value)?.into_bytes();
    let digest = sha256_hex(&bytes);
    Ok((bytes, digest))
}

/// Records with a canonical form and a content hash.
///
/// Implementors that embed their own hash override [`Hashable::canonical_value`]
/// to leave that field out.
pub trait Hashable: Serialize {
    fn canonical_value(&self) -> Result<Value> {
        to_canonical_value(self)
    }

    fn canonical_json(&self) -> Result<String> {
        canonical_json(&self.canonical_value()?)
    }

    fn content_hash(&self) -> Result<String> {
        Ok(sha256_hex(self.canonical_json()?.as_bytes()))
    }

    /// Canonical text together with its hash.
    fn hash_data(&self) -> Result<(String, String)> {
        let canonical = self.canonical_json()?;
        let digest = sha256_hex(canonical.as_bytes());
        Ok((canonical, digest))
    }
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(item, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut String) -> Result<()> {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        out.push_str(&format_float(f)?);
    } else {
        return Err(OracleError::NonCanonical(format!("unrepresentable number {n}")));
    }
    Ok(())
}

/// Render a float the way ECMAScript `Number.prototype.toString` does.
fn format_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(OracleError::NonCanonical(format!(
            "non-finite number {value} not permitted"
        )));
    }
    if value == 0.0 {
        return Ok("0".to_string());
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e-7".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .ok_or_else(|| OracleError::NonCanonical(format!("unexpected float form {scientific}")))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|_| OracleError::NonCanonical(format!("unexpected float form {scientific}")))?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let k = digits.len() as i32;
    let n = exponent + 1;
    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.push_str(&"0".repeat((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-n) as usize));
        out.push_str(&digits);
    } else {
        let (lead, rest) = digits.split_at(1);
        out.push_str(lead);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let e = n - 1;
        out.push('e');
        out.push(if e >= 0 { '+' } else { '-' });
        out.push_str(&e.abs().to_string());
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Finite-float guard
// ---------------------------------------------------------------------------

// serde_json silently maps NaN/Infinity to `null`; this pass walks the value
// first so a non-finite float fails the call instead.

#[derive(Debug)]
struct GuardError(String);

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GuardError {}

impl ser::Error for GuardError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        GuardError(msg.to_string())
    }
}

#[derive(Clone, Copy)]
struct FiniteGuard;

type GuardResult = std::result::Result<(), GuardError>;

fn check_finite(value: f64) -> GuardResult {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GuardError(format!("non-finite number {value} not permitted")))
    }
}

impl ser::Serializer for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> GuardResult {
        Ok(())
    }
    fn serialize_i8(self, _v: i8) -> GuardResult {
        Ok(())
    }
    fn serialize_i16(self, _v: i16) -> GuardResult {
        Ok(())
    }
    fn serialize_i32(self, _v: i32) -> GuardResult {
        Ok(())
    }
    fn serialize_i64(self, _v: i64) -> GuardResult {
        Ok(())
    }
    fn serialize_i128(self, _v: i128) -> GuardResult {
        Ok(())
    }
    fn serialize_u8(self, _v: u8) -> GuardResult {
        Ok(())
    }
    fn serialize_u16(self, _v: u16) -> GuardResult {
        Ok(())
    }
    fn serialize_u32(self, _v: u32) -> GuardResult {
        Ok(())
    }
    fn serialize_u64(self, _v: u64) -> GuardResult {
        Ok(())
    }
    fn serialize_u128(self, _v: u128) -> GuardResult {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> GuardResult {
        check_finite(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> GuardResult {
        check_finite(v)
    }
    fn serialize_char(self, _v: char) -> GuardResult {
        Ok(())
    }
    fn serialize_str(self, _v: &str) -> GuardResult {
        Ok(())
    }
    fn serialize_bytes(self, _v: &[u8]) -> GuardResult {
        Ok(())
    }
    fn serialize_none(self) -> GuardResult {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> GuardResult {
        value.serialize(self)
    }
    fn serialize_unit(self) -> GuardResult {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> GuardResult {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> GuardResult {
        Ok(())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> GuardResult {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> GuardResult {
        value.serialize(self)
    }
    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, GuardError> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> GuardResult {
        key.serialize(*self)
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteGuard {
    type Ok = ();
    type Error = GuardError;
    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> GuardResult {
        value.serialize(*self)
    }
    fn end(self) -> GuardResult {
        Ok(())
    }
}
