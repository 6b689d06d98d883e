//! Slot parameter normalization.
//!
//! The dialogue platform sends each slot either as a scalar or as a list,
//! depending on how many values the user mentioned. Everything past the
//! webhook boundary works on [`SlotValues`], an ordered and possibly empty
//! sequence, so it never has to branch on shape.

use serde_json::Value;
use std::collections::HashMap;

/// Quantity assumed when none was given for an item.
pub const DEFAULT_QUANTITY: u32 = 1;

/// Ordered sequence of values for one slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotValues(Vec<Value>);

impl SlotValues {
	/// Normalizes a raw slot value. Arrays yield their non-empty elements,
	/// `null` and empty strings yield nothing, any other scalar yields itself.
	pub fn from_value(value: Option<&Value>) -> Self {
		match value {
			None => Self::default(),
			Some(Value::Array(items)) => {
				Self(items.iter().filter(|v| !is_blank(v)).cloned().collect())
			},
			Some(v) if is_blank(v) => Self::default(),
			Some(v) => Self(vec![v.clone()]),
		}
	}

	/// Looks up `name` in a parameter map and normalizes it.
	pub fn from_parameters(parameters: &HashMap<String, Value>, name: &str) -> Self {
		Self::from_value(parameters.get(name))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn first(&self) -> Option<&Value> {
		self.0.first()
	}

	pub fn get(&self, index: usize) -> Option<&Value> {
		self.0.get(index)
	}

	/// String elements, trimmed, blanks dropped.
	pub fn strings(&self) -> Vec<String> {
		self.0
			.iter()
			.filter_map(|v| v.as_str())
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect()
	}

	/// Quantity at `index`, matched positionally. Missing, non-positive or
	/// unparseable entries fall back to [`DEFAULT_QUANTITY`].
	pub fn quantity_at(&self, index: usize) -> u32 {
		self.get(index)
			.and_then(coerce_integer)
			.filter(|q| *q > 0)
			.and_then(|q| u32::try_from(q).ok())
			.unwrap_or(DEFAULT_QUANTITY)
	}
}

/// Coerces a slot value to an integer.
///
/// Accepts JSON integers, integral floats (the platform sends `2.0` for
/// "two") and numeric strings.
pub fn coerce_integer(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64().or_else(|| {
			n.as_f64()
				.filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
				.map(|f| f as i64)
		}),
		Value::String(s) => {
			let s = s.trim();
			s.parse::<i64>()
				.ok()
				.or_else(|| coerce_integer(&serde_json::from_str::<Value>(s).ok()?))
		},
		_ => None,
	}
}

fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.trim().is_empty(),
		_ => false,
	}
}
