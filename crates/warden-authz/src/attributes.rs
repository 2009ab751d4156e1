// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute constraints for ABAC policies.
//!
//! A constraint map is parsed once, at snapshot build time, from a JSON object:
//!
//! | constraint value            | meaning                                    |
//! |-----------------------------|--------------------------------------------|
//! | scalar (`"eng"`, `3`, ...)  | actual value must equal it                 |
//! | list (`["eng", "ops"]`)     | actual value must be a member              |
//! | operator map (`{">=": 9}`)  | every operator must hold                   |
//!
//! Keys are dotted paths into nested maps (`time.hour`). A path that does not
//! resolve leaves the constraint unsatisfied; it is never an error. Unknown
//! operators are rejected by [`Constraints::parse`].

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::actor::AttributeMap;
use crate::error::{ConfigResult, ConfigurationError};

/// Comparison operators accepted inside an operator map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Equals,
	NotEquals,
	GreaterThan,
	GreaterThanOrEquals,
	LessThan,
	LessThanOrEquals,
	In,
	NotIn,
}

impl Operator {
	pub fn parse(token: &str) -> Option<Self> {
		match token {
			"==" => Some(Operator::Equals),
			"!=" => Some(Operator::NotEquals),
			">" => Some(Operator::GreaterThan),
			">=" => Some(Operator::GreaterThanOrEquals),
			"<" => Some(Operator::LessThan),
			"<=" => Some(Operator::LessThanOrEquals),
			"in" => Some(Operator::In),
			"not_in" => Some(Operator::NotIn),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Operator::Equals => "==",
			Operator::NotEquals => "!=",
			Operator::GreaterThan => ">",
			Operator::GreaterThanOrEquals => ">=",
			Operator::LessThan => "<",
			Operator::LessThanOrEquals => "<=",
			Operator::In => "in",
			Operator::NotIn => "not_in",
		}
	}

	/// Evaluates this operator with `actual` on the left-hand side.
	pub fn evaluate(&self, actual: &Value, expected: &Value) -> bool {
		match self {
			Operator::Equals => values_equal(actual, expected),
			Operator::NotEquals => !values_equal(actual, expected),
			Operator::GreaterThan => compare(actual, expected).is_some_and(Ordering::is_gt),
			Operator::GreaterThanOrEquals => compare(actual, expected).is_some_and(Ordering::is_ge),
			Operator::LessThan => compare(actual, expected).is_some_and(Ordering::is_lt),
			Operator::LessThanOrEquals => compare(actual, expected).is_some_and(Ordering::is_le),
			Operator::In => contains(expected, actual),
			Operator::NotIn => expected.is_array() && !contains(expected, actual),
		}
	}

	fn validate_operand(&self, path: &str, operand: &Value) -> ConfigResult<()> {
		let invalid = |message: &str| ConfigurationError::InvalidOperand {
			path: path.to_string(),
			operator: self.as_str().to_string(),
			message: message.to_string(),
		};

		match self {
			Operator::In | Operator::NotIn if !operand.is_array() => Err(invalid("expected a list")),
			Operator::GreaterThan
			| Operator::GreaterThanOrEquals
			| Operator::LessThan
			| Operator::LessThanOrEquals
				if !(operand.is_number() || operand.is_string()) =>
			{
				Err(invalid("expected a number or string"))
			}
			_ => Ok(()),
		}
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single parsed constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
	Equals(Value),
	OneOf(Vec<Value>),
	Operators(Vec<(Operator, Value)>),
}

impl Constraint {
	fn parse(path: &str, raw: &Value) -> ConfigResult<Self> {
		match raw {
			Value::Array(items) => Ok(Constraint::OneOf(items.clone())),
			Value::Object(ops) => {
				let mut parsed = Vec::with_capacity(ops.len());
				for (token, operand) in ops {
					let op = Operator::parse(token).ok_or_else(|| ConfigurationError::UnknownOperator {
						path: path.to_string(),
						operator: token.clone(),
					})?;
					op.validate_operand(path, operand)?;
					parsed.push((op, operand.clone()));
				}
				Ok(Constraint::Operators(parsed))
			}
			scalar => Ok(Constraint::Equals(scalar.clone())),
		}
	}

	pub fn is_satisfied_by(&self, actual: &Value) -> bool {
		match self {
			Constraint::Equals(expected) => values_equal(actual, expected),
			Constraint::OneOf(options) => options.iter().any(|o| values_equal(actual, o)),
			Constraint::Operators(ops) => ops.iter().all(|(op, operand)| op.evaluate(actual, operand)),
		}
	}
}

/// A parsed constraint map. Empty means "matches anything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
	entries: Vec<(String, Constraint)>,
}

impl Constraints {
	/// Parses a constraint map. `null` is treated as an empty map.
	pub fn parse(raw: &Value) -> ConfigResult<Self> {
		match raw {
			Value::Null => Ok(Self::default()),
			Value::Object(map) => {
				let entries = map
					.iter()
					.map(|(path, value)| Constraint::parse(path, value).map(|c| (path.clone(), c)))
					.collect::<ConfigResult<Vec<_>>>()?;
				Ok(Self { entries })
			}
			_ => Err(ConfigurationError::InvalidOperand {
				path: String::new(),
				operator: String::new(),
				message: "constraint set must be a map".to_string(),
			}),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if every constraint holds against `actual`.
	pub fn satisfied_by(&self, actual: &AttributeMap) -> bool {
		self.entries.iter().all(|(path, constraint)| {
			lookup_path(actual, path).is_some_and(|value| constraint.is_satisfied_by(value))
		})
	}
}

/// Convenience form of [`Constraints::satisfied_by`].
pub fn satisfies(actual: &AttributeMap, constraints: &Constraints) -> bool {
	constraints.satisfied_by(actual)
}

/// Resolves a dotted path (`a.b.c`) into nested maps.
pub fn lookup_path<'a>(attrs: &'a AttributeMap, path: &str) -> Option<&'a Value> {
	let mut segments = path.split('.');
	let first = segments.next()?;
	segments.try_fold(attrs.get(first)?, |current, segment| current.as_object()?.get(segment))
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
			(Some(x), Some(y)) => x == y,
			_ => x == y,
		},
		_ => a == b,
	}
}

fn contains(list: &Value, needle: &Value) -> bool {
	list
		.as_array()
		.is_some_and(|items| items.iter().any(|item| values_equal(item, needle)))
}

/// Numbers compare numerically and strings lexicographically; any other
/// pairing is incomparable.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
	match (actual, expected) {
		(Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		_ => None,
	}
}
