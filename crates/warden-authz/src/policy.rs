// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute-based policies (ABAC).
//!
//! Policies are authored as [`PolicyDefinition`]s with free-form JSON
//! constraint maps and compiled into [`Policy`] values when a snapshot is
//! built. Compilation is where unknown operators and malformed policies are
//! rejected; evaluation itself cannot fail.
//!
//! Conditions are evaluated against a namespaced context:
//!
//! | key        | contents                                               |
//! |------------|--------------------------------------------------------|
//! | `actor`    | subject attributes, including `actor_kind`/`actor_id`  |
//! | `resource` | caller-supplied resource attributes                    |
//! | `env`      | caller-supplied context (e.g. `time.hour`)             |
//! | `request`  | `action`, `tenant_id`, `resource_type`, `resource_id`  |

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::actor::AttributeMap;
use crate::attributes::Constraints;
use crate::error::{ConfigResult, ConfigurationError};
use crate::permission;
use crate::types::{default_true, PolicyId, TenantId};

/// Action entry that matches every action.
pub const ANY_ACTION: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
	Allow,
	Deny,
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Effect::Allow => f.write_str("allow"),
			Effect::Deny => f.write_str("deny"),
		}
	}
}

/// A resource-type constraint: one type or a list of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceTypes {
	One(String),
	Many(Vec<String>),
}

/// A policy as authored, before its constraints are parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDefinition {
	pub id: PolicyId,
	pub tenant_id: TenantId,
	#[serde(default)]
	pub name: String,
	pub effect: Effect,
	#[serde(default)]
	pub priority: i32,
	#[serde(default = "default_true")]
	pub is_active: bool,
	pub actions: Vec<String>,
	#[serde(default)]
	pub resource_types: Option<ResourceTypes>,
	#[serde(default)]
	pub subject: Value,
	#[serde(default)]
	pub resource: Value,
	#[serde(default)]
	pub conditions: Value,
}

impl PolicyDefinition {
	pub fn new(tenant_id: TenantId, effect: Effect, actions: &[&str]) -> Self {
		Self {
			id: PolicyId::generate(),
			tenant_id,
			name: String::new(),
			effect,
			priority: 0,
			is_active: true,
			actions: actions.iter().map(|a| a.to_string()).collect(),
			resource_types: None,
			subject: Value::Null,
			resource: Value::Null,
			conditions: Value::Null,
		}
	}

	pub fn with_priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}

	pub fn with_subject(mut self, subject: Value) -> Self {
		self.subject = subject;
		self
	}

	pub fn with_resource(mut self, resource: Value) -> Self {
		self.resource = resource;
		self
	}

	pub fn with_conditions(mut self, conditions: Value) -> Self {
		self.conditions = conditions;
		self
	}

	pub fn with_resource_types(mut self, types: &[&str]) -> Self {
		self.resource_types = Some(ResourceTypes::Many(
			types.iter().map(|t| t.to_string()).collect(),
		));
		self
	}

	pub fn inactive(mut self) -> Self {
		self.is_active = false;
		self
	}

	/// Parses every constraint map and checks the policy is well-formed.
	pub fn compile(&self) -> ConfigResult<Policy> {
		let malformed = |message: &str| ConfigurationError::MalformedPolicy {
			policy: self.id,
			message: message.to_string(),
		};

		if self.actions.is_empty() {
			return Err(malformed("action list is empty"));
		}
		if self.actions.iter().any(|a| a.trim().is_empty()) {
			return Err(malformed("action list contains an empty entry"));
		}

		let resource_types = match &self.resource_types {
			None => Vec::new(),
			Some(ResourceTypes::One(t)) => vec![t.clone()],
			Some(ResourceTypes::Many(ts)) if ts.is_empty() => {
				return Err(malformed("resource type list is empty"));
			}
			Some(ResourceTypes::Many(ts)) => ts.clone(),
		};
		if resource_types.iter().any(|t| t.trim().is_empty()) {
			return Err(malformed("resource type is empty"));
		}

		Ok(Policy {
			id: self.id,
			tenant_id: self.tenant_id,
			name: self.name.clone(),
			effect: self.effect,
			priority: self.priority,
			is_active: self.is_active,
			actions: self.actions.clone(),
			resource_types,
			subject: Constraints::parse(&self.subject)?,
			resource: Constraints::parse(&self.resource)?,
			conditions: Constraints::parse(&self.conditions)?,
		})
	}
}

/// A compiled policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
	pub id: PolicyId,
	pub tenant_id: TenantId,
	pub name: String,
	pub effect: Effect,
	pub priority: i32,
	pub is_active: bool,
	pub actions: Vec<String>,
	/// Empty means any resource type.
	pub resource_types: Vec<String>,
	pub subject: Constraints,
	pub resource: Constraints,
	pub conditions: Constraints,
}

impl Policy {
	pub fn covers_action(&self, action: &str) -> bool {
		self.actions.iter().any(|a| a == ANY_ACTION) || permission::matches(&self.actions, action)
	}

	pub fn covers_resource_type(&self, resource_type: &str) -> bool {
		self.resource_types.is_empty() || self.resource_types.iter().any(|t| t == resource_type)
	}

	fn applies(&self, input: &PolicyInput<'_>) -> bool {
		self.is_active
			&& self.covers_action(input.action)
			&& self.covers_resource_type(input.resource_type)
			&& self.subject.satisfied_by(input.subject)
			&& self.resource.satisfied_by(input.resource)
			&& (self.conditions.is_empty() || self.conditions.satisfied_by(input.context))
	}
}

/// Orders policies by descending priority, then id, so evaluation and the
/// reported match order are stable.
pub fn sort_by_priority(policies: &mut [Policy]) {
	policies.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
}

/// Everything a policy may be checked against.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
	pub action: &'a str,
	pub resource_type: &'a str,
	pub subject: &'a AttributeMap,
	pub resource: &'a AttributeMap,
	pub context: &'a AttributeMap,
}

/// Builds the namespaced condition context.
pub fn condition_context(
	subject: &AttributeMap,
	resource: &AttributeMap,
	env: &AttributeMap,
	action: &str,
	tenant_id: TenantId,
	resource_type: &str,
	resource_id: Option<&str>,
) -> AttributeMap {
	let mut context = AttributeMap::new();
	context.insert("actor".to_string(), Value::Object(subject.clone()));
	context.insert("resource".to_string(), Value::Object(resource.clone()));
	context.insert("env".to_string(), Value::Object(env.clone()));
	context.insert(
		"request".to_string(),
		json!({
			"action": action,
			"tenant_id": tenant_id.to_string(),
			"resource_type": resource_type,
			"resource_id": resource_id,
		}),
	);
	context
}

/// Ids of every matching policy, split by effect, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyMatches {
	pub allow: Vec<PolicyId>,
	pub deny: Vec<PolicyId>,
}

/// Runs every policy against `input`. Never short-circuits.
///
/// `policies` must already be ordered with [`sort_by_priority`].
pub fn evaluate(policies: &[Policy], input: &PolicyInput<'_>) -> PolicyMatches {
	policies
		.iter()
		.filter(|p| p.applies(input))
		.fold(PolicyMatches::default(), |mut matches, p| {
			match p.effect {
				Effect::Allow => matches.allow.push(p.id),
				Effect::Deny => matches.deny.push(p.id),
			}
			matches
		})
}
