// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision requests, results and audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::actor::{ActorKind, AttributeMap};
use crate::types::{ActorId, PolicyId, TenantId};

/// A single authorization question.
///
/// The caller resolves the resource and pre-fetches its attributes; the engine
/// performs no existence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
	pub actor_id: ActorId,
	pub actor_kind: ActorKind,
	/// Required permission, e.g. `project:settings:write`.
	pub action: String,
	pub tenant_id: TenantId,
	pub resource_type: String,
	#[serde(default)]
	pub resource_id: Option<String>,
	#[serde(default)]
	pub resource_attributes: AttributeMap,
	/// Caller-supplied environment values, e.g. `{"time": {"hour": 14}}`.
	#[serde(default)]
	pub context: AttributeMap,
}

impl DecisionRequest {
	pub fn new(
		actor_id: ActorId,
		actor_kind: ActorKind,
		action: impl Into<String>,
		tenant_id: TenantId,
		resource_type: impl Into<String>,
	) -> Self {
		Self {
			actor_id,
			actor_kind,
			action: action.into(),
			tenant_id,
			resource_type: resource_type.into(),
			resource_id: None,
			resource_attributes: AttributeMap::new(),
			context: AttributeMap::new(),
		}
	}

	pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
		self.resource_id = Some(id.into());
		self
	}

	pub fn with_resource_attributes(mut self, attributes: AttributeMap) -> Self {
		self.resource_attributes = attributes;
		self
	}

	pub fn with_context(mut self, context: AttributeMap) -> Self {
		self.context = context;
		self
	}
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecisionReason {
	Elevated,
	Owner,
	Relationship(String),
	Role(String),
	PolicyAllow,
	PolicyDeny,
	NoMatchingGrant,
	InternalError,
	ActorInactive,
	TenantInactive,
	TenantMismatch,
}

impl DecisionReason {
	/// Whether a decision with this reason may be served from a cache.
	///
	/// Bypass paths and failures are always re-evaluated.
	pub fn is_cacheable(&self) -> bool {
		!matches!(
			self,
			DecisionReason::Elevated | DecisionReason::Owner | DecisionReason::InternalError
		)
	}
}

impl fmt::Display for DecisionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DecisionReason::Elevated => f.write_str("elevated"),
			DecisionReason::Owner => f.write_str("owner"),
			DecisionReason::Relationship(kind) => write!(f, "relationship:{kind}"),
			DecisionReason::Role(name) => write!(f, "role:{name}"),
			DecisionReason::PolicyAllow => f.write_str("policy-allow"),
			DecisionReason::PolicyDeny => f.write_str("policy-deny"),
			DecisionReason::NoMatchingGrant => f.write_str("no-matching-grant"),
			DecisionReason::InternalError => f.write_str("internal-error"),
			DecisionReason::ActorInactive => f.write_str("actor-inactive"),
			DecisionReason::TenantInactive => f.write_str("tenant-inactive"),
			DecisionReason::TenantMismatch => f.write_str("tenant-mismatch"),
		}
	}
}

impl Serialize for DecisionReason {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// The rules that contributed to a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchedRules {
	pub ownership: bool,
	pub relationship: Option<String>,
	/// Role chain walked to the matching role.
	pub roles: Vec<String>,
	/// Deny policy ids when denied by policy, allow policy ids otherwise.
	pub policies: Vec<PolicyId>,
}

/// Immutable result of one evaluation. For internal audit use only; untrusted
/// callers get [`Decision::public`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
	pub allowed: bool,
	pub reason: DecisionReason,
	pub matched: MatchedRules,
	/// Version of the snapshot the decision was evaluated against. Zero when
	/// no snapshot could be read.
	pub snapshot_version: u64,
}

impl Decision {
	pub fn allow(reason: DecisionReason, matched: MatchedRules, snapshot_version: u64) -> Self {
		Self {
			allowed: true,
			reason,
			matched,
			snapshot_version,
		}
	}

	pub fn deny(reason: DecisionReason, matched: MatchedRules, snapshot_version: u64) -> Self {
		Self {
			allowed: false,
			reason,
			matched,
			snapshot_version,
		}
	}

	/// Closed decision for any internal failure.
	pub fn internal_error(snapshot_version: u64) -> Self {
		Self::deny(DecisionReason::InternalError, MatchedRules::default(), snapshot_version)
	}

	/// Contributing rule identifiers in evaluation order.
	pub fn rule_ids(&self) -> Vec<String> {
		let mut ids = Vec::new();
		if self.matched.ownership {
			ids.push("owner".to_string());
		}
		if let Some(kind) = &self.matched.relationship {
			ids.push(format!("relationship:{kind}"));
		}
		ids.extend(self.matched.roles.iter().map(|r| format!("role:{r}")));
		ids.extend(self.matched.policies.iter().map(|p| format!("policy:{p}")));
		ids
	}

	pub fn public(&self) -> PublicDecision {
		PublicDecision {
			allowed: self.allowed,
		}
	}
}

/// The only part of a decision safe to return to an untrusted caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublicDecision {
	pub allowed: bool,
}

/// Audit record for one decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionEvent {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub snapshot_version: u64,
	pub actor_id: ActorId,
	pub actor_kind: ActorKind,
	pub tenant_id: TenantId,
	pub action: String,
	pub resource_type: String,
	pub resource_id: Option<String>,
	pub decision: Decision,
}

impl DecisionEvent {
	pub fn new(request: &DecisionRequest, decision: &Decision) -> Self {
		Self {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			snapshot_version: decision.snapshot_version,
			actor_id: request.actor_id,
			actor_kind: request.actor_kind,
			tenant_id: request.tenant_id,
			action: request.action.clone(),
			resource_type: request.resource_type.clone(),
			resource_id: request.resource_id.clone(),
			decision: decision.clone(),
		}
	}
}

/// Receives every decision the engine makes. Implementations must not block.
pub trait DecisionRecorder: Send + Sync {
	fn record(&self, event: DecisionEvent);
}
