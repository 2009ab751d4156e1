// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The decision engine.
//!
//! [`evaluate`] is the pure authorization algorithm over one snapshot.
//! [`DecisionEngine`] wraps it with snapshot access, an optional cache and an
//! optional audit recorder, and converts every internal failure into a closed
//! `internal-error` decision.
//!
//! # Evaluation order
//!
//! Guards run first and end evaluation immediately:
//!
//! 1. tenant and actor must be present in the snapshot and the actor kind
//!    must match the request (otherwise an [`EvaluationError`])
//! 2. inactive actor → deny `actor-inactive`
//! 3. resource `tenant_id` attribute naming another tenant → deny
//!    `tenant-mismatch`
//! 4. elevated actor → allow `elevated` (the only path that beats deny)
//! 5. inactive tenant → deny `tenant-inactive`
//!
//! Then every grant source is consulted and recorded as an allow candidate:
//! ownership, relationship, tenant role, allow policies. Deny policies are
//! checked exactly once, after all candidates are known, and override all of
//! them. The reason for an allow is the first candidate in that order.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::actor::Actor;
use crate::cache::{CacheKey, DecisionCache};
use crate::decision::{
	Decision, DecisionEvent, DecisionReason, DecisionRecorder, DecisionRequest, MatchedRules,
};
use crate::error::EvaluationError;
use crate::policy::{self, PolicyInput};
use crate::relationship::{self, Relation, ResourceView};
use crate::role;
use crate::snapshot::{Snapshot, SnapshotAccessor};
use crate::types::{ActorId, TenantId};

/// Resource attribute checked against the request tenant.
pub const TENANT_ATTRIBUTE: &str = "tenant_id";

/// Resource attribute naming the owning actor, unless overridden.
pub const DEFAULT_OWNER_ATTRIBUTE: &str = "owner_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
	pub owner_attribute: String,
}

impl Default for EngineOptions {
	fn default() -> Self {
		Self {
			owner_attribute: DEFAULT_OWNER_ATTRIBUTE.to_string(),
		}
	}
}

/// Evaluates `request` against `snapshot`.
///
/// Pure and deterministic: the same snapshot and request always yield the
/// same decision. An `Err` means the request could not be evaluated at all;
/// callers must treat it as a denial.
#[instrument(
	level = "debug",
	skip(snapshot, request, options),
	fields(
		actor_id = %request.actor_id,
		action = %request.action,
		tenant_id = %request.tenant_id,
		resource_type = %request.resource_type,
		snapshot_version = snapshot.version(),
	)
)]
pub fn evaluate(
	snapshot: &Snapshot,
	request: &DecisionRequest,
	options: &EngineOptions,
) -> Result<Decision, EvaluationError> {
	let version = snapshot.version();

	let tenant = snapshot
		.tenant(request.tenant_id)
		.ok_or(EvaluationError::UnknownTenant {
			tenant: request.tenant_id,
			version,
		})?;
	let actor = snapshot
		.actor(request.actor_id)
		.ok_or(EvaluationError::UnknownActor(request.actor_id))?;
	if actor.kind() != request.actor_kind {
		return Err(EvaluationError::ActorKindMismatch {
			actor: request.actor_id,
			registered: actor.kind(),
			claimed: request.actor_kind,
		});
	}

	if !actor.is_active() {
		return Ok(deny(DecisionReason::ActorInactive, version));
	}
	if !resource_in_tenant(request) {
		debug!("resource tenant does not match request tenant");
		return Ok(deny(DecisionReason::TenantMismatch, version));
	}
	if actor.elevated() {
		return Ok(Decision::allow(
			DecisionReason::Elevated,
			MatchedRules::default(),
			version,
		));
	}
	if !tenant.tenant().is_active {
		return Ok(deny(DecisionReason::TenantInactive, version));
	}

	let mut matched = MatchedRules::default();
	let mut first: Option<DecisionReason> = None;

	let view = ResourceView {
		resource_type: &request.resource_type,
		resource_id: request.resource_id.as_deref(),
		attributes: &request.resource_attributes,
	};
	let relations = relationship::relations_of(
		actor,
		view,
		&options.owner_attribute,
		tenant.relationships(),
		snapshot.relations(),
	);
	for relation in relations {
		match relation {
			Relation::Owner => {
				matched.ownership = true;
				first.get_or_insert(DecisionReason::Owner);
				break;
			}
			Relation::Delegated(kind) if snapshot.relations().grants(&kind, &request.action) => {
				first.get_or_insert_with(|| DecisionReason::Relationship(kind.clone()));
				matched.relationship = Some(kind);
				break;
			}
			Relation::Delegated(kind) => {
				debug!(relation = %kind, "relation does not cover action");
			}
		}
	}

	match tenant.membership_role(actor.id()) {
		Some(start) => {
			if let Some(grant) = role::resolve_grant(tenant.roles(), start, &request.action) {
				first.get_or_insert(DecisionReason::Role(grant.role_name));
				matched.roles = grant.chain;
			} else {
				debug!(role = %start.name, "role chain does not cover action");
			}
		}
		None => debug!("actor has no membership in tenant"),
	}

	let subject = actor.subject_attributes();
	let context = policy::condition_context(
		&subject,
		&request.resource_attributes,
		&request.context,
		&request.action,
		request.tenant_id,
		&request.resource_type,
		request.resource_id.as_deref(),
	);
	let policies = policy::evaluate(
		tenant.policies(),
		&PolicyInput {
			action: &request.action,
			resource_type: &request.resource_type,
			subject: &subject,
			resource: &request.resource_attributes,
			context: &context,
		},
	);

	if !policies.deny.is_empty() {
		debug!(deny = policies.deny.len(), "deny policy matched");
		matched.policies = policies.deny;
		return Ok(Decision::deny(DecisionReason::PolicyDeny, matched, version));
	}
	if !policies.allow.is_empty() {
		first.get_or_insert(DecisionReason::PolicyAllow);
	}
	matched.policies = policies.allow;

	match first {
		Some(reason) => Ok(Decision::allow(reason, matched, version)),
		None => {
			debug!("no matching grant");
			Ok(Decision::deny(DecisionReason::NoMatchingGrant, matched, version))
		}
	}
}

fn deny(reason: DecisionReason, version: u64) -> Decision {
	Decision::deny(reason, MatchedRules::default(), version)
}

/// A resource that declares a tenant must declare the request's tenant.
fn resource_in_tenant(request: &DecisionRequest) -> bool {
	match request.resource_attributes.get(TENANT_ATTRIBUTE) {
		None => true,
		Some(value) => value
			.as_str()
			.and_then(|s| s.parse::<Uuid>().ok())
			.is_some_and(|id| id == request.tenant_id.into_inner()),
	}
}

/// Thread-safe entry point for authorization decisions.
pub struct DecisionEngine {
	snapshots: Arc<dyn SnapshotAccessor>,
	options: EngineOptions,
	cache: Option<DecisionCache>,
	recorder: Option<Arc<dyn DecisionRecorder>>,
}

impl DecisionEngine {
	pub fn new(snapshots: Arc<dyn SnapshotAccessor>) -> Self {
		Self {
			snapshots,
			options: EngineOptions::default(),
			cache: None,
			recorder: None,
		}
	}

	pub fn with_options(mut self, options: EngineOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_cache(mut self, cache: DecisionCache) -> Self {
		self.cache = Some(cache);
		self
	}

	pub fn with_recorder(mut self, recorder: Arc<dyn DecisionRecorder>) -> Self {
		self.recorder = Some(recorder);
		self
	}

	pub fn options(&self) -> &EngineOptions {
		&self.options
	}

	/// Decides `request`. Never fails: internal errors become a closed
	/// `internal-error` decision.
	pub fn decide(&self, request: &DecisionRequest) -> Decision {
		let decision = self.decide_inner(request);
		if let Some(recorder) = &self.recorder {
			recorder.record(DecisionEvent::new(request, &decision));
		}
		decision
	}

	/// Effective permissions of `actor` in `tenant` in the current snapshot.
	pub fn effective_permissions(
		&self,
		tenant: TenantId,
		actor: ActorId,
	) -> Result<Vec<String>, EvaluationError> {
		Ok(self.snapshots.snapshot()?.effective_permissions(tenant, actor))
	}

	pub fn is_member(&self, tenant: TenantId, actor: ActorId) -> Result<bool, EvaluationError> {
		Ok(self.snapshots.snapshot()?.is_member(tenant, actor))
	}

	pub fn memberships_of(&self, actor: ActorId) -> Result<Vec<TenantId>, EvaluationError> {
		Ok(self.snapshots.snapshot()?.memberships_of(actor))
	}

	fn decide_inner(&self, request: &DecisionRequest) -> Decision {
		let snapshot = match self.snapshots.snapshot() {
			Ok(snapshot) => snapshot,
			Err(err) => {
				warn!(error = %err, "snapshot unavailable, failing closed");
				return Decision::internal_error(0);
			}
		};

		let key = self.cache.as_ref().map(|_| {
			CacheKey::new(
				snapshot.version(),
				request,
				snapshot.actor(request.actor_id).map(Actor::attributes),
			)
		});
		if let (Some(cache), Some(key)) = (&self.cache, &key) {
			if let Some(hit) = cache.get(key) {
				debug!(key = key.as_str(), "decision cache hit");
				return hit;
			}
		}

		let decision = match evaluate(&snapshot, request, &self.options) {
			Ok(decision) => decision,
			Err(err) => {
				warn!(
					error = %err,
					actor_id = %request.actor_id,
					tenant_id = %request.tenant_id,
					"evaluation failed, failing closed"
				);
				Decision::internal_error(snapshot.version())
			}
		};

		if let (Some(cache), Some(key)) = (&self.cache, key) {
			cache.insert(key, &decision);
		}
		decision
	}
}
