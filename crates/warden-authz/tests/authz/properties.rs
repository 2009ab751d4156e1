// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use proptest::prelude::*;
use serde_json::json;

use warden_authz::{
	evaluate, Actor, ActorId, ActorKind, Constraints, DecisionReason, DecisionRequest, Effect,
	EngineOptions, PolicyDefinition, Role, Snapshot, SnapshotBuilder, Tenant, TenantId,
};

use super::support::attrs;

struct Scenario {
	snapshot: Snapshot,
	request: DecisionRequest,
}

/// A human with a role, an allow-everything policy, optional ownership and
/// optionally a deny-everything policy.
fn scenario(
	permissions: &[String],
	action: &str,
	owner: bool,
	elevated: bool,
	deny: bool,
) -> Scenario {
	let tenant = TenantId::generate();
	let actor = ActorId::generate();
	let perms: Vec<&str> = permissions.iter().map(String::as_str).collect();
	let role = Role::new(tenant, "granted", &perms);
	let role_id = role.id;

	let mut builder = SnapshotBuilder::new()
		.tenant(Tenant::new(tenant, "acme"))
		.actor(Actor::human(actor).with_elevated(elevated))
		.role(role)
		.membership(actor, tenant, role_id)
		.policy(PolicyDefinition::new(tenant, Effect::Allow, &["*"]).with_priority(1000));
	if deny {
		builder = builder.policy(
			PolicyDefinition::new(tenant, Effect::Deny, &["*"])
				.with_priority(-1000)
				.with_subject(json!({"actor_kind": "human"})),
		);
	}

	let mut request = DecisionRequest::new(actor, ActorKind::Human, action, tenant, "ticket")
		.with_resource_id("T-1");
	if owner {
		request = request.with_resource_attributes(attrs(json!({"owner_id": actor.to_string()})));
	}

	Scenario {
		snapshot: builder.build().unwrap(),
		request,
	}
}

proptest! {
	#[test]
	fn deny_supremacy_except_elevated(
		permissions in prop::collection::vec("[a-z]{1,5}:(\\*|[a-z]{1,5})", 0..4),
		action in "[a-z]{1,5}:[a-z]{1,5}",
		owner in any::<bool>(),
		elevated in any::<bool>(),
	) {
		let s = scenario(&permissions, &action, owner, elevated, true);
		let decision = evaluate(&s.snapshot, &s.request, &EngineOptions::default()).unwrap();

		prop_assert_eq!(decision.allowed, elevated);
		let expected = if elevated { DecisionReason::Elevated } else { DecisionReason::PolicyDeny };
		prop_assert_eq!(decision.reason, expected);
	}

	#[test]
	fn allow_policy_grants_without_deny(
		permissions in prop::collection::vec("[a-z]{1,5}:(\\*|[a-z]{1,5})", 0..4),
		action in "[a-z]{1,5}:[a-z]{1,5}",
		owner in any::<bool>(),
	) {
		let s = scenario(&permissions, &action, owner, false, false);
		let decision = evaluate(&s.snapshot, &s.request, &EngineOptions::default()).unwrap();
		prop_assert!(decision.allowed);
		if owner {
			prop_assert_eq!(decision.reason, DecisionReason::Owner);
		}
	}

	#[test]
	fn evaluation_is_deterministic(
		permissions in prop::collection::vec("[a-z]{1,5}:(\\*|[a-z]{1,5})", 0..4),
		action in "[a-z]{1,5}:[a-z]{1,5}",
		owner in any::<bool>(),
		elevated in any::<bool>(),
		deny in any::<bool>(),
	) {
		let s = scenario(&permissions, &action, owner, elevated, deny);
		let options = EngineOptions::default();
		let first = evaluate(&s.snapshot, &s.request, &options).unwrap();
		let second = evaluate(&s.snapshot, &s.request, &options).unwrap();
		prop_assert_eq!(first, second);
	}
}

#[test]
fn in_operator_on_department() {
	let constraints = Constraints::parse(&json!({"department": {"in": ["eng", "ops"]}})).unwrap();
	assert!(constraints.satisfied_by(&attrs(json!({"department": "eng"}))));
	assert!(!constraints.satisfied_by(&attrs(json!({"department": "sales"}))));
	assert!(!constraints.satisfied_by(&attrs(json!({}))));
}
