// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::json;

use warden_authz::{ActorId, ActorKind, DecisionReason, DecisionRequest, TenantId};

use super::support::{run_authz_cases, AuthzCase, TestEngine};

#[test]
fn test_decision_table() {
	let app = TestEngine::new();
	let f = &app.fixtures;
	let t = f.tenant;

	let cases = vec![
		// RBAC
		AuthzCase {
			name: "role_inheritance_grants_parent_permission",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "role:B",
		},
		AuthzCase {
			name: "own_role_permission",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:comment",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "role:B",
		},
		AuthzCase {
			name: "exact_grant_does_not_widen",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:delete",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		AuthzCase {
			name: "no_membership_no_grant",
			actor: f.bob,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		AuthzCase {
			name: "system_admin_nested_wildcard",
			actor: f.carol,
			kind: ActorKind::Human,
			tenant: t,
			action: "org:members:write",
			resource: ("org", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "role:admin",
		},
		AuthzCase {
			name: "system_admin_lacks_org_delete",
			actor: f.carol,
			kind: ActorKind::Human,
			tenant: t,
			action: "org:delete",
			resource: ("org", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		AuthzCase {
			name: "wildcard_covers_nested_permission",
			actor: f.carol,
			kind: ActorKind::Human,
			tenant: t,
			action: "project:settings:write",
			resource: ("project", Some("P-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "role:admin",
		},
		AuthzCase {
			name: "membership_does_not_cross_tenants",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: f.other_tenant,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		// Elevated bypass
		AuthzCase {
			name: "elevated_bypass_overrides_deny",
			actor: f.root,
			kind: ActorKind::Human,
			tenant: t,
			action: "org:delete",
			resource: ("org", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "elevated",
		},
		AuthzCase {
			name: "elevated_in_inactive_tenant",
			actor: f.root,
			kind: ActorKind::Human,
			tenant: f.dormant_tenant,
			action: "org:read",
			resource: ("org", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "elevated",
		},
		// Ownership
		AuthzCase {
			name: "owner_attribute_grants_everything",
			actor: f.frank,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:delete",
			resource: ("ticket", Some("T-3")),
			resource_attributes: json!({"owner_id": f.frank.to_string()}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "owner",
		},
		AuthzCase {
			name: "owner_edge_grants_everything",
			actor: f.frank,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:delete",
			resource: ("ticket", Some("T-7")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "owner",
		},
		AuthzCase {
			name: "deny_overrides_ownership",
			actor: f.erin,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-4")),
			resource_attributes: json!({"owner_id": f.erin.to_string()}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "policy-deny",
		},
		AuthzCase {
			name: "automated_actor_is_never_owner",
			actor: f.agent,
			kind: ActorKind::Automated,
			tenant: t,
			action: "ticket:delete",
			resource: ("ticket", Some("T-5")),
			resource_attributes: json!({"owner_id": f.agent.to_string()}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		// Automated actors
		AuthzCase {
			name: "automated_role_grant",
			actor: f.agent,
			kind: ActorKind::Automated,
			tenant: t,
			action: "task:write",
			resource: ("task", Some("K-1")),
			resource_attributes: json!({"locked": false}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "role:agent_executor",
		},
		AuthzCase {
			name: "automated_denied_on_locked_resource",
			actor: f.agent,
			kind: ActorKind::Automated,
			tenant: t,
			action: "task:write",
			resource: ("task", Some("K-1")),
			resource_attributes: json!({"locked": true}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "policy-deny",
		},
		// Relationships
		AuthzCase {
			name: "relationship_through_container",
			actor: f.dave,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:write",
			resource: ("ticket", Some("T-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "relationship:maintainer",
		},
		AuthzCase {
			name: "relationship_does_not_cover_action",
			actor: f.dave,
			kind: ActorKind::Human,
			tenant: t,
			action: "project:delete",
			resource: ("ticket", Some("T-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		AuthzCase {
			name: "relationship_needs_resource_id",
			actor: f.dave,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:write",
			resource: ("ticket", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		// Attribute policies
		AuthzCase {
			name: "attribute_policy_allows_department",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: t,
			action: "document:read",
			resource: ("document", Some("D-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: true,
			expected_reason: "policy-allow",
		},
		AuthzCase {
			name: "attribute_policy_excludes_other_department",
			actor: f.bob,
			kind: ActorKind::Human,
			tenant: t,
			action: "document:read",
			resource: ("document", Some("D-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		AuthzCase {
			name: "condition_inside_office_hours",
			actor: f.bob,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:write",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({"time": {"hour": 14}}),
			expected_allowed: true,
			expected_reason: "policy-allow",
		},
		AuthzCase {
			name: "condition_outside_office_hours",
			actor: f.bob,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:write",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({"time": {"hour": 20}}),
			expected_allowed: false,
			expected_reason: "no-matching-grant",
		},
		// Guards
		AuthzCase {
			name: "inactive_actor",
			actor: f.ghost,
			kind: ActorKind::Human,
			tenant: t,
			action: "org:read",
			resource: ("org", None),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "actor-inactive",
		},
		AuthzCase {
			name: "tenant_mismatch",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({"tenant_id": f.other_tenant.to_string()}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "tenant-mismatch",
		},
		AuthzCase {
			name: "tenant_mismatch_even_when_elevated",
			actor: f.root,
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({"tenant_id": f.other_tenant.to_string()}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "tenant-mismatch",
		},
		AuthzCase {
			name: "inactive_tenant",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: f.dormant_tenant,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "tenant-inactive",
		},
		// Internal failures
		AuthzCase {
			name: "unknown_tenant_fails_closed",
			actor: f.alice,
			kind: ActorKind::Human,
			tenant: TenantId::generate(),
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "internal-error",
		},
		AuthzCase {
			name: "unknown_actor_fails_closed",
			actor: ActorId::generate(),
			kind: ActorKind::Human,
			tenant: t,
			action: "ticket:read",
			resource: ("ticket", Some("T-2")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "internal-error",
		},
		AuthzCase {
			name: "actor_kind_mismatch_fails_closed",
			actor: f.agent,
			kind: ActorKind::Human,
			tenant: t,
			action: "task:write",
			resource: ("task", Some("K-1")),
			resource_attributes: json!({}),
			context: json!({}),
			expected_allowed: false,
			expected_reason: "internal-error",
		},
	];

	let first = run_authz_cases(&app.engine, &cases);
	let second = run_authz_cases(&app.engine, &cases);
	assert_eq!(first, second, "decisions must be deterministic");
}

#[test]
fn test_matched_rules_are_reported() {
	let app = TestEngine::new();
	let f = &app.fixtures;

	let inherited = app.engine.decide(&DecisionRequest::new(
		f.alice,
		ActorKind::Human,
		"ticket:read",
		f.tenant,
		"ticket",
	));
	assert_eq!(inherited.matched.roles, vec!["B".to_string(), "A".to_string()]);
	assert!(!inherited.matched.ownership);

	let owned = app.engine.decide(
		&DecisionRequest::new(f.frank, ActorKind::Human, "ticket:delete", f.tenant, "ticket")
			.with_resource_id("T-7"),
	);
	assert!(owned.matched.ownership);
	assert_eq!(owned.rule_ids(), vec!["owner".to_string()]);

	let denied = app.engine.decide(
		&DecisionRequest::new(f.erin, ActorKind::Human, "ticket:read", f.tenant, "ticket")
			.with_resource_id("T-4")
			.with_resource_attributes(super::support::attrs(
				json!({"owner_id": f.erin.to_string()}),
			)),
	);
	assert_eq!(denied.reason, DecisionReason::PolicyDeny);
	assert_eq!(denied.matched.policies, vec![f.deny_suspended]);
	assert!(denied.matched.ownership, "overridden candidates stay visible to audit");

	let locked = app.engine.decide(
		&DecisionRequest::new(f.agent, ActorKind::Automated, "task:write", f.tenant, "task")
			.with_resource_attributes(super::support::attrs(json!({"locked": true}))),
	);
	assert_eq!(locked.matched.policies, vec![f.deny_locked_for_agents]);
	assert_eq!(locked.matched.roles, vec!["agent_executor".to_string()]);

	let docs = app.engine.decide(&DecisionRequest::new(
		f.alice,
		ActorKind::Human,
		"document:read",
		f.tenant,
		"document",
	));
	assert_eq!(docs.matched.policies, vec![f.allow_department_docs]);

	let related = app.engine.decide(
		&DecisionRequest::new(f.dave, ActorKind::Human, "ticket:read", f.tenant, "ticket")
			.with_resource_id("T-1"),
	);
	assert_eq!(related.matched.relationship.as_deref(), Some("maintainer"));
}

#[test]
fn test_public_view_hides_internals() {
	let app = TestEngine::new();
	let f = &app.fixtures;

	let decision = app.engine.decide(
		&DecisionRequest::new(f.erin, ActorKind::Human, "ticket:read", f.tenant, "ticket")
			.with_resource_id("T-4"),
	);
	let public = serde_json::to_value(decision.public()).unwrap();
	assert_eq!(public, json!({"allowed": false}));
}

#[test]
fn test_effective_permissions_and_membership() {
	let app = TestEngine::new();
	let f = &app.fixtures;

	assert_eq!(
		app.engine.effective_permissions(f.tenant, f.alice).unwrap(),
		vec!["ticket:comment".to_string(), "ticket:read".to_string()]
	);
	assert!(app
		.engine
		.effective_permissions(f.tenant, f.bob)
		.unwrap()
		.is_empty());
	assert!(app
		.engine
		.effective_permissions(f.other_tenant, f.alice)
		.unwrap()
		.is_empty());

	assert!(app.engine.is_member(f.tenant, f.carol).unwrap());
	assert!(!app.engine.is_member(f.tenant, f.bob).unwrap());
	assert!(!app.engine.is_member(f.other_tenant, f.carol).unwrap());

	assert_eq!(app.engine.memberships_of(f.carol).unwrap(), vec![f.tenant]);
	assert!(app.engine.memberships_of(f.bob).unwrap().is_empty());
}

#[test]
fn test_unrelated_relation_kinds_both_grant() {
	use std::sync::Arc;
	use warden_authz::{
		Actor, DecisionEngine, RelationDefinition, ResourceRef, ResourceRelationship, SnapshotBuilder,
		SnapshotStore, Tenant,
	};

	let tenant = TenantId::generate();
	let clerk = ActorId::generate();
	let ticket = ResourceRef::new("ticket", "T-1");
	let store = Arc::new(SnapshotStore::new());
	store
		.publish(
			SnapshotBuilder::new()
				.tenant(Tenant::new(tenant, "acme"))
				.relation(RelationDefinition::new("maintainer", &["ticket:write"]))
				.relation(RelationDefinition::new("billing", &["ticket:invoice:read"]))
				.actor(Actor::human(clerk))
				.relationship(ResourceRelationship::actor(tenant, ticket.clone(), "maintainer", clerk))
				.relationship(ResourceRelationship::actor(tenant, ticket, "billing", clerk)),
		)
		.unwrap();
	let engine = DecisionEngine::new(store);

	let request = |action: &str| {
		DecisionRequest::new(clerk, ActorKind::Human, action, tenant, "ticket").with_resource_id("T-1")
	};

	let invoice = engine.decide(&request("ticket:invoice:read"));
	assert!(invoice.allowed);
	assert_eq!(invoice.reason, DecisionReason::Relationship("billing".to_string()));
	assert_eq!(invoice.matched.relationship.as_deref(), Some("billing"));

	let write = engine.decide(&request("ticket:write"));
	assert_eq!(write.reason, DecisionReason::Relationship("maintainer".to_string()));

	let delete = engine.decide(&request("ticket:delete"));
	assert!(!delete.allowed);
	assert_eq!(delete.reason, DecisionReason::NoMatchingGrant);
}
