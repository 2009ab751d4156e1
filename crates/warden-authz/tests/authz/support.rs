// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::{json, Value};
use std::sync::Arc;

use warden_authz::{
	Actor, ActorId, ActorKind, AttributeMap, Decision, DecisionEngine, DecisionRequest, Effect,
	PolicyDefinition, PolicyId, RelationDefinition, ResourceRef, ResourceRelationship, Role,
	SnapshotBuilder, SnapshotStore, Tenant, TenantId,
};

pub fn attrs(value: Value) -> AttributeMap {
	value.as_object().cloned().unwrap_or_default()
}

/// Actors and tenants shared by the decision tables.
pub struct Fixtures {
	pub tenant: TenantId,
	pub other_tenant: TenantId,
	pub dormant_tenant: TenantId,
	/// Member of role `B`, which inherits `A`. Department `eng`.
	pub alice: ActorId,
	/// No membership. Department `sales`.
	pub bob: ActorId,
	/// Member of the system `admin` role.
	pub carol: ActorId,
	/// No membership; `maintainer` of project `P-1`, which contains ticket `T-1`.
	pub dave: ActorId,
	/// No membership; suspended.
	pub erin: ActorId,
	/// No membership.
	pub frank: ActorId,
	/// Elevated and suspended.
	pub root: ActorId,
	/// Inactive, member of `admin`.
	pub ghost: ActorId,
	/// Automated, member of `agent_executor`.
	pub agent: ActorId,
	pub deny_locked_for_agents: PolicyId,
	pub deny_suspended: PolicyId,
	pub allow_department_docs: PolicyId,
	pub allow_office_hours_writes: PolicyId,
}

pub struct TestEngine {
	pub fixtures: Fixtures,
	pub store: Arc<SnapshotStore>,
	pub engine: DecisionEngine,
}

impl TestEngine {
	pub fn new() -> Self {
		let fixtures = Fixtures {
			tenant: TenantId::generate(),
			other_tenant: TenantId::generate(),
			dormant_tenant: TenantId::generate(),
			alice: ActorId::generate(),
			bob: ActorId::generate(),
			carol: ActorId::generate(),
			dave: ActorId::generate(),
			erin: ActorId::generate(),
			frank: ActorId::generate(),
			root: ActorId::generate(),
			ghost: ActorId::generate(),
			agent: ActorId::generate(),
			deny_locked_for_agents: PolicyId::generate(),
			deny_suspended: PolicyId::generate(),
			allow_department_docs: PolicyId::generate(),
			allow_office_hours_writes: PolicyId::generate(),
		};

		let store = Arc::new(SnapshotStore::new());
		store
			.publish(builder(&fixtures))
			.unwrap_or_else(|e| panic!("fixture snapshot failed to build: {e}"));
		let engine = DecisionEngine::new(store.clone());

		Self {
			fixtures,
			store,
			engine,
		}
	}
}

pub fn builder(f: &Fixtures) -> SnapshotBuilder {
	let t = f.tenant;

	let a = Role::new(t, "A", &["ticket:read"]);
	let b = Role::new(t, "B", &["ticket:comment"]).inheriting(a.id);
	let b_id = b.id;

	let mut dormant = Tenant::new(f.dormant_tenant, "dormant");
	dormant.is_active = false;

	let mut base = SnapshotBuilder::new()
		.tenant(Tenant::new(t, "acme"))
		.tenant(Tenant::new(f.other_tenant, "globex"))
		.tenant(dormant)
		.system_roles(t)
		.role(a)
		.role(b)
		.relation(RelationDefinition::new("owner", &["*:*"]))
		.relation(RelationDefinition::new("maintainer", &["ticket:*"]).inheriting("viewer"))
		.relation(RelationDefinition::new("viewer", &["ticket:read", "document:read"]))
		.actor(Actor::human(f.alice).with_attributes(attrs(json!({"department": "eng"}))))
		.actor(Actor::human(f.bob).with_attributes(attrs(json!({"department": "sales"}))))
		.actor(Actor::human(f.carol))
		.actor(Actor::human(f.dave))
		.actor(Actor::human(f.erin).with_attributes(attrs(json!({"suspended": true}))))
		.actor(Actor::human(f.frank))
		.actor(
			Actor::human(f.root)
				.with_elevated(true)
				.with_attributes(attrs(json!({"suspended": true}))),
		)
		.actor(Actor::human(f.ghost).with_active(false))
		.actor(Actor::automated(f.agent))
		.membership(f.alice, t, b_id)
		.relationship(ResourceRelationship::contained_in(
			t,
			ResourceRef::new("ticket", "T-1"),
			ResourceRef::new("project", "P-1"),
		))
		.relationship(ResourceRelationship::actor(
			t,
			ResourceRef::new("project", "P-1"),
			"maintainer",
			f.dave,
		))
		.relationship(ResourceRelationship::actor(
			t,
			ResourceRef::new("ticket", "T-7"),
			"owner",
			f.frank,
		));

	let mut deny_agents = PolicyDefinition::new(t, Effect::Deny, &["*"])
		.with_priority(100)
		.with_subject(json!({"actor_kind": "automated"}))
		.with_resource(json!({"locked": true}));
	deny_agents.id = f.deny_locked_for_agents;

	let mut deny_suspended = PolicyDefinition::new(t, Effect::Deny, &["*"])
		.with_priority(50)
		.with_subject(json!({"suspended": true}));
	deny_suspended.id = f.deny_suspended;

	let mut allow_docs = PolicyDefinition::new(t, Effect::Allow, &["document:read"])
		.with_priority(10)
		.with_resource_types(&["document"])
		.with_subject(json!({"department": {"in": ["eng", "ops"]}}));
	allow_docs.id = f.allow_department_docs;

	let mut allow_writes = PolicyDefinition::new(t, Effect::Allow, &["ticket:write"])
		.with_priority(5)
		.with_subject(json!({"actor_kind": "human"}))
		.with_conditions(json!({"env.time.hour": {">=": 9, "<": 17}}));
	allow_writes.id = f.allow_office_hours_writes;

	base = base
		.policy(deny_agents)
		.policy(deny_suspended)
		.policy(allow_docs)
		.policy(allow_writes);

	// Memberships to system roles are resolved by name.
	let admin = system_role(&base, t, "admin");
	let executor = system_role(&base, t, "agent_executor");
	base
		.membership(f.carol, t, admin)
		.membership(f.ghost, t, admin)
		.membership(f.agent, t, executor)
}

fn system_role(builder: &SnapshotBuilder, tenant: TenantId, name: &str) -> warden_authz::RoleId {
	builder
		.roles()
		.iter()
		.find(|r| r.tenant_id == tenant && r.name == name)
		.map(|r| r.id)
		.unwrap_or_else(|| panic!("system role {name} missing"))
}

/// One row of a decision table.
pub struct AuthzCase {
	pub name: &'static str,
	pub actor: ActorId,
	pub kind: ActorKind,
	pub tenant: TenantId,
	pub action: &'static str,
	pub resource: (&'static str, Option<&'static str>),
	pub resource_attributes: Value,
	pub context: Value,
	pub expected_allowed: bool,
	pub expected_reason: &'static str,
}

impl AuthzCase {
	pub fn request(&self) -> DecisionRequest {
		let mut request = DecisionRequest::new(
			self.actor,
			self.kind,
			self.action,
			self.tenant,
			self.resource.0,
		)
		.with_resource_attributes(attrs(self.resource_attributes.clone()))
		.with_context(attrs(self.context.clone()));
		request.resource_id = self.resource.1.map(str::to_string);
		request
	}
}

pub fn run_authz_cases(engine: &DecisionEngine, cases: &[AuthzCase]) -> Vec<Decision> {
	cases
		.iter()
		.map(|case| {
			let decision = engine.decide(&case.request());
			assert_eq!(
				(decision.allowed, decision.reason.to_string().as_str()),
				(case.expected_allowed, case.expected_reason),
				"Case '{}': {} on {}:{:?} - matched {:?}",
				case.name,
				case.action,
				case.resource.0,
				case.resource.1,
				decision.matched,
			);
			decision
		})
		.collect()
}
