// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use warden_authz::{
	Actor, ActorId, ActorKind, DecisionEngine, DecisionReason, DecisionRequest, Effect,
	PolicyDefinition, Role, SnapshotBuilder, SnapshotStore, Tenant, TenantId,
};

use super::support::{builder, TestEngine};

const PUBLISHES: u64 = 200;

/// Odd versions grant through role `reader-odd`, even versions through
/// `reader-even` plus an allow policy. A reader that ever saw fields from two
/// versions would report a reason that disagrees with the version parity.
fn generation(tenant: TenantId, actor: ActorId, odd: bool) -> SnapshotBuilder {
	let name = if odd { "reader-odd" } else { "reader-even" };
	let role = Role::new(tenant, name, &["ticket:read"]);
	let role_id = role.id;

	let mut builder = SnapshotBuilder::new()
		.tenant(Tenant::new(tenant, "acme"))
		.actor(Actor::human(actor))
		.role(role)
		.membership(actor, tenant, role_id);
	if !odd {
		builder = builder.policy(PolicyDefinition::new(tenant, Effect::Allow, &["ticket:read"]));
	}
	builder
}

#[test]
fn test_readers_never_observe_mixed_snapshot() {
	let tenant = TenantId::generate();
	let actor = ActorId::generate();
	let store = Arc::new(SnapshotStore::from_builder(generation(tenant, actor, true)).unwrap());
	let engine = DecisionEngine::new(store.clone());
	let done = AtomicBool::new(false);

	thread::scope(|s| {
		for _ in 0..4 {
			s.spawn(|| {
				let request = DecisionRequest::new(actor, ActorKind::Human, "ticket:read", tenant, "ticket");
				let mut observed = 0u64;
				while !done.load(Ordering::Acquire) {
					let decision = engine.decide(&request);
					assert!(decision.allowed);

					let odd = decision.snapshot_version % 2 == 1;
					let expected_role = if odd { "reader-odd" } else { "reader-even" };
					assert_eq!(
						decision.reason,
						DecisionReason::Role(expected_role.to_string()),
						"version {} reported {}",
						decision.snapshot_version,
						decision.reason
					);
					assert_eq!(decision.matched.policies.len(), usize::from(!odd));
					assert!(decision.snapshot_version >= observed, "versions never go backwards");
					observed = decision.snapshot_version;

					let snapshot = store.current();
					let t = snapshot.tenant(tenant).unwrap();
					assert_eq!(t.roles().len(), 1);
					assert_eq!(t.policies().len(), usize::from(snapshot.version() % 2 == 0));
				}
			});
		}

		s.spawn(|| {
			for version in 2..=PUBLISHES {
				let published = store
					.publish(generation(tenant, actor, version % 2 == 1))
					.unwrap();
				assert_eq!(published, version);
			}
			done.store(true, Ordering::Release);
		});
	});

	assert_eq!(store.current().version(), PUBLISHES);
}

#[test]
fn test_in_flight_snapshot_survives_publish() {
	let app = TestEngine::new();
	let f = &app.fixtures;
	let before = app.store.current();

	let mut republished = builder(f);
	republished = republished.role(Role::new(f.tenant, "late", &["ticket:*"]));
	app.store.publish(republished).unwrap();

	assert_eq!(before.version(), 1);
	assert!(before.tenant(f.tenant).unwrap().role_by_name("late").is_none());
	assert_eq!(app.store.current().version(), 2);
	assert!(app
		.store
		.current()
		.tenant(f.tenant)
		.unwrap()
		.role_by_name("late")
		.is_some());
}

#[test]
fn test_rejected_snapshot_is_not_published() {
	let app = TestEngine::new();
	let f = &app.fixtures;

	let mut cyclic_a = Role::new(f.tenant, "cyclic-a", &[]);
	let cyclic_b = Role::new(f.tenant, "cyclic-b", &[]).inheriting(cyclic_a.id);
	cyclic_a.inherits_from = Some(cyclic_b.id);

	let result = app.store.publish(builder(f).role(cyclic_a).role(cyclic_b));
	assert!(result.is_err());
	assert_eq!(app.store.current().version(), 1);

	let decision = app.engine.decide(&DecisionRequest::new(
		f.alice,
		ActorKind::Human,
		"ticket:read",
		f.tenant,
		"ticket",
	));
	assert!(decision.allowed);
	assert_eq!(decision.snapshot_version, 1);
}
