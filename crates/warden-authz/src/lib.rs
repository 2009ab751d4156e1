// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decision engine for Warden.
//!
//! Given an actor, an action, a tenant and a resource, the engine answers
//! allow or deny with a reason and the rules that contributed. It combines
//! three models:
//!
//! - **RBAC**: tenant memberships bound to roles with inheritable permission
//!   sets
//! - **ReBAC**: ownership and relationship edges between actors and resources
//! - **ABAC**: prioritized allow/deny policies over actor, resource and
//!   environment attributes
//!
//! All configuration is read from an immutable, versioned [`Snapshot`].
//! Evaluation is pure and lock-free; new configuration is published through
//! [`SnapshotStore`] as a whole new snapshot.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_authz::{
//!     Actor, ActorId, ActorKind, DecisionEngine, DecisionRequest, Role, SnapshotBuilder,
//!     SnapshotStore, Tenant, TenantId,
//! };
//!
//! let tenant = TenantId::generate();
//! let alice = ActorId::generate();
//! let viewer = Role::new(tenant, "viewer", &["ticket:read"]);
//! let viewer_id = viewer.id;
//!
//! let store = SnapshotStore::from_builder(
//!     SnapshotBuilder::new()
//!         .tenant(Tenant::new(tenant, "acme"))
//!         .actor(Actor::human(alice))
//!         .role(viewer)
//!         .membership(alice, tenant, viewer_id),
//! )
//! .unwrap();
//!
//! let engine = DecisionEngine::new(Arc::new(store));
//! let request = DecisionRequest::new(alice, ActorKind::Human, "ticket:read", tenant, "ticket");
//! let decision = engine.decide(&request);
//!
//! assert!(decision.allowed);
//! assert_eq!(decision.reason.to_string(), "role:viewer");
//! ```

pub mod actor;
pub mod attributes;
pub mod cache;
pub mod decision;
pub mod document;
pub mod engine;
pub mod error;
pub mod permission;
pub mod policy;
pub mod relationship;
pub mod role;
pub mod snapshot;
pub mod types;

pub use actor::{Actor, ActorKind, AttributeMap, AutomatedActor, HumanActor};
pub use attributes::{Constraint, Constraints, Operator};
pub use cache::{CacheKey, DecisionCache};
pub use decision::{
	Decision, DecisionEvent, DecisionReason, DecisionRecorder, DecisionRequest, MatchedRules,
	PublicDecision,
};
pub use document::{RoleRef, SnapshotDocument};
pub use engine::{evaluate, DecisionEngine, EngineOptions};
pub use error::{ConfigResult, ConfigurationError, EvaluationError};
pub use policy::{Effect, Policy, PolicyDefinition, PolicyMatches, ResourceTypes};
pub use relationship::{
	Relation, RelationCatalog, RelationDefinition, RelationTarget, ResourceRelationship,
};
pub use role::{Membership, Role, RoleGrant};
pub use snapshot::{Snapshot, SnapshotAccessor, SnapshotBuilder, SnapshotStats, SnapshotStore};
pub use types::{ActorId, PolicyId, ResourceRef, RoleId, Tenant, TenantId};
