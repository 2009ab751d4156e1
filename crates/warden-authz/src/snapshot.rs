// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Immutable, versioned authorization snapshots.
//!
//! A [`Snapshot`] holds everything one evaluation reads: tenants, the actor
//! directory, roles, memberships, compiled policies, relationship edges and the
//! relation catalog. It is only ever constructed through [`SnapshotBuilder`],
//! which validates the whole configuration up front. A configuration that
//! fails validation is never published.
//!
//! [`SnapshotStore`] publishes new snapshots by swapping an `Arc`. Readers
//! clone the `Arc` and keep evaluating against it even if a newer version is
//! published mid-flight; superseded snapshots are dropped with their last
//! reference.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::error::{ConfigResult, ConfigurationError, EvaluationError};
use crate::policy::{self, Policy, PolicyDefinition};
use crate::relationship::{
	RelationCatalog, RelationDefinition, RelationTarget, RelationshipIndex, ResourceRelationship,
	CONTAINER_RELATION, OWNER_RELATION,
};
use crate::role::{self, Membership, Role};
use crate::types::{ActorId, RoleId, Tenant, TenantId};

// =============================================================================
// Snapshot
// =============================================================================

/// Per-tenant slice of a snapshot.
#[derive(Debug, Clone)]
pub struct TenantSnapshot {
	tenant: Tenant,
	roles: HashMap<RoleId, Role>,
	role_names: HashMap<String, RoleId>,
	memberships: HashMap<ActorId, RoleId>,
	policies: Vec<Policy>,
	relationships: RelationshipIndex,
}

impl TenantSnapshot {
	fn new(tenant: Tenant) -> Self {
		Self {
			tenant,
			roles: HashMap::new(),
			role_names: HashMap::new(),
			memberships: HashMap::new(),
			policies: Vec::new(),
			relationships: RelationshipIndex::default(),
		}
	}

	pub fn tenant(&self) -> &Tenant {
		&self.tenant
	}

	pub fn roles(&self) -> &HashMap<RoleId, Role> {
		&self.roles
	}

	pub fn role_by_name(&self, name: &str) -> Option<&Role> {
		self.role_names.get(name).and_then(|id| self.roles.get(id))
	}

	/// The role the actor's membership binds it to, if any.
	pub fn membership_role(&self, actor_id: ActorId) -> Option<&Role> {
		self
			.memberships
			.get(&actor_id)
			.and_then(|role_id| self.roles.get(role_id))
	}

	pub fn is_member(&self, actor_id: ActorId) -> bool {
		self.memberships.contains_key(&actor_id)
	}

	pub fn effective_permissions(&self, actor_id: ActorId) -> Vec<String> {
		match self.membership_role(actor_id) {
			Some(role) => role::effective_permissions(&self.roles, role),
			None => Vec::new(),
		}
	}

	/// Compiled policies, highest priority first.
	pub fn policies(&self) -> &[Policy] {
		&self.policies
	}

	pub fn relationships(&self) -> &RelationshipIndex {
		&self.relationships
	}
}

/// Entity counts, for logging and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
	pub tenants: usize,
	pub actors: usize,
	pub roles: usize,
	pub memberships: usize,
	pub policies: usize,
	pub relationships: usize,
	pub relations: usize,
}

/// A validated, immutable view of all authorization configuration.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
	version: u64,
	tenants: HashMap<TenantId, TenantSnapshot>,
	actors: HashMap<ActorId, Actor>,
	relations: RelationCatalog,
}

impl Snapshot {
	pub fn version(&self) -> u64 {
		self.version
	}

	pub fn tenant(&self, id: TenantId) -> Option<&TenantSnapshot> {
		self.tenants.get(&id)
	}

	pub fn actor(&self, id: ActorId) -> Option<&Actor> {
		self.actors.get(&id)
	}

	pub fn relations(&self) -> &RelationCatalog {
		&self.relations
	}

	/// Deduplicated, sorted permissions granted to `actor` in `tenant` through
	/// its role chain. Empty without a membership.
	pub fn effective_permissions(&self, tenant: TenantId, actor: ActorId) -> Vec<String> {
		self
			.tenant(tenant)
			.map(|t| t.effective_permissions(actor))
			.unwrap_or_default()
	}

	pub fn is_member(&self, tenant: TenantId, actor: ActorId) -> bool {
		self.tenant(tenant).is_some_and(|t| t.is_member(actor))
	}

	/// Tenants `actor` holds a membership in, sorted.
	pub fn memberships_of(&self, actor: ActorId) -> Vec<TenantId> {
		let mut tenants: Vec<TenantId> = self
			.tenants
			.iter()
			.filter(|(_, t)| t.is_member(actor))
			.map(|(id, _)| *id)
			.collect();
		tenants.sort();
		tenants
	}

	pub fn stats(&self) -> SnapshotStats {
		let mut stats = SnapshotStats {
			tenants: self.tenants.len(),
			actors: self.actors.len(),
			relations: self.relations.kinds().count(),
			..Default::default()
		};
		for t in self.tenants.values() {
			stats.roles += t.roles.len();
			stats.memberships += t.memberships.len();
			stats.policies += t.policies.len();
			stats.relationships += t.relationships.len();
		}
		stats
	}
}

// =============================================================================
// Builder
// =============================================================================

/// Collects configuration and validates it into a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
	tenants: Vec<Tenant>,
	actors: Vec<Actor>,
	roles: Vec<Role>,
	memberships: Vec<Membership>,
	relationships: Vec<ResourceRelationship>,
	policies: Vec<PolicyDefinition>,
	relations: Vec<RelationDefinition>,
}

impl SnapshotBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn tenant(mut self, tenant: Tenant) -> Self {
		self.tenants.push(tenant);
		self
	}

	pub fn actor(mut self, actor: Actor) -> Self {
		self.actors.push(actor);
		self
	}

	pub fn role(mut self, role: Role) -> Self {
		self.roles.push(role);
		self
	}

	/// Adds per-tenant copies of the system role templates.
	pub fn system_roles(mut self, tenant: TenantId) -> Self {
		self.roles.extend(role::system_roles(tenant));
		self
	}

	pub fn membership(mut self, actor_id: ActorId, tenant_id: TenantId, role_id: RoleId) -> Self {
		self.memberships.push(Membership {
			actor_id,
			tenant_id,
			role_id,
		});
		self
	}

	pub fn relationship(mut self, edge: ResourceRelationship) -> Self {
		self.relationships.push(edge);
		self
	}

	pub fn policy(mut self, policy: PolicyDefinition) -> Self {
		self.policies.push(policy);
		self
	}

	pub fn relation(mut self, relation: RelationDefinition) -> Self {
		self.relations.push(relation);
		self
	}

	/// Roles added so far, for resolving references by name.
	pub fn roles(&self) -> &[Role] {
		&self.roles
	}

	/// Validates and builds a snapshot at version zero. [`SnapshotStore`]
	/// assigns the published version.
	pub fn build(self) -> ConfigResult<Snapshot> {
		let relations = RelationCatalog::build(&self.relations)?;

		let mut tenants: HashMap<TenantId, TenantSnapshot> = HashMap::with_capacity(self.tenants.len());
		for tenant in self.tenants {
			if tenants.contains_key(&tenant.id) {
				return Err(duplicate("tenant", tenant.id));
			}
			tenants.insert(tenant.id, TenantSnapshot::new(tenant));
		}

		let mut actors: HashMap<ActorId, Actor> = HashMap::with_capacity(self.actors.len());
		for actor in self.actors {
			let id = actor.id();
			if actors.insert(id, actor).is_some() {
				return Err(duplicate("actor", id));
			}
		}

		let mut roles: HashMap<RoleId, Role> = HashMap::with_capacity(self.roles.len());
		for role in self.roles {
			if !tenants.contains_key(&role.tenant_id) {
				return Err(ConfigurationError::UnknownTenant(role.tenant_id));
			}
			if roles.contains_key(&role.id) {
				return Err(duplicate("role", role.id));
			}
			roles.insert(role.id, role);
		}
		role::validate_hierarchy(&roles)?;

		for role in roles.into_values() {
			let Some(tenant) = tenants.get_mut(&role.tenant_id) else {
				return Err(ConfigurationError::UnknownTenant(role.tenant_id));
			};
			if tenant.role_names.insert(role.name.clone(), role.id).is_some() {
				return Err(ConfigurationError::DuplicateId {
					kind: "role name",
					id: format!("{}/{}", role.tenant_id, role.name),
				});
			}
			tenant.roles.insert(role.id, role);
		}

		for m in self.memberships {
			if !actors.contains_key(&m.actor_id) {
				return Err(ConfigurationError::UnknownActor(m.actor_id));
			}
			let owner = tenants
				.values()
				.find(|t| t.roles.contains_key(&m.role_id))
				.map(|t| t.tenant.id)
				.ok_or(ConfigurationError::UnknownRole(m.role_id))?;
			let tenant = tenants
				.get_mut(&m.tenant_id)
				.ok_or(ConfigurationError::UnknownTenant(m.tenant_id))?;
			if owner != m.tenant_id {
				return Err(ConfigurationError::CrossTenantReference {
					entity: format!("role {}", m.role_id),
					expected: m.tenant_id,
					found: owner,
				});
			}
			if tenant.memberships.insert(m.actor_id, m.role_id).is_some() {
				return Err(ConfigurationError::DuplicateMembership {
					actor: m.actor_id,
					tenant: m.tenant_id,
				});
			}
		}

		let mut seen_edges = HashSet::with_capacity(self.relationships.len());
		for edge in self.relationships {
			let relation = edge.relation.as_str();
			if relation != CONTAINER_RELATION
				&& relation != OWNER_RELATION
				&& !relations.contains(relation)
			{
				return Err(ConfigurationError::UnmappedRelation(edge.relation.clone()));
			}
			if let RelationTarget::Actor(actor) = &edge.target {
				if !actors.contains_key(actor) {
					return Err(ConfigurationError::UnknownActor(*actor));
				}
			}
			let tenant = tenants
				.get_mut(&edge.tenant_id)
				.ok_or(ConfigurationError::UnknownTenant(edge.tenant_id))?;
			if seen_edges.insert(edge.clone()) {
				tenant.relationships.insert(edge);
			} else {
				debug!(resource = %edge.resource, relation = %edge.relation, "ignoring duplicate relationship edge");
			}
		}

		let mut policy_ids = HashSet::with_capacity(self.policies.len());
		for def in self.policies {
			if !policy_ids.insert(def.id) {
				return Err(duplicate("policy", def.id));
			}
			let compiled = def.compile()?;
			let tenant = tenants
				.get_mut(&compiled.tenant_id)
				.ok_or(ConfigurationError::UnknownTenant(compiled.tenant_id))?;
			tenant.policies.push(compiled);
		}
		for tenant in tenants.values_mut() {
			policy::sort_by_priority(&mut tenant.policies);
		}

		Ok(Snapshot {
			version: 0,
			tenants,
			actors,
			relations,
		})
	}
}

fn duplicate(kind: &'static str, id: impl ToString) -> ConfigurationError {
	ConfigurationError::DuplicateId {
		kind,
		id: id.to_string(),
	}
}

// =============================================================================
// Access and publication
// =============================================================================

/// Read-only source of the current snapshot.
///
/// Implementations must be synchronous and side-effect free. An error is
/// turned into an `internal-error` decision by the engine.
pub trait SnapshotAccessor: Send + Sync {
	fn snapshot(&self) -> Result<Arc<Snapshot>, EvaluationError>;
}

impl SnapshotAccessor for Arc<Snapshot> {
	fn snapshot(&self) -> Result<Arc<Snapshot>, EvaluationError> {
		Ok(Arc::clone(self))
	}
}

/// Holds the live snapshot and swaps it atomically on publish.
#[derive(Debug)]
pub struct SnapshotStore {
	current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
	/// A store holding an empty version-zero snapshot.
	pub fn new() -> Self {
		Self {
			current: RwLock::new(Arc::new(Snapshot::default())),
		}
	}

	/// Builds and publishes in one step.
	pub fn from_builder(builder: SnapshotBuilder) -> ConfigResult<Self> {
		let store = Self::new();
		store.publish(builder)?;
		Ok(store)
	}

	pub fn current(&self) -> Arc<Snapshot> {
		Arc::clone(&self.current.read())
	}

	/// Validates `builder` and, on success, replaces the live snapshot with
	/// the next version. On failure the live snapshot is untouched.
	pub fn publish(&self, builder: SnapshotBuilder) -> ConfigResult<u64> {
		let mut snapshot = builder.build()?;

		let mut guard = self.current.write();
		snapshot.version = guard.version + 1;
		let version = snapshot.version;
		let stats = snapshot.stats();
		*guard = Arc::new(snapshot);
		drop(guard);

		info!(
			version,
			tenants = stats.tenants,
			actors = stats.actors,
			roles = stats.roles,
			memberships = stats.memberships,
			policies = stats.policies,
			relationships = stats.relationships,
			"published authorization snapshot"
		);
		Ok(version)
	}
}

impl Default for SnapshotStore {
	fn default() -> Self {
		Self::new()
	}
}

impl SnapshotAccessor for SnapshotStore {
	fn snapshot(&self) -> Result<Arc<Snapshot>, EvaluationError> {
		Ok(self.current())
	}
}
