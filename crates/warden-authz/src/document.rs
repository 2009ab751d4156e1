// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Serializable snapshot document.
//!
//! This is the on-disk shape of a snapshot (TOML or JSON). Roles may be
//! referenced by id or by name within their tenant, and tenants may opt in to
//! the system role templates. [`SnapshotDocument::into_builder`] resolves
//! those references; [`SnapshotBuilder::build`] does the rest of the
//! validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::actor::Actor;
use crate::error::{ConfigResult, ConfigurationError};
use crate::policy::PolicyDefinition;
use crate::relationship::{RelationDefinition, ResourceRelationship};
use crate::role::Role;
use crate::snapshot::SnapshotBuilder;
use crate::types::{ActorId, RoleId, Tenant, TenantId};

/// A role reference: a UUID or a role name in the referencing tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
	Id(RoleId),
	Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantDocument {
	#[serde(flatten)]
	pub tenant: Tenant,
	#[serde(default)]
	pub seed_system_roles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDocument {
	#[serde(default)]
	pub id: Option<RoleId>,
	pub tenant_id: TenantId,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub permissions: Vec<String>,
	#[serde(default)]
	pub inherits_from: Option<RoleRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipDocument {
	pub actor_id: ActorId,
	pub tenant_id: TenantId,
	pub role: RoleRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
	#[serde(default)]
	pub tenants: Vec<TenantDocument>,
	#[serde(default)]
	pub actors: Vec<Actor>,
	#[serde(default)]
	pub roles: Vec<RoleDocument>,
	#[serde(default)]
	pub memberships: Vec<MembershipDocument>,
	#[serde(default)]
	pub relationships: Vec<ResourceRelationship>,
	#[serde(default)]
	pub policies: Vec<PolicyDefinition>,
	#[serde(default)]
	pub relations: Vec<RelationDefinition>,
}

impl SnapshotDocument {
	/// Resolves role references and returns a builder ready to validate.
	pub fn into_builder(self) -> ConfigResult<SnapshotBuilder> {
		let mut builder = SnapshotBuilder::new();

		for doc in self.tenants {
			let id = doc.tenant.id;
			builder = builder.tenant(doc.tenant);
			if doc.seed_system_roles {
				builder = builder.system_roles(id);
			}
		}

		let assigned: Vec<RoleId> = self
			.roles
			.iter()
			.map(|r| r.id.unwrap_or_else(RoleId::generate))
			.collect();

		let mut names: HashMap<(TenantId, String), RoleId> = builder
			.roles()
			.iter()
			.map(|r| ((r.tenant_id, r.name.clone()), r.id))
			.collect();
		for (doc, id) in self.roles.iter().zip(&assigned) {
			names.insert((doc.tenant_id, doc.name.clone()), *id);
		}

		let resolve = |tenant: TenantId, role: &RoleRef| -> ConfigResult<RoleId> {
			match role {
				RoleRef::Id(id) => Ok(*id),
				RoleRef::Name(name) => names
					.get(&(tenant, name.clone()))
					.copied()
					.ok_or_else(|| ConfigurationError::UnknownRoleName {
						tenant,
						name: name.clone(),
					}),
			}
		};

		for (doc, id) in self.roles.into_iter().zip(assigned) {
			let inherits_from = doc
				.inherits_from
				.as_ref()
				.map(|parent| resolve(doc.tenant_id, parent))
				.transpose()?;
			builder = builder.role(Role {
				id,
				tenant_id: doc.tenant_id,
				name: doc.name,
				description: doc.description,
				permissions: doc.permissions,
				inherits_from,
				is_system: false,
			});
		}

		for m in self.memberships {
			let role_id = resolve(m.tenant_id, &m.role)?;
			builder = builder.membership(m.actor_id, m.tenant_id, role_id);
		}

		for actor in self.actors {
			builder = builder.actor(actor);
		}
		for edge in self.relationships {
			builder = builder.relationship(edge);
		}
		for policy in self.policies {
			builder = builder.policy(policy);
		}
		for relation in self.relations {
			builder = builder.relation(relation);
		}

		Ok(builder)
	}
}
