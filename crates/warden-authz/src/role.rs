// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles, memberships and role-chain resolution for RBAC.
//!
//! A role may name a single parent. Parent chains are validated as acyclic and
//! tenant-local when a snapshot is built ([`validate_hierarchy`]), so chain
//! walks at evaluation time need no cycle guard.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::iter;

use crate::error::{ConfigResult, ConfigurationError};
use crate::permission;
use crate::types::{ActorId, RoleId, TenantId};

/// A named permission set, optionally inheriting from one parent role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub id: RoleId,
	pub tenant_id: TenantId,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub permissions: Vec<String>,
	#[serde(default)]
	pub inherits_from: Option<RoleId>,
	#[serde(default)]
	pub is_system: bool,
}

impl Role {
	pub fn new(tenant_id: TenantId, name: impl Into<String>, permissions: &[&str]) -> Self {
		Self {
			id: RoleId::generate(),
			tenant_id,
			name: name.into(),
			description: None,
			permissions: permissions.iter().map(|p| p.to_string()).collect(),
			inherits_from: None,
			is_system: false,
		}
	}

	/// Builder: set the parent role.
	pub fn inheriting(mut self, parent: RoleId) -> Self {
		self.inherits_from = Some(parent);
		self
	}
}

/// Binds an actor to exactly one role within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
	pub actor_id: ActorId,
	pub tenant_id: TenantId,
	pub role_id: RoleId,
}

/// The outcome of a successful role-chain check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
	/// Name of the membership role (the start of the chain).
	pub role_name: String,
	/// Role names walked, from the membership role up to and including the
	/// role whose permissions matched.
	pub chain: Vec<String>,
}

/// Iterates a role followed by its ancestors.
pub fn role_chain<'a>(
	roles: &'a HashMap<RoleId, Role>,
	start: &'a Role,
) -> impl Iterator<Item = &'a Role> + 'a {
	iter::successors(Some(start), move |role| {
		role.inherits_from.and_then(|parent| roles.get(&parent))
	})
}

/// Walks the chain from `start` and returns the grant if any role along it
/// covers `required`.
pub fn resolve_grant(
	roles: &HashMap<RoleId, Role>,
	start: &Role,
	required: &str,
) -> Option<RoleGrant> {
	let mut chain = Vec::new();
	for role in role_chain(roles, start) {
		chain.push(role.name.clone());
		if permission::matches(&role.permissions, required) {
			return Some(RoleGrant {
				role_name: start.name.clone(),
				chain,
			});
		}
	}
	None
}

/// Deduplicated, sorted union of permissions along the chain.
pub fn effective_permissions(roles: &HashMap<RoleId, Role>, start: &Role) -> Vec<String> {
	role_chain(roles, start)
		.flat_map(|role| role.permissions.iter().cloned())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

/// Checks that every parent exists, lives in the same tenant, and that no
/// chain loops back on itself.
pub fn validate_hierarchy(roles: &HashMap<RoleId, Role>) -> ConfigResult<()> {
	let mut acyclic: HashSet<RoleId> = HashSet::with_capacity(roles.len());

	let mut ids: Vec<&RoleId> = roles.keys().collect();
	ids.sort();

	for id in ids {
		let mut on_path: HashSet<RoleId> = HashSet::new();
		let mut current = *id;

		loop {
			if acyclic.contains(&current) {
				break;
			}
			if !on_path.insert(current) {
				return Err(ConfigurationError::RoleCycle(current));
			}

			let Some(role) = roles.get(&current) else {
				return Err(ConfigurationError::UnknownRole(current));
			};

			let Some(parent_id) = role.inherits_from else {
				break;
			};

			let parent = roles
				.get(&parent_id)
				.ok_or(ConfigurationError::UnknownParentRole {
					role: role.id,
					parent: parent_id,
				})?;

			if parent.tenant_id != role.tenant_id {
				return Err(ConfigurationError::CrossTenantReference {
					entity: format!("role {parent_id}"),
					expected: role.tenant_id,
					found: parent.tenant_id,
				});
			}

			current = parent_id;
		}

		acyclic.extend(on_path);
	}

	Ok(())
}

/// Per-tenant copies of the built-in role templates.
///
/// | role             | grants                                               |
/// |------------------|------------------------------------------------------|
/// | `owner`          | everything under org, project, document, ticket, task, agent |
/// | `admin`          | management, without org deletion or agent writes     |
/// | `member`         | read/write on work items                             |
/// | `viewer`         | read-only                                            |
/// | `agent_executor` | what an automated agent needs to carry out tasks     |
pub fn system_roles(tenant_id: TenantId) -> Vec<Role> {
	const TEMPLATES: &[(&str, &str, &[&str])] = &[
		(
			"owner",
			"Tenant owner with full control",
			&["org:*", "project:*", "document:*", "ticket:*", "task:*", "agent:*"],
		),
		(
			"admin",
			"Administrator with management permissions",
			&[
				"org:read",
				"org:write",
				"org:members:*",
				"project:*",
				"document:*",
				"ticket:*",
				"task:*",
				"agent:read",
			],
		),
		(
			"member",
			"Standard member",
			&[
				"org:read",
				"project:read",
				"project:write",
				"document:read",
				"document:write",
				"ticket:read",
				"ticket:write",
				"task:read",
				"task:write",
				"agent:read",
			],
		),
		(
			"viewer",
			"Read-only access",
			&[
				"org:read",
				"project:read",
				"document:read",
				"ticket:read",
				"task:read",
				"agent:read",
			],
		),
		(
			"agent_executor",
			"Role for automated agents",
			&[
				"project:read",
				"document:read",
				"document:write",
				"ticket:read",
				"ticket:write",
				"task:read",
				"task:write",
				"task:complete:execute",
				"project:git:write",
			],
		),
	];

	TEMPLATES
		.iter()
		.map(|(name, description, permissions)| {
			let mut role = Role::new(tenant_id, *name, permissions);
			role.description = Some(description.to_string());
			role.is_system = true;
			role
		})
		.collect()
}
