// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relationship resolution for ReBAC.
//!
//! An actor relates to a resource by:
//!
//! 1. **Ownership**: the resource's owner attribute (or an `owner` edge on the
//!    resource itself) names the actor. Humans only.
//! 2. **Delegated relation**: an edge such as `maintainer` or `viewer` from the
//!    resource, or from its immediate container, to the actor.
//!
//! Containment is a single hop along a [`CONTAINER_RELATION`] edge. Deeper
//! hierarchies must be flattened by the caller.
//!
//! Each relation kind maps to a permission set declared in the
//! [`RelationCatalog`]. A kind with no mapping grants nothing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::actor::{Actor, AttributeMap};
use crate::error::{ConfigResult, ConfigurationError};
use crate::permission;
use crate::types::{ActorId, ResourceRef, TenantId};

/// Structural edge from a resource to its containing resource.
pub const CONTAINER_RELATION: &str = "parent";

/// Edge kind that marks direct ownership.
pub const OWNER_RELATION: &str = "owner";

/// What an edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationTarget {
	Actor(ActorId),
	Resource(ResourceRef),
}

/// A `(resource, relation, target)` edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRelationship {
	pub tenant_id: TenantId,
	pub resource: ResourceRef,
	pub relation: String,
	pub target: RelationTarget,
}

impl ResourceRelationship {
	pub fn actor(
		tenant_id: TenantId,
		resource: ResourceRef,
		relation: impl Into<String>,
		actor: ActorId,
	) -> Self {
		Self {
			tenant_id,
			resource,
			relation: relation.into(),
			target: RelationTarget::Actor(actor),
		}
	}

	pub fn contained_in(tenant_id: TenantId, resource: ResourceRef, container: ResourceRef) -> Self {
		Self {
			tenant_id,
			resource,
			relation: CONTAINER_RELATION.to_string(),
			target: RelationTarget::Resource(container),
		}
	}

	fn targets_actor(&self, actor: ActorId) -> bool {
		self.target == RelationTarget::Actor(actor)
	}
}

/// The resolved relationship between an actor and a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
	Owner,
	Delegated(String),
}

/// Declares the permissions a relation kind carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
	pub name: String,
	#[serde(default)]
	pub permissions: Vec<String>,
	/// Kind whose permissions are included in this one.
	#[serde(default)]
	pub inherits: Option<String>,
}

impl RelationDefinition {
	pub fn new(name: impl Into<String>, permissions: &[&str]) -> Self {
		Self {
			name: name.into(),
			permissions: permissions.iter().map(|p| p.to_string()).collect(),
			inherits: None,
		}
	}

	/// Builder: include another kind's permissions.
	pub fn inheriting(mut self, kind: impl Into<String>) -> Self {
		self.inherits = Some(kind.into());
		self
	}
}

/// Flattened relation kind → permission mapping. Declaration order is rank:
/// earlier kinds are stronger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationCatalog {
	order: Vec<String>,
	permissions: HashMap<String, Vec<String>>,
}

impl RelationCatalog {
	pub fn build(definitions: &[RelationDefinition]) -> ConfigResult<Self> {
		let by_name: HashMap<&str, &RelationDefinition> = definitions
			.iter()
			.map(|d| (d.name.as_str(), d))
			.collect();
		if by_name.len() != definitions.len() {
			let mut seen = HashSet::new();
			let dup = definitions
				.iter()
				.find(|d| !seen.insert(d.name.as_str()))
				.map(|d| d.name.clone())
				.unwrap_or_default();
			return Err(ConfigurationError::DuplicateId {
				kind: "relation",
				id: dup,
			});
		}

		let mut permissions = HashMap::with_capacity(definitions.len());
		for def in definitions {
			let mut flattened = BTreeSet::new();
			let mut visited = HashSet::new();
			let mut current = Some(def);

			while let Some(d) = current {
				if !visited.insert(d.name.as_str()) {
					return Err(ConfigurationError::RelationCycle(def.name.clone()));
				}
				flattened.extend(d.permissions.iter().cloned());
				current = match &d.inherits {
					Some(kind) => Some(
						*by_name
							.get(kind.as_str())
							.ok_or_else(|| ConfigurationError::UnmappedRelation(kind.clone()))?,
					),
					None => None,
				};
			}

			permissions.insert(def.name.clone(), flattened.into_iter().collect());
		}

		Ok(Self {
			order: definitions.iter().map(|d| d.name.clone()).collect(),
			permissions,
		})
	}

	pub fn contains(&self, kind: &str) -> bool {
		self.permissions.contains_key(kind)
	}

	pub fn rank(&self, kind: &str) -> Option<usize> {
		self.order.iter().position(|k| k == kind)
	}

	pub fn permissions(&self, kind: &str) -> Option<&[String]> {
		self.permissions.get(kind).map(Vec::as_slice)
	}

	/// Unknown kinds grant nothing.
	pub fn grants(&self, kind: &str, required: &str) -> bool {
		self
			.permissions(kind)
			.is_some_and(|granted| permission::matches(granted, required))
	}

	pub fn kinds(&self) -> impl Iterator<Item = &str> {
		self.order.iter().map(String::as_str)
	}
}

/// Per-tenant edge index keyed by source resource.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
	edges: HashMap<ResourceRef, Vec<ResourceRelationship>>,
}

impl RelationshipIndex {
	pub fn insert(&mut self, edge: ResourceRelationship) {
		self.edges.entry(edge.resource.clone()).or_default().push(edge);
	}

	pub fn edges_from(&self, resource: &ResourceRef) -> &[ResourceRelationship] {
		self.edges.get(resource).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.edges.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}
}

/// Inputs describing the resource side of a relationship lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResourceView<'a> {
	pub resource_type: &'a str,
	pub resource_id: Option<&'a str>,
	pub attributes: &'a AttributeMap,
}

/// Resolves every way `actor` relates to the resource.
///
/// Ownership short-circuits to `[Owner]`. Otherwise the delegated kinds found
/// on the resource or its immediate container come back deduplicated in
/// catalog rank order, strongest first.
pub fn relations_of(
	actor: &Actor,
	resource: ResourceView<'_>,
	owner_attribute: &str,
	index: &RelationshipIndex,
	catalog: &RelationCatalog,
) -> Vec<Relation> {
	if actor.can_own() && owner_attribute_matches(actor, resource.attributes, owner_attribute) {
		return vec![Relation::Owner];
	}

	let Some(resource_id) = resource.resource_id else {
		return Vec::new();
	};
	let target = ResourceRef::new(resource.resource_type, resource_id);
	let direct = index.edges_from(&target);

	if actor.can_own()
		&& direct
			.iter()
			.any(|e| e.relation == OWNER_RELATION && e.targets_actor(actor.id()))
	{
		return vec![Relation::Owner];
	}

	let containers = direct.iter().filter_map(|e| match &e.target {
		RelationTarget::Resource(container) if e.relation == CONTAINER_RELATION => Some(container),
		_ => None,
	});

	let mut candidates: Vec<&str> = delegated_kinds(actor, direct).collect();
	for container in containers {
		candidates.extend(delegated_kinds(actor, index.edges_from(container)));
	}

	let ranked: BTreeMap<usize, &str> = candidates
		.into_iter()
		.filter_map(|kind| match catalog.rank(kind) {
			Some(rank) => Some((rank, kind)),
			None => {
				debug!(relation = kind, "relation kind has no permission mapping, ignoring");
				None
			}
		})
		.collect();

	if ranked.is_empty() {
		debug!(resource = %target, actor_id = %actor.id(), "no relationship to resource");
	}
	ranked
		.into_values()
		.map(|kind| Relation::Delegated(kind.to_string()))
		.collect()
}

fn delegated_kinds<'a>(
	actor: &'a Actor,
	edges: &'a [ResourceRelationship],
) -> impl Iterator<Item = &'a str> + 'a {
	edges
		.iter()
		.filter(move |e| e.targets_actor(actor.id()))
		.filter(|e| e.relation != CONTAINER_RELATION)
		.filter(move |e| e.relation != OWNER_RELATION || actor.can_own())
		.map(|e| e.relation.as_str())
}

fn owner_attribute_matches(actor: &Actor, attributes: &AttributeMap, key: &str) -> bool {
	attributes
		.get(key)
		.and_then(|v| v.as_str())
		.and_then(|s| s.parse::<Uuid>().ok())
		.is_some_and(|owner| owner == actor.id().into_inner())
}
