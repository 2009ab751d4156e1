// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifiers and small value types shared by every engine component.
//!
//! - **ID newtypes**: [`ActorId`], [`TenantId`], [`RoleId`], [`PolicyId`] wrap
//!   UUIDs so an actor id can never be passed where a tenant id is expected
//! - [`Tenant`]: the isolation boundary every role, policy and relationship
//!   belongs to
//! - [`ResourceRef`]: the caller-resolved `resource_type` + `resource_id` pair
//!
//! All ID types serialize transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(ActorId, "Unique identifier for a human or automated actor.");
define_id_type!(TenantId, "Unique identifier for a tenant.");
define_id_type!(RoleId, "Unique identifier for a role.");
define_id_type!(PolicyId, "Unique identifier for an attribute policy.");

// =============================================================================
// Tenant
// =============================================================================

/// Isolation boundary. Roles, policies, memberships and relationships are all
/// scoped to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
	pub id: TenantId,
	pub name: String,
	#[serde(default = "default_true")]
	pub is_active: bool,
}

impl Tenant {
	pub fn new(id: TenantId, name: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			is_active: true,
		}
	}
}

pub(crate) fn default_true() -> bool {
	true
}

// =============================================================================
// Resource reference
// =============================================================================

/// A resource as seen by the engine: a type plus an optional id.
///
/// Deeper hierarchies are resolved by the caller into this single pair before
/// a request reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
	pub resource_type: String,
	pub resource_id: String,
}

impl ResourceRef {
	pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
		Self {
			resource_type: resource_type.into(),
			resource_id: resource_id.into(),
		}
	}
}

impl fmt::Display for ResourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.resource_type, self.resource_id)
	}
}
