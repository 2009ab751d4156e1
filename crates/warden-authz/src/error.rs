// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::actor::ActorKind;
use crate::types::{ActorId, PolicyId, RoleId, TenantId};

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Raised while building a snapshot. A snapshot that fails to build is never
/// published.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
	#[error("role inheritance cycle detected at role {0}")]
	RoleCycle(RoleId),

	#[error("role {role} inherits from unknown role {parent}")]
	UnknownParentRole { role: RoleId, parent: RoleId },

	#[error("unknown role {0}")]
	UnknownRole(RoleId),

	#[error("unknown role '{name}' in tenant {tenant}")]
	UnknownRoleName { tenant: TenantId, name: String },

	#[error("unknown tenant {0}")]
	UnknownTenant(TenantId),

	#[error("unknown actor {0}")]
	UnknownActor(ActorId),

	#[error("{entity} belongs to tenant {found} but is referenced from tenant {expected}")]
	CrossTenantReference {
		entity: String,
		expected: TenantId,
		found: TenantId,
	},

	#[error("duplicate {kind} id {id}")]
	DuplicateId { kind: &'static str, id: String },

	#[error("duplicate membership for actor {actor} in tenant {tenant}")]
	DuplicateMembership { actor: ActorId, tenant: TenantId },

	#[error("unknown comparison operator '{operator}' on attribute '{path}'")]
	UnknownOperator { path: String, operator: String },

	#[error("invalid operand for '{operator}' on attribute '{path}': {message}")]
	InvalidOperand {
		path: String,
		operator: String,
		message: String,
	},

	#[error("malformed policy {policy}: {message}")]
	MalformedPolicy { policy: PolicyId, message: String },

	#[error("relation kind '{0}' has no permission mapping")]
	UnmappedRelation(String),

	#[error("relation inheritance cycle detected at '{0}'")]
	RelationCycle(String),
}

/// Internal failure during evaluation. The engine converts every one of these
/// into a closed `internal-error` decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
	#[error("snapshot unavailable: {0}")]
	SnapshotUnavailable(String),

	#[error("tenant {tenant} is not present in snapshot version {version}")]
	UnknownTenant { tenant: TenantId, version: u64 },

	#[error("actor {0} is not present in the actor directory")]
	UnknownActor(ActorId),

	#[error("actor {actor} is registered as {registered} but the request claims {claimed}")]
	ActorKindMismatch {
		actor: ActorId,
		registered: ActorKind,
		claimed: ActorKind,
	},
}
