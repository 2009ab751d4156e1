// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actors: the humans and automated agents that requests are made on behalf of.
//!
//! [`Actor`] is a closed enum. Policies never dispatch on the variant; instead
//! the kind is injected into the subject attribute map under
//! [`ACTOR_KIND_ATTRIBUTE`] so constraints can discriminate on it like any other
//! attribute.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::{default_true, ActorId};

/// Free-form attribute map used for ABAC evaluation.
pub type AttributeMap = serde_json::Map<String, Value>;

/// Subject attribute key holding `"human"` or `"automated"`.
pub const ACTOR_KIND_ATTRIBUTE: &str = "actor_kind";

/// Subject attribute key holding the actor id as a string.
pub const ACTOR_ID_ATTRIBUTE: &str = "actor_id";

/// Discriminant of [`Actor`], as carried on decision requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
	Human,
	Automated,
}

impl ActorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ActorKind::Human => "human",
			ActorKind::Automated => "automated",
		}
	}
}

impl fmt::Display for ActorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A human user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanActor {
	pub id: ActorId,
	#[serde(default = "default_true")]
	pub is_active: bool,
	/// Super-admin flag. Bypasses every check, including deny policies.
	#[serde(default)]
	pub is_elevated: bool,
	#[serde(default)]
	pub attributes: AttributeMap,
}

/// An autonomous agent. Never elevated and never a resource owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomatedActor {
	pub id: ActorId,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub attributes: AttributeMap,
}

/// An actor snapshot as read from the actor directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
	Human(HumanActor),
	Automated(AutomatedActor),
}

impl Actor {
	/// Creates an active, non-elevated human with no attributes.
	pub fn human(id: ActorId) -> Self {
		Actor::Human(HumanActor {
			id,
			is_active: true,
			is_elevated: false,
			attributes: AttributeMap::new(),
		})
	}

	/// Creates an active automated actor with no attributes.
	pub fn automated(id: ActorId) -> Self {
		Actor::Automated(AutomatedActor {
			id,
			is_active: true,
			attributes: AttributeMap::new(),
		})
	}

	pub fn id(&self) -> ActorId {
		match self {
			Actor::Human(h) => h.id,
			Actor::Automated(a) => a.id,
		}
	}

	pub fn kind(&self) -> ActorKind {
		match self {
			Actor::Human(_) => ActorKind::Human,
			Actor::Automated(_) => ActorKind::Automated,
		}
	}

	pub fn is_active(&self) -> bool {
		match self {
			Actor::Human(h) => h.is_active,
			Actor::Automated(a) => a.is_active,
		}
	}

	pub fn elevated(&self) -> bool {
		match self {
			Actor::Human(h) => h.is_elevated,
			Actor::Automated(_) => false,
		}
	}

	/// Only humans can own resources.
	pub fn can_own(&self) -> bool {
		matches!(self, Actor::Human(_))
	}

	pub fn attributes(&self) -> &AttributeMap {
		match self {
			Actor::Human(h) => &h.attributes,
			Actor::Automated(a) => &a.attributes,
		}
	}

	/// Attribute map used for subject constraints, with the actor kind and id
	/// injected. Injected keys shadow stored attributes of the same name.
	pub fn subject_attributes(&self) -> AttributeMap {
		let mut attrs = self.attributes().clone();
		attrs.insert(
			ACTOR_KIND_ATTRIBUTE.to_string(),
			Value::String(self.kind().as_str().to_string()),
		);
		attrs.insert(
			ACTOR_ID_ATTRIBUTE.to_string(),
			Value::String(self.id().to_string()),
		);
		attrs
	}

	/// Builder: replace the attribute map.
	pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
		match &mut self {
			Actor::Human(h) => h.attributes = attributes,
			Actor::Automated(a) => a.attributes = attributes,
		}
		self
	}

	/// Builder: set the elevated flag. No effect on automated actors.
	pub fn with_elevated(mut self, elevated: bool) -> Self {
		if let Actor::Human(h) = &mut self {
			h.is_elevated = elevated;
		}
		self
	}

	/// Builder: set the active flag.
	pub fn with_active(mut self, active: bool) -> Self {
		match &mut self {
			Actor::Human(h) => h.is_active = active,
			Actor::Automated(a) => a.is_active = active,
		}
		self
	}
}
