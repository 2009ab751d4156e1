// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::{info, instrument};

use warden_audit::AuditService;
use warden_authz::{ActorId, DecisionEngine, DecisionRequest, SnapshotStore, TenantId};
use warden_config::{load_snapshot, WardenConfig};

fn open_store(config: &WardenConfig) -> Result<SnapshotStore> {
	let Some(path) = &config.snapshot.path else {
		bail!("no snapshot configured: set [snapshot].path, WARDEN_SNAPSHOT_PATH or --snapshot");
	};

	let builder = load_snapshot(path)?;
	let store = SnapshotStore::new();
	store
		.publish(builder)
		.with_context(|| format!("snapshot {} is invalid", path.display()))?;
	Ok(store)
}

/// Builds the snapshot and prints its entity counts.
#[instrument(skip_all)]
pub fn validate(config: &WardenConfig, out: &mut impl Write) -> Result<()> {
	let store = open_store(config)?;
	let stats = store.current().stats();

	writeln!(out, "snapshot ok")?;
	writeln!(out, "  tenants:       {}", stats.tenants)?;
	writeln!(out, "  actors:        {}", stats.actors)?;
	writeln!(out, "  roles:         {}", stats.roles)?;
	writeln!(out, "  memberships:   {}", stats.memberships)?;
	writeln!(out, "  relationships: {}", stats.relationships)?;
	writeln!(out, "  relations:     {}", stats.relations)?;
	writeln!(out, "  policies:      {}", stats.policies)?;
	Ok(())
}

/// Reads a JSON decision request from a file, or stdin for `-`.
pub fn read_request(source: &str) -> Result<DecisionRequest> {
	let content = if source == "-" {
		let mut buf = String::new();
		std::io::stdin()
			.read_to_string(&mut buf)
			.context("failed to read request from stdin")?;
		buf
	} else {
		std::fs::read_to_string(source)
			.with_context(|| format!("failed to read request file {source}"))?
	};

	serde_json::from_str(&content).context("request is not a valid decision request")
}

#[instrument(skip_all, fields(action = %request.action))]
pub async fn check(
	config: &WardenConfig,
	request: &DecisionRequest,
	public: bool,
	out: &mut impl Write,
) -> Result<()> {
	let store = Arc::new(open_store(config)?);
	let mut engine = DecisionEngine::new(store).with_options(config.engine.options());
	if let Some(cache) = config.engine.cache() {
		engine = engine.with_cache(cache);
	}

	let audit = AuditService::from_config(&config.audit)
		.context("failed to start audit pipeline")?
		.map(Arc::new);
	if let Some(audit) = &audit {
		engine = engine.with_recorder(audit.clone());
	}

	let decision = engine.decide(request);
	info!(allowed = decision.allowed, reason = %decision.reason, "decision");

	if public {
		serde_json::to_writer_pretty(&mut *out, &decision.public())?;
	} else {
		serde_json::to_writer_pretty(&mut *out, &decision)?;
	}
	writeln!(out)?;

	if let Some(audit) = audit {
		audit.flush().await.context("failed to flush audit records")?;
	}
	Ok(())
}

pub fn permissions(
	config: &WardenConfig,
	tenant: TenantId,
	actor: ActorId,
	out: &mut impl Write,
) -> Result<()> {
	let snapshot = open_store(config)?.current();
	if snapshot.tenant(tenant).is_none() {
		bail!("unknown tenant {tenant}");
	}

	let report = json!({
		"tenant_id": tenant,
		"actor_id": actor,
		"member": snapshot.is_member(tenant, actor),
		"permissions": snapshot.effective_permissions(tenant, actor),
		"tenants": snapshot.memberships_of(actor),
	});
	serde_json::to_writer_pretty(&mut *out, &report)?;
	writeln!(out)?;
	Ok(())
}
