//! `fleetctl apply`
//!
//! Commits specs in order against an in-memory provider seeded from the
//! configured project and zone, then reports what the provider saw.

use super::load_spec;
use crate::output::{CallRow, InstanceRow, OutputFormatter};
use anyhow::{Context, Result};
use fleet_core::{Config, GroupId, InstanceDescription};
use fleet_dev::MockCloudDriver;
use fleet_group::GroupPlugin;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of committing one spec file
#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub group: String,
    pub source: PathBuf,
    pub summary: String,
}

/// Final state of one touched group
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub converged: bool,
    pub instances: Vec<InstanceDescription>,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub pretend: bool,
    pub commits: Vec<CommitRecord>,
    pub groups: Vec<GroupReport>,
    pub calls: Vec<CallRow>,
}

/// Commit every spec, describe the touched groups and optionally destroy them
pub async fn run(config: &Config, specs: &[PathBuf], pretend: bool, destroy: bool) -> Result<ApplyReport> {
    let driver = MockCloudDriver::new(config.provider.clone());
    let plugin = GroupPlugin::with_builtin_flavors(Arc::new(driver.clone()))
        .with_default_flavor(config.group.default_flavor.clone());

    let mut commits = Vec::with_capacity(specs.len());
    let mut touched: Vec<GroupId> = Vec::new();

    for path in specs {
        let spec = load_spec(path)?;
        let summary = plugin
            .commit_group(&spec, pretend)
            .await
            .with_context(|| format!("Failed to commit group '{}' from {}", spec.id, path.display()))?;
        info!("committed group {} from {} (pretend={})", spec.id, path.display(), pretend);

        if !touched.contains(&spec.id) {
            touched.push(spec.id.clone());
        }
        commits.push(CommitRecord {
            group: spec.id.to_string(),
            source: path.clone(),
            summary,
        });
    }

    let mut groups = Vec::new();
    if pretend {
        if destroy {
            warn!("--destroy has no effect together with --pretend");
        }
    } else {
        for id in &touched {
            let description = plugin
                .describe_group(id)
                .await
                .with_context(|| format!("Failed to describe group '{}'", id))?;

            if destroy {
                plugin
                    .destroy_group(id)
                    .await
                    .with_context(|| format!("Failed to destroy group '{}'", id))?;
            }

            groups.push(GroupReport {
                group: id.to_string(),
                converged: description.converged,
                instances: description.instances,
                destroyed: destroy,
            });
        }
    }

    let calls = driver
        .calls()
        .await
        .into_iter()
        .enumerate()
        .map(|(i, call)| CallRow {
            seq: i + 1,
            call: format!("{:?}", call),
        })
        .collect();

    Ok(ApplyReport {
        pretend,
        commits,
        groups,
        calls,
    })
}

pub async fn execute(
    config: &Config,
    specs: &[PathBuf],
    pretend: bool,
    destroy: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let report = run(config, specs, pretend, destroy).await?;

    if formatter.is_structured() {
        return formatter.print_value(&report);
    }

    print_commits(&report, formatter);

    if !report.groups.is_empty() {
        formatter.print_section("Groups");
        let mut rows = Vec::new();
        for group in &report.groups {
            let state = if group.converged { "converged" } else { "converging" };
            formatter.print_info(&format!(
                "{}: {} ({} instances)",
                group.group,
                state,
                group.instances.len()
            ));
            let id = GroupId::new(group.group.as_str());
            rows.extend(
                group
                    .instances
                    .iter()
                    .map(|instance| InstanceRow::from_description(&id, instance)),
            );
        }
        formatter.print_list(&rows)?;

        for group in report.groups.iter().filter(|g| g.destroyed) {
            formatter.print_success(&format!("Destroyed group '{}'", group.group));
        }
    }

    formatter.print_section("Provider calls");
    formatter.print_list(&report.calls)?;
    Ok(())
}

fn print_commits(report: &ApplyReport, formatter: &OutputFormatter) {
    if report.pretend {
        formatter.print_warning("Pretend mode: nothing was sent to the provider");
    }
    for commit in &report.commits {
        let source = display_name(&commit.source);
        if commit.summary.is_empty() {
            formatter.print_success(&format!("{} ({}): no changes", commit.group, source));
            continue;
        }
        formatter.print_success(&format!("{} ({})", commit.group, source));
        for line in commit.summary.lines() {
            println!("    {}", line);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
