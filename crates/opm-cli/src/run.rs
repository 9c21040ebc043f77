//! Migration run orchestration.
//!
//! Stages compose the way the actions nest: `export` stops after the
//! store snapshot, `filter` after scoping, `clone`/`convert` after the
//! transformation, `import` pushes everything produced back to the store,
//! and `cleanup` deletes superseded source policies. Destructive stages
//! ask for confirmation unless `--yes` was given.

use std::io::Write;

use anyhow::{bail, Context, Result};
use futures_util::{stream, StreamExt};
use tracing::{error, info, warn};

use opm_core::acl::AclProvider;
use opm_core::{
    clone_for_object_store, collect_roots, filter_policies, has_opaque_resource, is_boilerplate,
    partition_for_cleanup, policies_for_root, resolve_from_acls, synthesize, RootIdentifier,
    ScopeFilter, SourcePolicy, TargetPolicy,
};
use opm_hdfs::{HdfsShell, KerberosAuth};
use opm_ranger::{RangerClient, RangerConfig};

use crate::lists::{load_list, split_csv};
use crate::report::save_policies;
use crate::summary::{display_source_policies, display_target_policies};
use crate::{Action, Cli, Mode};

/// Run the migration as described by the command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let settings = crate::config::Settings::load(&cli.config)?;
    let options = Options::resolve(&cli, settings)?;

    let ranger_config = RangerConfig::new(
        &options.ranger.url,
        &options.ranger.username,
        &options.ranger.password,
    )?
    .with_accept_invalid_certs(options.ranger.accept_invalid_certs)
    .with_export_timeout(options.ranger.export_timeout())
    .with_import_timeout(options.ranger.import_timeout())
    .with_delete_timeout(options.ranger.delete_timeout());
    let client = RangerClient::new(ranger_config)?;

    let shell = options.acl_fallback.as_ref().map(|fallback| {
        HdfsShell::new(Some(KerberosAuth::new(
            &fallback.keytab_path,
            &fallback.principal,
        )))
    });

    let mut import_queue: Vec<serde_json::Value> = Vec::new();

    if options.mode.includes_hive() {
        run_hive(&client, &options, &mut import_queue).await?;
    }
    if options.mode.includes_hdfs() {
        run_hdfs(&client, &options, shell.as_ref(), &mut import_queue).await?;
    }
    if options.action == Action::Import {
        run_import(&client, &options, &import_queue).await?;
    }

    Ok(())
}

/// Settings and command-line arguments merged; the command line wins.
struct Options {
    mode: Mode,
    action: Action,
    hive_service: String,
    hdfs_service: String,
    ozone_service: String,
    ozone_prefix: Option<String>,
    ozone_service_id: Option<String>,
    include_databases: Option<Vec<String>>,
    exclude_databases: Option<Vec<String>>,
    include_roots: Option<Vec<String>>,
    exclude_roots: Option<Vec<String>>,
    acl_fallback: Option<FallbackOptions>,
    ranger: crate::config::RangerSettings,
    report_dir: std::path::PathBuf,
    concurrency: usize,
    save_json: bool,
    assume_yes: bool,
}

struct FallbackOptions {
    keytab_path: std::path::PathBuf,
    principal: String,
    root_dir_prefix: String,
}

impl Options {
    fn resolve(cli: &Cli, settings: crate::config::Settings) -> Result<Self> {
        let include_databases = if let Some(raw) = &cli.databases {
            Some(split_csv(raw))
        } else if let Some(path) = &cli.databases_file {
            Some(load_list(path)?)
        } else if let Some(path) = &settings.filters.databases_file {
            Some(load_list(path)?)
        } else {
            None
        };

        let exclude_databases = if let Some(raw) = &cli.exclude_databases {
            Some(split_csv(raw))
        } else if let Some(path) = &cli.exclude_databases_file {
            Some(load_list(path)?)
        } else if let Some(path) = &settings.filters.exclude_databases_file {
            Some(load_list(path)?)
        } else {
            None
        };

        let include_roots = cli.roots.as_deref().map(split_csv);
        let exclude_roots = cli.exclude_roots.as_deref().map(split_csv);

        let fallback_enabled = if cli.disable_acl_fallback {
            false
        } else {
            cli.enable_acl_fallback || settings.acl_fallback.enabled
        };
        let acl_fallback = if fallback_enabled {
            let keytab_path = cli
                .keytab
                .clone()
                .or_else(|| settings.acl_fallback.keytab_path.clone())
                .context("ACL fallback requires a keytab path (--keytab or settings)")?;
            let principal = cli
                .principal
                .clone()
                .or_else(|| settings.acl_fallback.principal.clone())
                .context("ACL fallback requires a principal (--principal or settings)")?;
            if !keytab_path.exists() {
                bail!("keytab file not found: {}", keytab_path.display());
            }
            info!(keytab = %keytab_path.display(), principal, "filesystem ACL fallback enabled");
            Some(FallbackOptions {
                keytab_path,
                principal,
                root_dir_prefix: settings.acl_fallback.root_dir_prefix.clone(),
            })
        } else {
            info!("filesystem ACL fallback disabled");
            None
        };

        let ozone_prefix = cli.ozone_prefix.clone().or(settings.ozone.prefix);
        let ozone_service_id = cli.ozone_service_id.clone().or(settings.ozone.service_id);

        if cli.mode.includes_hive()
            && matches!(cli.action, Action::Clone | Action::Convert | Action::Import)
        {
            if ozone_prefix.is_none() {
                bail!("--ozone-prefix required (or set ozone.prefix in the settings file)");
            }
            if ozone_service_id.is_none() {
                bail!("--ozone-service-id required (or set ozone.service_id in the settings file)");
            }
        }

        Ok(Self {
            mode: cli.mode,
            action: cli.action,
            hive_service: cli
                .hive_service
                .clone()
                .unwrap_or(settings.services.hive),
            hdfs_service: cli
                .hdfs_service
                .clone()
                .unwrap_or(settings.services.hdfs),
            ozone_service: cli
                .ozone_service
                .clone()
                .unwrap_or(settings.services.ozone),
            ozone_prefix,
            ozone_service_id,
            include_databases,
            exclude_databases,
            include_roots,
            exclude_roots,
            acl_fallback,
            ranger: settings.ranger,
            report_dir: settings.output.report_dir,
            concurrency: settings.output.concurrency.max(1),
            save_json: cli.save_json,
            assume_yes: cli.yes,
        })
    }
}

async fn run_hive(
    client: &RangerClient,
    options: &Options,
    import_queue: &mut Vec<serde_json::Value>,
) -> Result<()> {
    info!("starting hive policy processing");

    let policies = match client.export_policies(&options.hive_service).await {
        Ok(policies) if !policies.is_empty() => policies,
        Ok(_) => {
            if options.mode == Mode::Hive {
                bail!("no hive policies exported");
            }
            warn!("no hive policies exported, continuing with hdfs stage");
            return Ok(());
        }
        Err(error) => {
            if options.mode == Mode::Hive {
                return Err(error).context("exporting hive policies");
            }
            warn!(%error, "hive export failed, continuing with hdfs stage");
            return Ok(());
        }
    };

    match options.action {
        Action::Export => {
            display_source_policies(&policies, "EXPORTED HIVE POLICIES");
            if options.save_json {
                save_policies(&options.report_dir, "hive_exported", &policies)?;
            }
        }
        Action::Cleanup => run_cleanup(client, options, &policies).await?,
        Action::Filter | Action::Clone | Action::Convert | Action::Import => {
            let scope = ScopeFilter::new(
                options.include_databases.clone(),
                options.exclude_databases.clone(),
            );
            let filtered = filter_policies(&policies, &scope);

            if options.action == Action::Filter {
                display_source_policies(&filtered, "FILTERED HIVE POLICIES");
                if options.save_json {
                    save_policies(&options.report_dir, "hive_filtered", &filtered)?;
                }
                return Ok(());
            }

            let prefix = options
                .ozone_prefix
                .as_deref()
                .context("ozone prefix is required for cloning")?;
            let service_id = options
                .ozone_service_id
                .as_deref()
                .context("ozone service id is required for cloning")?;

            let mut cloned = Vec::with_capacity(filtered.len());
            for policy in &filtered {
                let outcome = clone_for_object_store(policy, prefix, service_id);
                for warning in &outcome.warnings {
                    warn!(policy = %outcome.policy.name, warning, "clone produced a warning");
                }
                info!(original = %policy.name, clone = %outcome.policy.name, "cloned hive policy");
                cloned.push(outcome.policy);
            }

            if options.action == Action::Import {
                for policy in &cloned {
                    import_queue.push(serde_json::to_value(policy)?);
                }
            } else {
                display_target_summary_for_clones(&cloned, prefix);
                if options.save_json && !cloned.is_empty() {
                    save_policies(
                        &options.report_dir,
                        &format!("hive_cloned_{prefix}"),
                        &cloned,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn display_target_summary_for_clones(cloned: &[SourcePolicy], prefix: &str) {
    if cloned.is_empty() {
        println!("\nNO HIVE POLICIES CREATED");
        warn!("no hive policies were created");
        return;
    }
    display_source_policies(cloned, &format!("CLONED HIVE POLICIES (PREFIX: {prefix})"));
}

async fn run_cleanup(
    client: &RangerClient,
    options: &Options,
    policies: &[SourcePolicy],
) -> Result<()> {
    info!("starting hive policy cleanup");
    let (to_delete, to_keep) =
        partition_for_cleanup(policies, options.include_databases.as_deref());

    println!("\nHIVE POLICY CLEANUP ANALYSIS");
    println!("Total policies in Ranger: {}", policies.len());
    println!("Policies to DELETE: {}", to_delete.len());
    println!("Policies to KEEP: {}", to_keep.len());

    if to_delete.is_empty() {
        println!("\nNo policies match the cleanup criteria.");
        info!("no policies to cleanup");
        return Ok(());
    }

    display_source_policies(&to_delete, "POLICIES TO BE DELETED");

    let mut kept_boilerplate = 0;
    let mut kept_opaque = 0;
    let mut kept_other = 0;
    for policy in &to_keep {
        if is_boilerplate(policy) {
            kept_boilerplate += 1;
        } else if has_opaque_resource(policy) {
            kept_opaque += 1;
        } else {
            kept_other += 1;
        }
    }
    println!("POLICIES TO BE KEPT ({} total)", to_keep.len());
    println!("  Default policies: {kept_boilerplate}");
    println!("  URL policies: {kept_opaque}");
    println!("  Other policies: {kept_other}");

    if options.save_json {
        save_policies(&options.report_dir, "hive_cleanup_to_delete", &to_delete)?;
        save_policies(&options.report_dir, "hive_cleanup_to_keep", &to_keep)?;
    }

    println!("\nWARNING: This action will permanently delete the policies listed above!");
    if !confirm(
        &format!("Delete {} policies from Ranger?", to_delete.len()),
        options.assume_yes,
    )? {
        info!("cleanup cancelled by user");
        println!("Cleanup cancelled.");
        return Ok(());
    }

    let total = to_delete.len();
    let mut deleted = 0_usize;
    let mut failed = 0_usize;
    for (index, policy) in to_delete.iter().enumerate() {
        match policy.id {
            Some(id) => match client.delete_policy(id).await {
                Ok(()) => deleted += 1,
                Err(error) => {
                    error!(policy = %policy.name, %error, "delete failed");
                    failed += 1;
                }
            },
            None => {
                error!(policy = %policy.name, "policy has no id, skipping");
                failed += 1;
            }
        }
        log_progress("cleanup", index + 1, total, deleted, failed);
    }

    println!("\nCleanup Results:");
    println!("  Successfully deleted: {deleted}");
    println!("  Failed to delete: {failed}");
    Ok(())
}

async fn run_hdfs(
    client: &RangerClient,
    options: &Options,
    shell: Option<&HdfsShell>,
    import_queue: &mut Vec<serde_json::Value>,
) -> Result<()> {
    info!("starting hdfs policy processing");

    let policies = match client.export_policies(&options.hdfs_service).await {
        Ok(policies) => policies,
        Err(error) => {
            if shell.is_some() {
                warn!(%error, "hdfs export failed, relying on filesystem ACL fallback");
                Vec::new()
            } else if options.mode == Mode::Hdfs {
                return Err(error).context("exporting hdfs policies");
            } else {
                warn!(%error, "hdfs export failed, skipping hdfs stage");
                return Ok(());
            }
        }
    };

    if policies.is_empty() && shell.is_none() {
        if options.mode == Mode::Hdfs {
            bail!("no hdfs policies found and ACL fallback is disabled");
        }
        warn!("no hdfs policies found and ACL fallback is disabled, skipping hdfs stage");
        return Ok(());
    }

    match options.action {
        Action::Export => {
            if !policies.is_empty() {
                display_source_policies(&policies, "EXPORTED HDFS POLICIES");
                if options.save_json {
                    save_policies(&options.report_dir, "hdfs_exported", &policies)?;
                }
            }
        }
        Action::Convert | Action::Import => {
            let fallback = options.acl_fallback.as_ref().and_then(|fb| {
                shell.map(|shell| (shell as &dyn AclProvider, fb.root_dir_prefix.as_str()))
            });
            let converted = convert_all(
                &policies,
                options.include_roots.as_deref(),
                options.exclude_roots.as_deref(),
                fallback,
                &options.ozone_service,
                options.concurrency,
            )
            .await;

            if options.action == Action::Import {
                for policy in &converted {
                    import_queue.push(serde_json::to_value(policy)?);
                }
            } else if converted.is_empty() {
                println!("\nNO OZONE POLICIES CREATED");
                warn!("no ozone policies were created");
            } else {
                display_target_policies(&converted, "CONVERTED OZONE POLICIES FROM HDFS");
                if options.save_json {
                    save_policies(&options.report_dir, "hdfs_converted", &converted)?;
                }
            }
        }
        Action::Filter | Action::Clone | Action::Cleanup => {
            info!(action = ?options.action, "action has no hdfs stage");
        }
    }
    Ok(())
}

/// Convert every selected root, concurrently, in deterministic output
/// order. Roots without source policies fall back to filesystem ACLs
/// when a provider is available.
async fn convert_all(
    policies: &[SourcePolicy],
    include_roots: Option<&[String]>,
    exclude_roots: Option<&[String]>,
    fallback: Option<(&dyn AclProvider, &str)>,
    target_service: &str,
    concurrency: usize,
) -> Vec<TargetPolicy> {
    let mut roots = collect_roots(policies, include_roots, exclude_roots);

    // Explicitly requested roots are processed even without source
    // policies, as long as the fallback can supply permissions.
    if let (Some(include), Some(_)) = (include_roots, fallback) {
        roots.extend(include.iter().map(|name| RootIdentifier::new(name.as_str())));
    }
    if let Some(exclude) = exclude_roots {
        roots.retain(|root| !exclude.iter().any(|name| name == root.as_str()));
    }

    let root_names: Vec<&str> = roots.iter().map(RootIdentifier::as_str).collect();
    info!(count = roots.len(), roots = root_names.join(","), "roots to process");

    let mut converted: Vec<(RootIdentifier, Vec<TargetPolicy>)> = stream::iter(roots)
        .map(|root| async move {
            let sources = policies_for_root(&root, policies);
            let targets = if sources.is_empty() {
                match fallback {
                    Some((provider, dir_prefix)) => {
                        warn!(root = %root, "no source policies, attempting ACL fallback");
                        let root_path = format!("{dir_prefix}{root}");
                        resolve_from_acls(provider, &root, &root_path, target_service).await
                    }
                    None => {
                        info!(root = %root, "no source policies and fallback disabled, skipping");
                        Vec::new()
                    }
                }
            } else {
                synthesize(&root, &sources, target_service)
            };
            (root, targets)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    converted.sort_by(|a, b| a.0.cmp(&b.0));
    converted.into_iter().flat_map(|(_, targets)| targets).collect()
}

async fn run_import(
    client: &RangerClient,
    options: &Options,
    import_queue: &[serde_json::Value],
) -> Result<()> {
    if import_queue.is_empty() {
        info!("no policies to import");
        return Ok(());
    }

    println!("\nPOLICIES TO BE IMPORTED ({} total)", import_queue.len());
    for (index, policy) in import_queue.iter().enumerate() {
        let name = policy["name"].as_str().unwrap_or("<unnamed>");
        let service = policy["service"].as_str().unwrap_or("<unknown>");
        println!("{}. {name} ({service})", index + 1);
    }

    if !confirm(
        &format!("Import {} policies to Ranger?", import_queue.len()),
        options.assume_yes,
    )? {
        info!("import cancelled by user");
        println!("Import cancelled.");
        return Ok(());
    }

    let total = import_queue.len();
    let mut imported = 0_usize;
    let mut failed = 0_usize;
    for (index, policy) in import_queue.iter().enumerate() {
        match client.import_policy(policy).await {
            Ok(()) => imported += 1,
            Err(error) => {
                let name = policy["name"].as_str().unwrap_or("<unnamed>");
                error!(policy = name, %error, "import failed");
                failed += 1;
            }
        }
        log_progress("import", index + 1, total, imported, failed);
    }

    println!("\nImport Results:");
    println!("  Successfully imported: {imported}");
    println!("  Failed to import: {failed}");

    if options.save_json {
        save_policies(&options.report_dir, "imported_policies", import_queue)?;
    }
    Ok(())
}

fn log_progress(stage: &str, done: usize, total: usize, succeeded: usize, failed: usize) {
    if done % 10 == 0 || done == total {
        let percent = done * 100 / total;
        info!(
            stage,
            progress = format!("{done}/{total} ({percent}%)"),
            succeeded,
            failed,
            "progress"
        );
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{prompt} (yes/no): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "yes" | "y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opm_core::acl::AclDocument;
    use opm_core::{AccessGrant, AccessKind, PolicyItem, ResourceValues};
    use pretty_assertions::assert_eq;

    fn path_policy(name: &str, paths: &[&str]) -> SourcePolicy {
        let mut policy = SourcePolicy {
            name: name.to_string(),
            service: "cm_hdfs".to_string(),
            policy_items: vec![PolicyItem {
                accesses: vec![AccessGrant::allowed(AccessKind::Read)],
                users: vec!["alice".to_string()],
                ..PolicyItem::default()
            }],
            ..SourcePolicy::default()
        };
        policy.resources.insert(
            "path".to_string(),
            ResourceValues::new(paths.iter().map(ToString::to_string).collect()),
        );
        policy
    }

    struct NoAcls;

    #[async_trait]
    impl AclProvider for NoAcls {
        async fn get_acl(&self, _path: &str) -> Option<AclDocument> {
            None
        }

        async fn list_child_dirs(&self, _path: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn convert_all_orders_output_by_root() {
        let policies = vec![
            path_policy("b", &["/data/fid2/raw"]),
            path_policy("a", &["/data/fid1"]),
        ];
        let converted = convert_all(&policies, None, None, None, "cm_ozone", 4).await;
        let names: Vec<&str> = converted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "fid1_volume_policy",
                "fid2_volume_policy",
                "fid2_bucket_policy"
            ]
        );
    }

    #[tokio::test]
    async fn included_roots_without_policies_use_fallback() {
        let include = vec!["fid9".to_string()];
        let provider = NoAcls;
        let converted = convert_all(
            &[],
            Some(&include),
            None,
            Some((&provider, "/data/")),
            "cm_ozone",
            1,
        )
        .await;
        // Fallback found nothing, so the root produces no policies.
        assert!(converted.is_empty());
    }

    #[tokio::test]
    async fn excluded_roots_are_dropped_even_when_included() {
        let include = vec!["fid1".to_string(), "fid2".to_string()];
        let exclude = vec!["fid2".to_string()];
        let policies = vec![path_policy("a", &["/data/fid1"]), path_policy("b", &["/data/fid2"])];
        let provider = NoAcls;
        let converted = convert_all(
            &policies,
            Some(&include),
            Some(&exclude),
            Some((&provider, "/data/")),
            "cm_ozone",
            2,
        )
        .await;
        let names: Vec<&str> = converted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["fid1_volume_policy"]);
    }
}
