//! Command dispatch: maps parsed arguments onto services.

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{
    Cli, Commands, ConfigCommands, HierarchyCommands, NavCommands, SectionArgs, SectionCommands,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{AccessDecision, BlockPayload, HierarchyId, SectionId, UserId, VisitOutcome, VisitStatus};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line; returns the process exit code.
#[instrument(level = "debug", skip_all)]
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `pagetree --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(exitcode::OK);
        }
        Commands::Config { command } => return config_command(cli, command),
        _ => {}
    }

    let container = ServiceContainer::load(load_settings(cli)?)?;
    let user = UserId::from(cli.user.clone());
    debug!(user = %user, "dispatching");

    match command {
        Commands::Hierarchy { command } => hierarchy_command(&container, command),
        Commands::Section { command } => section_command(&container, command),
        Commands::Nav { command } => nav_command(&container, &user, command),
        Commands::Visit {
            target,
            complete,
            gating,
        } => {
            let section = resolve_section(&container, target)?;
            let enforce = gating.resolve(container.gating.enforce_default());
            let status = if *complete {
                VisitStatus::Complete
            } else {
                VisitStatus::Incomplete
            };
            let report = container.gating.visit(&user, section, enforce, status)?;
            match (report.decision, report.outcome) {
                (AccessDecision::DeniedRedirectTo(first), _) => {
                    output::failure(&format!(
                        "denied, visit {} first",
                        section_line(&container, first)?
                    ));
                    Ok(exitcode::DENIED)
                }
                (AccessDecision::Allowed, outcome) => {
                    let what = match outcome {
                        Some(VisitOutcome::FirstVisit) => "first visit",
                        Some(VisitOutcome::Revisit) => "revisit",
                        Some(VisitOutcome::NotTracked) | None => "not tracked (anonymous)",
                    };
                    output::action(what, &section_line(&container, section)?);
                    container.save()?;
                    Ok(exitcode::OK)
                }
            }
        }
        Commands::Access { target, gating } => {
            let section = resolve_section(&container, target)?;
            let enforce = gating.resolve(container.gating.enforce_default());
            match container.gating.can_access(&user, section, enforce)? {
                AccessDecision::Allowed => {
                    output::success("allowed");
                    Ok(exitcode::OK)
                }
                AccessDecision::DeniedRedirectTo(first) => {
                    output::failure(&format!(
                        "denied, redirect to {}",
                        section_line(&container, first)?
                    ));
                    Ok(exitcode::DENIED)
                }
            }
        }
        Commands::Location { hierarchy } => {
            let id = container.hierarchy.resolve(hierarchy)?;
            let at = container.gating.user_location(&user, id)?;
            output::action("location", &section_line(&container, at)?);
            if let Some(record) = container.gating.location_record(&user, id) {
                output::detail(&format!("updated {}", record.updated_at.to_rfc3339()));
            }
            let visits = container.gating.visits(&user, id)?;
            if !visits.is_empty() {
                output::header("visits");
                for visit in visits {
                    output::detail(&format!(
                        "{:<10} {}  {}",
                        format!("{:?}", visit.status).to_lowercase(),
                        visit.last_visit.to_rfc3339(),
                        section_line(&container, visit.section)?
                    ));
                }
            }
            Ok(exitcode::OK)
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(exitcode::OK),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).map_err(InfraError::from)?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    Ok(settings)
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".to_string());
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| local_config_path(std::path::Path::new(".")));
            output::action("global", &global);
            output::action("local", &local.display());
            output::action("store", &load_settings(cli)?.store_path.display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(exitcode::OK)
}

fn resolve_section(c: &ServiceContainer, args: &SectionArgs) -> CliResult<SectionId> {
    let hierarchy = c.hierarchy.resolve(&args.hierarchy)?;
    Ok(c.hierarchy.resolve_section(hierarchy, &args.path)?)
}

/// `label (path)` of a section, `/` for the root.
fn section_line(c: &ServiceContainer, id: SectionId) -> CliResult<String> {
    let store = c.store.read();
    let hierarchy = store.hierarchy_of(id)?;
    let section = hierarchy.section(id)?;
    let path = hierarchy.path_of(id)?;
    Ok(format!(
        "{} ({})",
        section.label,
        if path.is_empty() { "/" } else { path.as_str() }
    ))
}

fn child_path(parent: &str, slug: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        slug.to_string()
    } else {
        format!("{parent}/{slug}")
    }
}

fn hierarchy_command(c: &ServiceContainer, command: &HierarchyCommands) -> CliResult<i32> {
    match command {
        HierarchyCommands::Create { name, base_url } => {
            let id = c.hierarchy.create_hierarchy(name, base_url)?;
            c.save()?;
            let summary = c.hierarchy.summary(id)?;
            output::success(&format!("created {} [{}]", summary.name, summary.slug));
        }
        HierarchyCommands::List => {
            let all = c.hierarchy.list();
            if all.is_empty() {
                output::warning("no hierarchies");
            }
            for h in all {
                output::info(&format!(
                    "{:<24} {:<32} {:>4} sections  {}",
                    h.slug, h.name, h.sections, h.id
                ));
            }
        }
        HierarchyCommands::Show { hierarchy, ids } => {
            let id = c.hierarchy.resolve(hierarchy)?;
            let tree = c
                .hierarchy
                .with_hierarchy(id, |h| output::hierarchy_tree(h, *ids))?;
            output::info(&tree);
        }
        HierarchyCommands::Delete { hierarchy } => {
            let id = c.hierarchy.resolve(hierarchy)?;
            c.hierarchy.delete_hierarchy(id)?;
            c.save()?;
            output::success(&format!("deleted {hierarchy}"));
        }
        HierarchyCommands::Copy { hierarchy, name } => {
            let source = c.hierarchy.resolve(hierarchy)?;
            let copy = c.versioning.copy_hierarchy(source, name)?;
            c.save()?;
            print_created(c, "copied to", copy)?;
        }
        HierarchyCommands::Export { hierarchy, output: file } => {
            let id = c.hierarchy.resolve(hierarchy)?;
            let json = c.versioning.export_json(id)?;
            match file {
                Some(path) => {
                    c.fs.write(path, &json)
                        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
                    output::success(&format!("exported to {}", path.display()));
                }
                None => output::info(&json),
            }
        }
        HierarchyCommands::Import { file } => {
            let json = c
                .fs
                .read_to_string(file)
                .map_err(|e| InfraError::io(format!("read {}", file.display()), e))?;
            let id = c.versioning.import_json(&json)?;
            c.save()?;
            print_created(c, "imported", id)?;
        }
    }
    Ok(exitcode::OK)
}

fn print_created(c: &ServiceContainer, label: &str, id: HierarchyId) -> CliResult<()> {
    let summary = c.hierarchy.summary(id)?;
    output::action(
        label,
        &format!("{} [{}], {} sections", summary.name, summary.slug, summary.sections),
    );
    Ok(())
}

fn section_command(c: &ServiceContainer, command: &SectionCommands) -> CliResult<i32> {
    match command {
        SectionCommands::Add {
            parent,
            label,
            slug,
        } => {
            let parent_id = resolve_section(c, parent)?;
            let id = c.hierarchy.add_child(parent_id, label, slug.as_deref())?;
            c.save()?;
            output::success(&format!("added {}", section_line(c, id)?));
        }
        SectionCommands::Edit {
            target,
            label,
            slug,
        } => {
            if label.is_none() && slug.is_none() {
                return Err(CliError::InvalidArgs(
                    "nothing to change, pass --label and/or --slug".to_string(),
                ));
            }
            let id = resolve_section(c, target)?;
            c.hierarchy
                .update_section(id, label.as_deref(), slug.as_deref())?;
            c.save()?;
            output::success(&format!("updated {}", section_line(c, id)?));
        }
        SectionCommands::Move {
            target,
            to,
            position,
        } => {
            let id = resolve_section(c, target)?;
            let hierarchy = c.hierarchy.resolve(&target.hierarchy)?;
            let new_parent = c.hierarchy.resolve_section(hierarchy, to)?;
            c.hierarchy
                .move_section(id, new_parent, position.unwrap_or(usize::MAX))?;
            c.save()?;
            output::success(&format!("moved {}", section_line(c, id)?));
        }
        SectionCommands::Delete { target } => {
            let id = resolve_section(c, target)?;
            let line = section_line(c, id)?;
            let removed = c.hierarchy.delete_section(id)?;
            c.save()?;
            output::success(&format!(
                "deleted {line} and {} descendants",
                removed.removed.len().saturating_sub(1)
            ));
        }
        SectionCommands::Unlock { target, lock } => {
            let id = resolve_section(c, target)?;
            c.hierarchy.set_unlocked(id, !lock)?;
            c.save()?;
            let state = if *lock { "locked" } else { "unlocked" };
            output::success(&format!("{state} {}", section_line(c, id)?));
        }
        SectionCommands::Reorder { parent, order } => {
            let parent_id = resolve_section(c, parent)?;
            let hierarchy = c.hierarchy.resolve(&parent.hierarchy)?;
            let ids = order
                .iter()
                .map(|slug| {
                    c.hierarchy
                        .resolve_section(hierarchy, &child_path(&parent.path, slug))
                })
                .collect::<Result<Vec<_>, _>>()?;
            c.hierarchy.reorder_children(parent_id, &ids)?;
            c.save()?;
            output::success(&format!("reordered {} children", ids.len()));
        }
        SectionCommands::Blocks { target } => {
            let id = resolve_section(c, target)?;
            for block in c.hierarchy.blocks(id)? {
                output::info(&format!(
                    "{:>3}. {:<8} {} {}",
                    block.ordinality, block.block_type, block.label, block.id
                ));
                for (key, value) in &block.context {
                    output::detail(&format!("{key}: {value}"));
                }
            }
        }
        SectionCommands::AddBlock {
            target,
            block_type,
            payload,
            label,
            css_extra,
        } => {
            let id = resolve_section(c, target)?;
            let payload: BlockPayload = serde_json::from_str(payload)
                .map_err(|e| CliError::InvalidArgs(format!("payload is not JSON: {e}")))?;
            let block = c
                .hierarchy
                .append_block(id, label, css_extra, block_type, &payload)?;
            c.save()?;
            output::success(&format!("added {block_type} block {block}"));
        }
    }
    Ok(exitcode::OK)
}

fn nav_command(c: &ServiceContainer, user: &UserId, command: &NavCommands) -> CliResult<i32> {
    match command {
        NavCommands::Flatten { hierarchy } => {
            let id = c.hierarchy.resolve(hierarchy)?;
            for section in c.navigation.flatten(id)?.iter() {
                output::info(&section_line(c, *section)?);
            }
        }
        NavCommands::Next { target } => {
            let id = resolve_section(c, target)?;
            match c.navigation.next(id)? {
                Some(next) => output::info(&section_line(c, next)?),
                None => output::warning("last section"),
            }
        }
        NavCommands::Prev { target } => {
            let id = resolve_section(c, target)?;
            match c.navigation.previous(id)? {
                Some(prev) => output::info(&section_line(c, prev)?),
                None => output::warning("first section"),
            }
        }
        NavCommands::Ancestors { target } => {
            let id = resolve_section(c, target)?;
            for ancestor in c.navigation.ancestors(id)?.iter() {
                output::info(&section_line(c, *ancestor)?);
            }
        }
        NavCommands::Closing { target } => {
            let id = resolve_section(c, target)?;
            for closing in c.navigation.closing_children(id)? {
                output::info(&section_line(c, closing)?);
            }
        }
        NavCommands::Page { target, gating } => {
            let id = resolve_section(c, target)?;
            let enforce = gating.resolve(c.gating.enforce_default());
            let view = c.navigation.page_view(user, id, enforce)?;
            let json = serde_json::to_string_pretty(&view)
                .map_err(|e| InfraError::serialization("serialize page view", e))?;
            output::info(&json);
        }
    }
    Ok(exitcode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path_joins_slugs() {
        assert_eq!(child_path("", "intro"), "intro");
        assert_eq!(child_path("/", "intro"), "intro");
        assert_eq!(child_path("intro/", "part-1"), "intro/part-1");
    }
}
