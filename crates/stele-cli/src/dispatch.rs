use anyhow::Result;
use serde_json::json;
use stele_core::domain::LanguageSet;
use stele_core::{ExecutionOutcome, Repository, Resolved};

use crate::cli::{Command, SteleCli};

pub fn run(cli: &SteleCli) -> ExecutionOutcome {
    match execute(cli) {
        Ok(outcome) => outcome,
        Err(err) => ExecutionOutcome::from_error(&err),
    }
}

fn execute(cli: &SteleCli) -> Result<ExecutionOutcome> {
    let repo = Repository::open(&cli.store)?;
    match &cli.command {
        Command::Init => Ok(ExecutionOutcome::success(
            format!("store ready at {}", repo.path().display()),
            json!({ "path": repo.path() }),
        )),
        Command::Lookup { url, languages } => {
            let resolved = repo.translate(url, languages)?;
            let (message, details) = match &resolved {
                Resolved::Location { node_id } => {
                    (format!("location {node_id}"), json!({ "resolved": resolved }))
                }
                Resolved::Resource { resource } => {
                    (format!("resource {resource}"), json!({ "resolved": resolved }))
                }
                Resolved::Redirect { path } => {
                    (format!("redirect -> /{path}"), json!({ "resolved": resolved }))
                }
            };
            Ok(ExecutionOutcome::success(message, details))
        }
        Command::Path { node_id, languages } => {
            let path = repo.load_autogenerated_path(*node_id, languages)?;
            Ok(ExecutionOutcome::success(
                format!("/{path}"),
                json!({ "node_id": node_id, "path": path }),
            ))
        }
        Command::Aliases {
            node_id,
            custom_only,
        } => {
            let rows = repo.list_url_aliases(*node_id, *custom_only)?;
            let mut lines = vec![format!("{} active entries", rows.len())];
            let mut entries = Vec::new();
            for row in &rows {
                let kind = if row.is_alias { "custom" } else { "auto" };
                let set = LanguageSet::decode(row.lang_mask);
                let mut codes = repo.language_codes(&set)?;
                if set.always_available {
                    codes.push("*".to_string());
                }
                lines.push(format!(
                    "  {} {kind} {} [{}]",
                    row.id,
                    row.text,
                    codes.join(", ")
                ));
                entries.push(json!({ "entry": row, "languages": codes }));
            }
            Ok(ExecutionOutcome::success(
                lines.join("\n"),
                json!({ "node_id": node_id, "entries": entries }),
            ))
        }
        Command::Doctor => {
            let summary = repo.doctor()?;
            let message = if summary.is_clean() {
                "store is clean".to_string()
            } else {
                format!(
                    "repaired: {} without location, {} without parent, {} broken links, \
                     {} placeholders pruned, {} links repaired, {} conflicts removed",
                    summary.aliases_without_location,
                    summary.aliases_without_parent,
                    summary.broken_links_removed,
                    summary.nop_aliases_pruned,
                    summary.links_repaired,
                    summary.conflicting_rows_removed,
                )
            };
            Ok(ExecutionOutcome::success(message, json!({ "summary": summary })))
        }
        Command::Info => {
            let meta = repo.store_meta()?;
            let languages = repo.list_languages()?;
            let mut lines: Vec<String> = meta
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect();
            lines.push(format!(
                "languages: {}",
                languages
                    .iter()
                    .map(|(code, _)| code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            let meta_json: serde_json::Map<String, serde_json::Value> = meta
                .into_iter()
                .map(|(key, value)| (key, json!(value)))
                .collect();
            let language_codes: Vec<String> =
                languages.into_iter().map(|(code, _)| code).collect();
            Ok(ExecutionOutcome::success(
                lines.join("\n"),
                json!({ "meta": meta_json, "languages": language_codes }),
            ))
        }
    }
}
