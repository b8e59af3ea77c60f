use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use casbin::{Adapter, DefaultModel, FileAdapter, Model};
use colored::Colorize;
use rulestore_adapter::{RuleStoreAdapter, SAVED_SECTIONS};
use rulestore_core::RuleFilter;
use rulestore_storage::RuleCollection;

use crate::cli::{ExportArgs, ImportArgs};
use crate::output::print_success;

/// Loads a policy CSV file into a fresh model built from `model_path`.
///
/// Lines whose policy type the model does not define are dropped.
pub async fn read_policy_file(model_path: &Path, policy_path: &Path) -> Result<DefaultModel> {
    let mut model = DefaultModel::from_file(model_path)
        .await
        .with_context(|| format!("Failed to read model: {}", model_path.display()))?;
    FileAdapter::new(policy_path.to_path_buf())
        .load_policy(&mut model)
        .await
        .with_context(|| format!("Failed to read file: {}", policy_path.display()))?;
    Ok(model)
}

/// Number of rules a save would write.
fn savable_rules(model: &DefaultModel) -> usize {
    SAVED_SECTIONS
        .iter()
        .filter_map(|sec| model.get_model().get(*sec).map(|assertions| (*sec, assertions)))
        .flat_map(|(sec, assertions)| {
            assertions
                .keys()
                .map(move |ptype| model.get_policy(sec, ptype).len())
        })
        .sum()
}

pub async fn import<C: RuleCollection>(
    adapter: &mut RuleStoreAdapter<C>,
    args: &ImportArgs,
) -> Result<()> {
    let mut model = read_policy_file(&args.model, &args.file).await?;
    let count = savable_rules(&model);

    if args.replace {
        let deleted = adapter.delete_all().await?;
        tracing::info!(deleted, "Cleared stored rules before import");
    }
    adapter.save_policy(&mut model).await?;
    print_success(&format!(
        "Imported {count} rules from {}",
        args.file.display().to_string().cyan()
    ));
    Ok(())
}

pub async fn export<C: RuleCollection>(
    adapter: &RuleStoreAdapter<C>,
    args: &ExportArgs,
) -> Result<()> {
    let rules: Vec<_> = adapter
        .find_rules(&RuleFilter::new())
        .await?
        .into_iter()
        .filter(|rule| !rule.is_degenerate())
        .collect();

    let mut contents = String::new();
    for rule in &rules {
        contents.push_str(&rule.to_string());
        contents.push('\n');
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &contents)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            print_success(&format!(
                "Exported {} rules to {}",
                rules.len(),
                path.display().to_string().cyan()
            ));
        }
        None => {
            io::stdout()
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulestore_core::bson::doc;
    use rulestore_db_memory::InMemoryCollection;

    const MODEL: &str = "\
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
";

    const POLICY: &str = "\
# permissions
p, alice, data1, read
p, bob, data2, write

g, alice, admin
p9, carol, data3
";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn import_args(dir: &tempfile::TempDir, policy: &str, replace: bool) -> ImportArgs {
        ImportArgs {
            file: write_file(dir, "policy.csv", policy),
            model: write_file(dir, "model.conf", MODEL),
            replace,
        }
    }

    #[tokio::test]
    async fn test_read_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = import_args(&dir, POLICY, false);
        let model = read_policy_file(&args.model, &args.file).await.unwrap();

        let rule: Vec<String> = ["alice", "data1", "read"].map(String::from).to_vec();
        assert!(model.has_policy("p", "p", rule));
        assert_eq!(model.get_policy("g", "g").len(), 1);
        // p9 is not defined by the model.
        assert_eq!(savable_rules(&model), 3);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = write_file(&dir, "model.conf", MODEL);
        let err = read_policy_file(&model, &dir.path().join("absent.csv"))
            .await
            .err().unwrap();
        assert!(err.to_string().starts_with("Failed to read file"));
    }

    #[tokio::test]
    async fn test_read_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let policy = write_file(&dir, "policy.csv", POLICY);
        let err = read_policy_file(&dir.path().join("absent.conf"), &policy)
            .await
            .err().unwrap();
        assert!(err.to_string().starts_with("Failed to read model"));
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = RuleStoreAdapter::new(InMemoryCollection::new());

        import(&mut adapter, &import_args(&dir, POLICY, false))
            .await
            .unwrap();
        assert_eq!(adapter.collection().len().await, 3);

        let output = dir.path().join("export.csv");
        export(
            &adapter,
            &ExportArgs {
                output: Some(output.clone()),
            },
        )
        .await
        .unwrap();

        let exported = fs::read_to_string(&output).unwrap();
        assert_eq!(
            exported,
            "p, alice, data1, read\n\
             p, bob, data2, write\n\
             g, alice, admin\n"
        );
    }

    #[tokio::test]
    async fn test_import_replace() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = RuleStoreAdapter::new(InMemoryCollection::new());
        adapter
            .add_policy("p", "p", vec!["carol".into(), "data9".into(), "read".into()])
            .await
            .unwrap();

        let args = import_args(&dir, "p, alice, data1, read\n", true);
        import(&mut adapter, &args).await.unwrap();

        let rules = adapter.find_rules(&RuleFilter::new()).await.unwrap();
        let lines: Vec<String> = rules.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["p, alice, data1, read"]);
    }

    #[tokio::test]
    async fn test_export_keeps_duplicates_and_skips_empty_rules() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = RuleStoreAdapter::new(InMemoryCollection::with_documents(vec![
            doc! { "_id": 1, "ptype": "g", "v0": "alice", "v1": "admin" },
            doc! { "_id": 2, "ptype": "p" },
            doc! { "_id": 3, "ptype": "g", "v0": "alice", "v1": "admin" },
        ]));

        let output = dir.path().join("export.csv");
        export(
            &adapter,
            &ExportArgs {
                output: Some(output.clone()),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "g, alice, admin\ng, alice, admin\n"
        );
    }
}
