use anyhow::{Context, Result};
use casbin::Adapter;
use colored::Colorize;
use rulestore_adapter::RuleStoreAdapter;
use rulestore_core::bson;
use rulestore_core::{RuleFilter, format_policy_line};
use rulestore_storage::RuleCollection;

use super::section;
use crate::cli::{ListArgs, OutputFormat, RemoveFilteredArgs, RuleArgs};
use crate::output::{print_rules, print_success, print_warning};

/// Builds the store filter for `list`. Without options it selects every rule.
pub fn build_filter(args: &ListArgs) -> Result<RuleFilter> {
    if let Some(raw) = &args.raw {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("--raw is not valid JSON")?;
        let query = bson::to_document(&value).context("--raw must be a JSON object")?;
        return Ok(RuleFilter::raw(query));
    }

    Ok(RuleFilter {
        ptype: args.ptype.clone(),
        v0: args.v0.clone(),
        v1: args.v1.clone(),
        v2: args.v2.clone(),
        v3: args.v3.clone(),
        v4: args.v4.clone(),
        v5: args.v5.clone(),
        raw_query: None,
    })
}

/// Prints stored rules as they are in the store: in store order, duplicates
/// included.
pub async fn list<C: RuleCollection>(
    adapter: &RuleStoreAdapter<C>,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let rules = adapter.find_rules(&build_filter(args)?).await?;
    print_rules(&rules, format)
}

pub async fn add(adapter: &mut impl Adapter, args: &RuleArgs) -> Result<()> {
    let sec = section(&args.ptype)?;
    adapter
        .add_policy(sec, &args.ptype, args.values.clone())
        .await?;
    print_success(&format!(
        "Added {}",
        format_policy_line(&args.ptype, &args.values).cyan()
    ));
    Ok(())
}

pub async fn remove(adapter: &mut impl Adapter, args: &RuleArgs) -> Result<()> {
    let sec = section(&args.ptype)?;
    let line = format_policy_line(&args.ptype, &args.values);
    if adapter
        .remove_policy(sec, &args.ptype, args.values.clone())
        .await?
    {
        print_success(&format!("Removed {}", line.cyan()));
    } else {
        print_warning(&format!("No stored rule matches {line}"));
    }
    Ok(())
}

pub async fn remove_filtered(
    adapter: &mut impl Adapter,
    args: &RemoveFilteredArgs,
) -> Result<()> {
    let sec = section(&args.ptype)?;
    let removed = adapter
        .remove_filtered_policy(sec, &args.ptype, args.field_index, args.values.clone())
        .await?;
    if removed {
        print_success(&format!(
            "Removed {} rules with v{}.. = {}",
            args.ptype.cyan(),
            args.field_index,
            args.values.join(", ")
        ));
    } else {
        print_warning("No stored rule matches");
    }
    Ok(())
}

pub async fn clear<C: RuleCollection>(adapter: &RuleStoreAdapter<C>, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete every stored rule without --yes");
    }
    let deleted = adapter.delete_all().await?;
    print_success(&format!("Deleted {deleted} rules"));
    Ok(())
}
