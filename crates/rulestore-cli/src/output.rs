use anyhow::Result;
use colored::Colorize;
use rulestore_core::{CasbinRule, VALUE_FIELDS};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_rules(rules: &[CasbinRule], format: OutputFormat) -> Result<()> {
    if rules.is_empty() && format == OutputFormat::Table {
        println!("No rules found.");
        return Ok(());
    }
    println!("{}", render_rules(rules, format)?);
    Ok(())
}

pub fn render_rules(rules: &[CasbinRule], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(rules)?,
        OutputFormat::Csv => rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => render_table(rules),
    };
    Ok(rendered)
}

fn render_table(rules: &[CasbinRule]) -> String {
    let mut builder = Builder::default();
    builder.push_record(std::iter::once("ptype").chain(VALUE_FIELDS));
    for rule in rules {
        let values = (0..VALUE_FIELDS.len()).map(|index| rule.field(index).unwrap_or(""));
        builder.push_record(std::iter::once(rule.ptype.as_str()).chain(values));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    format!("{table}\nTotal: {}", rules.len())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
