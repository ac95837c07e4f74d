use anyhow::Result;
use aws_sdk_dynamodb::types::AttributeValue;
use std::io::{self, Write};

use crate::driver::{Outcome, RunReport};
use crate::dynamodb::{Item, TableDeletion};

const ITEM_BORDER: &str = "************************************************";
const FAILURE_BORDER: &str = "--------------------------------------------------";

/// Renders one attribute value with its type descriptor, e.g. `S=[Perth]`.
pub fn render_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) => format!("S=[{s}]"),
        AttributeValue::N(n) => format!("N=[{n}]"),
        AttributeValue::Ss(values) => format!("SS=[{}]", values.join(",")),
        AttributeValue::Ns(values) => format!("NS=[{}]", values.join(",")),
        AttributeValue::Bool(b) => format!("BOOL=[{b}]"),
        AttributeValue::Null(_) => "NULL".to_string(),
        other => format!("{other:?}"),
    }
}

/// Renders every attribute of `item` as `Name S=[value]` lines, ordered by name.
pub fn render_item(item: &Item) -> String {
    let mut lines = vec![ITEM_BORDER.to_string()];
    lines.extend(
        item.sorted()
            .into_iter()
            .map(|(name, value)| format!("{name} {}", render_value(value))),
    );
    lines.push(ITEM_BORDER.to_string());
    lines.join("\n")
}

pub fn print_item(item: &Item) {
    println!("{}", render_item(item));
}

/// Renders a failed step: a header, the error, and its innermost cause when it differs.
pub fn render_failure(header: &str, error: &anyhow::Error) -> String {
    let mut lines = vec![
        header.to_string(),
        FAILURE_BORDER.to_string(),
        error.to_string(),
    ];
    let root_cause = error.root_cause().to_string();
    if root_cause != error.to_string() {
        lines.push(root_cause);
    }
    lines.push(FAILURE_BORDER.to_string());
    lines.join("\n")
}

pub fn print_failure(header: &str, error: &anyhow::Error) {
    println!("{}", render_failure(header, error));
}

/// Renders the table status and request id returned by a table deletion.
pub fn render_deletion(deletion: &TableDeletion) -> String {
    let status = deletion
        .status
        .as_ref()
        .map_or("UNKNOWN", |status| status.as_str());
    let request_id = deletion.request_id.as_deref().unwrap_or("-");
    format!("Status: {status} RequestId: {request_id}")
}

pub fn print_deletion(deletion: &TableDeletion) {
    println!("{}", render_deletion(deletion));
}

pub fn print_separator() {
    println!("----");
}

/// Prints one line per step followed by the overall result.
pub fn print_report(report: &RunReport) {
    println!("\n--- Run Summary ---");
    for step in report.steps() {
        match &step.outcome {
            Outcome::Succeeded => println!("[ok]     {}", step.step),
            Outcome::Failed(reason) => println!("[failed] {}: {reason}", step.step),
        }
    }
    let failed = report.failures().count();
    if report.halted() {
        println!("Run halted after {failed} failed step(s)");
    } else if failed > 0 {
        println!("Run completed with {failed} failed step(s)");
    } else {
        println!("Run completed successfully");
    }
    println!("-------------------\n");
}

/// Prompts the user for input and returns the entered string.
pub fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Blocks until the user presses Enter.
pub fn wait_for_enter() -> Result<()> {
    prompt("Press Enter to exit...")?;
    Ok(())
}
