//! Installed package resolution

use tracing::debug;

use crate::bridge::Bridge;
use crate::error::Result;
use crate::keyword::KeywordExpression;

const PACKAGE_MARKER: &str = "package:";

/// Bridge arguments that list installed packages
pub fn list_packages_args() -> Vec<String> {
    ["shell", "pm", "list", "packages"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parse `pm list packages` output into package identifiers.
///
/// Lines without the `package:` marker are ignored. Order is preserved and
/// duplicates are kept.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(PACKAGE_MARKER))
        .map(|pkg| pkg.trim().to_string())
        .filter(|pkg| !pkg.is_empty())
        .collect()
}

/// Filter a listing with an optional keyword expression
pub fn filter_packages(packages: Vec<String>, expr: Option<&KeywordExpression>) -> Vec<String> {
    match expr {
        None => packages,
        Some(expr) => packages.into_iter().filter(|p| expr.matches(p)).collect(),
    }
}

/// Installed packages on one device, optionally filtered
pub async fn resolve_packages<B: Bridge + ?Sized>(
    bridge: &B,
    device: &str,
    expr: Option<&KeywordExpression>,
) -> Result<Vec<String>> {
    let output = bridge.capture(device, &list_packages_args()).await?;
    let packages = parse_package_list(&output);
    let total = packages.len();
    let matched = filter_packages(packages, expr);

    debug!(
        "{}: {} of {} package(s) match {}",
        device,
        matched.len(),
        total,
        expr.map(|e| e.to_string()).unwrap_or_else(|| "<all>".to_string())
    );

    Ok(matched)
}
