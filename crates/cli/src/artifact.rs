//! On-disk rule-set artifact and line-item input files.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cartwise_core::{
    coerce_identifier, coerce_item, LineItem, MiningAlgorithm, MiningConfig, RuleSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// One mining run: the ranked rules plus what produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetArtifact {
    pub format_version: u32,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub algorithm: MiningAlgorithm,
    pub min_support: f64,
    pub min_confidence: f64,
    pub transaction_count: usize,
    pub fingerprint: String,
    /// Sorted distinct item names seen in the mined transactions.
    pub products: Vec<String>,
    pub rules: RuleSet,
}

impl RuleSetArtifact {
    pub fn new(
        mining: &MiningConfig,
        transaction_count: usize,
        products: Vec<String>,
        rules: RuleSet,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            algorithm: mining.algorithm,
            min_support: mining.min_support,
            min_confidence: mining.min_confidence,
            transaction_count,
            fingerprint: rules.fingerprint(),
            products,
            rules,
        }
    }

    /// Product list for basket entry, falling back to the items named by rules.
    pub fn catalog(&self) -> Vec<String> {
        if self.products.is_empty() {
            self.rules.catalog()
        } else {
            self.products.clone()
        }
    }
}

pub fn write_artifact(path: &Path, artifact: &RuleSetArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("could not create artifact directory `{}`", parent.display())
        })?;
    }

    let body = serde_json::to_string_pretty(artifact).context("could not serialize rule set")?;
    fs::write(path, body)
        .with_context(|| format!("could not write artifact `{}`", path.display()))?;
    Ok(())
}

/// Loads an artifact and re-validates its rules.
///
/// Rules are checked for canonical order and invariants during deserialization;
/// the stored fingerprint must also match the loaded rules.
pub fn read_artifact(path: &Path) -> Result<RuleSetArtifact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read artifact `{}`", path.display()))?;
    let artifact: RuleSetArtifact = serde_json::from_str(&raw)
        .with_context(|| format!("artifact `{}` is not a valid rule set", path.display()))?;

    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        bail!(
            "artifact `{}` has format version {} (expected {})",
            path.display(),
            artifact.format_version,
            ARTIFACT_FORMAT_VERSION
        );
    }

    let actual = artifact.rules.fingerprint();
    if actual != artifact.fingerprint {
        bail!(
            "artifact `{}` fingerprint mismatch: recorded {}, computed {}",
            path.display(),
            artifact.fingerprint,
            actual
        );
    }

    Ok(artifact)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemInput {
    pub records: Vec<LineItem>,
    /// Records dropped because they carried no usable order identifier.
    pub skipped: usize,
}

/// Reads a JSON array of line-item objects.
///
/// Both fields are coerced to strings, with integral float order ids written
/// as integers; a missing or null item is kept as a missing item, a missing or
/// null order id drops the record.
pub fn read_line_items(path: &Path, order_field: &str, item_field: &str) -> Result<LineItemInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read line items `{}`", path.display()))?;
    let rows: Vec<Map<String, Value>> = serde_json::from_str(&raw).with_context(|| {
        format!("line items `{}` must be a JSON array of objects", path.display())
    })?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0_usize;
    for row in rows {
        let Some(order_id) = row.get(order_field).and_then(coerce_identifier) else {
            skipped += 1;
            continue;
        };
        let item = row.get(item_field).and_then(coerce_item);
        records.push(LineItem { order_id, item });
    }

    if skipped > 0 {
        tracing::warn!(
            event_name = "cli.mine.records_skipped",
            skipped,
            order_field,
            "line items without an order identifier were skipped"
        );
    }

    Ok(LineItemInput { records, skipped })
}
