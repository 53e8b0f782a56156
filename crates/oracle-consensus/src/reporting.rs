//! Markdown consensus summary and on-disk artifacts for a resolution.

use std::path::Path;

use anyhow::{Context, Result};

use crate::consensus::{percent, ConsensusResult};
use crate::provable::ProvableConsensusData;
use crate::research::SealedRecord;

/// Render the human-readable consensus summary.
pub fn render_consensus_summary_md(
    consensus: &ConsensusResult,
    provable: &ProvableConsensusData,
) -> String {
    let yes_no = |b: bool| if b { "Yes" } else { "No" };
    let verification = &provable.verification;

    let mut out = String::new();
    out.push_str("# Consensus Summary\n\n");
    out.push_str(&format!(
        "**Consensus Reached:** {}\n**Outcome:** {}\n**Confidence:** {}\n**Agent Agreement:** {}\n**Weighted Agreement:** {}\n",
        yes_no(consensus.reached),
        consensus.outcome,
        percent(consensus.confidence),
        percent(consensus.agreement_ratio),
        percent(consensus.weighted_ratio),
    ));
    if consensus.requires_human_review {
        out.push_str("**Human Review Required:** Yes\n");
    }
    if let Some(reason) = &consensus.reason {
        out.push_str(&format!("**Reason:** {}\n", reason));
    }

    out.push_str("\n## Source Verification\n");
    out.push_str(&format!(
        "- Tier 1 Sources: {}\n- Tier 2 Sources: {}\n- Total Unique Sources: {}\n- Verification Passed: {}\n",
        verification.tier1_sources,
        verification.tier2_sources,
        verification.unique_sources,
        yes_no(verification.passed),
    ));

    if !provable.tier_distribution.is_empty() {
        out.push_str("\n### Tier Distribution\n");
        for (tier, count) in &provable.tier_distribution {
            let label = serde_json::to_value(tier)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            out.push_str(&format!("- `{}`: {}\n", label, count));
        }
    }

    if !verification.issues.is_empty() {
        out.push_str("\n### Issues\n");
        for issue in &verification.issues {
            out.push_str(&format!("- {}\n", issue));
        }
    }

    if !verification.warnings.is_empty() {
        out.push_str("\n### Warnings\n");
        for warning in &verification.warnings {
            out.push_str(&format!("- {}\n", warning));
        }
    }

    if let Some(da) = provable.disagreement.as_ref().filter(|d| d.has_disagreement) {
        let distribution = da
            .outcome_distribution
            .iter()
            .map(|(outcome, n)| format!("{}: {}", outcome, n))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str("\n## Disagreement Analysis\n");
        out.push_str(&format!(
            "- Outcome Distribution: {}\n- Requires Manual Review: {}\n",
            distribution,
            yes_no(da.requires_manual_review),
        ));
        if !da.contributing_factors.is_empty() {
            out.push_str("- Contributing Factors:\n");
            for factor in &da.contributing_factors {
                out.push_str(&format!("  - {}\n", factor));
            }
        }
    }

    out.push_str(&format!("\n---\n*Data Hash: {}*\n", provable.data_hash));
    out
}

/// Write consensus_summary.md.
pub fn write_consensus_summary_md(
    path: &Path,
    consensus: &ConsensusResult,
    provable: &ProvableConsensusData,
) -> Result<()> {
    let md = render_consensus_summary_md(consensus, provable);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the exact canonical bytes of a sealed record.
pub fn write_sealed_json<T>(path: &Path, sealed: &SealedRecord<T>) -> Result<()> {
    std::fs::write(path, sealed.canonical_bytes()).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
