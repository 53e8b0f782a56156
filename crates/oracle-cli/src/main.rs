//! Oracle - multi-agent consensus CLI
//!
//! The `oracle` command resolves a batch of agent results from disk.
//!
//! ## Commands
//!
//! - `resolve`: Calculate consensus and write the sealed research record
//! - `merge`: Print the merged, deduplicated sources of a batch
//! - `hash`: Print the canonical SHA-256 of a JSON document
//! - `verify`: Check a JSON document against an expected hash

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use oracle_consensus::obs::{
    emit_consensus_calculated, emit_disagreement_analyzed, emit_hash_mismatch,
    emit_provable_data_built, emit_research_data_built, emit_verification_completed,
    ResolutionSpan,
};
use oracle_consensus::{
    analyze, calculate, calculate_strict, compute_digest, merge_sources, read_agent_results, verify,
    verify_payload, write_consensus_summary_md, write_sealed_json, AgentResult, ConsensusResult,
    ProvableConsensusData, ResearchDataBuilder, StrictConsensusConfig,
};

#[derive(Parser)]
#[command(name = "oracle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-agent oracle consensus engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a batch of agent results
    Resolve {
        /// Agent results (JSON array)
        #[arg(short, long)]
        results: PathBuf,

        /// Strict consensus config (JSON); defaults plus ORACLE_* env otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Supermajority threshold override
        #[arg(long, env = "ORACLE_THRESHOLD")]
        threshold: Option<f64>,

        /// Minimum agent count override
        #[arg(long, env = "ORACLE_MIN_AGENTS")]
        min_agents: Option<usize>,

        /// Plain weighted voting without the strict-mode bars
        #[arg(long)]
        lenient: bool,

        /// Market identifier recorded in the research data
        #[arg(long, default_value = "0")]
        market_id: u64,

        /// Question being resolved
        #[arg(long, default_value = "")]
        question: String,

        /// Resolution criteria
        #[arg(long, default_value = "")]
        criteria: String,

        /// Directory for research_data.json, research_data.sha256 and consensus_summary.md
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print merged sources of a batch
    Merge {
        /// Agent results (JSON array)
        #[arg(short, long)]
        results: PathBuf,
    },

    /// Print the canonical SHA-256 of a JSON document
    Hash {
        /// JSON document
        file: PathBuf,
    },

    /// Verify a JSON document against an expected SHA-256
    Verify {
        /// JSON document
        file: PathBuf,

        /// Expected hex digest
        #[arg(short, long)]
        expected: String,
    },
}

/// Options of the `resolve` subcommand.
struct ResolveArgs {
    results: PathBuf,
    config: Option<PathBuf>,
    threshold: Option<f64>,
    min_agents: Option<usize>,
    lenient: bool,
    market_id: u64,
    question: String,
    criteria: String,
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Resolution<'a> {
    consensus: &'a ConsensusResult,
    provable: &'a ProvableConsensusData,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    oracle_consensus::init_tracing(cli.json, level);

    match cli.command {
        Commands::Resolve {
            results,
            config,
            threshold,
            min_agents,
            lenient,
            market_id,
            question,
            criteria,
            output,
        } => cmd_resolve(ResolveArgs {
            results,
            config,
            threshold,
            min_agents,
            lenient,
            market_id,
            question,
            criteria,
            output,
        }),
        Commands::Merge { results } => cmd_merge(&results),
        Commands::Hash { file } => cmd_hash(&file),
        Commands::Verify { file, expected } => cmd_verify(&file, &expected),
    }
}

fn load_results(path: &Path) -> Result<Vec<AgentResult>> {
    read_agent_results(path).with_context(|| format!("Failed to load agent results: {:?}", path))
}

fn load_config(
    path: Option<&Path>,
    threshold: Option<f64>,
    min_agents: Option<usize>,
) -> Result<StrictConsensusConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {:?}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid consensus config: {:?}", path))?
        }
        None => StrictConsensusConfig::from_env(),
    };
    if let Some(threshold) = threshold {
        config.base.threshold = threshold;
    }
    if let Some(min_agents) = min_agents {
        config.base.min_agents = min_agents;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.threshold, args.min_agents)?;
    let results = load_results(&args.results)?;

    let resolution_id = format!("market-{}", args.market_id);
    let _span = ResolutionSpan::enter(&resolution_id);
    info!(agents = results.len(), lenient = args.lenient, "Resolving");

    let (consensus, provable) = if args.lenient {
        let consensus = calculate(&results, &config.base);
        let verification = verify(&results, &config);
        let disagreement = analyze(&results, &config);
        let provable =
            ProvableConsensusData::assemble(&results, &consensus, verification, disagreement)?;
        (consensus, provable)
    } else {
        calculate_strict(&results, &config)?
    };

    emit_consensus_calculated(&consensus);
    emit_verification_completed(&provable.verification);
    if let Some(disagreement) = &provable.disagreement {
        emit_disagreement_analyzed(disagreement);
    }
    emit_provable_data_built(&provable);

    let resolution = Resolution {
        consensus: &consensus,
        provable: &provable,
    };
    println!("{}", serde_json::to_string_pretty(&resolution)?);

    if let Some(dir) = &args.output {
        write_artifacts(dir, &args, &config, results, consensus, provable)?;
    }
    Ok(())
}

fn write_artifacts(
    dir: &Path,
    args: &ResolveArgs,
    config: &StrictConsensusConfig,
    results: Vec<AgentResult>,
    consensus: ConsensusResult,
    provable: ProvableConsensusData,
) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;

    let mut builder = ResearchDataBuilder::new(
        args.market_id,
        args.question.clone(),
        args.criteria.clone(),
    );
    builder.min_sources_per_agent(config.min_sources_per_agent);
    builder.start_research();
    let strategies = results.iter().map(|r| r.strategy.clone()).collect();
    builder.build_config(strategies, config)?;
    builder.set_merged_sources(merge_sources(&results));
    for result in results {
        builder.add_agent_result(result, None);
    }

    write_consensus_summary_md(&dir.join("consensus_summary.md"), &consensus, &provable)?;
    builder.set_consensus(consensus, Some(provable));
    builder.complete_research();
    let sealed = builder.build()?;

    write_sealed_json(&dir.join("research_data.json"), &sealed)?;
    let digest_path = dir.join("research_data.sha256");
    std::fs::write(&digest_path, format!("{}\n", sealed.sha256_hash))
        .with_context(|| format!("write {:?}", digest_path))?;

    emit_research_data_built(args.market_id, sealed.data.total_agents, &sealed.sha256_hash);
    eprintln!("Wrote research data to {:?}", dir);
    Ok(())
}

fn cmd_merge(results: &Path) -> Result<()> {
    let results = load_results(results)?;
    let merged = merge_sources(&results);
    println!("{}", serde_json::to_string_pretty(&merged)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Not valid JSON: {:?}", path))
}

fn cmd_hash(file: &Path) -> Result<()> {
    let value = read_json(file)?;
    println!("{}", compute_digest(&value)?);
    Ok(())
}

fn cmd_verify(file: &Path, expected: &str) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("read {:?}", file))?;
    let check = verify_payload(&text, expected)?;
    if !check.valid {
        emit_hash_mismatch(expected, &check.actual_hash);
        anyhow::bail!(
            "Hash mismatch for {:?}: expected {}, got {}",
            file,
            expected,
            check.actual_hash
        );
    }
    println!("Verified: {}", check.actual_hash);
    Ok(())
}
