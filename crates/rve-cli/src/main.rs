use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rve_core::{CompiledResults, HomogenizationConfig, Homogenizer, LoadingTensorBuilder, NodeCloud};
use rve_io::{Deck, load_captured_results, load_test_case, save_json, save_results};
use rve_model::TestCase;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;

use cli::{Cli, Commands};

fn init_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_case(path: &Path) -> Result<TestCase> {
    load_test_case(path).with_context(|| format!("failed to load test case {}", path.display()))
}

/// Node cloud from `--mesh`, or from the node file the test case names
fn load_mesh(case: &TestCase, mesh: Option<PathBuf>) -> Result<NodeCloud> {
    let path = match mesh.or_else(|| case.mesh.node_file_absolute.clone()) {
        Some(path) => path,
        None => bail!("test case {} names no node file; pass --mesh", case.case_id),
    };
    let deck = Deck::parse_file(&path)
        .with_context(|| format!("failed to parse node deck {}", path.display()))?;
    let cloud = NodeCloud::from_deck(&deck)
        .with_context(|| format!("unusable node table in {}", path.display()))?;
    info!(path = %path.display(), nodes = cloud.len(), "loaded mesh");
    Ok(cloud)
}

fn check(cases: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for path in cases {
        let outcome = load_case(path).and_then(|case| {
            case.check_parameters()?;
            Ok(case)
        });
        match outcome {
            Ok(case) => println!(
                "ok      {} (case {}, {} load cases)",
                path.display(),
                case.case_id,
                case.num_load_cases()
            ),
            Err(err) => {
                failures += 1;
                println!("FAILED  {}: {err:#}", path.display());
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} test cases failed their checks", cases.len());
    }
    Ok(())
}

fn tensors(case: &Path, mesh: Option<PathBuf>, json: bool) -> Result<()> {
    let case = load_case(case)?;
    let cloud = load_mesh(&case, mesh)?;
    let extents = cloud.extents()?;
    let edge_lengths = extents.edge_lengths();
    let tensors = LoadingTensorBuilder::build(&case.loading.spec, edge_lengths);
    if json {
        let text = serde_json::to_string_pretty(&tensors).context("failed to serialize tensors")?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "Edge lengths: {} x {} x {}",
        edge_lengths[0], edge_lengths[1], edge_lengths[2]
    );

    let labels = case.loading.labels.as_deref().unwrap_or_default();
    for (index, tensor) in tensors.iter().enumerate() {
        match labels.get(index) {
            Some(label) => println!("\nLoad case {} ({label}):", index + 1),
            None => println!("\nLoad case {}:", index + 1),
        }
        println!("{tensor}");
    }
    Ok(())
}

fn deck(case: &Path, mesh: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let case = load_case(case)?;
    let cloud = load_mesh(&case, mesh)?;
    let sink = rve_core::generate_deck(&cloud, &case.loading, &HomogenizationConfig::default())
        .context("failed to generate periodic boundary conditions")?;

    let text = format!(
        "** Test case {} generated {}\n{}",
        case.case_id,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        sink.render()
    );
    match output {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote {} equations and {} steps to {}",
                sink.constraints().equations.len(),
                sink.step_count(),
                path.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn homogenize(case: &Path, results: &Path, json: Option<PathBuf>) -> Result<()> {
    let case = load_case(case)?;
    case.check_parameters()
        .with_context(|| format!("test case {} failed its parameter checks", case.case_id))?;
    let captured = load_captured_results(results)
        .with_context(|| format!("failed to load captured results {}", results.display()))?;
    if let Some(id) = &captured.case_id {
        if *id != case.case_id {
            warn!(captured = %id, case = %case.case_id, "captured results belong to a different case id");
        }
    }

    let homogenized = Homogenizer::homogenize_all(&captured.load_cases);
    let mut full_results = BTreeMap::new();
    let mut debug = BTreeMap::new();
    for (load_case, result) in homogenized {
        full_results.insert(load_case, result.properties);
        debug.insert(load_case, result.debug);
    }
    let compiled = CompiledResults::from_homogenized(&case.loading, full_results, debug)
        .context("failed to compile the report")?;

    let saved = save_results(&compiled.reported, &case.path, &case.case_id)?;
    if let Some(path) = json {
        save_json(&path, &compiled)?;
        println!("Full results written to {}", path.display());
    }

    println!(
        "Test case {} homogenized {}",
        case.case_id,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    if !compiled.compressed {
        println!("(report not compressed: some properties were requested by several load cases)");
    }
    println!("\n{}", compiled.reported);
    println!("Report saved to {}", saved.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Check { cases } => check(&cases),
        Commands::Tensors { case, mesh, json } => tensors(&case, mesh, json),
        Commands::Deck { case, mesh, output } => deck(&case, mesh, output),
        Commands::Homogenize {
            case,
            results,
            json,
        } => homogenize(&case, &results, json),
    }
}
