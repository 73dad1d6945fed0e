//! Loop selection driver.
//!
//! Reads `param.json`, loads an IR module, and prints the loop selection
//! decisions for every configured kernel. Optionally writes the resulting
//! mapping plans as JSON for the DFG builder.

use clap::Parser;
use loopsel::config::TargetConfig;
use loopsel::core::{IrAdaptor, LoopAnalysis, LoopForest, LoopId, LoopSelector, LoopselError};
use loopsel::plan::MappingPlan;
use loopsel::test_ir::{TestIR, TestIRAdaptor};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loopsel", version, about = "Vectorization-aware loop selection for CGRA mapping")]
struct Cli {
    /// IR module: `.tir`, or `.ll`/`.bc` when built with the `llvm` feature.
    input: PathBuf,

    /// Target configuration.
    #[arg(short, long, default_value = "param.json")]
    param: PathBuf,

    /// Only analyze this function.
    #[arg(short, long)]
    function: Option<String>,

    /// Write the mapping plans as JSON.
    #[arg(long, value_name = "FILE")]
    emit_plan: Option<PathBuf>,

    /// Print each kernel's loop nest with classifications.
    #[arg(long)]
    print_loops: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Configuration problems are fatal before any IR is read.
    let config = match TargetConfig::load_or_default(&cli.param) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &TargetConfig) -> Result<(), LoopselError> {
    let is_llvm = cli
        .input
        .extension()
        .is_some_and(|ext| ext == "ll" || ext == "bc");
    let plans = if is_llvm {
        run_llvm(cli, config)?
    } else {
        run_tir(cli, config)?
    };

    if let Some(path) = &cli.emit_plan {
        let json = serde_json::to_string_pretty(&plans)?;
        fs::write(path, json).map_err(|source| LoopselError::Output {
            path: path.clone(),
            source,
        })?;
        log::info!("Wrote {} mapping plan(s) to {}", plans.len(), path.display());
    }
    Ok(())
}

fn run_tir(cli: &Cli, config: &TargetConfig) -> Result<Vec<MappingPlan>, LoopselError> {
    let text = fs::read_to_string(&cli.input).map_err(|source| LoopselError::Input {
        path: cli.input.clone(),
        source,
    })?;
    let ir = TestIR::parse(&text).map_err(|reason| LoopselError::Parse {
        path: cli.input.clone(),
        reason,
    })?;
    let mut adaptor = TestIRAdaptor::new(&ir);
    select_all(&mut adaptor, cli, config)
}

#[cfg(feature = "llvm")]
fn run_llvm(cli: &Cli, config: &TargetConfig) -> Result<Vec<MappingPlan>, LoopselError> {
    let context = inkwell::context::Context::create();
    let module = loopsel::llvm::load_module(&context, &cli.input).map_err(|reason| {
        LoopselError::Parse {
            path: cli.input.clone(),
            reason,
        }
    })?;
    let mut adaptor = loopsel::llvm::LlvmAdaptor::new(&module);
    select_all(&mut adaptor, cli, config)
}

#[cfg(not(feature = "llvm"))]
fn run_llvm(cli: &Cli, _config: &TargetConfig) -> Result<Vec<MappingPlan>, LoopselError> {
    Err(LoopselError::UnsupportedInput {
        reason: format!(
            "{} is LLVM IR; rebuild with `--features llvm`",
            display_name(&cli.input)
        ),
    })
}

#[cfg(not(feature = "llvm"))]
fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn select_all<A: IrAdaptor>(
    adaptor: &mut A,
    cli: &Cli,
    config: &TargetConfig,
) -> Result<Vec<MappingPlan>, LoopselError> {
    let funcs: Vec<A::FuncRef> = adaptor.funcs().collect();
    log::debug!("{} function(s) in module", adaptor.func_count());
    for kernel in config.kernels.names() {
        if !funcs.iter().any(|&f| adaptor.func_link_name(f) == kernel) {
            log::warn!("Kernel {} is not defined in {}", kernel, cli.input.display());
        }
    }
    if let Some(name) = &cli.function {
        if !funcs.iter().any(|&f| adaptor.func_link_name(f) == name) {
            return Err(LoopselError::FunctionNotFound { name: name.clone() });
        }
    }

    let selector = LoopSelector::new(config);
    let mut analysis = LoopAnalysis::new();
    let mut plans = Vec::new();

    for func in funcs {
        let name = adaptor.func_link_name(func).to_string();
        if cli.function.as_deref().is_some_and(|only| only != name) {
            continue;
        }
        if adaptor.func_is_declaration(func) || !config.is_kernel(&name) {
            log::debug!("Skipping {}: not a target kernel", name);
            continue;
        }

        let forest = analysis.switch_func(adaptor, func);
        if cli.print_loops {
            print_forest(&name, &*adaptor, &forest, &selector);
        }

        let selection = selector.select(&name, &*adaptor, &forest);
        for event in &selection.events {
            println!("{}", event);
        }
        if selection.is_empty() {
            log::info!("{}: no loops selected", name);
        }
        plans.push(MappingPlan::new(&name, &*adaptor, &forest, &selection, config));
    }

    Ok(plans)
}

fn print_forest<A: IrAdaptor>(
    name: &str,
    adaptor: &A,
    forest: &LoopForest<A::BlockRef>,
    selector: &LoopSelector<'_>,
) {
    println!("Loops of {} ({} total)", name, forest.len());
    for &top in forest.top_level_loops() {
        print_loop(adaptor, forest, selector, top);
    }
}

fn print_loop<A: IrAdaptor>(
    adaptor: &A,
    forest: &LoopForest<A::BlockRef>,
    selector: &LoopSelector<'_>,
    id: LoopId,
) {
    let lp = forest.get(id);
    let class = selector.classifier().classify(adaptor, forest, id);
    println!(
        "{}loop {} depth {}: {} ({} blocks)",
        "  ".repeat(lp.depth() as usize),
        adaptor.block_name(lp.header()),
        lp.depth(),
        class,
        lp.blocks().len()
    );
    for &sub in lp.sub_loops() {
        print_loop(adaptor, forest, selector, sub);
    }
}
