use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use nicedag::dag::{Dag, DagConfig};
use nicedag::dimacs::DimacsSolver;
use nicedag::dot::DotConfig;
use nicedag::sat::MemorySolver;
use nicedag::solver::{NullSolver, Solver};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Backend {
    /// Write the clauses in DIMACS format.
    File,
    /// Solve in memory.
    Memory,
    /// Only count the clauses.
    #[value(name = "none")]
    Discard,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Translate a binary AIGER circuit into CNF")]
struct Cli {
    /// Input AIGER file (binary `aig` format).
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Where the clauses go.
    #[clap(long, value_enum, default_value = "file")]
    solver: Backend,

    /// Output DIMACS file (for `--solver file`).
    #[clap(short, long, value_name = "FILE", default_value = "out.cnf")]
    output: PathBuf,

    /// Disable the ITE pattern matcher.
    #[clap(long)]
    no_matching: bool,

    /// Name the root by a proxy literal.
    #[clap(long)]
    retractable: bool,

    /// Print graph statistics.
    #[clap(long)]
    stats: bool,

    /// Write the graph in DOT format, with the expansions.
    #[clap(long, value_name = "FILE")]
    graphviz: Option<PathBuf>,

    /// Largest clause that is merged into its parents without a proxy.
    #[clap(long, value_name = "INT", default_value = "3")]
    clause_max: usize,

    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log_level: simplelog::LevelFilter,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let dag = Dag::new(DagConfig {
        matching: !args.no_matching,
        clause_max: args.clause_max,
        ..DagConfig::default()
    });

    match args.solver {
        Backend::File => {
            let mut solver = DimacsSolver::create(&args.output)?;
            run(&dag, &args, &mut solver)?;
            println!(
                "Writing {} variables and {} clauses to {}",
                solver.num_vars(),
                solver.num_clauses(),
                args.output.display()
            );
            solver.finish()?;
        }
        Backend::Memory => {
            let mut solver = MemorySolver::new();
            run(&dag, &args, &mut solver)?;
            println!("{} variables, {} clauses", solver.num_vars(), solver.num_clauses());
            let answer = solver.solve();
            println!("s {}", answer);
        }
        Backend::Discard => {
            let mut solver = NullSolver::default();
            run(&dag, &args, &mut solver)?;
            println!("{} variables, {} clauses", solver.num_vars(), solver.num_clauses());
        }
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}

fn run<S: Solver>(dag: &Dag, args: &Cli, solver: &mut S) -> color_eyre::Result<()> {
    let aiger = dag.read_aiger_file(&args.input, solver)?;
    println!("header = {:?}", aiger.header);
    println!("dag = {:?}", dag);

    if args.stats {
        println!("{}", dag.stats(aiger.root));
        println!("ITE/IFF matches: {}", dag.num_matches());
    }

    let lit = dag.compile(aiger.root, args.retractable, solver);
    if let Some(lit) = lit {
        println!("root literal = {}", lit);
    }

    if let Some(path) = &args.graphviz {
        let config = DotConfig {
            show_counts: true,
            show_expansions: true,
            ..DotConfig::default()
        };
        let dot = dag.to_dot_with_config(&[aiger.root], &config)?;
        println!("DOT in {}", path.display());
        std::fs::write(path, dot)?;
    }

    Ok(())
}
