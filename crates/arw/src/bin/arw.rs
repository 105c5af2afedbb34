//! `arw`: solve and analyse ARW stationary distributions from the shell.

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use arw::analysis;
use arw::persist::{read_distribution, write_distribution, write_text_dumps, StoredDistribution};
use arw::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "arw",
    about = "Stationary distributions of activated random walk",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Explore the chain and solve for its stationary distribution.
    Solve {
        /// Graph family; the last vertex is the sink.
        #[arg(long, value_enum)]
        graph: GraphKind,
        /// Number of vertices, sink included.
        #[arg(long)]
        size: u32,
        /// Sleep probability. One value applies to every non-sink vertex;
        /// a comma-separated list gives one value per non-sink vertex in
        /// rank order.
        #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
        sleep: Vec<f64>,
        /// Seed particles.
        #[arg(long, default_value_t = 1)]
        particles: u32,
        #[arg(long, value_enum, default_value_t = ModeArg::Exact)]
        mode: ModeArg,
        /// Trajectories per transition in sampled mode.
        #[arg(long, default_value_t = 1000)]
        samples: u32,
        /// Random seed for sampled mode.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Microstates one exact relaxation may enumerate.
        #[arg(long, default_value_t = ExactRelaxation::DEFAULT_MAX_MICROSTATES)]
        max_microstates: u64,
        /// Firings one sampled trajectory may take.
        #[arg(long, default_value_t = SampledRelaxation::DEFAULT_MAX_TOPPLINGS)]
        max_topplings: u64,
        #[arg(long, value_enum, default_value_t = SolverArg::Auto)]
        solver: SolverArg,
        /// Directory for the blob and text dumps. Nothing is written
        /// without it.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Base name of the written files. Defaults to `<graph>-<size>`.
        #[arg(long)]
        name: Option<String>,
    },
    /// Print statistics of a stored distribution.
    Analyze {
        /// A blob written by `arw solve`.
        blob: PathBuf,
        /// Order of the joint intensities.
        #[arg(long, default_value_t = 1)]
        k: usize,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum GraphKind {
    Path,
    Cycle,
    Clique,
    Star,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ModeArg {
    Exact,
    Sampled,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SolverArg {
    Auto,
    Direct,
    GaussSeidel,
    Power,
}

impl GraphKind {
    fn build(self, size: u32) -> Result<Graph, GraphError> {
        match self {
            GraphKind::Path => presets::path(size),
            GraphKind::Cycle => presets::cycle(size),
            GraphKind::Clique => presets::clique(size),
            GraphKind::Star => presets::star(size),
        }
    }

    fn label(self) -> &'static str {
        match self {
            GraphKind::Path => "path",
            GraphKind::Cycle => "cycle",
            GraphKind::Clique => "clique",
            GraphKind::Star => "star",
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = execute(Cli::parse().command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn execute(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Solve {
            graph,
            size,
            sleep,
            particles,
            mode,
            samples,
            seed,
            max_microstates,
            max_topplings,
            solver,
            out,
            name,
        } => {
            let g = graph.build(size)?;
            let sleep = if sleep.len() == 1 {
                SleepProbabilities::uniform(&g, sleep[0])?
            } else {
                SleepProbabilities::new(&g, sleep)?
            };
            let config = PipelineConfig {
                particles,
                mode: match mode {
                    ModeArg::Exact => Mode::Exact,
                    ModeArg::Sampled => Mode::Sampled,
                },
                samples_per_transition: samples,
                rng_seed: seed,
                max_microstates,
                max_topplings,
                solver: match solver {
                    SolverArg::Auto => SolverMethod::default(),
                    SolverArg::Direct => SolverMethod::Direct,
                    SolverArg::GaussSeidel => SolverMethod::GaussSeidel,
                    SolverArg::Power => SolverMethod::PowerIteration,
                },
                ..PipelineConfig::default()
            };
            let result = run(&g, &sleep, &config, &mut LogObserver)?;

            let stdout = std::io::stdout();
            let mut w = BufWriter::new(stdout.lock());
            for (c, p) in result.iter() {
                writeln!(w, "{c}\t{p:.17}")?;
            }
            writeln!(
                w,
                "# {} configurations ({} discovered), residual {:e}",
                result.len(),
                result.metrics.discovered,
                result.residual()
            )?;
            w.flush()?;

            if let Some(dir) = out {
                std::fs::create_dir_all(&dir)?;
                let name = name.unwrap_or_else(|| format!("{}-{size}", graph.label()));
                let stored = StoredDistribution::new(
                    &g,
                    sleep.as_slice(),
                    result.index,
                    result.probabilities,
                );
                let blob = dir.join(format!("{name}.arwd"));
                let mut file = BufWriter::new(File::create(&blob)?);
                write_distribution(&mut file, &stored)?;
                file.flush()?;
                log::info!("wrote {}", blob.display());
                write_text_dumps(&dir, &name, &stored)?;
            }
            Ok(())
        }
        Command::Analyze { blob, k } => {
            let mut file = BufReader::new(File::open(&blob)?);
            let stored = read_distribution(&mut file)?;
            let (s, p) = (&stored.states, &stored.probabilities);

            let stdout = std::io::stdout();
            let mut w = BufWriter::new(stdout.lock());
            writeln!(w, "# {k}-point joint intensities")?;
            for v in analysis::joint_intensities(k, s, p)? {
                writeln!(w, "{v:.17}")?;
            }
            writeln!(w, "# pair correlations")?;
            for v in analysis::correlations(s, p)? {
                writeln!(w, "{v:.17}")?;
            }
            writeln!(w, "# survivors: k, P(exactly k), P(at least k)")?;
            for j in 0..=stored.sleep.len() {
                writeln!(
                    w,
                    "{j}\t{:.17}\t{:.17}",
                    analysis::survivors_exactly(j, s, p)?,
                    analysis::survivors_at_least(j, s, p)?
                )?;
            }
            w.flush()?;
            Ok(())
        }
    }
}
