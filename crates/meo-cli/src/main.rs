use clap::Parser;
use meo_batch::{dispatch_local, dispatch_slurm, ChunkRunner};
use meo_core::{MeoResult, RunConfig};
use meo_io::concat_chunks;
use std::env;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        // Chunk workers run under the dispatcher, which classifies this
        // exit code; it must stay in sync with the error taxonomy.
        process::exit(err.exit_code() as i32);
    }
}

fn run(cli: Cli) -> MeoResult<()> {
    let config = RunConfig::from_file(&cli.config)?;

    match cli.command {
        Commands::Chunk { anchors } => {
            let runner = ChunkRunner::new(&config);
            for anchor in anchors {
                let path = runner.run(anchor)?;
                info!(%anchor, path = %path.display(), "chunk written");
            }
            Ok(())
        }
        Commands::Dispatch { slurm, chunks } => {
            let anchors = if chunks.is_empty() {
                config.chunk_grid()?.anchors()
            } else {
                chunks
            };
            let use_slurm = slurm || env::var_os("MEO_SLURM").is_some();
            if use_slurm {
                dispatch_slurm(&config, &cli.config, &anchors)
            } else {
                dispatch_local(&config, &cli.config, &anchors)
            }
        }
        Commands::Concat { output } => {
            let target = output.unwrap_or_else(|| config.output_path());
            let summary = concat_chunks(&config.solution_dir(), &target)?;
            info!(
                chunks = summary.chunks_merged,
                n_x = summary.n_x,
                n_y = summary.n_y,
                output = %target.display(),
                "merged chunk results"
            );
            Ok(())
        }
    }
}
