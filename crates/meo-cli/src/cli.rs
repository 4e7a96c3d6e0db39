use clap::{Parser, Subcommand};
use meo_core::ChunkAnchor;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meo", author, version, about = "Chunked methanol network optimization")]
pub struct Cli {
    /// Path to the run configuration file
    #[arg(long, global = true, default_value = "meo.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve one or more chunks in this process
    Chunk {
        /// Chunk anchors of the form x,y
        #[arg(required = true)]
        anchors: Vec<ChunkAnchor>,
    },
    /// Fan chunks out over worker processes or cluster jobs
    Dispatch {
        /// Submit cluster jobs via sbatch instead of running locally
        #[arg(long)]
        slurm: bool,
        /// Restrict the run to these anchors (default: every chunk)
        #[arg(long, value_delimiter = ' ')]
        chunks: Vec<ChunkAnchor>,
    },
    /// Merge all chunk result files into the final dataset
    Concat {
        /// Override the configured output path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_subcommand_parses_anchors() {
        let cli = Cli::try_parse_from(["meo", "chunk", "0,0", "5,10"]).unwrap();
        match cli.command {
            Commands::Chunk { anchors } => {
                assert_eq!(anchors, vec![ChunkAnchor::new(0, 0), ChunkAnchor::new(5, 10)]);
            }
            other => panic!("parsed {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("meo.toml"));
    }

    #[test]
    fn chunk_subcommand_requires_an_anchor() {
        assert!(Cli::try_parse_from(["meo", "chunk"]).is_err());
    }

    #[test]
    fn dispatch_accepts_a_chunk_list() {
        let cli = Cli::try_parse_from([
            "meo",
            "dispatch",
            "--config",
            "custom.toml",
            "--slurm",
            "--chunks",
            "0,0 5,0",
        ])
        .unwrap();
        match cli.command {
            Commands::Dispatch { slurm, chunks } => {
                assert!(slurm);
                assert_eq!(chunks, vec![ChunkAnchor::new(0, 0), ChunkAnchor::new(5, 0)]);
            }
            other => panic!("parsed {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn concat_output_is_optional() {
        let cli = Cli::try_parse_from(["meo", "concat"]).unwrap();
        match cli.command {
            Commands::Concat { output } => assert!(output.is_none()),
            other => panic!("parsed {other:?}"),
        }
    }
}
