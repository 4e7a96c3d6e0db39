//! Fan chunks out over workers.
//!
//! Local mode runs one OS process per chunk through a bounded pool; a
//! crashing or infeasible chunk can then never take the batch down with
//! it, and the dispatcher classifies the failure from the worker's exit
//! code alone. SLURM mode submits groups of chunks as cluster jobs and
//! leaves scheduling to the cluster.
//!
//! The pool is fail-fast: the first worker failure kills every running
//! sibling and the batch stops. Cluster submissions are the opposite:
//! every group is submitted even when earlier submissions fail, and the
//! failures are reported together at the end.

use meo_core::{ChunkAnchor, ExitCode, MeoError, MeoResult, RunConfig};
use std::collections::HashSet;
use std::path::Path;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run every chunk as a local worker process, at most
/// `config.num_workers` at a time.
///
/// Workers are re-invocations of the current executable's `chunk`
/// subcommand against the same configuration file.
pub fn dispatch_local(
    config: &RunConfig,
    config_path: &Path,
    anchors: &[ChunkAnchor],
) -> MeoResult<()> {
    let exe = std::env::current_exe()
        .map_err(|err| MeoError::Dispatch(format!("cannot locate own executable: {err}")))?;
    let anchors = unique_anchors(anchors);
    let jobs: Vec<(String, Command)> = anchors
        .iter()
        .map(|anchor| {
            let mut command = Command::new(&exe);
            command
                .arg("chunk")
                .arg("--config")
                .arg(config_path)
                .arg(anchor.to_string());
            (anchor.to_string(), command)
        })
        .collect();
    info!(chunks = jobs.len(), workers = worker_limit(config.num_workers), "dispatching locally");
    run_pool(worker_limit(config.num_workers), jobs)
}

/// Submit the chunks as cluster jobs, `config.num_workers` chunks per
/// job, via `sbatch`.
pub fn dispatch_slurm(
    config: &RunConfig,
    config_path: &Path,
    anchors: &[ChunkAnchor],
) -> MeoResult<()> {
    let script = config.slurm_script.as_ref().ok_or_else(|| {
        MeoError::Config("slurm dispatch requires 'slurm_script' in the configuration".into())
    })?;

    let anchors = unique_anchors(anchors);
    let groups = chunk_groups(&anchors, worker_limit(config.num_workers));
    let total = groups.len();
    let mut failures = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        let chunk_list = group
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let result = Command::new("sbatch")
            .arg(script)
            .arg("--config")
            .arg(config_path)
            .arg("--chunks")
            .arg(&chunk_list)
            .output();
        match result {
            Ok(output) if output.status.success() => {
                info!(group = index, chunks = group.len(), "submitted cluster job");
            }
            Ok(output) => failures.push(format!(
                "group {index}: sbatch exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(err) => failures.push(format!("group {index}: failed to run sbatch: {err}")),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(MeoError::Dispatch(format!(
            "{} of {total} cluster submissions failed: {}",
            failures.len(),
            failures.join("; ")
        )))
    }
}

/// Drop repeated anchors, keeping first occurrences in order. Every chunk
/// file is owned by exactly one worker at a time; a repeated anchor would
/// race two workers on the same output.
fn unique_anchors(anchors: &[ChunkAnchor]) -> Vec<ChunkAnchor> {
    let mut seen = HashSet::new();
    let unique: Vec<ChunkAnchor> = anchors
        .iter()
        .copied()
        .filter(|anchor| seen.insert(*anchor))
        .collect();
    if unique.len() < anchors.len() {
        warn!(
            dropped = anchors.len() - unique.len(),
            "ignoring repeated chunk anchors"
        );
    }
    unique
}

/// `0` workers means one per CPU.
fn worker_limit(num_workers: usize) -> usize {
    if num_workers == 0 {
        num_cpus::get()
    } else {
        num_workers
    }
}

fn chunk_groups(anchors: &[ChunkAnchor], size: usize) -> Vec<Vec<ChunkAnchor>> {
    anchors.chunks(size.max(1)).map(|g| g.to_vec()).collect()
}

/// Drive labelled commands through a bounded process pool.
///
/// On the first failure every still-running sibling is killed and reaped
/// before the classified error is returned; queued jobs are never
/// started.
fn run_pool(limit: usize, jobs: Vec<(String, Command)>) -> MeoResult<()> {
    let mut pending = jobs.into_iter();
    let mut running: Vec<(String, Child)> = Vec::new();

    loop {
        while running.len() < limit.max(1) {
            match pending.next() {
                Some((label, mut command)) => match command.spawn() {
                    Ok(child) => {
                        info!(chunk = %label, "started chunk worker");
                        running.push((label, child));
                    }
                    Err(err) => {
                        cancel_all(&mut running);
                        return Err(MeoError::Dispatch(format!(
                            "failed to start worker for chunk {label}: {err}"
                        )));
                    }
                },
                None => break,
            }
        }
        if running.is_empty() {
            return Ok(());
        }

        let mut index = 0;
        while index < running.len() {
            let (label, child) = &mut running[index];
            match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    info!(chunk = %label, "chunk worker finished");
                    running.swap_remove(index);
                }
                Ok(Some(status)) => {
                    let err = classify_failure(label, status.code());
                    running.swap_remove(index);
                    cancel_all(&mut running);
                    return Err(err);
                }
                Ok(None) => index += 1,
                Err(err) => {
                    let label = label.clone();
                    running.swap_remove(index);
                    cancel_all(&mut running);
                    return Err(MeoError::Dispatch(format!(
                        "lost track of worker for chunk {label}: {err}"
                    )));
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn cancel_all(running: &mut Vec<(String, Child)>) {
    for (label, child) in running.drain(..) {
        warn!(chunk = %label, "cancelling chunk worker");
        let mut child = child;
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Re-raise a worker failure under the error kind its exit code encodes.
fn classify_failure(label: &str, code: Option<i32>) -> MeoError {
    let Some(code) = code else {
        return MeoError::Dispatch(format!("chunk {label} worker was terminated by a signal"));
    };
    match ExitCode::from_raw(code) {
        ExitCode::Config => MeoError::Config(format!("chunk {label} failed: configuration error")),
        ExitCode::Data => {
            MeoError::DataUnavailable(format!("chunk {label} failed: input data unavailable"))
        }
        ExitCode::Solve => MeoError::Solve(format!("chunk {label} failed: solver error")),
        ExitCode::Dispatch | ExitCode::Success | ExitCode::Failure => {
            MeoError::Dispatch(format!("chunk {label} worker exited with code {code}"))
        }
    }
}
