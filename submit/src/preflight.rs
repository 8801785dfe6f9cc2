//! Checks that have to pass before any resolution runs: the input file
//! must exist, and for Gaussian and ORCA its content has to agree with the
//! requested processor count.

use crate::compiler::{JobRequest, Program};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("{0} doesn't exist or isn't a file")]
    MissingInput(String),
    #[error("failed to read {path}: {source}")]
    UnreadableInput {
        path: String,
        source: std::io::Error,
    },
    #[error("asked for {expected} cores but the input sets {found}; the two have to match")]
    NprocMismatch { expected: u32, found: String },
    #[error("no %nproc= line in the input; add %nproc={expected}")]
    MissingNprocDirective { expected: u32 },
    #[error("parallel ORCA runs need Opt PAL {expected} or %pal nproc = {expected} in the input")]
    MissingPalDirective { expected: u32 },
}

pub fn check_input(request: &JobRequest) -> Result<(), PreflightError> {
    let path = Path::new(&request.input);
    if !path.is_file() {
        return Err(PreflightError::MissingInput(request.input.clone()));
    }

    match request.program {
        Program::Gaussian => check_gaussian_nproc(request)?,
        Program::Orca if request.nproc > 1 => check_orca_pal(request)?,
        _ => {}
    }

    debug!(input = %request.input, "input preflight passed");
    Ok(())
}

/// Gaussian reads its own core count from the input; a `%nproc=` line that
/// disagrees with the scheduler request would waste the allocation.
///
/// The comparison is a substring match, so `%nproc=42` satisfies a request
/// for 4 cores. Inherited cluster behavior, kept as is.
fn check_gaussian_nproc(request: &JobRequest) -> Result<(), PreflightError> {
    let content = read(&request.input)?;
    let wanted = format!("%nproc={}", request.nproc);

    for line in content.lines() {
        if line.contains(&wanted) {
            return Ok(());
        }
        if line.contains("%nproc=") {
            return Err(PreflightError::NprocMismatch {
                expected: request.nproc,
                found: line.trim().to_owned(),
            });
        }
    }

    Err(PreflightError::MissingNprocDirective {
        expected: request.nproc,
    })
}

/// ORCA parallelism is driven by the input's PAL block, not by mpirun alone.
fn check_orca_pal(request: &JobRequest) -> Result<(), PreflightError> {
    let content = read(&request.input)?;
    if content.contains("PAL") || content.contains("nproc") {
        Ok(())
    } else {
        Err(PreflightError::MissingPalDirective {
            expected: request.nproc,
        })
    }
}

fn read(path: &str) -> Result<String, PreflightError> {
    fs::read_to_string(path).map_err(|source| PreflightError::UnreadableInput {
        path: path.to_owned(),
        source,
    })
}

/// An output of `./` (or none at all) derives the name from the input with
/// the program's conventional suffix. GOLD names its own outputs.
pub fn resolve_output(program: Program, input: &str, output: Option<&str>) -> String {
    match output {
        Some(output) if output != "./" => output.to_owned(),
        _ => {
            let suffix = match program {
                Program::Cp2k | Program::Gold => "out",
                Program::Gaussian | Program::Orca => "qfi",
            };
            Path::new(input)
                .with_extension(suffix)
                .display()
                .to_string()
        }
    }
}
