use crate::compiler::script::RenderedScript;
use std::fs;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

pub const SCRIPT_NAME: &str = "script.pbs";

const QSUB: &str = "/usr/local/torque/bin/qsub";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("failed to write script.pbs: {0}")]
    Write(std::io::Error),
    #[error("failed to run qsub: {0}")]
    Spawn(std::io::Error),
    #[error("qsub exited with {0}")]
    Rejected(std::process::ExitStatus),
}

/// Persist the rendered script next to the input, where qsub picks it up.
pub fn write_script(script: &RenderedScript) -> Result<(), SubmitError> {
    fs::write(SCRIPT_NAME, script.as_str()).map_err(SubmitError::Write)?;
    debug!(script = SCRIPT_NAME, "job script written");
    Ok(())
}

/// Hand the written script to the batch queue.
pub fn submit() -> Result<(), SubmitError> {
    info!(command = QSUB, script = SCRIPT_NAME, "submitting");
    let status = Command::new(QSUB)
        .arg(SCRIPT_NAME)
        .status()
        .map_err(SubmitError::Spawn)?;

    if status.success() {
        Ok(())
    } else {
        Err(SubmitError::Rejected(status))
    }
}
