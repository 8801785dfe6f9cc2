pub mod policy;
pub mod scratch;
pub mod script;
pub mod toolchain;

#[cfg(test)]
mod compiler_test;

use crate::identity::Identity;
use clap::ValueEnum;
use policy::PolicyError;
use script::RenderedScript;
use std::fmt;
use thiserror::Error;
use toolchain::{ToolchainError, ToolchainSelection};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

/// Programs the cluster knows how to run
/// (this is deliberately an enum and not a plugin trait, the policy tables
/// below match on it and stay checkable at compile time)
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Cp2k,
    #[value(alias = "g16")]
    Gaussian,
    Gold,
    Orca,
}

impl Program {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cp2k => "cp2k",
            Self::Gaussian => "gaussian",
            Self::Gold => "gold",
            Self::Orca => "orca",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Queue {
    Borg1,
    Borg2,
    Borg3,
    BorgTest,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borg1 => "borg1",
            Self::Borg2 => "borg2",
            Self::Borg3 => "borg3",
            Self::BorgTest => "borg-test",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the compiler needs to know about one submission.
/// Built once by the CLI layer, never mutated afterwards.
#[derive(Clone, Debug)]
pub struct JobRequest {
    pub program: Program,
    pub queue: Queue,
    pub nproc: u32,
    /// requested software version, `None` picks the program's default
    pub version: Option<String>,
    /// custom walltime in seconds, divided by nproc like the queue budgets
    pub walltime: Option<u64>,
    /// memory request in GB, only meaningful for ORCA
    pub mem_gb: Option<u64>,
    pub preserve_scratch: bool,
    pub multinode: bool,
    pub input: String,
    pub output: String,
}

impl JobRequest {
    /// true multi-node scatter: one processor per host across several hosts.
    /// Only GOLD supports it, the other programs pack one node.
    pub fn is_multinode(&self) -> bool {
        self.program == Program::Gold && self.multinode && self.nproc > 1
    }
}

pub struct CompiledJob {
    pub script: RenderedScript,
    pub toolchain: ToolchainSelection,
}

/// Resolve queue policy, toolchain and scratch staging for `request` and
/// render the job script. Pure: no filesystem access, no submission.
pub fn compile(request: &JobRequest, identity: &Identity) -> Result<CompiledJob, CompileError> {
    let resources = policy::resolve(request)?;
    let toolchain = toolchain::resolve(request)?;
    let staging = scratch::plan(request.preserve_scratch, request.is_multinode());

    let script = script::render(request, identity, &resources, &toolchain, &staging);

    Ok(CompiledJob { script, toolchain })
}
