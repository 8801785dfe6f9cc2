use super::{JobRequest, Program, Queue};
use itertools::Itertools;
use thiserror::Error;

const CP2K_VERSIONS: &[&str] = &["6.1", "4.1"];
const CP2K_DEFAULT: &str = "6.1";

const GAUSSIAN_VERSIONS: &[&str] = &["16-C.01", "16"];
const GAUSSIAN_DEFAULT: &str = "16-C.01";

const GOLD_VERSIONS: &[&str] = &["2018"];
const GOLD_DEFAULT: &str = "2018";

const ORCA_VERSIONS: &[&str] = &["2.8", "3", "3.0.2", "3.0.3", "4", "4.1.2", "4.2.1"];
const ORCA_DEFAULT: &str = "4.2.1";

/// The legacy numerical-library toolchain old ORCA builds were linked
/// against. Modern builds ship their own MPI and need no companion module.
const ORCA_LEGACY_MPI: &str = "openmpi/1.8.1";
const ORCA_LEGACY_COMPILER: &str = "intel2011";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolchainError {
    #[error("{program} version {version} is not available in this system (available: {})",
            .supported.iter().join(", "))]
    UnsupportedVersion {
        program: Program,
        version: String,
        supported: &'static [&'static str],
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainSelection {
    pub version: String,
    /// `module load` target, e.g. `cp2k/6.1` or `CSD/Enterprise2018`
    pub module: String,
    /// secondary load line for version-dependent toolchains (legacy ORCA)
    pub companion_module: Option<String>,
    /// complete invocation prefix, serial binary or `mpirun`-wrapped
    pub command: String,
}

impl ToolchainSelection {
    /// modules joined for the script-information summary
    pub fn modules(&self) -> String {
        [Some(&self.module), self.companion_module.as_ref()]
            .into_iter()
            .flatten()
            .join(" ")
    }
}

/// Resolve the requested (or default) version to module loads and an
/// execution command for `request`.
pub fn resolve(request: &JobRequest) -> Result<ToolchainSelection, ToolchainError> {
    let (version, module, companion_module) = match request.program {
        Program::Cp2k => {
            let version = pick(request, CP2K_DEFAULT, CP2K_VERSIONS)?;
            (version.clone(), format!("cp2k/{version}"), None)
        }
        Program::Gaussian => {
            let version = pick(request, GAUSSIAN_DEFAULT, GAUSSIAN_VERSIONS)?;
            (version.clone(), format!("gaussian/{version}"), None)
        }
        Program::Gold => {
            // the module tree names GOLD releases after the CSD suite
            let version = format!("Enterprise{}", pick(request, GOLD_DEFAULT, GOLD_VERSIONS)?);
            (version.clone(), format!("CSD/{version}"), None)
        }
        Program::Orca => orca(request)?,
    };

    let command = command(request.program, request.queue, request.nproc);

    Ok(ToolchainSelection {
        version,
        module,
        companion_module,
        command,
    })
}

fn pick(
    request: &JobRequest,
    default: &str,
    supported: &'static [&'static str],
) -> Result<String, ToolchainError> {
    let version = request.version.as_deref().unwrap_or(default);
    if supported.contains(&version) {
        Ok(version.to_owned())
    } else {
        Err(ToolchainError::UnsupportedVersion {
            program: request.program,
            version: version.to_owned(),
            supported,
        })
    }
}

/// ORCA aliases short version names to full releases and still knows about
/// retired ones. Releases before 4 need the companion MPI module.
fn orca(request: &JobRequest) -> Result<(String, String, Option<String>), ToolchainError> {
    let requested = request.version.as_deref().unwrap_or(ORCA_DEFAULT);
    let (version, legacy) = match requested {
        "2" | "2.8" | "2.8.0" => ("2.8.0", true),
        "3" | "3.0" | "3.0.3" => ("3.0.3", true),
        "3.0.2" => ("3.0.2", true),
        "4" | "4.1.2" | "4.2.1" => (requested, false),
        // 2.7 was retired from the module tree; anything else never existed
        other => {
            return Err(ToolchainError::UnsupportedVersion {
                program: request.program,
                version: other.to_owned(),
                supported: ORCA_VERSIONS,
            })
        }
    };

    let companion_module = legacy.then(|| {
        // borg-test has no legacy MPI build of its own and borrows borg3's
        let queue = match request.queue {
            Queue::BorgTest => Queue::Borg3,
            queue => queue,
        };
        format!("{ORCA_LEGACY_MPI}_{ORCA_LEGACY_COMPILER}-{queue}")
    });

    Ok((
        version.to_owned(),
        format!("orca/{version}"),
        companion_module,
    ))
}

/// MPI transport class by queue tier: borg2 nodes talk infiniband, the
/// rest stay on the plain loopback transport.
fn transport(queue: Queue) -> &'static str {
    match queue {
        Queue::Borg2 => "openib,self",
        Queue::Borg1 | Queue::Borg3 | Queue::BorgTest => "self",
    }
}

fn binary(program: Program) -> &'static str {
    match program {
        Program::Cp2k => "cp2k.popt",
        Program::Gaussian => "gaussian",
        Program::Gold => "gold_auto",
        // resolved with `which` at execution time, see the script renderer
        Program::Orca => "$exec",
    }
}

fn command(program: Program, queue: Queue, nproc: u32) -> String {
    let binary = binary(program);
    if nproc == 1 {
        binary.to_owned()
    } else {
        // `blt` is the spelling the cluster's mpirun wrapper accepts
        format!("mpirun -np {nproc} -mca blt {} {binary}", transport(queue))
    }
}
