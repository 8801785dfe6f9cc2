//! Final text assembly. All validation happened upstream; this module only
//! lays the resolved pieces out in the fixed section order: scheduler
//! directives, environment/modules, staging, execution, result copy-back.

use super::policy::ResourceDirectives;
use super::scratch::ScratchPlan;
use super::toolchain::ToolchainSelection;
use super::{JobRequest, Program};
use crate::identity::Identity;
use std::fmt;
use std::fmt::Write;

const NOTIFICATION_DOMAIN: &str = "klingon.uab.cat";

/// result extensions ORCA copies back to the submission directory
const ORCA_RESULTS: &[&str] = &[
    "gbw", "txt", "loc", "qro", "uno", "unso", "xyz", "prop",
];

/// The rendered job script. Created once, handed to the writer, never
/// touched again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedScript(String);

impl RenderedScript {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// named sections appended in a fixed order, one blank line between them
struct Sections(Vec<String>);

impl Sections {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn push(&mut self, section: String) {
        self.0.push(section);
    }

    fn finish(self) -> RenderedScript {
        let mut text = self.0.join("\n\n");
        text.push('\n');
        RenderedScript(text)
    }
}

pub fn render(
    request: &JobRequest,
    identity: &Identity,
    resources: &ResourceDirectives,
    toolchain: &ToolchainSelection,
    scratch: &ScratchPlan,
) -> RenderedScript {
    let mut sections = Sections::new();
    sections.push(directives(request, identity, resources));
    sections.push(environment(request, toolchain));
    sections.push(staging(identity, scratch));
    sections.push(execution(request, toolchain));
    sections.push(results(request));
    sections.finish()
}

fn directives(request: &JobRequest, identity: &Identity, resources: &ResourceDirectives) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "#PBS -q {}", request.queue);
    let _ = writeln!(block, "#PBS -N {}", request.input);
    let _ = writeln!(block, "#PBS -M {}@{NOTIFICATION_DOMAIN}", identity.user);
    let _ = writeln!(block, "#PBS -l {}", resources.nodes);
    if let Some(walltime) = resources.walltime {
        let _ = writeln!(block, "#PBS -l walltime={walltime}");
    }
    if let Some(mem_gb) = resources.mem_gb {
        let _ = writeln!(block, "#PBS -l mem={mem_gb}GB");
    }
    let _ = writeln!(block, "#PBS -k oe");
    block.push_str("#PBS -r n");
    block
}

fn environment(request: &JobRequest, toolchain: &ToolchainSelection) -> String {
    let profile = match request.program {
        Program::Cp2k | Program::Gold => "/QFcomm/modules.profile",
        Program::Gaussian | Program::Orca => "/QFcomm/environment.bash",
    };

    let mut block = String::from("### ENVIRONMENT ###\n");
    let _ = writeln!(block, ". {profile}");
    let _ = write!(block, "module load {}", toolchain.module);
    if let Some(companion) = &toolchain.companion_module {
        let _ = write!(block, "\nmodule load {companion}");
    }
    block
}

fn staging(identity: &Identity, scratch: &ScratchPlan) -> String {
    let mut block = ScratchPlan::header(&identity.user);
    let _ = write!(block, "\n{}", scratch.staging);
    if let Some(marker) = scratch.marker {
        let _ = write!(block, "\n{marker}");
    }
    block
}

fn execution(request: &JobRequest, toolchain: &ToolchainSelection) -> String {
    let command = &toolchain.command;
    let input = &request.input;
    let output = &request.output;

    let mut block = String::from("### EXECUTION ###\n");
    match request.program {
        Program::Cp2k => {
            let _ = write!(block, "{command} -i {input} -o {output}");
        }
        Program::Gaussian => {
            let _ = writeln!(block, "date > $PBS_O_WORKDIR/{output}");
            let _ = writeln!(block, "cat $PBS_NODEFILE >> $PBS_O_WORKDIR/{output}");
            let _ = writeln!(block, "{command} < $SWAP_DIR/{input} >> $PBS_O_WORKDIR/{output}");
            let _ = write!(block, "date >> $PBS_O_WORKDIR/{output}");
        }
        Program::Gold => {
            let _ = write!(block, "{command} {input}");
        }
        Program::Orca => {
            let _ = writeln!(block, "exec=`which orca`");
            let _ = writeln!(block, "echo $SWAP_DIR > $PBS_O_WORKDIR/{output}");
            let _ = writeln!(block, "echo \"********\" >> $PBS_O_WORKDIR/{output}");
            let _ = writeln!(block, "cat $PBS_NODEFILE >> $PBS_O_WORKDIR/{output}");
            let _ = writeln!(block, "echo \"********\" >> $PBS_O_WORKDIR/{output}");
            let _ = write!(block, "{command} {input} >> $PBS_O_WORKDIR/{output}");
        }
    }
    block
}

fn results(request: &JobRequest) -> String {
    let mut block = String::from("### RESULTS ###\n");
    match request.program {
        Program::Orca => {
            let lines = ORCA_RESULTS
                .iter()
                .map(|ext| format!("cp $SWAP_DIR/*.{ext} $PBS_O_WORKDIR/"))
                .collect::<Vec<_>>()
                .join("\n");
            block.push_str(&lines);
        }
        _ => {
            block.push_str("cp -f $SWAP_DIR/* $PBS_O_WORKDIR/$JOB_ID");
        }
    }
    block
}
