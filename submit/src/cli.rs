use crate::compiler::{JobRequest, Program, Queue};
use crate::preflight;
use clap::Parser;

/// Submit cp2k, Gaussian16, GOLD and ORCA jobs to the kirk cluster.
#[derive(Parser, Debug)]
#[command(name = "kirksub")]
pub struct Cli {
    /// Program to run.
    #[arg(value_enum)]
    pub program: Program,

    /// Queue to submit to.
    #[arg(short, long, value_enum)]
    pub queue: Queue,

    /// Number of processors.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub nproc: u32,

    /// Version of the software you want to use.
    #[arg(short = 'v', long = "version")]
    pub version: Option<String>,

    /// Scratch won't be erased after 24 hours without writing.
    #[arg(short = 's', long = "noscr")]
    pub noscr: bool,

    /// Custom walltime in seconds. borg1 max: 10800000, borg2 max:
    /// 21600000, borg3 max: -, borg-test max: 129600.
    #[arg(short, long)]
    pub walltime: Option<u64>,

    /// Memory request in GB. ORCA only, defaults to 4GB per processor.
    #[arg(long)]
    pub mem: Option<u64>,

    /// Do not submit. Only create the script.pbs file.
    #[arg(short = 'N', long = "nosub")]
    pub nosub: bool,

    /// One processor per node across several hosts. GOLD only.
    #[arg(short, long)]
    pub multinode: bool,

    /// Input file name.
    pub input: String,

    /// Output file name.
    pub output: Option<String>,
}

impl Cli {
    pub fn to_request(&self) -> JobRequest {
        let output =
            preflight::resolve_output(self.program, &self.input, self.output.as_deref());

        JobRequest {
            program: self.program,
            queue: self.queue,
            nproc: self.nproc,
            version: self.version.clone(),
            walltime: self.walltime,
            mem_gb: self.mem,
            preserve_scratch: self.noscr,
            multinode: self.multinode,
            input: self.input.clone(),
            output,
        }
    }
}
