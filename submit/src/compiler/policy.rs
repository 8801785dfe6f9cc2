use super::{JobRequest, Program, Queue};
use std::fmt;
use thiserror::Error;

/// Walltime budgets in seconds for a single processor. The realized
/// walltime is `budget / nproc`. borg3 has no budget at all.
const BORG1_BUDGET: u64 = 10_800_000;
const BORG2_BUDGET: u64 = 21_600_000;
const BORG_TEST_BUDGET: u64 = 129_600;

const BORG2_MIN_CORES: u32 = 12;
const BORG_TEST_MAX_CORES: u32 = 8;

/// Default ORCA memory request per processor, in GB.
const ORCA_MEM_PER_CORE_GB: u64 = 4;

/// The violated side of a queue's core limit, kept around so error
/// messages can name the offending bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreBound {
    AtLeast(u32),
    AtMost(u32),
}

impl fmt::Display for CoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(min) => write!(f, "no less than {min}"),
            Self::AtMost(max) => write!(f, "a maximum of {max}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{program} is not available in {queue}")]
    UnsupportedQueue { program: Program, queue: Queue },
    #[error("{queue} takes {bound} cores, asked for {nproc}")]
    ResourceConstraint {
        queue: Queue,
        bound: CoreBound,
        nproc: u32,
    },
}

/// `#PBS -l nodes=...` topology. Both single-allocation shapes and the
/// GOLD one-processor-per-host scatter have to be representable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSpec {
    /// one node, one processor
    Single { queue: Queue },
    /// one node, `ppn` processors
    Packed { queue: Queue, ppn: u32 },
    /// one processor on each of `nodes` hosts
    Scatter { nodes: u32 },
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { queue } => write!(f, "nodes=1:{queue}"),
            Self::Packed { queue, ppn } => write!(f, "nodes=1:{queue}:ppn={ppn}"),
            Self::Scatter { nodes } => write!(f, "nodes={nodes}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDirectives {
    pub nodes: NodeSpec,
    /// `None` renders no walltime directive (borg3 without an override)
    pub walltime: Option<u64>,
    /// memory request in GB, ORCA only
    pub mem_gb: Option<u64>,
}

/// Validate queue availability and core limits, then compute the resource
/// directives for `request`.
pub fn resolve(request: &JobRequest) -> Result<ResourceDirectives, PolicyError> {
    // JobRequest construction guarantees nproc >= 1
    debug_assert!(request.nproc >= 1);

    check_availability(request.program, request.queue)?;
    check_core_limits(request.queue, request.nproc)?;

    // A custom walltime is per-processor too, same as the queue budgets.
    // Historical cluster policy, flagged in DESIGN.md.
    let budget = request.walltime.or(queue_budget(request.queue));
    let walltime = budget.map(|seconds| seconds / u64::from(request.nproc));

    let nodes = if request.nproc == 1 {
        NodeSpec::Single {
            queue: request.queue,
        }
    } else if request.is_multinode() {
        NodeSpec::Scatter {
            nodes: request.nproc,
        }
    } else {
        NodeSpec::Packed {
            queue: request.queue,
            ppn: request.nproc,
        }
    };

    let mem_gb = match request.program {
        Program::Orca => Some(
            request
                .mem_gb
                .unwrap_or(ORCA_MEM_PER_CORE_GB * u64::from(request.nproc)),
        ),
        _ => None,
    };

    Ok(ResourceDirectives {
        nodes,
        walltime,
        mem_gb,
    })
}

fn queue_budget(queue: Queue) -> Option<u64> {
    match queue {
        Queue::Borg1 => Some(BORG1_BUDGET),
        Queue::Borg2 => Some(BORG2_BUDGET),
        Queue::Borg3 => None,
        Queue::BorgTest => Some(BORG_TEST_BUDGET),
    }
}

fn check_availability(program: Program, queue: Queue) -> Result<(), PolicyError> {
    match (program, queue) {
        (Program::Cp2k, Queue::Borg1) => Err(PolicyError::UnsupportedQueue { program, queue }),
        _ => Ok(()),
    }
}

fn check_core_limits(queue: Queue, nproc: u32) -> Result<(), PolicyError> {
    match queue {
        Queue::Borg2 if nproc < BORG2_MIN_CORES => Err(PolicyError::ResourceConstraint {
            queue,
            bound: CoreBound::AtLeast(BORG2_MIN_CORES),
            nproc,
        }),
        Queue::BorgTest if nproc > BORG_TEST_MAX_CORES => Err(PolicyError::ResourceConstraint {
            queue,
            bound: CoreBound::AtMost(BORG_TEST_MAX_CORES),
            nproc,
        }),
        _ => Ok(()),
    }
}
