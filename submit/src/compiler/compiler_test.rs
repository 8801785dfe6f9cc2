use super::policy::{self, CoreBound, NodeSpec, PolicyError};
use super::scratch;
use super::toolchain::{self, ToolchainError};
use super::{compile, JobRequest, Program, Queue};
use crate::identity::Identity;

fn request(program: Program, queue: Queue, nproc: u32) -> JobRequest {
    JobRequest {
        program,
        queue,
        nproc,
        version: None,
        walltime: None,
        mem_gb: None,
        preserve_scratch: false,
        multinode: false,
        input: "water.inp".to_owned(),
        output: "water.out".to_owned(),
    }
}

fn identity() -> Identity {
    Identity {
        user: "spock".to_owned(),
        hostname: "kirk.uab.es".to_owned(),
    }
}

#[test]
pub fn walltime_is_queue_budget_per_processor() {
    let resources = policy::resolve(&request(Program::Gaussian, Queue::Borg1, 4)).unwrap();
    assert_eq!(resources.walltime, Some(10_800_000 / 4));

    // floor division, not rounding
    let resources = policy::resolve(&request(Program::Gaussian, Queue::BorgTest, 7)).unwrap();
    assert_eq!(resources.walltime, Some(18_514));
}

#[test]
pub fn explicit_walltime_is_divided_like_the_budget() {
    let mut req = request(Program::Gold, Queue::Borg2, 12);
    req.walltime = Some(21_600_000);
    let resources = policy::resolve(&req).unwrap();
    assert_eq!(resources.walltime, Some(1_800_000));
}

#[test]
pub fn borg3_emits_no_walltime_unless_overridden() {
    let mut req = request(Program::Cp2k, Queue::Borg3, 12);
    assert_eq!(policy::resolve(&req).unwrap().walltime, None);

    let job = compile(&req, &identity()).unwrap();
    assert!(!job.script.as_str().contains("walltime"));

    req.walltime = Some(86_400);
    assert_eq!(policy::resolve(&req).unwrap().walltime, Some(86_400 / 12));
}

#[test]
pub fn borg2_rejects_fewer_than_twelve_cores() {
    for program in [Program::Cp2k, Program::Gaussian, Program::Gold, Program::Orca] {
        let result = policy::resolve(&request(program, Queue::Borg2, 11));
        assert!(matches!(
            result,
            Err(PolicyError::ResourceConstraint {
                queue: Queue::Borg2,
                bound: CoreBound::AtLeast(12),
                nproc: 11,
            })
        ));
    }
}

#[test]
pub fn borg_test_rejects_more_than_eight_cores() {
    let result = compile(&request(Program::Gaussian, Queue::BorgTest, 9), &identity());
    assert!(matches!(
        result,
        Err(super::CompileError::Policy(PolicyError::ResourceConstraint {
            queue: Queue::BorgTest,
            bound: CoreBound::AtMost(8),
            nproc: 9,
        }))
    ));
}

#[test]
pub fn cp2k_is_not_available_on_borg1() {
    let result = policy::resolve(&request(Program::Cp2k, Queue::Borg1, 4));
    assert!(matches!(
        result,
        Err(PolicyError::UnsupportedQueue {
            program: Program::Cp2k,
            queue: Queue::Borg1,
        })
    ));
}

#[test]
pub fn default_versions_resolve_to_documented_modules() {
    let cases = [
        (Program::Cp2k, "cp2k/6.1"),
        (Program::Gaussian, "gaussian/16-C.01"),
        (Program::Gold, "CSD/Enterprise2018"),
        (Program::Orca, "orca/4.2.1"),
    ];
    for (program, module) in cases {
        let selection = toolchain::resolve(&request(program, Queue::Borg3, 2)).unwrap();
        assert_eq!(selection.module, module);
    }
}

#[test]
pub fn unknown_versions_are_rejected_by_name() {
    let mut req = request(Program::Cp2k, Queue::Borg3, 2);
    req.version = Some("5.0".to_owned());
    match toolchain::resolve(&req) {
        Err(error @ ToolchainError::UnsupportedVersion { .. }) => {
            assert!(error.to_string().contains("5.0"));
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }

    // retired release, still known by name
    let mut req = request(Program::Orca, Queue::Borg3, 2);
    req.version = Some("2.7".to_owned());
    match toolchain::resolve(&req) {
        Err(error @ ToolchainError::UnsupportedVersion { .. }) => {
            assert!(error.to_string().contains("2.7"));
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
pub fn one_processor_runs_serial() {
    for program in [Program::Cp2k, Program::Gaussian, Program::Gold, Program::Orca] {
        let selection = toolchain::resolve(&request(program, Queue::Borg3, 1)).unwrap();
        assert!(!selection.command.contains("mpirun"), "{selection:?}");
    }
}

#[test]
pub fn parallel_runs_wrap_with_queue_transport() {
    let selection = toolchain::resolve(&request(Program::Cp2k, Queue::Borg2, 16)).unwrap();
    assert_eq!(selection.command, "mpirun -np 16 -mca blt openib,self cp2k.popt");

    let selection = toolchain::resolve(&request(Program::Gaussian, Queue::BorgTest, 4)).unwrap();
    assert_eq!(selection.command, "mpirun -np 4 -mca blt self gaussian");
}

#[test]
pub fn legacy_orca_loads_the_companion_mpi_module() {
    let mut req = request(Program::Orca, Queue::Borg2, 12);
    req.version = Some("2.8".to_owned());
    let selection = toolchain::resolve(&req).unwrap();
    assert_eq!(selection.version, "2.8.0");
    assert_eq!(
        selection.companion_module.as_deref(),
        Some("openmpi/1.8.1_intel2011-borg2")
    );

    // borg-test borrows borg3's legacy MPI build
    req.queue = Queue::BorgTest;
    req.nproc = 4;
    let selection = toolchain::resolve(&req).unwrap();
    assert_eq!(
        selection.companion_module.as_deref(),
        Some("openmpi/1.8.1_intel2011-borg3")
    );

    req.version = Some("4.2.1".to_owned());
    let selection = toolchain::resolve(&req).unwrap();
    assert_eq!(selection.companion_module, None);
}

#[test]
pub fn orca_memory_defaults_to_four_gb_per_core() {
    let resources = policy::resolve(&request(Program::Orca, Queue::Borg3, 4)).unwrap();
    assert_eq!(resources.mem_gb, Some(16));

    let mut req = request(Program::Orca, Queue::Borg3, 4);
    req.mem_gb = Some(8);
    assert_eq!(policy::resolve(&req).unwrap().mem_gb, Some(8));

    let resources = policy::resolve(&request(Program::Gaussian, Queue::Borg3, 4)).unwrap();
    assert_eq!(resources.mem_gb, None);
}

#[test]
pub fn node_topology_shapes() {
    let resources = policy::resolve(&request(Program::Gaussian, Queue::Borg1, 1)).unwrap();
    assert_eq!(resources.nodes, NodeSpec::Single { queue: Queue::Borg1 });
    assert_eq!(resources.nodes.to_string(), "nodes=1:borg1");

    let resources = policy::resolve(&request(Program::Gaussian, Queue::Borg2, 12)).unwrap();
    assert_eq!(resources.nodes.to_string(), "nodes=1:borg2:ppn=12");

    let mut req = request(Program::Gold, Queue::Borg3, 6);
    req.multinode = true;
    let resources = policy::resolve(&req).unwrap();
    assert_eq!(resources.nodes, NodeSpec::Scatter { nodes: 6 });
    assert_eq!(resources.nodes.to_string(), "nodes=6");

    // the flag only means scatter for GOLD
    let mut req = request(Program::Cp2k, Queue::Borg3, 6);
    req.multinode = true;
    let resources = policy::resolve(&req).unwrap();
    assert_eq!(resources.nodes.to_string(), "nodes=1:borg3:ppn=6");
}

#[test]
pub fn multi_node_staging_stages_each_distinct_host_once() {
    let plan = scratch::plan(false, true);
    // the nodefile lists one entry per processor, the loop runs over the
    // deduplicated host list
    assert!(plan.staging.contains("sort $machines | uniq > hosts"));
    assert_eq!(plan.staging.matches("ssh $node \"mkdir").count(), 1);
    assert_eq!(plan.staging.matches("ssh $node \"cp").count(), 1);
}

#[test]
pub fn retention_marker_follows_the_preserve_flag() {
    assert_eq!(
        scratch::plan(true, false).marker,
        Some("touch NO_ESBORRAR_SCRATCH")
    );
    assert_eq!(scratch::plan(false, false).marker, None);
}

#[test]
pub fn gold_on_borg2_with_twelve_cores_end_to_end() {
    let job = compile(&request(Program::Gold, Queue::Borg2, 12), &identity()).unwrap();
    let script = job.script.as_str();

    assert!(script.contains("#PBS -q borg2\n"));
    assert!(script.contains("#PBS -l walltime=1800000\n"));
    assert!(script.contains("module load CSD/Enterprise2018"));
    assert!(script.contains("#PBS -M spock@klingon.uab.cat\n"));
}

#[test]
pub fn sections_come_in_fixed_order() {
    let mut req = request(Program::Orca, Queue::Borg1, 4);
    req.preserve_scratch = true;
    let job = compile(&req, &identity()).unwrap();
    let script = job.script.as_str();

    let directives = script.find("#PBS -q borg1").unwrap();
    let environment = script.find("### ENVIRONMENT ###").unwrap();
    let staging = script.find("SWAP_DIR=/scratch/spock/$JOB_ID").unwrap();
    let marker = script.find("touch NO_ESBORRAR_SCRATCH").unwrap();
    let execution = script.find("### EXECUTION ###").unwrap();
    let results = script.find("### RESULTS ###").unwrap();

    assert_eq!(directives, 0);
    assert!(environment < staging);
    assert!(staging < marker);
    assert!(marker < execution);
    assert!(execution < results);

    assert!(script.contains("#PBS -l mem=16GB\n"));
    assert!(script.contains("exec=`which orca`"));
    assert!(script.contains("cp $SWAP_DIR/*.gbw $PBS_O_WORKDIR/"));
}
