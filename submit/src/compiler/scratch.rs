//! Scratch staging: how the working directory reaches the per-job scratch
//! space before execution. Scratch lives under `/scratch/<user>/<job id>`
//! and is purged by a janitor after 24 hours without writes unless the
//! retention marker is present.

/// `$PBS_JOBID` comes back fully qualified; scratch directories are keyed
/// by the bare numeric id.
const JOBID_SUFFIX: &str = ".kirk.uab.es";

const SCRATCH_ROOT: &str = "/scratch";

/// the janitor skips directories containing this marker file
const RETENTION_MARKER: &str = "touch NO_ESBORRAR_SCRATCH";

/// Single-node staging: create the scratch directory once and copy the
/// submission directory into it.
const LOCAL_STAGING: &str = r#"if [ ! -d "$SWAP_DIR" ]; then
    mkdir -p $SWAP_DIR || exit $?
    cp -r $PBS_O_WORKDIR/* $SWAP_DIR || exit $?
    cd $SWAP_DIR
fi"#;

/// Multi-node staging: replicate the scratch directory to every allocated
/// host. `$PBS_NODEFILE` lists one entry per processor, so the host list
/// goes through `sort | uniq` first and each distinct host is staged once.
const REPLICATED_STAGING: &str = r#"machines=$PBS_O_WORKDIR/machinefile
rm $machines hosts
cat $PBS_NODEFILE | perl -pe 's/.uab.es//g' > $machines
sort $machines | uniq > hosts

for node in `cat hosts`
do
    ssh $node "mkdir $SWAP_DIR"
    ssh $node "cp $PBS_O_WORKDIR/* $SWAP_DIR/"
done
cd $SWAP_DIR"#;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScratchPlan {
    pub staging: &'static str,
    pub marker: Option<&'static str>,
}

impl ScratchPlan {
    /// the `JOB_ID`/`SWAP_DIR` definitions every staging fragment builds on
    pub fn header(user: &str) -> String {
        format!("JOB_ID=${{PBS_JOBID%'{JOBID_SUFFIX}'}}\nSWAP_DIR={SCRATCH_ROOT}/{user}/$JOB_ID")
    }
}

pub fn plan(preserve_scratch: bool, multi_node: bool) -> ScratchPlan {
    ScratchPlan {
        staging: if multi_node {
            REPLICATED_STAGING
        } else {
            LOCAL_STAGING
        },
        marker: preserve_scratch.then_some(RETENTION_MARKER),
    }
}
