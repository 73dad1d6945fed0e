//! Hand-off record for the data-flow-graph builder.
//!
//! A [`MappingPlan`] is what loop selection produces for one kernel: the
//! chosen loops with enough context to find them again in the IR, the two
//! targeting flags, and the mapper settings passed through from `param.json`.

use crate::config::{MappingParams, TargetConfig};
use crate::core::{IrAdaptor, LoopClass, LoopForest, Selection};
use serde::Serialize;

/// A selected loop as seen by the downstream builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedLoop {
    /// Position in the vectorized-then-scalar candidate list.
    pub candidate_index: usize,
    pub header: String,
    pub class: LoopClass,
    pub depth: u32,
    /// Names of all blocks of the loop, sub-loops included.
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingPlan {
    pub function: String,
    pub target_entire_function: bool,
    pub target_nested: bool,
    pub loops: Vec<PlannedLoop>,
    pub params: MappingParams,
}

impl MappingPlan {
    pub fn new<A: IrAdaptor>(
        function: &str,
        adaptor: &A,
        forest: &LoopForest<A::BlockRef>,
        selection: &Selection,
        config: &TargetConfig,
    ) -> Self {
        let loops = selection
            .loops
            .iter()
            .map(|selected| {
                let lp = forest.get(selected.id);
                PlannedLoop {
                    candidate_index: selected.candidate_index,
                    header: adaptor.block_name(lp.header()).to_string(),
                    class: selected.class,
                    depth: lp.depth(),
                    blocks: lp
                        .blocks()
                        .iter()
                        .map(|&b| adaptor.block_name(b).to_string())
                        .collect(),
                }
            })
            .collect();

        Self {
            function: function.to_string(),
            target_entire_function: config.target_entire_function,
            target_nested: config.target_nested,
            loops,
            params: config.params.clone(),
        }
    }
}
