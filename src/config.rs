// This module holds the immutable target configuration that drives loop selection and
// the loader for the param.json file the mapping flow is configured with. TargetConfig is
// built once per run and passed by reference into the selector; nothing here is global or
// mutable after construction. Kernel targets are a typed mapping from function name to the
// set of explicit candidate indices requested for that function. MappingParams carries the
// fabric and mapper settings that loop selection does not interpret but hands through to
// the data-flow-graph builder unchanged. Loading checks every required key before
// deserializing, so a missing key is reported by name before any IR is touched.

//! Target configuration and `param.json` loading.

use crate::core::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Keys that must be present in `param.json`, in the order they are checked.
pub const REQUIRED_KEYS: [&str; 17] = [
    "row",
    "column",
    "targetFunction",
    "kernel",
    "targetNested",
    "targetLoopsID",
    "isTrimmedDemo",
    "doCGRAMapping",
    "isStaticElasticCGRA",
    "ctrlMemConstraint",
    "bypassConstraint",
    "regConstraint",
    "precisionAware",
    "vectorizationMode",
    "fusionStrategy",
    "heuristicMapping",
    "parameterizableCGRA",
];

/// Function name to explicit candidate indices.
///
/// An empty index set means the function is a target but no explicit
/// selection was made, so automatic selection applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelTargets {
    map: BTreeMap<String, BTreeSet<usize>>,
}

impl KernelTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as a kernel, merging `ids` into any existing entry.
    pub fn insert<I>(&mut self, name: impl Into<String>, ids: I)
    where
        I: IntoIterator<Item = usize>,
    {
        self.map.entry(name.into()).or_default().extend(ids);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Explicit indices for a kernel, `None` if it is not a target.
    pub fn loop_ids(&self, name: &str) -> Option<&BTreeSet<usize>> {
        self.map.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Settings consumed by the downstream mapper, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingParams {
    pub rows: u32,
    pub columns: u32,
    pub is_static_elastic_cgra: bool,
    pub is_trimmed_demo: bool,
    pub do_cgra_mapping: bool,
    pub ctrl_mem_constraint: u32,
    pub bypass_constraint: u32,
    pub reg_constraint: u32,
    pub precision_aware: bool,
    pub vectorization_mode: String,
    pub fusion_strategy: Vec<String>,
    pub heuristic_mapping: bool,
    pub parameterizable_cgra: bool,
}

impl Default for MappingParams {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 4,
            is_static_elastic_cgra: false,
            is_trimmed_demo: true,
            do_cgra_mapping: true,
            ctrl_mem_constraint: 200,
            bypass_constraint: 4,
            reg_constraint: 8,
            precision_aware: false,
            vectorization_mode: "all".to_string(),
            fusion_strategy: Vec::new(),
            heuristic_mapping: true,
            parameterizable_cgra: false,
        }
    }
}

/// Immutable configuration for one selection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetConfig {
    pub kernels: KernelTargets,
    /// Map the whole function as one unit instead of individual loops.
    pub target_entire_function: bool,
    /// Also consider the immediate sub-loops of top-level loops.
    pub target_nested: bool,
    /// Classify a loop by all of its blocks, sub-loop blocks included.
    pub classify_sub_loop_blocks: bool,
    pub params: MappingParams,
}

/// On-disk shape of `param.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParamFile {
    row: u32,
    column: u32,
    target_function: bool,
    kernel: String,
    target_nested: bool,
    #[serde(rename = "targetLoopsID")]
    target_loops_id: Vec<usize>,
    is_trimmed_demo: bool,
    #[serde(rename = "doCGRAMapping")]
    do_cgra_mapping: bool,
    #[serde(rename = "isStaticElasticCGRA")]
    is_static_elastic_cgra: bool,
    ctrl_mem_constraint: u32,
    bypass_constraint: u32,
    reg_constraint: u32,
    precision_aware: bool,
    vectorization_mode: String,
    fusion_strategy: Vec<String>,
    heuristic_mapping: bool,
    #[serde(rename = "parameterizableCGRA")]
    parameterizable_cgra: bool,
    #[serde(default)]
    classify_sub_loop_blocks: bool,
    #[serde(default)]
    additional_kernels: BTreeMap<String, Vec<usize>>,
}

impl TargetConfig {
    /// Empty configuration: no kernels, default mapper settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kernel with explicit candidate indices (may be empty).
    pub fn with_kernel<I>(mut self, name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.kernels.insert(name, ids);
        self
    }

    pub fn with_target_nested(mut self, target_nested: bool) -> Self {
        self.target_nested = target_nested;
        self
    }

    pub fn with_target_entire_function(mut self, target_entire_function: bool) -> Self {
        self.target_entire_function = target_entire_function;
        self
    }

    pub fn with_classify_sub_loop_blocks(mut self, enabled: bool) -> Self {
        self.classify_sub_loop_blocks = enabled;
        self
    }

    /// Is `func_name` one of the configured kernels?
    pub fn is_kernel(&self, func_name: &str) -> bool {
        self.kernels.contains(func_name)
    }

    /// Parse the contents of a `param.json` file.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;

        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(ConfigError::MissingField { key });
            }
        }

        let param: ParamFile = serde_json::from_value(value)?;
        Ok(Self::from_param(param))
    }

    /// Load `param.json` from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::debug!(
            "Loaded {}: {} kernel(s), targetNested={}, targetFunction={}",
            path.display(),
            config.kernels.len(),
            config.target_nested,
            config.target_entire_function
        );
        Ok(config)
    }

    /// Load `param.json` if it exists, otherwise fall back to the defaults,
    /// under which no function is a kernel.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    fn from_param(param: ParamFile) -> Self {
        let mut kernels = KernelTargets::new();
        kernels.insert(param.kernel, param.target_loops_id);
        for (name, ids) in param.additional_kernels {
            kernels.insert(name, ids);
        }

        Self {
            kernels,
            target_entire_function: param.target_function,
            target_nested: param.target_nested,
            classify_sub_loop_blocks: param.classify_sub_loop_blocks,
            params: MappingParams {
                rows: param.row,
                columns: param.column,
                is_static_elastic_cgra: param.is_static_elastic_cgra,
                is_trimmed_demo: param.is_trimmed_demo,
                do_cgra_mapping: param.do_cgra_mapping,
                ctrl_mem_constraint: param.ctrl_mem_constraint,
                bypass_constraint: param.bypass_constraint,
                reg_constraint: param.reg_constraint,
                precision_aware: param.precision_aware,
                vectorization_mode: param.vectorization_mode,
                fusion_strategy: param.fusion_strategy,
                heuristic_mapping: param.heuristic_mapping,
                parameterizable_cgra: param.parameterizable_cgra,
            },
        }
    }
}
