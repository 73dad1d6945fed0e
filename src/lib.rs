//! loopsel - vectorization-aware loop selection for CGRA mapping.
//!
//! loopsel decides which loops of a kernel are handed to the
//! data-flow-graph builder of a CGRA mapping flow. Loops whose instructions
//! produce or consume vector values are preferred over scalar ones; explicit
//! loop indices from `param.json` refer to positions in that
//! vectorized-first order.
//!
//! # Primary Usage
//!
//! ```ignore
//! use loopsel::config::TargetConfig;
//! use loopsel::core::{IrAdaptor, LoopAnalysis, LoopSelector};
//! use loopsel::test_ir::{TestIR, TestIRAdaptor};
//!
//! let config = TargetConfig::load(Path::new("param.json"))?;
//! let ir = TestIR::parse(&source)?;
//! let mut adaptor = TestIRAdaptor::new(&ir);
//! let func = adaptor.func_by_name("kernel").unwrap();
//! let forest = LoopAnalysis::new().switch_func(&mut adaptor, func);
//! let selection = LoopSelector::new(&config).select("kernel", &adaptor, &forest);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Adaptor trait, loop analysis, classifier and selector
//! - [`config`] - Target configuration and `param.json` loading
//! - [`plan`] - Hand-off record for the DFG builder
//! - [`test_ir`] - Typed textual IR for tests and small inputs
//! - `llvm` - inkwell-backed adaptor (feature `llvm`)

pub mod config;
pub mod core;
pub mod plan;
pub mod test_ir;

#[cfg(feature = "llvm")]
pub mod llvm;

pub use crate::config::{KernelTargets, MappingParams, TargetConfig};
pub use crate::core::{
    // Framework traits
    IrAdaptor, TypeClass,
    // Loop analysis
    Loop, LoopAnalysis, LoopForest, LoopId,
    // Classification and selection
    ClassifyScope, LoopClass, VectorOpClassifier,
    CandidateList, LoopSelector, SelectedLoop, Selection, SelectionEvent,
    // Errors
    ConfigError, LoopselError,
};
pub use crate::plan::{MappingPlan, PlannedLoop};
