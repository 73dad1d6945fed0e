// This module serves as the central hub for loopsel's core components. It exports the
// host-IR boundary (the IrAdaptor trait and the TypeClass folding of value types), loop-nest
// discovery (LoopAnalysis computing RPO, dominators and natural loops into a LoopForest),
// the vector-operation classifier, the loop selector with its selection events, and the
// error types. Everything here is read-only with respect to the IR and keeps no state
// between invocations: each function gets a fresh forest, fresh candidate numbering and a
// fresh selection.

//! Core loop-selection infrastructure.
//!
//! # Key Components
//!
//! ## Adaptor (`adaptor`, `types`)
//! - Trait-based access to functions, blocks, successors and instruction types
//! - `TypeClass::is_vector` as the only type query selection depends on
//!
//! ## Loop analysis (`loops`)
//! - Reverse post-order and iterative dominators
//! - Natural loops nested into a deterministic `LoopForest`
//!
//! ## Classification (`classifier`)
//! - Vectorized vs. scalar, by result and operand types
//!
//! ## Selection (`selector`)
//! - Vectorized-first candidate numbering
//! - Explicit index selection with automatic fallback

pub mod adaptor;
pub mod classifier;
pub mod error;
pub mod loops;
pub mod selector;
pub mod types;

pub use adaptor::IrAdaptor;

pub use classifier::{
    ClassifyScope,
    LoopClass,
    VectorOpClassifier,
};

pub use error::{
    ConfigError,
    ConfigResult,
    LoopselError,
};

pub use loops::{
    Loop,
    LoopAnalysis,
    LoopForest,
    LoopId,
};

pub use selector::{
    CandidateList,
    LoopSelector,
    SelectedLoop,
    Selection,
    SelectionEvent,
};

pub use types::TypeClass;
