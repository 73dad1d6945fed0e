//! LLVM front end.
//!
//! Loads LLVM modules through inkwell and exposes them via [`IrAdaptor`] so
//! loop analysis and selection run directly on clang output.
//!
//! # Example
//! ```ignore
//! use inkwell::context::Context;
//! use loopsel::llvm::{load_module, LlvmAdaptor};
//!
//! let context = Context::create();
//! let module = load_module(&context, Path::new("kernel.ll"))?;
//! let mut adaptor = LlvmAdaptor::new(&module);
//! ```
//!
//! [`IrAdaptor`]: crate::core::IrAdaptor

pub mod adaptor;

pub use adaptor::{load_module, LlvmAdaptor, LlvmBlockRef, LlvmFuncRef};
