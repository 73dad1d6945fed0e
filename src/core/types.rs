//! Value type classification as seen by the loop selector.
//!
//! Adaptors fold the host IR's type system down to [`TypeClass`]. Only the
//! distinction between fixed-width vectors and everything else matters for
//! loop classification; the other variants exist so diagnostics stay readable.

use std::fmt;

/// Coarse classification of an IR value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// No value (stores, branches, void calls).
    Void,
    /// A single integer, float or pointer element.
    Scalar,
    /// A fixed-width vector of `lanes` scalar elements.
    Vector { lanes: u32 },
    /// Arrays and structs.
    Aggregate,
    /// Basic block operands of terminators.
    Label,
}

impl TypeClass {
    /// True if the type represents a fixed-width vector of scalars.
    pub const fn is_vector(self) -> bool {
        matches!(self, TypeClass::Vector { .. })
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::Void => write!(f, "void"),
            TypeClass::Scalar => write!(f, "scalar"),
            TypeClass::Vector { lanes } => write!(f, "<{} x scalar>", lanes),
            TypeClass::Aggregate => write!(f, "aggregate"),
            TypeClass::Label => write!(f, "label"),
        }
    }
}
