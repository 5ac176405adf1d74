//! Enumerative synthesis of quantum-circuit-generating programs.
//!
//! Given a specification of input/output statevectors, the search explores
//! completions of a program sketch in cost order until one matches every
//! example when executed on the statevector simulator. See [`search`] for
//! the driver, [`transition`] for the refinement rules and [`spec`] for the
//! specification format.

pub mod angles;
pub mod ast;
pub mod parser;
pub mod prune;
pub mod search;
pub mod sim;
pub mod spec;
pub mod transition;
pub mod worklist;
