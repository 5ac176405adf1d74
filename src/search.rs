//! The best-first search driver.
//!
//! The driver pops the cheapest pending program, discards it if the pruning
//! filter objects, verifies it against every testcase once it is ground, and
//! otherwise expands it back into the worklist. Cost is not monotonic under
//! refinement (filling a hole with a variable makes a program cheaper), so
//! this is plain exhaustive best-first enumeration, not A*; termination with
//! `Exhausted` relies on the pruning budgets making the space finite.

use std::time::{Duration, Instant};

use log::{debug, info};
use thiserror::Error;

use crate::angles;
use crate::ast::Pgm;
use crate::prune::{self, PruneConfig};
use crate::sim;
use crate::spec::Spec;
use crate::transition;
use crate::worklist::Worklist;

/// Terminal failures of a whole search run. Everything candidate-local
/// (verification mismatches, invalid arithmetic, bad qubit indices) is
/// handled inside the loop and never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("no solution found: search space exhausted")]
    Exhausted,
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Wall-clock budget for the whole run.
    pub timeout: Option<Duration>,
    pub prune: PruneConfig,
    /// Enable the rotation-parameter sub-search for `Ry`/`CRy` skeletons.
    pub angle_filling: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            timeout: None,
            prune: PruneConfig::default(),
            angle_filling: true,
        }
    }
}

/// Search from the empty sketch.
pub fn synthesize(spec: &Spec, options: &SearchOptions) -> Result<Pgm, SynthError> {
    synthesize_from(spec, Pgm::empty("n"), options)
}

/// Search from a user-supplied partial sketch.
pub fn synthesize_from(
    spec: &Spec,
    seed: Pgm,
    options: &SearchOptions,
) -> Result<Pgm, SynthError> {
    let start = Instant::now();
    let min_qubits = spec.min_qubits();
    let mut worklist = Worklist::new();
    worklist.put([seed]);

    let mut iterations = 0u64;
    while let Some(pgm) = worklist.get() {
        if let Some(budget) = options.timeout {
            if start.elapsed() > budget {
                return Err(SynthError::Timeout(budget));
            }
        }
        iterations += 1;
        debug!(
            "iteration {iterations} (cost {}, {} pending): {pgm:?}",
            pgm.cost(),
            worklist.len()
        );

        if prune::should_reject(&pgm, &options.prune) {
            continue;
        }

        if pgm.terminated() {
            if verified(spec, &pgm) {
                info!(
                    "solution found after {iterations} iterations in {:.2?}",
                    start.elapsed()
                );
                return Ok(pgm);
            }
            continue;
        }

        if options.angle_filling && angles::angle_ready(&pgm) {
            for candidate in angles::fill(&pgm, min_qubits) {
                if verified(spec, &candidate) {
                    info!(
                        "solution found after {iterations} iterations in {:.2?}",
                        start.elapsed()
                    );
                    return Ok(candidate);
                }
            }
            continue;
        }

        worklist.put(transition::expand(&pgm, &spec.gates));
    }

    info!(
        "worklist drained after {iterations} iterations in {:.2?}",
        start.elapsed()
    );
    Err(SynthError::Exhausted)
}

/// Testcases run in their fixed order; the first mismatch discards the
/// candidate, so a program is never partially credited.
fn verified(spec: &Spec, pgm: &Pgm) -> bool {
    spec.testcases.iter().all(|tc| sim::verify(pgm, tc))
}
