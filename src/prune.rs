//! Static rejection of unproductive candidates.
//!
//! These checks are heuristic: the budgets keep the search tractable and can
//! in principle reject a program no other derivation reaches. That trade is
//! deliberate and the budgets are configurable per run.

use crate::ast::{Aexp, Cmd, Pgm};

/// Per-syntax-kind occurrence budgets.
#[derive(Debug, Clone, Copy)]
pub struct PruneConfig {
    /// Maximum number of `Seq` nodes in a program.
    pub max_seqs: usize,
    /// Maximum number of `For` nodes in a program.
    pub max_fors: usize,
    /// Maximum number of binary arithmetic nodes in a program.
    pub max_aexps: usize,
    /// Maximum depth of any arithmetic subtree.
    pub max_aexp_depth: u64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        PruneConfig {
            max_seqs: 3,
            max_fors: 2,
            max_aexps: 11,
            max_aexp_depth: 6,
        }
    }
}

#[derive(Default)]
struct Counts {
    seqs: usize,
    fors: usize,
    aexps: usize,
}

/// `true` when the candidate should be discarded without further expansion
/// or verification.
pub fn should_reject(pgm: &Pgm, config: &PruneConfig) -> bool {
    reject_cmd(&pgm.body, config, &mut Counts::default())
}

fn reject_cmd(cmd: &Cmd, config: &PruneConfig, counts: &mut Counts) -> bool {
    match cmd {
        Cmd::Hole => false,
        Cmd::Seq(pre, post) => {
            counts.seqs += 1;
            if counts.seqs > config.max_seqs {
                return true;
            }
            reject_cmd(pre, config, counts) || reject_cmd(post, config, counts)
        }
        Cmd::For(var, start, end, body) => {
            counts.fors += 1;
            if counts.fors > config.max_fors {
                return true;
            }
            // A ground body that never mentions the loop variable makes the
            // loop a plain repetition of the same commands.
            if body.terminated() && !body.references(var) {
                return true;
            }
            reject_aexp(start, config, counts)
                || reject_aexp(end, config, counts)
                || reject_cmd(body, config, counts)
        }
        Cmd::Gate(gate) => gate
            .args()
            .into_iter()
            .any(|arg| reject_aexp(arg, config, counts)),
    }
}

fn reject_aexp(aexp: &Aexp, config: &PruneConfig, counts: &mut Counts) -> bool {
    let (left, right) = match aexp {
        Aexp::Add(a, b) | Aexp::Sub(a, b) | Aexp::Mul(a, b) | Aexp::Div(a, b) => (a, b),
        _ => return false,
    };
    counts.aexps += 1;
    if counts.aexps > config.max_aexps {
        return true;
    }
    if aexp.depth() > config.max_aexp_depth {
        return true;
    }
    // Identical ground operands (x - x, x // x, ...) are redundant.
    if **left != Aexp::Hole && left == right {
        return true;
    }
    // Keep one canonical nesting per operator chain.
    let op = std::mem::discriminant(aexp);
    if std::mem::discriminant(&**left) == op || std::mem::discriminant(&**right) == op {
        return true;
    }
    reject_aexp(left, config, counts) || reject_aexp(right, config, counts)
}
