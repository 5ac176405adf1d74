//! Bounded enumeration of rotation parameters.
//!
//! Structural search leaves the `p`/`den` slots of `Ry`/`CRy` open for a
//! long time: they range over a continuous-feeling space where cost-ordered
//! enumeration has little traction. Once a candidate is ground everywhere
//! else, this sub-search substitutes small integer linear combinations of
//! the in-scope symbols instead, exhaustively over a fixed coefficient grid.

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::ast::{Aexp, Cmd, Gate, Pgm};

/// Coefficient grid for the linear combinations.
pub const COEFFS: [i64; 5] = [2, 1, 0, -1, -2];

/// True when the only holes left in `pgm` are rotation-parameter slots of
/// `Ry`/`CRy` gates (each slot either ground or exactly a hole).
pub fn angle_ready(pgm: &Pgm) -> bool {
    !pgm.terminated() && cmd_ready(&pgm.body)
}

fn cmd_ready(cmd: &Cmd) -> bool {
    match cmd {
        Cmd::Hole => false,
        Cmd::Seq(pre, post) => cmd_ready(pre) && cmd_ready(post),
        Cmd::For(_, start, end, body) => {
            start.terminated() && end.terminated() && cmd_ready(body)
        }
        Cmd::Gate(gate) => gate_ready(gate),
    }
}

fn gate_ready(gate: &Gate) -> bool {
    match gate {
        Gate::Hole => false,
        Gate::H(q) | Gate::X(q) => q.terminated(),
        Gate::Cx(ctrl, tgt) => ctrl.terminated() && tgt.terminated(),
        Gate::Ry(q, p, den) => q.terminated() && slot_ready(p) && slot_ready(den),
        Gate::CRy(ctrl, tgt, p, den) => {
            ctrl.terminated() && tgt.terminated() && slot_ready(p) && slot_ready(den)
        }
    }
}

fn slot_ready(slot: &Aexp) -> bool {
    slot.terminated() || *slot == Aexp::Hole
}

/// Every ground instantiation of the open rotation parameters. `min_qubits`
/// anchors the positivity filter on the candidate expressions.
///
/// NOTE: calling this on a program that is not [`angle_ready`] is 100% an
/// API misuse.
pub fn fill(pgm: &Pgm, min_qubits: usize) -> Vec<Pgm> {
    assert!(angle_ready(pgm), "fill called on a non-angle-ready program");
    fill_cmd(&pgm.body, &pgm.param, 0, min_qubits)
        .into_iter()
        .map(|body| Pgm::new(pgm.param.clone(), body))
        .collect()
}

fn fill_cmd(cmd: &Cmd, param: &str, depth: usize, min_qubits: usize) -> Vec<Cmd> {
    match cmd {
        Cmd::Hole => unreachable!("command hole in an angle-ready program"),
        Cmd::Seq(pre, post) => {
            let posts = fill_cmd(post, param, depth, min_qubits);
            fill_cmd(pre, param, depth, min_qubits)
                .into_iter()
                .cartesian_product(posts)
                .map(|(pre, post)| Cmd::seq(pre, post))
                .collect()
        }
        Cmd::For(var, start, end, body) => fill_cmd(body, param, depth + 1, min_qubits)
            .into_iter()
            .map(|body| Cmd::for_loop(var.clone(), start.clone(), end.clone(), body))
            .collect(),
        Cmd::Gate(gate) => fill_gate(gate, param, depth, min_qubits)
            .into_iter()
            .map(Cmd::Gate)
            .collect(),
    }
}

fn fill_gate(gate: &Gate, param: &str, depth: usize, min_qubits: usize) -> Vec<Gate> {
    match gate {
        Gate::Ry(q, p, den) if !p.terminated() || !den.terminated() => {
            rotation_params(p, den, param, depth, min_qubits)
                .into_iter()
                .map(|(p, den)| Gate::Ry(q.clone(), p, den))
                .collect()
        }
        Gate::CRy(ctrl, tgt, p, den) if !p.terminated() || !den.terminated() => {
            rotation_params(p, den, param, depth, min_qubits)
                .into_iter()
                .map(|(p, den)| Gate::CRy(ctrl.clone(), tgt.clone(), p, den))
                .collect()
        }
        other => vec![other.clone()],
    }
}

/// A hole pair becomes `(1, combination)`; a single open slot takes the
/// combination while the ground slot is kept.
fn rotation_params(
    p: &Aexp,
    den: &Aexp,
    param: &str,
    depth: usize,
    min_qubits: usize,
) -> Vec<(Aexp, Aexp)> {
    let combos = candidate_exprs(param, depth, min_qubits);
    match (p.terminated(), den.terminated()) {
        (false, false) => combos.into_iter().map(|c| (Aexp::Int(1), c)).collect(),
        (true, false) => combos.into_iter().map(|c| (p.clone(), c)).collect(),
        (false, true) => combos.into_iter().map(|c| (c, den.clone())).collect(),
        (true, true) => vec![(p.clone(), den.clone())],
    }
}

enum Sym {
    LoopVar(usize),
    Param,
    Constant,
}

impl Sym {
    /// Value at the most adverse boundary instantiation: every loop index at
    /// its largest reachable value for the smallest testcase.
    fn boundary_value(&self, qubits: usize) -> i64 {
        match self {
            Sym::LoopVar(_) => qubits as i64 - 1,
            Sym::Param => qubits as i64,
            Sym::Constant => 1,
        }
    }
}

/// All integer linear combinations over the enclosing loop variables, the
/// program parameter and a constant term, with coefficients from [`COEFFS`],
/// excluding combinations that are non-positive at the boundary.
pub fn candidate_exprs(param: &str, depth: usize, min_qubits: usize) -> Vec<Aexp> {
    let mut symbols: Vec<Sym> = (0..depth).map(Sym::LoopVar).collect();
    symbols.push(Sym::Param);
    symbols.push(Sym::Constant);

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for coeffs in (0..symbols.len())
        .map(|_| COEFFS.iter().copied())
        .multi_cartesian_product()
    {
        let boundary: i64 = symbols
            .iter()
            .zip(&coeffs)
            .map(|(sym, coeff)| coeff * sym.boundary_value(min_qubits))
            .sum();
        if boundary <= 0 {
            continue;
        }
        let Some(expr) = build_combination(param, &symbols, &coeffs) else {
            continue;
        };
        if seen.insert(expr.clone()) {
            out.push(expr);
        }
    }
    out
}

/// Materialize a coefficient vector as an expression: the positive terms
/// summed, the negative ones subtracted. A combination with no positive term
/// cannot be positive at any reachable instantiation.
fn build_combination(param: &str, symbols: &[Sym], coeffs: &[i64]) -> Option<Aexp> {
    let mut positive: Vec<Aexp> = Vec::new();
    let mut negative: Vec<Aexp> = Vec::new();
    for (sym, &coeff) in symbols.iter().zip(coeffs) {
        if coeff == 0 {
            continue;
        }
        let magnitude = coeff.abs();
        let term = match sym {
            Sym::Constant => Aexp::Int(magnitude),
            Sym::LoopVar(level) => scaled(magnitude, Aexp::var(format!("i{level}"))),
            Sym::Param => scaled(magnitude, Aexp::var(param)),
        };
        if coeff > 0 {
            positive.push(term);
        } else {
            negative.push(term);
        }
    }
    let mut terms = positive.into_iter();
    let mut expr = terms.next()?;
    for term in terms {
        expr = Aexp::add(expr, term);
    }
    for term in negative {
        expr = Aexp::sub(expr, term);
    }
    Some(expr)
}

fn scaled(coeff: i64, var: Aexp) -> Aexp {
    if coeff == 1 {
        var
    } else {
        Aexp::mul(Aexp::Int(coeff), var)
    }
}
