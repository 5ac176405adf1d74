//! Statevector execution of ground programs and comparison against expected
//! vectors up to an unobservable global phase.
//!
//! Qubit 0 is the most significant bit of the basis-state index, matching
//! the line-qubit ordering the expected vectors are written in. Simulation
//! cost grows as `2^n`, so this is by far the most expensive step of a
//! search iteration.

use fxhash::FxHashMap;
use log::debug;
use num_complex::Complex64;
use thiserror::Error;

use crate::ast::{Aexp, Cmd, Gate, Pgm};
use crate::spec::Testcase;

/// Absolute tolerance for statevector comparison.
pub const ATOL: f64 = 1e-5;

/// Faults that invalidate a single candidate. None of these abort a search;
/// the driver simply discards the candidate that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("division by zero in `{0}`")]
    DivisionByZero(String),
    #[error("unbound variable `{0}`")]
    UnboundVar(String),
    #[error("qubit index {0} out of range for {1} qubits")]
    QubitOutOfRange(i64, usize),
    #[error("control and target are both qubit {0}")]
    ControlIsTarget(usize),
    #[error("rotation ratio {0}/{1} is outside [0, 1]")]
    InvalidRotation(i64, i64),
}

type Env = FxHashMap<String, i64>;
type Matrix = [[Complex64; 2]; 2];

/// Run `pgm` on `input` with the program parameter bound to `qubits`.
///
/// NOTE: executing a program that still contains holes is 100% an API
/// misuse; the driver only sends terminated candidates here.
pub fn execute(
    pgm: &Pgm,
    qubits: usize,
    input: &[Complex64],
) -> Result<Vec<Complex64>, ExecError> {
    assert!(pgm.terminated(), "cannot execute a program with holes");
    assert_eq!(input.len(), 1 << qubits, "input length is not 2^qubits");
    let mut state = input.to_vec();
    let mut env = Env::default();
    env.insert(pgm.param.clone(), qubits as i64);
    run_cmd(&pgm.body, &mut env, &mut state, qubits)?;
    Ok(state)
}

/// Execute the candidate on one testcase and compare. Any execution fault
/// counts as a mismatch.
pub fn verify(pgm: &Pgm, tc: &Testcase) -> bool {
    match execute(pgm, tc.qubits, &tc.input) {
        Ok(result) => allclose_up_to_global_phase(&tc.output, &result, ATOL),
        Err(err) => {
            debug!("testcase {}: candidate invalid: {err}", tc.name);
            false
        }
    }
}

fn run_cmd(
    cmd: &Cmd,
    env: &mut Env,
    state: &mut [Complex64],
    qubits: usize,
) -> Result<(), ExecError> {
    match cmd {
        Cmd::Hole => unreachable!("hole in a terminated program"),
        Cmd::Seq(pre, post) => {
            run_cmd(pre, env, state, qubits)?;
            run_cmd(post, env, state, qubits)
        }
        Cmd::For(var, start, end, body) => {
            let lo = eval(start, env)?;
            let hi = eval(end, env)?;
            for value in lo..hi {
                env.insert(var.clone(), value);
                run_cmd(body, env, state, qubits)?;
            }
            env.remove(var);
            Ok(())
        }
        Cmd::Gate(gate) => apply_gate(gate, env, state, qubits),
    }
}

fn apply_gate(
    gate: &Gate,
    env: &Env,
    state: &mut [Complex64],
    qubits: usize,
) -> Result<(), ExecError> {
    match gate {
        Gate::Hole => unreachable!("hole in a terminated program"),
        Gate::H(q) => {
            let q = qubit_index(q, env, qubits)?;
            apply_single(state, qubits, q, hadamard());
            Ok(())
        }
        Gate::X(q) => {
            let q = qubit_index(q, env, qubits)?;
            apply_single(state, qubits, q, pauli_x());
            Ok(())
        }
        Gate::Ry(q, p, den) => {
            let q = qubit_index(q, env, qubits)?;
            let matrix = ry(eval(p, env)?, eval(den, env)?)?;
            apply_single(state, qubits, q, matrix);
            Ok(())
        }
        Gate::Cx(ctrl, tgt) => {
            let ctrl = qubit_index(ctrl, env, qubits)?;
            let tgt = qubit_index(tgt, env, qubits)?;
            if ctrl == tgt {
                return Err(ExecError::ControlIsTarget(ctrl));
            }
            apply_controlled(state, qubits, ctrl, tgt, pauli_x());
            Ok(())
        }
        Gate::CRy(ctrl, tgt, p, den) => {
            let ctrl = qubit_index(ctrl, env, qubits)?;
            let tgt = qubit_index(tgt, env, qubits)?;
            if ctrl == tgt {
                return Err(ExecError::ControlIsTarget(ctrl));
            }
            let matrix = ry(eval(p, env)?, eval(den, env)?)?;
            apply_controlled(state, qubits, ctrl, tgt, matrix);
            Ok(())
        }
    }
}

/// Evaluate an arithmetic expression. Division is floor division, as in the
/// surface syntax's `//`.
pub fn eval(aexp: &Aexp, env: &Env) -> Result<i64, ExecError> {
    match aexp {
        Aexp::Hole => unreachable!("hole in a terminated expression"),
        Aexp::Int(value) => Ok(*value),
        Aexp::Var(name) => env
            .get(name)
            .copied()
            .ok_or_else(|| ExecError::UnboundVar(name.clone())),
        Aexp::Add(a, b) => Ok(eval(a, env)? + eval(b, env)?),
        Aexp::Sub(a, b) => Ok(eval(a, env)? - eval(b, env)?),
        Aexp::Mul(a, b) => Ok(eval(a, env)? * eval(b, env)?),
        Aexp::Div(a, b) => {
            let denom = eval(b, env)?;
            if denom == 0 {
                return Err(ExecError::DivisionByZero(aexp.to_string()));
            }
            Ok(floor_div(eval(a, env)?, denom))
        }
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let quot = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quot - 1
    } else {
        quot
    }
}

fn qubit_index(aexp: &Aexp, env: &Env, qubits: usize) -> Result<usize, ExecError> {
    let value = eval(aexp, env)?;
    if value < 0 || value >= qubits as i64 {
        return Err(ExecError::QubitOutOfRange(value, qubits));
    }
    Ok(value as usize)
}

fn hadamard() -> Matrix {
    let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn pauli_x() -> Matrix {
    let zero = Complex64::default();
    let one = Complex64::new(1.0, 0.0);
    [[zero, one], [one, zero]]
}

/// Rotation by `2*acos(sqrt(p/den))` around Y.
fn ry(p: i64, den: i64) -> Result<Matrix, ExecError> {
    if den == 0 {
        return Err(ExecError::DivisionByZero(format!("{p}//{den}")));
    }
    let ratio = p as f64 / den as f64;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ExecError::InvalidRotation(p, den));
    }
    // cos(theta/2) = sqrt(p/den)
    let cos = Complex64::new(ratio.sqrt(), 0.0);
    let sin = Complex64::new((1.0 - ratio).sqrt(), 0.0);
    Ok([[cos, -sin], [sin, cos]])
}

fn apply_single(state: &mut [Complex64], qubits: usize, qubit: usize, m: Matrix) {
    let mask = 1usize << (qubits - 1 - qubit);
    for i in 0..state.len() {
        if i & mask == 0 {
            let j = i | mask;
            let (a, b) = (state[i], state[j]);
            state[i] = m[0][0] * a + m[0][1] * b;
            state[j] = m[1][0] * a + m[1][1] * b;
        }
    }
}

fn apply_controlled(
    state: &mut [Complex64],
    qubits: usize,
    ctrl: usize,
    tgt: usize,
    m: Matrix,
) {
    let cmask = 1usize << (qubits - 1 - ctrl);
    let tmask = 1usize << (qubits - 1 - tgt);
    for i in 0..state.len() {
        if i & cmask != 0 && i & tmask == 0 {
            let j = i | tmask;
            let (a, b) = (state[i], state[j]);
            state[i] = m[0][0] * a + m[0][1] * b;
            state[j] = m[1][0] * a + m[1][1] * b;
        }
    }
}

/// Equality of statevectors up to a global phase factor: align the phases at
/// the largest component of `actual`, then compare elementwise.
pub fn allclose_up_to_global_phase(
    expected: &[Complex64],
    actual: &[Complex64],
    atol: f64,
) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    let pivot = actual
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
        .map(|(i, _)| i);
    let Some(pivot) = pivot else {
        return expected.is_empty();
    };
    if actual[pivot].norm() <= atol {
        return expected.iter().zip(actual).all(|(e, a)| (e - a).norm() <= atol);
    }
    let phase = Complex64::from_polar(1.0, expected[pivot].arg() - actual[pivot].arg());
    expected
        .iter()
        .zip(actual)
        .all(|(e, a)| (e - a * phase).norm() <= atol)
}
