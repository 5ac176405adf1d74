//! Loading input/output specifications from JSON.
//!
//! A specification names the enabled gate set (optional, defaulting to the
//! full vocabulary) and a map of testcases, each giving an expected output
//! statevector and optionally an input one:
//!
//! ```json
//! {
//!     "gates": ["H", "CX"],
//!     "testcases": {
//!         "1": { "output": "0.70710677,0,0,0.70710677" }
//!     }
//! }
//! ```
//!
//! Vectors are comma-separated complex numbers in numpy notation (`0.5`,
//! `1j`, `0.5+0.5j`). The qubit count of a testcase is derived from the
//! output vector length; a missing input defaults to the all-zero basis
//! state.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use num_complex::Complex64;
use serde::Deserialize;
use thiserror::Error;

use crate::ast::GateKind;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read specification file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed specification: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown gate name `{0}`")]
    UnknownGate(String),
    #[error("specification has no testcases")]
    NoTestcases,
    #[error("testcase `{0}`: malformed complex number `{1}`")]
    BadComplex(String, String),
    #[error("testcase `{0}`: vector length {1} is not a power of two")]
    BadLength(String, usize),
    #[error("testcase `{0}`: input length {1} does not match output length {2}")]
    LengthMismatch(String, usize, usize),
}

#[derive(Debug, Deserialize)]
struct RawSpec {
    #[serde(default)]
    gates: Option<Vec<String>>,
    testcases: BTreeMap<String, RawTestcase>,
}

#[derive(Debug, Deserialize)]
struct RawTestcase {
    #[serde(default)]
    input: Option<String>,
    output: String,
}

/// One input/output example. `qubits` is derived from the vector length.
#[derive(Debug, Clone)]
pub struct Testcase {
    pub name: String,
    pub input: Vec<Complex64>,
    pub output: Vec<Complex64>,
    pub qubits: usize,
}

/// A parsed specification: the enabled gate set plus the testcases in name
/// order. The fixed order makes fail-fast verification deterministic.
#[derive(Debug, Clone)]
pub struct Spec {
    pub gates: Vec<GateKind>,
    pub testcases: Vec<Testcase>,
}

impl Spec {
    pub fn from_file(path: &Path) -> Result<Spec, SpecError> {
        Spec::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Spec, SpecError> {
        let raw: RawSpec = serde_json::from_str(text)?;

        let gates = match raw.gates {
            None => GateKind::ALL.to_vec(),
            Some(names) => names
                .iter()
                .map(|name| {
                    GateKind::from_name(name).ok_or_else(|| SpecError::UnknownGate(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        if raw.testcases.is_empty() {
            return Err(SpecError::NoTestcases);
        }

        let mut testcases = Vec::with_capacity(raw.testcases.len());
        for (name, tc) in raw.testcases {
            let output = parse_vector(&name, &tc.output)?;
            let len = output.len();
            if len < 2 || !len.is_power_of_two() {
                return Err(SpecError::BadLength(name, len));
            }
            let input = match tc.input {
                Some(text) => {
                    let input = parse_vector(&name, &text)?;
                    if input.len() != len {
                        return Err(SpecError::LengthMismatch(name, input.len(), len));
                    }
                    input
                }
                None => {
                    let mut zero = vec![Complex64::default(); len];
                    zero[0] = Complex64::new(1.0, 0.0);
                    zero
                }
            };
            testcases.push(Testcase {
                name,
                input,
                output,
                qubits: len.trailing_zeros() as usize,
            });
        }

        Ok(Spec { gates, testcases })
    }

    /// The smallest qubit count among the testcases.
    pub fn min_qubits(&self) -> usize {
        self.testcases
            .iter()
            .map(|tc| tc.qubits)
            .min()
            .unwrap_or(1)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gates: Vec<&str> = self.gates.iter().map(|g| g.name()).collect();
        write!(f, "Spec(gates: [{}], testcases:", gates.join(", "))?;
        for tc in &self.testcases {
            write!(f, " {}[n={}]", tc.name, tc.qubits)?;
        }
        write!(f, ")")
    }
}

fn parse_vector(name: &str, text: &str) -> Result<Vec<Complex64>, SpecError> {
    text.split(',')
        .map(|entry| {
            parse_complex(entry.trim())
                .ok_or_else(|| SpecError::BadComplex(name.to_string(), entry.trim().to_string()))
        })
        .collect()
}

/// Parse one complex number in numpy notation: a real part, an imaginary
/// part suffixed with `j`, or both (`-0.5+0.5j`).
fn parse_complex(text: &str) -> Option<Complex64> {
    if text.is_empty() {
        return None;
    }
    let Some(body) = text.strip_suffix('j') else {
        return text.parse::<f64>().ok().map(|re| Complex64::new(re, 0.0));
    };
    // split "a+bj" at the sign of the imaginary part, skipping a leading
    // sign and exponent signs
    let split = body
        .char_indices()
        .rev()
        .find(|&(i, c)| {
            (c == '+' || c == '-')
                && i > 0
                && !matches!(body.as_bytes()[i - 1], b'e' | b'E')
        })
        .map(|(i, _)| i);
    let (re_text, im_text) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => ("", body),
    };
    let re = if re_text.is_empty() {
        0.0
    } else {
        re_text.parse::<f64>().ok()?
    };
    let im = match im_text {
        "" | "+" => 1.0,
        "-" => -1.0,
        _ => im_text.parse::<f64>().ok()?,
    };
    Some(Complex64::new(re, im))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GHZ_SPEC: &str = r#"{
        "gates": ["H", "CX"],
        "testcases": {
            "1": {
                "output": "0.70710677,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0.70710677"
            },
            "2": {
                "output": "0.70710677, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0.70710677"
            },
            "3": { "output": "0.70710677,0,0,0,0,0,0,0.70710677" }
        }
    }"#;

    #[test]
    fn parses_ghz_spec() {
        let spec = Spec::from_json(GHZ_SPEC).unwrap();
        assert_eq!(spec.gates, vec![GateKind::H, GateKind::Cx]);
        assert_eq!(spec.testcases.len(), 3);
        assert_eq!(spec.min_qubits(), 3);
        for (tc, qubits) in spec.testcases.iter().zip([5, 4, 3]) {
            assert_eq!(tc.qubits, qubits);
            assert_eq!(tc.output.len(), 1 << qubits);
            assert_eq!(tc.input.len(), tc.output.len());
            // default input is the all-zero basis state
            assert_eq!(tc.input[0], Complex64::new(1.0, 0.0));
            assert!(tc.input[1..].iter().all(|amp| amp.norm() == 0.0));
            // both vectors are normalized
            let norm: f64 = tc.output.iter().map(|amp| amp.norm_sqr()).sum();
            assert!((norm - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn gates_default_to_full_vocabulary() {
        let spec = Spec::from_json(
            r#"{ "testcases": { "1": { "output": "1,0" } } }"#,
        )
        .unwrap();
        assert_eq!(spec.gates, GateKind::ALL.to_vec());
    }

    #[test]
    fn rejects_unknown_gate() {
        let err = Spec::from_json(
            r#"{ "gates": ["CZ"], "testcases": { "1": { "output": "1,0" } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::UnknownGate(name) if name == "CZ"));
    }

    #[test]
    fn rejects_odd_vector_length() {
        let err = Spec::from_json(
            r#"{ "testcases": { "1": { "output": "1,0,0" } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::BadLength(_, 3)));
    }

    #[test]
    fn rejects_missing_testcases() {
        let err = Spec::from_json(r#"{ "testcases": {} }"#).unwrap_err();
        assert!(matches!(err, SpecError::NoTestcases));
    }

    #[test]
    fn explicit_input_must_match_length() {
        let err = Spec::from_json(
            r#"{ "testcases": { "1": { "input": "1,0", "output": "1,0,0,0" } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::LengthMismatch(_, 2, 4)));
    }

    #[test]
    fn complex_number_notation() {
        assert_eq!(parse_complex("0.5"), Some(Complex64::new(0.5, 0.0)));
        assert_eq!(parse_complex("-2"), Some(Complex64::new(-2.0, 0.0)));
        assert_eq!(parse_complex("1j"), Some(Complex64::new(0.0, 1.0)));
        assert_eq!(parse_complex("-j"), Some(Complex64::new(0.0, -1.0)));
        assert_eq!(parse_complex("0.5+0.5j"), Some(Complex64::new(0.5, 0.5)));
        assert_eq!(parse_complex("-0.5-0.5j"), Some(Complex64::new(-0.5, -0.5)));
        assert_eq!(parse_complex("1e-3+2e-4j"), Some(Complex64::new(1e-3, 2e-4)));
        assert_eq!(parse_complex(""), None);
        assert_eq!(parse_complex("abc"), None);
    }
}
