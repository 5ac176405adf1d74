use qcsynth::parser::parse;
use qcsynth::prune::PruneConfig;
use qcsynth::search::{synthesize, synthesize_from, SearchOptions, SynthError};
use qcsynth::sim;
use qcsynth::spec::Spec;

/// Two-peak targets of length 32, 16 and 8: GHZ states for n = 5, 4, 3.
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

fn init_logging() {
    let _ = colog::default_builder()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

#[test]
fn ghz_last_step() {
    init_logging();

    let spec = Spec::from_json(GHZ_SPEC).unwrap();
    let sketch = parse(
        "
def pgm(n):
    H(0)
    for i0 in range(1,n):
        CX(0, _)
",
    )
    .unwrap();
    let expected = parse(
        "
def pgm(n):
    H(0)
    for i0 in range(1,n):
        CX(0, i0)
",
    )
    .unwrap();

    let found = synthesize_from(&spec, sketch, &SearchOptions::default()).unwrap();
    assert_eq!(found, expected);
}

#[test]
fn unsatisfiable_gate_set_exhausts() {
    init_logging();

    // X alone permutes basis states and can never produce a superposition.
    let spec = Spec::from_json(
        r#"{
            "gates": ["X"],
            "testcases": { "1": { "output": "0.70710677,0.70710677" } }
        }"#,
    )
    .unwrap();
    let options = SearchOptions {
        prune: PruneConfig {
            max_seqs: 1,
            max_fors: 1,
            max_aexps: 0,
            max_aexp_depth: 2,
        },
        ..Default::default()
    };
    assert_eq!(synthesize(&spec, &options), Err(SynthError::Exhausted));
}

#[test]
fn synthesized_programs_render_and_reparse() {
    init_logging();

    let spec = Spec::from_json(GHZ_SPEC).unwrap();
    let sketch = parse(
        "
def pgm(n):
    H(0)
    for i0 in range(1,n):
        CX(0, _)
",
    )
    .unwrap();
    let found = synthesize_from(&spec, sketch, &SearchOptions::default()).unwrap();
    // the printed solution is valid surface syntax for the same program
    assert_eq!(parse(&found.to_string()).unwrap(), found);
    for tc in &spec.testcases {
        assert!(sim::verify(&found, tc));
    }
}

#[test]
#[ignore = "explores a few hundred thousand candidates; run with --ignored"]
fn ghz_from_the_empty_sketch() {
    init_logging();

    let spec = Spec::from_json(GHZ_SPEC).unwrap();
    let expected = parse(
        "
def pgm(n):
    H(0)
    for i0 in range(1,n):
        CX(0, i0)
",
    )
    .unwrap();
    let found = synthesize(&spec, &SearchOptions::default()).unwrap();
    for tc in &spec.testcases {
        assert!(sim::verify(&found, tc));
    }
    assert_eq!(found, expected);
}
