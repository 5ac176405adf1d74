//! One-step refinement of partial programs.
//!
//! `expand` locates the leftmost hole of a program (depth-first, children in
//! declared order) and returns one copy of the program per constructor that
//! hole can be filled with, each new constructor carrying fresh holes for its
//! own arguments. Everything else in the tree is cloned unchanged, so the
//! results differ from the input in exactly one position.

use fxhash::FxHashSet;

use crate::ast::{Aexp, Cmd, Gate, GateKind, Pgm};

/// All one-step refinements of `pgm` under the enabled gate set.
///
/// NOTE: calling this on a terminated program is 100% an API misuse.
pub fn expand(pgm: &Pgm, gates: &[GateKind]) -> Vec<Pgm> {
    assert!(
        !pgm.terminated(),
        "expand called on a program without holes"
    );
    let mut out: Vec<Pgm> = expand_cmd(&pgm.body, gates, &pgm.param, 0)
        .into_iter()
        .map(|body| Pgm::new(pgm.param.clone(), body))
        .collect();
    let mut seen = FxHashSet::default();
    out.retain(|pgm| seen.insert(pgm.clone()));
    out
}

fn expand_cmd(cmd: &Cmd, gates: &[GateKind], param: &str, depth: usize) -> Vec<Cmd> {
    match cmd {
        Cmd::Hole => vec![
            Cmd::seq(Cmd::Hole, Cmd::Hole),
            Cmd::for_loop(format!("i{depth}"), Aexp::Hole, Aexp::Hole, Cmd::Hole),
            Cmd::Gate(Gate::Hole),
        ],
        Cmd::Seq(pre, post) => {
            if !pre.terminated() {
                expand_cmd(pre, gates, param, depth)
                    .into_iter()
                    .map(|pre| Cmd::seq(pre, (**post).clone()))
                    .collect()
            } else if !post.terminated() {
                expand_cmd(post, gates, param, depth)
                    .into_iter()
                    .map(|post| Cmd::seq((**pre).clone(), post))
                    .collect()
            } else {
                Vec::new()
            }
        }
        Cmd::For(var, start, end, body) => {
            if !start.terminated() {
                expand_aexp(start, param, depth)
                    .into_iter()
                    .map(|start| Cmd::for_loop(var.clone(), start, end.clone(), (**body).clone()))
                    .collect()
            } else if !end.terminated() {
                expand_aexp(end, param, depth)
                    .into_iter()
                    .map(|end| Cmd::for_loop(var.clone(), start.clone(), end, (**body).clone()))
                    .collect()
            } else if !body.terminated() {
                // A bound that depends on its own loop variable has no
                // meaning; such a sketch gets no refinements at all.
                if end.references(var) || start.references(var) {
                    return Vec::new();
                }
                expand_cmd(body, gates, param, depth + 1)
                    .into_iter()
                    .map(|body| Cmd::for_loop(var.clone(), start.clone(), end.clone(), body))
                    .collect()
            } else {
                Vec::new()
            }
        }
        Cmd::Gate(gate) => expand_gate(gate, gates, param, depth)
            .into_iter()
            .map(Cmd::Gate)
            .collect(),
    }
}

fn expand_gate(gate: &Gate, gates: &[GateKind], param: &str, depth: usize) -> Vec<Gate> {
    if let Gate::Hole = gate {
        return gates.iter().map(|kind| kind.hole_instance()).collect();
    }
    let args = gate.args();
    for (slot, arg) in args.iter().enumerate() {
        if arg.terminated() {
            continue;
        }
        return expand_aexp(arg, param, depth)
            .into_iter()
            .map(|filled| {
                let mut new_args: Vec<Aexp> = args.iter().map(|a| (*a).clone()).collect();
                new_args[slot] = filled;
                gate.with_args(new_args)
            })
            .collect();
    }
    Vec::new()
}

fn expand_aexp(aexp: &Aexp, param: &str, depth: usize) -> Vec<Aexp> {
    match aexp {
        Aexp::Hole => {
            let mut menu = vec![
                Aexp::add(Aexp::Hole, Aexp::Hole),
                Aexp::sub(Aexp::Hole, Aexp::Hole),
                Aexp::mul(Aexp::Hole, Aexp::Hole),
                Aexp::div(Aexp::Hole, Aexp::Hole),
            ];
            menu.extend((0..3).map(Aexp::Int));
            menu.extend((0..depth).map(|level| Aexp::var(format!("i{level}"))));
            menu.push(Aexp::var(param));
            menu
        }
        Aexp::Int(_) | Aexp::Var(_) => Vec::new(),
        Aexp::Add(a, b) => expand_binop(a, b, param, depth, Aexp::add),
        Aexp::Sub(a, b) => expand_binop(a, b, param, depth, Aexp::sub),
        Aexp::Mul(a, b) => expand_binop(a, b, param, depth, Aexp::mul),
        Aexp::Div(a, b) => expand_binop(a, b, param, depth, Aexp::div),
    }
}

fn expand_binop(
    a: &Aexp,
    b: &Aexp,
    param: &str,
    depth: usize,
    build: impl Fn(Aexp, Aexp) -> Aexp,
) -> Vec<Aexp> {
    if !a.terminated() {
        expand_aexp(a, param, depth)
            .into_iter()
            .map(|filled| build(filled, b.clone()))
            .collect()
    } else if !b.terminated() {
        expand_aexp(b, param, depth)
            .into_iter()
            .map(|filled| build(a.clone(), filled))
            .collect()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Vec<GateKind> {
        GateKind::ALL.to_vec()
    }

    #[test]
    fn command_hole_menu() {
        let nexts = expand(&Pgm::empty("n"), &full());
        assert_eq!(nexts.len(), 3);
        assert!(nexts.contains(&Pgm::new("n", Cmd::seq(Cmd::Hole, Cmd::Hole))));
        assert!(nexts.contains(&Pgm::new(
            "n",
            Cmd::for_loop("i0", Aexp::Hole, Aexp::Hole, Cmd::Hole)
        )));
        assert!(nexts.contains(&Pgm::new("n", Cmd::Gate(Gate::Hole))));
    }

    #[test]
    fn gate_hole_menu_follows_enabled_set() {
        let pgm = Pgm::new("n", Cmd::Gate(Gate::Hole));
        assert_eq!(expand(&pgm, &full()).len(), 5);

        let restricted = [GateKind::H, GateKind::Cx];
        let nexts = expand(&pgm, &restricted);
        assert_eq!(nexts.len(), 2);
        assert!(nexts.contains(&Pgm::new("n", Cmd::Gate(Gate::H(Aexp::Hole)))));
        assert!(nexts.contains(&Pgm::new(
            "n",
            Cmd::Gate(Gate::Cx(Aexp::Hole, Aexp::Hole))
        )));
    }

    #[test]
    fn aexp_hole_menu_outside_loops() {
        // 4 operators + integers 0..=2 + the parameter, no loop variables
        let pgm = Pgm::new("n", Cmd::Gate(Gate::H(Aexp::Hole)));
        let nexts = expand(&pgm, &full());
        assert_eq!(nexts.len(), 8);
        assert!(nexts.contains(&Pgm::new("n", Cmd::Gate(Gate::H(Aexp::var("n"))))));
        assert!(!nexts
            .iter()
            .any(|pgm| matches!(&pgm.body, Cmd::Gate(Gate::H(Aexp::Var(v))) if v == "i0")));
    }

    #[test]
    fn aexp_hole_menu_inside_loop_sees_loop_var() {
        let pgm = Pgm::new(
            "n",
            Cmd::for_loop(
                "i0",
                Aexp::Int(0),
                Aexp::var("n"),
                Cmd::Gate(Gate::H(Aexp::Hole)),
            ),
        );
        let nexts = expand(&pgm, &full());
        assert_eq!(nexts.len(), 9);
        assert!(nexts.iter().any(
            |pgm| matches!(&pgm.body, Cmd::For(_, _, _, body)
                if **body == Cmd::Gate(Gate::H(Aexp::var("i0"))))
        ));
    }

    #[test]
    fn loop_bounds_do_not_see_own_variable() {
        let pgm = Pgm::new(
            "n",
            Cmd::for_loop("i0", Aexp::Int(0), Aexp::Hole, Cmd::Hole),
        );
        for next in expand(&pgm, &full()) {
            let Cmd::For(_, _, end, _) = &next.body else {
                panic!("expansion changed the constructor");
            };
            assert!(!end.references("i0"));
        }
    }

    #[test]
    fn self_referential_bound_gets_no_refinements() {
        let pgm = Pgm::new(
            "n",
            Cmd::for_loop("i0", Aexp::Int(0), Aexp::var("i0"), Cmd::Hole),
        );
        assert!(expand(&pgm, &full()).is_empty());
    }

    #[test]
    fn leftmost_hole_fills_first() {
        let pgm = Pgm::new(
            "n",
            Cmd::Gate(Gate::Cx(Aexp::Int(0), Aexp::add(Aexp::Hole, Aexp::Hole))),
        );
        for next in expand(&pgm, &full()) {
            let Cmd::Gate(Gate::Cx(ctrl, Aexp::Add(a, b))) = &next.body else {
                panic!("unexpected shape: {next}");
            };
            assert_eq!(*ctrl, Aexp::Int(0));
            assert_ne!(**a, Aexp::Hole);
            assert_eq!(**b, Aexp::Hole);
        }
    }

    #[test]
    fn expansion_changes_exactly_one_hole() {
        let pgm = Pgm::new(
            "n",
            Cmd::seq(Cmd::Gate(Gate::H(Aexp::Hole)), Cmd::Hole),
        );
        for next in expand(&pgm, &full()) {
            // the second hole is untouched while the first gets filled
            let Cmd::Seq(pre, post) = &next.body else {
                panic!("unexpected shape: {next}");
            };
            assert_ne!(**pre, Cmd::Gate(Gate::H(Aexp::Hole)));
            assert_eq!(**post, Cmd::Hole);
        }
    }

    #[test]
    fn ghz_derivation_chain() {
        let gates = full();
        let steps = [
            Pgm::empty("n"),
            Pgm::new("n", Cmd::seq(Cmd::Hole, Cmd::Hole)),
            Pgm::new("n", Cmd::seq(Cmd::Gate(Gate::Hole), Cmd::Hole)),
            Pgm::new("n", Cmd::seq(Cmd::Gate(Gate::H(Aexp::Hole)), Cmd::Hole)),
            Pgm::new("n", Cmd::seq(Cmd::Gate(Gate::H(Aexp::Int(0))), Cmd::Hole)),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop("i0", Aexp::Hole, Aexp::Hole, Cmd::Hole),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop("i0", Aexp::Int(1), Aexp::Hole, Cmd::Hole),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop("i0", Aexp::Int(1), Aexp::var("n"), Cmd::Hole),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop("i0", Aexp::Int(1), Aexp::var("n"), Cmd::Gate(Gate::Hole)),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop(
                        "i0",
                        Aexp::Int(1),
                        Aexp::var("n"),
                        Cmd::Gate(Gate::Cx(Aexp::Hole, Aexp::Hole)),
                    ),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop(
                        "i0",
                        Aexp::Int(1),
                        Aexp::var("n"),
                        Cmd::Gate(Gate::Cx(Aexp::Int(0), Aexp::Hole)),
                    ),
                ),
            ),
            Pgm::new(
                "n",
                Cmd::seq(
                    Cmd::Gate(Gate::H(Aexp::Int(0))),
                    Cmd::for_loop(
                        "i0",
                        Aexp::Int(1),
                        Aexp::var("n"),
                        Cmd::Gate(Gate::Cx(Aexp::Int(0), Aexp::var("i0"))),
                    ),
                ),
            ),
        ];
        for pair in steps.windows(2) {
            assert!(
                expand(&pair[0], &gates).contains(&pair[1]),
                "{} does not refine to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn results_are_duplicate_free() {
        let pgm = Pgm::new("n", Cmd::Gate(Gate::H(Aexp::Hole)));
        let nexts = expand(&pgm, &full());
        for (i, a) in nexts.iter().enumerate() {
            assert!(!nexts[i + 1..].contains(a));
        }
    }
}
