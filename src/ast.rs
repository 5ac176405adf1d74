use std::fmt;

/// Indentation unit used by the canonical program rendering.
pub const TAB: &str = "    ";

/// Arithmetic expressions over integers, loop variables and the program
/// parameter. `Hole` marks a not-yet-synthesized subterm.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Aexp {
    Hole,
    Int(i64),
    Var(String),
    Add(Box<Aexp>, Box<Aexp>),
    Sub(Box<Aexp>, Box<Aexp>),
    Mul(Box<Aexp>, Box<Aexp>),
    Div(Box<Aexp>, Box<Aexp>),
}

impl Aexp {
    pub fn var(name: impl Into<String>) -> Aexp {
        Aexp::Var(name.into())
    }

    pub fn add(a: Aexp, b: Aexp) -> Aexp {
        Aexp::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Aexp, b: Aexp) -> Aexp {
        Aexp::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Aexp, b: Aexp) -> Aexp {
        Aexp::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Aexp, b: Aexp) -> Aexp {
        Aexp::Div(Box::new(a), Box::new(b))
    }

    pub fn cost(&self) -> u64 {
        match self {
            Aexp::Hole => 3,
            Aexp::Int(_) | Aexp::Var(_) => 0,
            Aexp::Add(a, b) | Aexp::Sub(a, b) | Aexp::Mul(a, b) | Aexp::Div(a, b) => {
                a.cost() + b.cost() + 3
            }
        }
    }

    pub fn depth(&self) -> u64 {
        match self {
            Aexp::Hole | Aexp::Int(_) | Aexp::Var(_) => 1,
            Aexp::Add(a, b) | Aexp::Sub(a, b) | Aexp::Mul(a, b) | Aexp::Div(a, b) => {
                1 + a.depth().max(b.depth())
            }
        }
    }

    pub fn terminated(&self) -> bool {
        match self {
            Aexp::Hole => false,
            Aexp::Int(_) | Aexp::Var(_) => true,
            Aexp::Add(a, b) | Aexp::Sub(a, b) | Aexp::Mul(a, b) | Aexp::Div(a, b) => {
                a.terminated() && b.terminated()
            }
        }
    }

    /// Whether the variable `name` occurs anywhere in this expression.
    pub fn references(&self, name: &str) -> bool {
        match self {
            Aexp::Hole | Aexp::Int(_) => false,
            Aexp::Var(v) => v == name,
            Aexp::Add(a, b) | Aexp::Sub(a, b) | Aexp::Mul(a, b) | Aexp::Div(a, b) => {
                a.references(name) || b.references(name)
            }
        }
    }
}

impl fmt::Display for Aexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aexp::Hole => write!(f, "_"),
            Aexp::Int(v) => write!(f, "{v}"),
            Aexp::Var(name) => write!(f, "{name}"),
            Aexp::Add(a, b) => write!(f, "({a} + {b})"),
            Aexp::Sub(a, b) => write!(f, "({a} - {b})"),
            Aexp::Mul(a, b) => write!(f, "({a} * {b})"),
            Aexp::Div(a, b) => write!(f, "({a} // {b})"),
        }
    }
}

/// The gate vocabulary. Every argument slot is an [`Aexp`], so a gate can be
/// partially synthesized. `Ry`/`CRy` take a rotation given as the integer
/// ratio `p/den`, rotating by `2*acos(sqrt(p/den))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gate {
    Hole,
    H(Aexp),
    X(Aexp),
    Ry(Aexp, Aexp, Aexp),
    Cx(Aexp, Aexp),
    CRy(Aexp, Aexp, Aexp, Aexp),
}

impl Gate {
    /// Argument slots in declared order.
    pub fn args(&self) -> Vec<&Aexp> {
        match self {
            Gate::Hole => vec![],
            Gate::H(q) | Gate::X(q) => vec![q],
            Gate::Ry(q, p, den) => vec![q, p, den],
            Gate::Cx(c, t) => vec![c, t],
            Gate::CRy(c, t, p, den) => vec![c, t, p, den],
        }
    }

    /// Rebuild the same gate with replacement arguments.
    ///
    /// NOTE: passing the wrong number of arguments is 100% an API misuse.
    pub fn with_args(&self, args: Vec<Aexp>) -> Gate {
        let mut it = args.into_iter();
        let mut arg = move || it.next().expect("argument count mismatch");
        match self {
            Gate::Hole => Gate::Hole,
            Gate::H(_) => Gate::H(arg()),
            Gate::X(_) => Gate::X(arg()),
            Gate::Ry(..) => Gate::Ry(arg(), arg(), arg()),
            Gate::Cx(..) => Gate::Cx(arg(), arg()),
            Gate::CRy(..) => Gate::CRy(arg(), arg(), arg(), arg()),
        }
    }

    pub fn cost(&self) -> u64 {
        match self {
            Gate::Hole => 3,
            _ => self.args().iter().map(|a| a.cost()).sum::<u64>() + 2,
        }
    }

    pub fn depth(&self) -> u64 {
        1 + self.args().iter().map(|a| a.depth()).max().unwrap_or(0)
    }

    pub fn terminated(&self) -> bool {
        match self {
            Gate::Hole => false,
            _ => self.args().iter().all(|a| a.terminated()),
        }
    }

    pub fn references(&self, name: &str) -> bool {
        self.args().iter().any(|a| a.references(name))
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Hole => write!(f, "_"),
            Gate::H(q) => write!(f, "H({q})"),
            Gate::X(q) => write!(f, "X({q})"),
            Gate::Ry(q, p, den) => write!(f, "Ry({q}, {p}, {den})"),
            Gate::Cx(c, t) => write!(f, "CX({c}, {t})"),
            Gate::CRy(c, t, p, den) => write!(f, "CRy({c}, {t}, {p}, {den})"),
        }
    }
}

/// Names of the concrete gates, used for the specification's enabled-gate
/// set and by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    H,
    X,
    Ry,
    Cx,
    CRy,
}

impl GateKind {
    pub const ALL: [GateKind; 5] = [
        GateKind::H,
        GateKind::X,
        GateKind::Ry,
        GateKind::Cx,
        GateKind::CRy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::H => "H",
            GateKind::X => "X",
            GateKind::Ry => "Ry",
            GateKind::Cx => "CX",
            GateKind::CRy => "CRy",
        }
    }

    pub fn from_name(name: &str) -> Option<GateKind> {
        GateKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn arity(self) -> usize {
        match self {
            GateKind::H | GateKind::X => 1,
            GateKind::Cx => 2,
            GateKind::Ry => 3,
            GateKind::CRy => 4,
        }
    }

    /// A fresh instance with every argument slot a hole.
    pub fn hole_instance(self) -> Gate {
        match self {
            GateKind::H => Gate::H(Aexp::Hole),
            GateKind::X => Gate::X(Aexp::Hole),
            GateKind::Ry => Gate::Ry(Aexp::Hole, Aexp::Hole, Aexp::Hole),
            GateKind::Cx => Gate::Cx(Aexp::Hole, Aexp::Hole),
            GateKind::CRy => Gate::CRy(Aexp::Hole, Aexp::Hole, Aexp::Hole, Aexp::Hole),
        }
    }

    /// Instantiate from a parsed argument list, or `None` on an arity
    /// mismatch.
    pub fn instantiate(self, args: &[Aexp]) -> Option<Gate> {
        match (self, args) {
            (GateKind::H, [q]) => Some(Gate::H(q.clone())),
            (GateKind::X, [q]) => Some(Gate::X(q.clone())),
            (GateKind::Ry, [q, p, den]) => Some(Gate::Ry(q.clone(), p.clone(), den.clone())),
            (GateKind::Cx, [c, t]) => Some(Gate::Cx(c.clone(), t.clone())),
            (GateKind::CRy, [c, t, p, den]) => {
                Some(Gate::CRy(c.clone(), t.clone(), p.clone(), den.clone()))
            }
            _ => None,
        }
    }
}

/// Commands: straight-line sequencing, counted loops and gate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cmd {
    Hole,
    Seq(Box<Cmd>, Box<Cmd>),
    For(String, Aexp, Aexp, Box<Cmd>),
    Gate(Gate),
}

impl Cmd {
    pub fn seq(pre: Cmd, post: Cmd) -> Cmd {
        Cmd::Seq(Box::new(pre), Box::new(post))
    }

    pub fn for_loop(var: impl Into<String>, start: Aexp, end: Aexp, body: Cmd) -> Cmd {
        Cmd::For(var.into(), start, end, Box::new(body))
    }

    pub fn cost(&self) -> u64 {
        match self {
            Cmd::Hole => 5,
            Cmd::Seq(pre, post) => pre.cost() + post.cost() + 5,
            Cmd::For(_, start, end, body) => start.cost() + end.cost() + body.cost() + 3,
            Cmd::Gate(gate) => gate.cost(),
        }
    }

    pub fn depth(&self) -> u64 {
        match self {
            Cmd::Hole => 1,
            Cmd::Seq(pre, post) => 1 + pre.depth().max(post.depth()),
            Cmd::For(_, start, end, body) => {
                1 + start.depth().max(end.depth()).max(body.depth())
            }
            Cmd::Gate(gate) => 1 + gate.depth(),
        }
    }

    pub fn terminated(&self) -> bool {
        match self {
            Cmd::Hole => false,
            Cmd::Seq(pre, post) => pre.terminated() && post.terminated(),
            Cmd::For(_, start, end, body) => {
                start.terminated() && end.terminated() && body.terminated()
            }
            Cmd::Gate(gate) => gate.terminated(),
        }
    }

    pub fn references(&self, name: &str) -> bool {
        match self {
            Cmd::Hole => false,
            Cmd::Seq(pre, post) => pre.references(name) || post.references(name),
            Cmd::For(_, start, end, body) => {
                start.references(name) || end.references(name) || body.references(name)
            }
            Cmd::Gate(gate) => gate.references(name),
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Hole => write!(f, "_"),
            Cmd::Seq(pre, post) => write!(f, "{pre}\n{post}"),
            Cmd::For(var, start, end, body) => {
                write!(f, "for {var} in range({start},{end}):\n{}", indent(&body.to_string()))
            }
            Cmd::Gate(gate) => write!(f, "{gate}"),
        }
    }
}

/// A whole program: a parameterized circuit builder. The parameter is the
/// qubit count the program is instantiated with at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pgm {
    pub param: String,
    pub body: Cmd,
}

impl Pgm {
    pub fn new(param: impl Into<String>, body: Cmd) -> Pgm {
        Pgm {
            param: param.into(),
            body,
        }
    }

    /// The empty sketch: a program whose whole body is still unknown.
    pub fn empty(param: impl Into<String>) -> Pgm {
        Pgm::new(param, Cmd::Hole)
    }

    pub fn cost(&self) -> u64 {
        self.body.cost()
    }

    pub fn depth(&self) -> u64 {
        self.body.depth()
    }

    pub fn terminated(&self) -> bool {
        self.body.terminated()
    }
}

impl fmt::Display for Pgm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def pgm({}):\n{}", self.param, indent(&self.body.to_string()))
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("{TAB}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
