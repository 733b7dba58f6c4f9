//! Syntax tree of host-side scene code.

// ── Types ─────────────────────────────────────────────────────────────────

/// Declared type of a local. Every value is a vector of one to four lanes;
/// integer types truncate toward zero when stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub width: u8,
    pub integer: bool,
}

impl TypeName {
    pub const FLOAT: Self = Self { width: 1, integer: false };
    pub const FLOAT3: Self = Self { width: 3, integer: false };
    pub const FLOAT4: Self = Self { width: 4, integer: false };
    pub const INT: Self = Self { width: 1, integer: true };

    /// `float`, `float2`..`float4`, `half*`, `int*` and `uint*`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let (base, integer) = ["float", "half", "uint", "int"]
            .iter()
            .find_map(|base| word.strip_prefix(base).map(|rest| (rest, base.ends_with("int"))))?;
        let width = match base {
            "" | "1" => 1,
            "2" => 2,
            "3" => 3,
            "4" => 4,
            _ => return None,
        };
        Some(Self { width, integer })
    }
}

// ── Swizzle ───────────────────────────────────────────────────────────────

/// Component selection such as `.xz` or `.rgb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Swizzle {
    lanes: [u8; 4],
    len: u8,
}

impl Swizzle {
    /// Parses `xyzw` or `rgba` selectors, one to four long, never mixing
    /// the two sets.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || text.len() > 4 {
            return None;
        }
        let set = if text.chars().all(|c| "xyzw".contains(c)) {
            "xyzw"
        } else if text.chars().all(|c| "rgba".contains(c)) {
            "rgba"
        } else {
            return None;
        };
        let mut lanes = [0; 4];
        for (slot, c) in lanes.iter_mut().zip(text.chars()) {
            *slot = set.find(c)? as u8;
        }
        Some(Self { lanes, len: text.len() as u8 })
    }

    #[inline]
    pub fn lanes(&self) -> &[u8] {
        &self.lanes[..self.len as usize]
    }

    /// `true` when no lane is selected twice, i.e. the swizzle can be
    /// assigned to.
    pub fn is_writable(&self) -> bool {
        let lanes = self.lanes();
        lanes.iter().enumerate().all(|(i, l)| !lanes[..i].contains(l))
    }
}

// ── Expressions ───────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f32),
    Var(String),
    Call { name: String, args: Vec<Expr> },
    /// `float3(a, b)` style constructor.
    Construct { ty: TypeName, args: Vec<Expr> },
    Swizzle { base: Box<Expr>, swizzle: Swizzle },
    Neg(Box<Expr>),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `cond ? then : otherwise`, per component.
    Select { cond: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
}

// ── Statements ────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// Arithmetic applied before storing, for compound assignment.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
        }
    }
}

/// Assignment target: a local, or some lanes of one.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub swizzle: Option<Swizzle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare { ty: TypeName, name: String, init: Option<Expr> },
    Assign { target: Place, op: AssignOp, value: Expr },
    Expr(Expr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_keywords() {
        assert_eq!(TypeName::from_keyword("float"), Some(TypeName::FLOAT));
        assert_eq!(TypeName::from_keyword("float3"), Some(TypeName::FLOAT3));
        assert_eq!(TypeName::from_keyword("half4"), Some(TypeName::FLOAT4));
        assert_eq!(TypeName::from_keyword("int"), Some(TypeName::INT));
        assert_eq!(
            TypeName::from_keyword("uint2"),
            Some(TypeName { width: 2, integer: true })
        );
        assert_eq!(TypeName::from_keyword("float5"), None);
        assert_eq!(TypeName::from_keyword("float4x4"), None);
        assert_eq!(TypeName::from_keyword("floaty"), None);
        assert_eq!(TypeName::from_keyword("interior"), None);
    }

    #[test]
    fn swizzle_sets() {
        assert_eq!(Swizzle::parse("xz").unwrap().lanes(), &[0, 2]);
        assert_eq!(Swizzle::parse("bgra").unwrap().lanes(), &[2, 1, 0, 3]);
        assert_eq!(Swizzle::parse("xyzwx"), None);
        assert_eq!(Swizzle::parse("xg"), None);
        assert_eq!(Swizzle::parse("origin"), None);
        assert_eq!(Swizzle::parse(""), None);
    }

    #[test]
    fn repeated_lanes_are_read_only() {
        assert!(Swizzle::parse("xy").unwrap().is_writable());
        assert!(!Swizzle::parse("xx").unwrap().is_writable());
    }
}
