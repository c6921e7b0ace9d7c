//! Constant folding
//!
//! A post-order rewrite: children are optimised first, the node is rebuilt
//! over them, and a rebuilt node whose subtree is constant (no `Var`, no
//! `Deref`) is evaluated once and replaced by a value leaf.
//!
//! A constant subtree that fails to evaluate — `10 / 0` is the canonical
//! case — is kept as built, so the optimised tree reports the same error at
//! evaluation time instead of smuggling one into the AST. Folding a folded
//! tree changes nothing.

use super::ast::Expr;

impl Expr {
    /// Return a tree with every constant subtree folded to a single leaf.
    pub fn optimize(&self) -> Expr {
        match self {
            Expr::Value(_) | Expr::Var { .. } => self.clone(),
            Expr::Cast { vtype, child } => Self::fold(Expr::Cast {
                vtype: *vtype,
                child: Box::new(child.optimize()),
            }),
            Expr::Deref { vtype, child } => Expr::Deref {
                vtype: *vtype,
                child: Box::new(child.optimize()),
            },
            Expr::Unary { op, vtype, child } => Self::fold(Expr::Unary {
                op: *op,
                vtype: *vtype,
                child: Box::new(child.optimize()),
            }),
            Expr::Binary {
                op,
                vtype,
                left,
                right,
            } => Self::fold(Expr::Binary {
                op: *op,
                vtype: *vtype,
                left: Box::new(left.optimize()),
                right: Box::new(right.optimize()),
            }),
        }
    }

    fn fold(node: Expr) -> Expr {
        if node.is_constant() {
            if let Ok(value) = node.evaluate(None) {
                return Expr::Value(value);
            }
        }
        node
    }
}
