//! SAT literals, clauses, and the incremental oracle used to prove node equivalences.
//!
//! The FRAIG loop only talks to a [`SatOracle`]: it allocates variables, adds clauses
//! (mostly through [`SatOracle::add_and`] and [`SatOracle::add_xor`]), assumes literals and
//! asks for a verdict. Learned clauses survive between calls, only assumptions are released.
//!
//! [`VarisatOracle`] is the implementation backed by the [varisat](https://docs.rs/varisat) solver.

use std::{collections::HashSet, ops::Not};

use log::debug;
use varisat::ExtendFormula;

use crate::{AigError, Result};

/// A SAT variable, handed out by [`SatOracle::new_var`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(pub(crate) u32);

impl Var {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The literal of this variable, negated if `complement` is set.
    pub fn lit(self, complement: bool) -> Lit {
        let lit = Lit(self.0 as i64 + 1);
        if complement { !lit } else { lit }
    }
}

/// A SAT literal, in DIMACS convention (variable `k` is `k + 1`, negation is the opposite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit(i64);

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl From<i64> for Lit {
    fn from(value: i64) -> Self {
        if value == 0 {
            panic!("Tried to create a Lit from 0. 0 is not a valid literal in DIMACS format.");
        }
        Lit(value)
    }
}

impl Lit {
    pub fn var(self) -> Var {
        Var((self.0.unsigned_abs() - 1) as u32)
    }

    pub fn is_complement(self) -> bool {
        self.0 < 0
    }

    /// The DIMACS integer of this literal.
    pub fn to_dimacs(self) -> i64 {
        self.0
    }
}

/// A SAT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(Vec<Lit>);

impl Clause {
    pub fn lits(&self) -> &[Lit] {
        &self.0
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

impl<const N: usize> From<[Lit; N]> for Clause {
    fn from(value: [Lit; N]) -> Self {
        Clause(value.to_vec())
    }
}

/// Verdict of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    /// The formula is satisfiable under the current assumptions, a model is available.
    Sat,
    /// The formula is unsatisfiable under the current assumptions.
    Unsat,
}

/// An incremental SAT session.
pub trait SatOracle {
    /// Drops every variable, clause and assumption.
    fn reset(&mut self);

    fn new_var(&mut self) -> Var;

    fn add_clause(&mut self, clause: &Clause);

    /// Forgets the assumptions of the previous solve call.
    fn assume_release(&mut self);

    /// Adds an assumption for the next solve call.
    fn assume(&mut self, lit: Lit);

    fn solve(&mut self) -> Result<SatResult>;

    /// Value of `var` in the model of the last [`SatResult::Sat`] verdict, if assigned.
    fn value(&self, var: Var) -> Option<bool>;

    /// Add clauses that encode `z = AND(a, b)`.
    fn add_and(&mut self, z: Lit, a: Lit, b: Lit) {
        self.add_clause(&Clause::from([!a, !b, z]));
        self.add_clause(&Clause::from([a, !z]));
        self.add_clause(&Clause::from([b, !z]));
    }

    /// Add clauses that encode `z = XOR(a, b)`.
    fn add_xor(&mut self, z: Lit, a: Lit, b: Lit) {
        self.add_clause(&Clause::from([a, b, !z]));
        self.add_clause(&Clause::from([a, !b, z]));
        self.add_clause(&Clause::from([!a, b, z]));
        self.add_clause(&Clause::from([!a, !b, !z]));
    }

    /// Pins `lit` to `value` with a unit clause.
    fn add_const(&mut self, lit: Lit, value: bool) {
        self.add_clause(&Clause::from([if value { lit } else { !lit }]));
    }
}

/// A [`SatOracle`] backed by varisat.
///
/// varisat supports incrementality via assume/solve, which is all the FRAIG loop needs.
pub struct VarisatOracle {
    solver: varisat::Solver<'static>,
    vars: Vec<varisat::Lit>,
    assumptions: Vec<varisat::Lit>,
    model: HashSet<varisat::Lit>,
}

impl Default for VarisatOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl VarisatOracle {
    pub fn new() -> Self {
        VarisatOracle {
            solver: varisat::Solver::new(),
            vars: Vec::new(),
            assumptions: Vec::new(),
            model: HashSet::new(),
        }
    }

    /// Number of variables allocated so far.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn to_varisat(&self, lit: Lit) -> varisat::Lit {
        let v = self.vars[lit.var().index()];
        if lit.is_complement() { !v } else { v }
    }
}

impl SatOracle for VarisatOracle {
    fn reset(&mut self) {
        self.solver = varisat::Solver::new();
        self.vars.clear();
        self.assumptions.clear();
        self.model.clear();
    }

    fn new_var(&mut self) -> Var {
        let var = Var(self.vars.len() as u32);
        let lit = self.solver.new_lit();
        self.vars.push(lit);
        var
    }

    fn add_clause(&mut self, clause: &Clause) {
        let lits: Vec<varisat::Lit> = clause.lits().iter().map(|&l| self.to_varisat(l)).collect();
        self.solver.add_clause(&lits);
    }

    fn assume_release(&mut self) {
        self.assumptions.clear();
    }

    fn assume(&mut self, lit: Lit) {
        let lit = self.to_varisat(lit);
        self.assumptions.push(lit);
    }

    fn solve(&mut self) -> Result<SatResult> {
        self.solver.assume(&self.assumptions);
        self.model.clear();
        match self.solver.solve() {
            Ok(true) => {
                if let Some(model) = self.solver.model() {
                    self.model.extend(model);
                }
                debug!("oracle: SAT ({} vars)", self.vars.len());
                Ok(SatResult::Sat)
            }
            Ok(false) => {
                debug!("oracle: UNSAT ({} vars)", self.vars.len());
                Ok(SatResult::Unsat)
            }
            Err(e) => Err(AigError::Oracle(format!("{:?}", e))),
        }
    }

    fn value(&self, var: Var) -> Option<bool> {
        let lit = *self.vars.get(var.index())?;
        if self.model.contains(&lit) {
            Some(true)
        } else if self.model.contains(&!lit) {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn not_lit_test() {
        let l1 = Lit(1);
        assert_eq!(!l1, Lit(-1));
        assert!((!l1).is_complement());
        assert_eq!((!l1).var(), Var(0));
    }

    #[test]
    fn var_lit_test() {
        let v = Var(4);
        assert_eq!(v.lit(false).to_dimacs(), 5);
        assert_eq!(v.lit(true).to_dimacs(), -5);
        assert_eq!(v.lit(true).var(), v);
    }

    #[test]
    #[should_panic]
    fn invalid_lit_from_test() {
        _ = Lit::from(0);
    }

    #[test]
    fn and_gate_is_encoded() {
        let mut oracle = VarisatOracle::new();
        let (a, b, z) = (oracle.new_var(), oracle.new_var(), oracle.new_var());
        oracle.add_and(z.lit(false), a.lit(false), b.lit(true));

        // z can be true only with a and !b
        oracle.assume(z.lit(false));
        assert_eq!(oracle.solve().unwrap(), SatResult::Sat);
        assert_eq!(oracle.value(a), Some(true));
        assert_eq!(oracle.value(b), Some(false));

        oracle.assume_release();
        oracle.assume(z.lit(false));
        oracle.assume(b.lit(false));
        assert_eq!(oracle.solve().unwrap(), SatResult::Unsat);

        // assumptions are gone, the formula itself is fine
        oracle.assume_release();
        assert_eq!(oracle.solve().unwrap(), SatResult::Sat);
    }

    #[test]
    fn xor_gate_is_encoded() {
        let mut oracle = VarisatOracle::new();
        let (a, b, z) = (oracle.new_var(), oracle.new_var(), oracle.new_var());
        oracle.add_xor(z.lit(false), a.lit(false), b.lit(false));
        oracle.add_const(a.lit(false), true);

        oracle.assume(z.lit(false));
        assert_eq!(oracle.solve().unwrap(), SatResult::Sat);
        assert_eq!(oracle.value(b), Some(false));

        oracle.assume_release();
        oracle.assume(z.lit(false));
        oracle.assume(b.lit(false));
        assert_eq!(oracle.solve().unwrap(), SatResult::Unsat);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut oracle = VarisatOracle::new();
        let a = oracle.new_var();
        oracle.add_const(a.lit(false), true);
        oracle.add_const(a.lit(false), false);
        assert_eq!(oracle.solve().unwrap(), SatResult::Unsat);

        oracle.reset();
        assert_eq!(oracle.num_vars(), 0);
        let a = oracle.new_var();
        oracle.add_const(a.lit(true), true);
        assert_eq!(oracle.solve().unwrap(), SatResult::Sat);
        assert_eq!(oracle.value(a), Some(false));
    }
}
