//! SAT sweeping (FRAIG): proves or refutes the FEC candidates and merges the proven ones.
//!
//! Each round encodes the whole evaluation order into a fresh SAT session, walks it and asks the
//! oracle whether every unprocessed AND gate differs from the other members of its FEC group.
//! - UNSAT: the pair is equivalent and is merged at the end of the round.
//! - SAT: the model is a distinguishing pattern. Patterns are packed 64 to a word and simulated,
//!   which splits the group.
//!
//! Rounds go on until no group is left or the group count stagnates.

use log::{debug, info, warn};

use crate::{
    Aig, FaninId, NodeId, NodeKind, Result,
    circuit::Circuit,
    cnf::{SatOracle, SatResult, Var},
    sim::WORD_BITS,
};

/// What a call to [`Circuit::fraig`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FraigReport {
    /// Number of rounds, one SAT session each.
    pub rounds: usize,
    /// Number of gates merged into an equivalent node (or the constant).
    pub merges: usize,
    /// Number of distinguishing patterns extracted from SAT models.
    pub counterexamples: usize,
    /// Did the loop give up with FEC groups left?
    pub stagnated: bool,
}

/// Distinguishing patterns waiting to be simulated, one word per primary input.
struct Counterexamples {
    words: Vec<u64>,
    count: usize,
}

impl Counterexamples {
    fn new(num_inputs: usize) -> Self {
        Counterexamples {
            words: vec![0; num_inputs],
            count: 0,
        }
    }

    /// Shifts in the value of every primary input in the last model. Unassigned inputs read 0.
    fn record<S: SatOracle>(&mut self, aig: &Aig, vars: &[Option<Var>], oracle: &S) {
        for (word, &id) in self.words.iter_mut().zip(aig.get_inputs()) {
            let value = vars[id].and_then(|var| oracle.value(var)).unwrap_or(false);
            *word = (*word << 1) | value as u64;
        }
        self.count += 1;
    }

    fn is_full(&self) -> bool {
        self.count == WORD_BITS
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Hands out the pending words and their number of valid patterns, and starts a new word.
    fn take(&mut self) -> (Vec<u64>, usize) {
        let len = self.words.len();
        let words = std::mem::replace(&mut self.words, vec![0; len]);
        let count = std::mem::replace(&mut self.count, 0);
        (words, count)
    }
}

/// The variable of an already encoded node. Nodes that are not encoded before their consumers
/// are undefined, they get a fresh variable pinned to false.
fn fanin_var<S: SatOracle>(vars: &mut [Option<Var>], oracle: &mut S, id: NodeId) -> Var {
    if let Some(var) = vars[id] {
        return var;
    }
    let var = oracle.new_var();
    oracle.add_const(var.lit(false), false);
    vars[id] = Some(var);
    var
}

/// Encodes every node of the evaluation order into `oracle`, returns the variable of each node.
///
/// The constant is pinned to false and outputs share the variable of their fanin.
fn encode<S: SatOracle>(aig: &Aig, oracle: &mut S) -> Vec<Option<Var>> {
    let mut vars: Vec<Option<Var>> = vec![None; aig.id_bound()];
    let constant = oracle.new_var();
    oracle.add_const(constant.lit(false), false);
    vars[0] = Some(constant);

    for &id in aig.dfs_list() {
        let node = aig.node(id);
        match node.kind() {
            NodeKind::False | NodeKind::Undefined => (),
            NodeKind::Input => vars[id] = Some(oracle.new_var()),
            NodeKind::Output => {
                let fanin = node.fanin(FaninId::Fanin0);
                let var = fanin_var(&mut vars, oracle, fanin.get_node_id());
                vars[id] = Some(var);
            }
            NodeKind::And => {
                let f0 = node.fanin(FaninId::Fanin0);
                let f1 = node.fanin(FaninId::Fanin1);
                let a = fanin_var(&mut vars, oracle, f0.get_node_id()).lit(f0.get_complement());
                let b = fanin_var(&mut vars, oracle, f1.get_node_id()).lit(f1.get_complement());
                let z = oracle.new_var();
                oracle.add_and(z.lit(false), a, b);
                vars[id] = Some(z);
            }
        }
    }
    vars
}

fn var(vars: &[Option<Var>], id: NodeId) -> Var {
    match vars[id] {
        Some(var) => var,
        None => panic!("node {} is not encoded", id),
    }
}

/// Can `a` differ from `b ^ inv`? With `b` unset, can `a ^ inv` be true?
fn prove<S: SatOracle>(
    oracle: &mut S,
    vars: &[Option<Var>],
    a: NodeId,
    b: Option<NodeId>,
    inv: bool,
) -> Result<SatResult> {
    oracle.assume_release();
    match b {
        None => oracle.assume(var(vars, a).lit(inv)),
        Some(b) => {
            let x = oracle.new_var();
            oracle.add_xor(x.lit(false), var(vars, a).lit(false), var(vars, b).lit(inv));
            oracle.assume(x.lit(false));
        }
    }
    let result = oracle.solve()?;
    match b {
        None => debug!("Proving {} against the constant: {:?}", a, result),
        Some(b) => debug!(
            "Proving {} == {}{}: {:?}",
            a,
            if inv { "!" } else { "" },
            b,
            result
        ),
    }
    Ok(result)
}

impl Circuit {
    /// Simulates the pending counterexamples, without logging them.
    fn flush_counterexamples(&mut self, cex: &mut Counterexamples) -> Result<usize> {
        let (words, count) = cex.take();
        let groups = self.simulate_batch(&words, count, false)?;
        info!("Updating by SAT... Total #FEC Group = {}", groups);
        Ok(groups)
    }

    /// Proves the FEC candidates with `oracle` and merges the equivalent nodes.
    ///
    /// Needs FEC groups from a previous simulation ([`Circuit::random_sim`] or
    /// [`Circuit::file_sim`]). Merges keep the phase observed in simulation: a node whose
    /// signature differs from its representative is replaced by the inverted representative.
    ///
    /// The FEC partition is cleared when done, so that a later simulation starts over.
    pub fn fraig<S: SatOracle>(&mut self, oracle: &mut S) -> Result<FraigReport> {
        let mut report = FraigReport::default();
        if !self.fec.is_seeded() {
            warn!("No FEC group to prove, simulate the circuit first");
            return Ok(report);
        }

        let mut cex = Counterexamples::new(self.aig.num_inputs());
        let mut fail = 0;
        let mut previous = 0;
        while !self.fec.is_empty() && fail < self.config.fraig.stagnation_limit {
            report.rounds += 1;
            oracle.reset();
            let vars = encode(&self.aig, oracle);
            let mut fraiged = vec![false; self.aig.id_bound()];
            // (merged node, representative)
            let mut merges: Vec<(NodeId, NodeId)> = Vec::new();

            for k in 0..self.aig.dfs_list().len() {
                let id = self.aig.dfs_list()[k];
                let node = self.aig.node(id);
                if fraiged[id] || !node.is_and() {
                    continue;
                }
                let Some(slot) = node.fec_slot() else {
                    continue;
                };
                fraiged[id] = true;
                let group = self.fec.group(slot.group).to_vec();

                if group[0] == 0 {
                    let inv = self.aig.node(id).sim_value() != self.aig.node(0).sim_value();
                    match prove(oracle, &vars, id, None, inv)? {
                        SatResult::Unsat => merges.push((id, 0)),
                        SatResult::Sat => {
                            cex.record(&self.aig, &vars, &*oracle);
                            report.counterexamples += 1;
                            if cex.is_full() {
                                self.flush_counterexamples(&mut cex)?;
                            }
                        }
                    }
                    continue;
                }

                for &member in &group {
                    if member == id || fraiged[member] {
                        continue;
                    }
                    let inv = self.aig.node(id).sim_value() != self.aig.node(member).sim_value();
                    match prove(oracle, &vars, id, Some(member), inv)? {
                        SatResult::Unsat => {
                            fraiged[member] = true;
                            merges.push((member, id));
                        }
                        SatResult::Sat => {
                            cex.record(&self.aig, &vars, &*oracle);
                            report.counterexamples += 1;
                            if cex.is_full() {
                                self.flush_counterexamples(&mut cex)?;
                                // the group was just split, move on to the next node
                                break;
                            }
                        }
                    }
                }
            }

            for &(del, rep) in &merges {
                let inv = self.aig.node(del).sim_value() != self.aig.node(rep).sim_value();
                info!("Fraig: {} merging {}{}...", rep, if inv { "!" } else { "" }, del);
                self.fec.remove_member(&mut self.aig, del);
                self.aig.replace_node(del, rep, inv);
            }
            report.merges += merges.len();
            self.aig.rebuild_dfs();
            self.fec.prune(&mut self.aig);
            info!("Updating by UNSAT... Total #FEC Group = {}", self.fec.len());

            if !cex.is_empty() {
                self.flush_counterexamples(&mut cex)?;
            }

            let current = self.fec.len();
            if current == previous {
                fail += 1;
            } else {
                fail = 0;
            }
            previous = current;
        }

        report.stagnated = !self.fec.is_empty();
        if report.stagnated {
            warn!(
                "Giving up after {} rounds with {} FEC groups left",
                report.rounds,
                self.fec.len()
            );
        }
        self.fec.clear(&mut self.aig);
        info!(
            "Fraig: {} merges, {} counterexamples in {} rounds",
            report.merges, report.counterexamples, report.rounds
        );
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AigEdge, cnf::VarisatOracle, config::Config};
    use pretty_assertions::assert_eq;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn and(aig: &mut Aig, id: usize, f0: (usize, bool), f1: (usize, bool)) {
        aig.add_and(id, AigEdge::new(f0.0, f0.1), AigEdge::new(f1.0, f1.1), id)
            .unwrap();
    }

    /// Output signatures for the given input words.
    fn outputs(aig: &Aig, words: &[u64]) -> Vec<u64> {
        let mut aig = aig.clone();
        aig.set_input_values(words);
        aig.simulate();
        aig.get_outputs()
            .iter()
            .map(|&id| aig.node(id).sim_value())
            .collect()
    }

    #[test]
    fn redundant_gate_is_merged() {
        init();
        // a3 = i1 & i2, a4 = i1 & a3 (= a3)
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_input(2, 2).unwrap();
        and(&mut aig, 3, (1, false), (2, false));
        and(&mut aig, 4, (1, false), (3, false));
        aig.add_output(5, AigEdge::new(3, false), 5).unwrap();
        aig.add_output(6, AigEdge::new(4, false), 6).unwrap();
        let mut circuit = Circuit::new(aig);
        circuit.random_sim().unwrap();
        assert_eq!(circuit.fec_groups().iter().collect::<Vec<_>>(), vec![&[3, 4][..]]);

        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(
            report,
            FraigReport {
                rounds: 1,
                merges: 1,
                counterexamples: 0,
                stagnated: false,
            }
        );
        let aig = circuit.aig();
        assert!(aig.get_node(4).is_none());
        assert_eq!(aig.node(6).get_fanins(), &[AigEdge::new(3, false)]);
        assert_eq!(aig.num_ands(), 1);
        assert!(circuit.fec_groups().is_empty());
        assert!(!circuit.fec_groups().is_seeded());
        aig.check_integrity().unwrap();
        aig.check_dfs().unwrap();
    }

    #[test]
    fn counterexample_splits_candidates() {
        init();
        // a4 = i1 & i2, a5 = i1 & i3: equal as long as i2 == i3
        let src = "aag 5 3 0 2 2\n2\n4\n6\n8\n10\n8 2 4\n10 2 6\n";
        let mut circuit = Circuit::from_ascii(src.as_bytes()).unwrap();
        circuit.file_sim("000 011 100 111".as_bytes()).unwrap();
        assert_eq!(circuit.fec_groups().iter().collect::<Vec<_>>(), vec![&[4, 5][..]]);

        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(report.merges, 0);
        assert_eq!(report.counterexamples, 1);
        assert_eq!(report.rounds, 1);
        assert!(!report.stagnated);
        // the last simulation is the counterexample, which tells them apart
        let aig = circuit.aig();
        assert_ne!(aig.node(4).sim_value(), aig.node(5).sim_value());
        assert_eq!(aig.num_ands(), 2);
    }

    #[test]
    fn gate_proven_constant() {
        init();
        // a3 = i1 & i2, a4 = a3 & !i1 (always false)
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_input(2, 2).unwrap();
        and(&mut aig, 3, (1, false), (2, false));
        and(&mut aig, 4, (3, false), (1, true));
        aig.add_output(5, AigEdge::new(4, true), 5).unwrap();
        aig.add_output(6, AigEdge::new(3, false), 6).unwrap();
        let mut circuit = Circuit::new(aig);
        assert_eq!(circuit.optimize(), 0);
        circuit.random_sim().unwrap();
        assert_eq!(circuit.fec_groups().iter().collect::<Vec<_>>(), vec![&[0, 4][..]]);

        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(report.merges, 1);
        let aig = circuit.aig();
        assert!(aig.get_node(4).is_none());
        assert_eq!(aig.node(5).get_fanins(), &[AigEdge::new(0, true)]);
        aig.check_integrity().unwrap();
    }

    #[test]
    fn merges_preserve_outputs() {
        init();
        // xnor twice, the second copy with swapped fanins everywhere:
        // a3 = i1 & !i2, a4 = !i1 & i2, a5 = !a3 & !a4
        // a6 = !i2 & i1, a7 = i2 & !i1, a8 = !a7 & !a6
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_input(2, 2).unwrap();
        and(&mut aig, 3, (1, false), (2, true));
        and(&mut aig, 4, (1, true), (2, false));
        and(&mut aig, 5, (3, true), (4, true));
        and(&mut aig, 6, (2, true), (1, false));
        and(&mut aig, 7, (2, false), (1, true));
        and(&mut aig, 8, (7, true), (6, true));
        aig.add_output(9, AigEdge::new(5, false), 9).unwrap();
        aig.add_output(10, AigEdge::new(8, true), 10).unwrap();
        let words = [0xf0f0_3c3c_aaaa_0f0f, 0x1234_5678_9abc_def0];
        let expected = outputs(&aig, &words);

        let mut circuit = Circuit::new(aig);
        assert_eq!(circuit.strash(), 0);
        circuit.random_sim().unwrap();
        assert_eq!(circuit.fec_groups().len(), 3);
        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(report.merges, 3);
        assert_eq!(circuit.aig().num_ands(), 3);
        assert_eq!(outputs(circuit.aig(), &words), expected);
        circuit.aig().check_integrity().unwrap();
    }

    #[test]
    fn fraig_without_simulation_does_nothing() {
        init();
        let src = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
        let mut circuit = Circuit::from_ascii(src.as_bytes()).unwrap();
        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(report, FraigReport::default());
        assert_eq!(circuit.aig().num_ands(), 2);
    }

    #[test]
    fn full_word_of_counterexamples_mid_round() {
        init();
        // n_k = i1 & i_k for k in 2..=80, all alike on "all ones" and "all zeros"
        let num_inputs = 80;
        let mut aig = Aig::new();
        for id in 1..=num_inputs {
            aig.add_input(id, id).unwrap();
        }
        let first_gate = num_inputs + 1;
        for k in 2..=num_inputs {
            and(&mut aig, first_gate + k - 2, (1, false), (k, false));
        }
        let num_gates = num_inputs - 1;
        for g in 0..num_gates {
            let id = first_gate + num_gates + g;
            aig.add_output(id, AigEdge::new(first_gate + g, false), id)
                .unwrap();
        }
        let mut circuit = Circuit::new(aig);
        let patterns = format!("{} {}", "1".repeat(num_inputs), "0".repeat(num_inputs));
        circuit.file_sim(patterns.as_bytes()).unwrap();
        assert_eq!(circuit.fec_groups().len(), 1);
        assert_eq!(circuit.fec_groups().group(0).len(), num_gates);

        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert!(report.counterexamples >= WORD_BITS);
        assert_eq!(report.merges, 0);
        assert!(!report.stagnated);
        assert_eq!(circuit.aig().num_ands(), num_gates);
        circuit.aig().check_integrity().unwrap();
    }

    /// Answers SAT to everything, with an empty model.
    struct Stubborn;

    impl SatOracle for Stubborn {
        fn reset(&mut self) {}

        fn new_var(&mut self) -> Var {
            Var(0)
        }

        fn add_clause(&mut self, _clause: &crate::cnf::Clause) {}

        fn assume_release(&mut self) {}

        fn assume(&mut self, _lit: crate::cnf::Lit) {}

        fn solve(&mut self) -> Result<SatResult> {
            Ok(SatResult::Sat)
        }

        fn value(&self, _var: Var) -> Option<bool> {
            None
        }
    }

    #[test]
    fn gives_up_on_stagnation() {
        init();
        // the all-zero counterexample never separates a4 from a5
        let src = "aag 5 3 0 2 2\n2\n4\n6\n8\n10\n8 2 4\n10 2 6\n";
        let mut config = Config::default();
        config.fraig.stagnation_limit = 2;
        let mut circuit = Circuit::with_config(Aig::from_ascii(src.as_bytes()).unwrap(), config);
        circuit.file_sim("011 111".as_bytes()).unwrap();
        assert_eq!(circuit.fec_groups().len(), 1);

        let report = circuit.fraig(&mut Stubborn).unwrap();
        assert_eq!(
            report,
            FraigReport {
                rounds: 3,
                merges: 0,
                counterexamples: 3,
                stagnated: true,
            }
        );
        assert!(circuit.fec_groups().is_empty());
        assert_eq!(circuit.aig().num_ands(), 2);
    }
}
