//! The optimization context: an [`Aig`] together with its FEC partition, an optional simulation
//! log and the pass configuration.
//!
//! Every pass goes through [`Circuit`], so that structural changes never leave the FEC groups
//! pointing at deleted nodes.
//!
//! A typical flow:
//!
//! ```rust
//! use fraigr::{circuit::Circuit, cnf::VarisatOracle};
//!
//! let src = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n";
//! let mut circuit = Circuit::from_ascii(src.as_bytes()).unwrap();
//! circuit.strash();
//! circuit.optimize();
//! circuit.random_sim().unwrap();
//! let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
//! assert_eq!(report.merges, 1);
//! assert_eq!(circuit.aig().num_ands(), 1);
//! ```

use std::{
    io::{BufRead, Write},
    path::Path,
};

use crate::{
    Aig, NodeId, Result,
    config::Config,
    fec::FecGroups,
};

/// An AIG being optimized.
pub struct Circuit {
    pub(crate) aig: Aig,
    pub(crate) fec: FecGroups,
    /// Receives the simulated patterns and output values, one line per pattern.
    pub(crate) sim_log: Option<Box<dyn Write>>,
    pub(crate) config: Config,
}

impl Circuit {
    /// Wraps an AIG with the default configuration. The evaluation order is rebuilt.
    pub fn new(aig: Aig) -> Self {
        Self::with_config(aig, Config::default())
    }

    pub fn with_config(mut aig: Aig, config: Config) -> Self {
        aig.rebuild_dfs();
        Circuit {
            aig,
            fec: FecGroups::new(),
            sim_log: None,
            config,
        }
    }

    /// See [`Aig::from_ascii`].
    pub fn from_ascii(reader: impl BufRead) -> Result<Self> {
        Ok(Self::new(Aig::from_ascii(reader)?))
    }

    /// See [`Aig::from_file`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Aig::from_file(path)?))
    }

    pub fn aig(&self) -> &Aig {
        &self.aig
    }

    pub fn into_aig(self) -> Aig {
        self.aig
    }

    pub fn fec_groups(&self) -> &FecGroups {
        &self.fec
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Sets (or removes) the simulation log.
    pub fn set_sim_log(&mut self, sim_log: Option<Box<dyn Write>>) {
        self.sim_log = sim_log;
    }

    /// Writes the current circuit, see [`Aig::write_aag`].
    pub fn write_aag(&self, w: &mut impl Write) -> Result<()> {
        self.aig.write_aag(w)
    }

    /// See [`Aig::strash`].
    pub fn strash(&mut self) -> usize {
        let merges = self.aig.strash();
        self.fec.prune(&mut self.aig);
        merges
    }

    /// See [`Aig::optimize`].
    pub fn optimize(&mut self) -> usize {
        let collapses = self.aig.optimize();
        self.fec.prune(&mut self.aig);
        collapses
    }

    /// See [`Aig::sweep`].
    pub fn sweep(&mut self) -> usize {
        let removed = self.aig.sweep();
        self.fec.prune(&mut self.aig);
        removed
    }

    /// The FEC groups, each member paired with its inversion relative to the group
    /// representative (set when their last signatures differ).
    pub fn fec_pairs(&self) -> Vec<Vec<(NodeId, bool)>> {
        self.fec
            .iter()
            .map(|group| {
                let reference = self.aig.node(group[0]).sim_value();
                group
                    .iter()
                    .map(|&id| (id, self.aig.node(id).sim_value() != reference))
                    .collect()
            })
            .collect()
    }

    /// The other members of the FEC group of `id`, with their inversion relative to `id`.
    pub fn fecs_of(&self, id: NodeId) -> Vec<(NodeId, bool)> {
        let node = self.aig.node(id);
        let Some(slot) = node.fec_slot() else {
            return Vec::new();
        };
        self.fec
            .group(slot.group)
            .iter()
            .filter(|&&other| other != id)
            .map(|&other| (other, self.aig.node(other).sim_value() != node.sim_value()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::VarisatOracle;
    use pretty_assertions::assert_eq;

    /// a3 = i1 & i2, a4 = i2 & i1 (same function), a5 = i1 & !i2
    const SRC: &str = "aag 5 2 0 3 3\n2\n4\n6\n8\n10\n6 2 4\n8 4 2\n10 2 5\n";

    #[test]
    fn fec_reporting() {
        let mut circuit = Circuit::from_ascii(SRC.as_bytes()).unwrap();
        assert!(circuit.fec_pairs().is_empty());
        // i1 = 0b1100, i2 = 0b1010
        circuit.simulate_batch(&[0b1100, 0b1010], 4, false).unwrap();
        assert_eq!(circuit.fec_pairs(), vec![vec![(3, false), (4, false)]]);
        assert_eq!(circuit.fecs_of(4), vec![(3, false)]);
        assert!(circuit.fecs_of(5).is_empty());
    }

    #[test]
    fn strash_prunes_fec_groups() {
        let mut circuit = Circuit::from_ascii(SRC.as_bytes()).unwrap();
        circuit.simulate_batch(&[0b1100, 0b1010], 4, false).unwrap();
        assert_eq!(circuit.fec_groups().len(), 1);
        // a4 is not a structural copy of a3 (swapped fanins), nothing to merge
        assert_eq!(circuit.strash(), 0);
        assert_eq!(circuit.fec_groups().len(), 1);
        assert_eq!(circuit.optimize(), 0);
        circuit.aig().check_integrity().unwrap();
    }

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
    fn full_flow() {
        // a3 = i1 & i2, a4 = i1 & i2, a5 = i2 & i1, a6 = a3 & 1, a7 = i1 & !i1 (unused)
        // o8 = a4, o9 = !a5, o10 = a6
        let src = "aag 7 2 0 3 5\n2\n4\n8\n11\n12\n6 2 4\n8 2 4\n10 4 2\n12 6 1\n14 2 3\n";
        let mut circuit = Circuit::from_ascii(src.as_bytes()).unwrap();
        let original = circuit.aig().clone();
        let words = [0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210];

        assert_eq!(circuit.strash(), 1);
        assert_eq!(circuit.optimize(), 1);
        assert_eq!(circuit.sweep(), 1);
        assert_eq!(circuit.aig().num_ands(), 2);
        circuit.random_sim().unwrap();
        assert_eq!(circuit.fec_groups().len(), 1);
        let report = circuit.fraig(&mut VarisatOracle::new()).unwrap();
        assert_eq!(report.merges, 1);
        assert_eq!(circuit.aig().num_ands(), 1);
        circuit.aig().check_integrity().unwrap();
        assert_eq!(outputs(circuit.aig(), &words), outputs(&original, &words));

        let mut out = Vec::new();
        circuit.write_aag(&mut out).unwrap();
        let reparsed = Aig::from_ascii(out.as_slice()).unwrap();
        assert_eq!(reparsed.num_ands(), 1);
        assert_eq!(reparsed.num_outputs(), 3);
        assert_eq!(outputs(&reparsed, &words), outputs(&original, &words));
    }

    #[test]
    fn config_is_applied() {
        let mut config = Config::default();
        config.fraig.stagnation_limit = 1;
        let circuit = Circuit::with_config(Aig::new(), config);
        assert_eq!(circuit.config().fraig.stagnation_limit, 1);
    }
}
