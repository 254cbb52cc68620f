//! Bit-parallel simulation: 64 patterns per `u64` word, one word per primary input.
//!
//! Bit `k` of every signature is the value of the node under pattern `k`.
//! After each simulated word the FEC groups are refined, see [`FecGroups::refine`].
//!
//! [`FecGroups::refine`]: crate::fec::FecGroups::refine

use std::io::{BufRead, Write};

use log::info;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{Aig, FaninId, NodeKind, PatternError, Result, circuit::Circuit};

/// Number of patterns simulated at once.
pub const WORD_BITS: usize = u64::BITS as usize;

impl Aig {
    /// Assigns one word to each primary input, in declaration order.
    ///
    /// Panics if the number of words does not match the number of inputs.
    pub fn set_input_values(&mut self, words: &[u64]) {
        assert_eq!(
            words.len(),
            self.num_inputs(),
            "one word per primary input is expected"
        );
        for k in 0..words.len() {
            let id = self.get_inputs()[k];
            self.node_mut(id).sim = words[k];
        }
    }

    /// Evaluates the signature of every node of the evaluation order.
    ///
    /// Undefined nodes are read as constant false.
    pub fn simulate(&mut self) {
        self.node_mut(0).sim = 0;
        for k in 0..self.dfs_list().len() {
            let id = self.dfs_list()[k];
            let node = self.node(id);
            let value = match node.kind() {
                NodeKind::False | NodeKind::Undefined => 0,
                NodeKind::Input => node.sim,
                NodeKind::Output => self.edge_value(node.fanin(FaninId::Fanin0)),
                NodeKind::And => {
                    self.edge_value(node.fanin(FaninId::Fanin0))
                        & self.edge_value(node.fanin(FaninId::Fanin1))
                }
            };
            self.node_mut(id).sim = value;
        }
    }
}

impl Circuit {
    /// Simulates one word of patterns and refines the FEC groups.
    ///
    /// Only the `valid_bits` lowest patterns are logged (when `log` is set and a log is attached).
    /// Returns the number of FEC groups.
    pub(crate) fn simulate_batch(
        &mut self,
        words: &[u64],
        valid_bits: usize,
        log: bool,
    ) -> Result<usize> {
        self.aig.set_input_values(words);
        self.aig.simulate();
        let groups = self.fec.refine(&mut self.aig);
        if log {
            self.write_log(valid_bits)?;
        }
        Ok(groups)
    }

    /// One line per pattern: input bits in declaration order, a space, output bits.
    fn write_log(&mut self, valid_bits: usize) -> Result<()> {
        let Some(sim_log) = self.sim_log.as_mut() else {
            return Ok(());
        };
        for bit in 0..valid_bits {
            let mut line = String::with_capacity(self.aig.num_inputs() + self.aig.num_outputs() + 1);
            for &id in self.aig.get_inputs() {
                line.push(if self.aig.node(id).sim >> bit & 1 == 1 { '1' } else { '0' });
            }
            line.push(' ');
            for &id in self.aig.get_outputs() {
                line.push(if self.aig.node(id).sim >> bit & 1 == 1 { '1' } else { '0' });
            }
            writeln!(sim_log, "{}", line)?;
        }
        Ok(())
    }

    /// Simulates random words until the number of FEC groups stops changing for
    /// [`SimConfig::max_fail_for`] consecutive words, or drops to zero.
    ///
    /// Returns the number of patterns simulated.
    ///
    /// [`SimConfig::max_fail_for`]: crate::config::SimConfig::max_fail_for
    pub fn random_sim(&mut self) -> Result<usize> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.sim.seed);
        let max_fail = self.config.sim.max_fail_for(self.aig.dfs_list().len());
        let mut patterns = 0;
        let mut fail = 0;
        let mut previous = 0;
        while fail < max_fail {
            let words: Vec<u64> = (0..self.aig.num_inputs()).map(|_| rng.next_u64()).collect();
            let current = self.simulate_batch(&words, WORD_BITS, true)?;
            if current == previous {
                fail += 1;
            } else {
                fail = 0;
            }
            previous = current;
            patterns += WORD_BITS;
            info!("Total #FEC Group = {}", current);
            if current == 0 {
                break;
            }
        }
        info!("{} patterns simulated.", patterns);
        Ok(patterns)
    }

    /// Simulates the patterns read from `reader`: whitespace separated strings of `0`/`1`,
    /// one character per primary input.
    ///
    /// The last, partial word is simulated as well. On a malformed pattern, the patterns of the
    /// words completed so far are kept and a [`PatternError`] is returned.
    ///
    /// Returns the number of patterns simulated.
    pub fn file_sim(&mut self, reader: impl BufRead) -> Result<usize> {
        let num_inputs = self.aig.num_inputs();
        let mut words = vec![0u64; num_inputs];
        let mut count = 0;
        for line in reader.lines() {
            let line = line?;
            for pattern in line.split_whitespace() {
                let simulated = WORD_BITS * (count / WORD_BITS);
                let len = pattern.chars().count();
                if len != num_inputs {
                    return Err(PatternError::WidthMismatch {
                        pattern: pattern.to_string(),
                        len,
                        expected: num_inputs,
                        simulated,
                    }
                    .into());
                }
                for (k, ch) in pattern.chars().enumerate() {
                    match ch {
                        '0' => (),
                        '1' => words[k] |= 1 << (count % WORD_BITS),
                        _ => {
                            return Err(PatternError::IllegalCharacter {
                                pattern: pattern.to_string(),
                                ch,
                                simulated,
                            }
                            .into());
                        }
                    }
                }
                count += 1;
                if count % WORD_BITS == 0 {
                    let groups = self.simulate_batch(&words, WORD_BITS, true)?;
                    info!("Total #FEC Group = {}", groups);
                    words.fill(0);
                }
            }
        }
        if count % WORD_BITS != 0 {
            let groups = self.simulate_batch(&words, count % WORD_BITS, true)?;
            info!("Total #FEC Group = {}", groups);
        }
        info!("{} patterns simulated.", count);
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use std::{
        cell::RefCell,
        io::{self, Write},
        rc::Rc,
    };

    use super::*;
    use crate::{AigError, AigEdge, config::Config};
    use pretty_assertions::assert_eq;

    /// a3 = i1 & !i2, a4 = !i1 & i2, a5 = !a3 & !a4 (xnor); o6 = a5, o7 = !a3
    const XNOR: &str = "aag 5 2 0 2 3\n2\n4\n10\n7\n6 2 5\n8 3 4\n10 7 9\n";

    /// A log sink the test can read back.
    #[derive(Clone, Default)]
    struct SharedLog(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedLog {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn simulate_test() {
        let mut aig = Aig::from_ascii(XNOR.as_bytes()).unwrap();
        aig.set_input_values(&[0b1100, 0b1010]);
        aig.simulate();
        assert_eq!(aig.node(3).sim_value(), 0b0100);
        assert_eq!(aig.node(4).sim_value(), 0b0010);
        assert_eq!(aig.node(5).sim_value(), !0b0110);
        assert_eq!(aig.node(6).sim_value(), !0b0110);
        assert_eq!(aig.node(7).sim_value(), !0b0100);
    }

    #[test]
    fn simulate_is_deterministic() {
        let mut aig = Aig::from_ascii(XNOR.as_bytes()).unwrap();
        aig.set_input_values(&[0xdead_beef, 0x0123_4567_89ab_cdef]);
        aig.simulate();
        let first: Vec<u64> = aig.iter_nodes().map(|n| n.sim_value()).collect();
        aig.simulate();
        let second: Vec<u64> = aig.iter_nodes().map(|n| n.sim_value()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn undefined_reads_as_false() {
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_and(2, AigEdge::new(1, false), AigEdge::new(5, true), 2)
            .unwrap();
        aig.add_output(3, AigEdge::new(2, false), 3).unwrap();
        aig.rebuild_dfs();
        aig.set_input_values(&[0b1011]);
        aig.simulate();
        assert_eq!(aig.node(3).sim_value(), 0b1011);
    }

    #[test]
    #[should_panic]
    fn wrong_number_of_words() {
        let mut aig = Aig::from_ascii(XNOR.as_bytes()).unwrap();
        aig.set_input_values(&[0]);
    }

    #[test]
    fn file_sim_logs_partial_word() {
        let mut circuit = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        let log = SharedLog::default();
        circuit.set_sim_log(Some(Box::new(log.clone())));
        let count = circuit.file_sim("00 01\n10\n  11\n".as_bytes()).unwrap();
        assert_eq!(count, 4);
        assert_eq!(log.text(), "00 11\n01 01\n10 00\n11 11\n");
    }

    #[test]
    fn file_sim_errors() {
        let mut circuit = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        let res = circuit.file_sim("00 01 011".as_bytes());
        assert!(matches!(
            res,
            Err(AigError::PatternError(PatternError::WidthMismatch {
                len: 3,
                expected: 2,
                simulated: 0,
                ..
            }))
        ));

        // nothing was simulated by the aborted call
        assert!(!circuit.fec_groups().is_seeded());

        let word = "01\n".repeat(WORD_BITS);
        let mut reference = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        reference.file_sim(word.as_bytes()).unwrap();

        let mut patterns = word.clone();
        patterns.push_str("11\n0x\n");
        let res = circuit.file_sim(patterns.as_bytes());
        match res {
            Err(AigError::PatternError(e)) => {
                assert_eq!(e.simulated(), WORD_BITS);
                assert!(matches!(e, PatternError::IllegalCharacter { ch: 'x', .. }));
            }
            _ => panic!("expected a pattern error"),
        }
        // the groups of the last complete word are kept, back-references included
        let groups: Vec<&[usize]> = circuit.fec_groups().iter().collect();
        assert_eq!(groups, reference.fec_groups().iter().collect::<Vec<_>>());
        assert_eq!(groups, vec![&[0, 3, 5][..]]);
        assert_eq!(
            circuit.aig().node(5).fec_slot(),
            Some(crate::FecSlot { group: 0, index: 2 })
        );
        assert_eq!(circuit.aig().node(4).fec_slot(), None);
    }

    #[test]
    fn file_sim_refines_fec_groups() {
        let mut circuit = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        // Only 00 and 11: a3 and a4 stay with the constant
        circuit.file_sim("00 11".as_bytes()).unwrap();
        assert_eq!(circuit.fec_groups().iter().collect::<Vec<_>>(), vec![&[0, 3, 4][..]]);
        circuit.file_sim("10".as_bytes()).unwrap();
        assert_eq!(circuit.fec_groups().iter().collect::<Vec<_>>(), vec![&[0, 4][..]]);
    }

    #[test]
    fn random_sim_test() {
        let mut circuit = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        let patterns = circuit.random_sim().unwrap();
        assert_eq!(patterns % WORD_BITS, 0);
        // all the gates compute different functions
        assert!(circuit.fec_groups().is_empty());
        assert!(circuit.fec_groups().is_seeded());

        // same seed, same result
        let mut again = Circuit::from_ascii(XNOR.as_bytes()).unwrap();
        assert_eq!(again.random_sim().unwrap(), patterns);
        assert_eq!(again.aig().node(5).sim_value(), circuit.aig().node(5).sim_value());
    }

    #[test]
    fn random_sim_honors_max_fail() {
        let mut config = Config::default();
        config.sim.max_fail = Some(2);
        // a2 = i1 & !i1 never leaves the group of the constant
        let src = "aag 2 1 0 1 1\n2\n4\n4 2 3\n";
        let mut circuit = Circuit::with_config(Aig::from_ascii(src.as_bytes()).unwrap(), config);
        let patterns = circuit.random_sim().unwrap();
        assert_eq!(circuit.fec_groups().len(), 1);
        // first word creates the group, two more words without change
        assert_eq!(patterns, 3 * WORD_BITS);
    }
}
