use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use super::dfs::Dfs;
use crate::{Aig, AigEdge, NodeId, Result, aig::error::ParserError};

fn read_u64(s: &str, line: usize) -> std::result::Result<u64, ParserError> {
    s.parse::<u64>().map_err(|_| ParserError::InvalidToken {
        line,
        msg: format!("{} expected u64", s),
    })
}

fn check_even(x: u64, line: usize) -> std::result::Result<(), ParserError> {
    if x & 1 == 1 {
        return Err(ParserError::InvalidToken {
            line,
            msg: format!("expected literal to be even, got {}", x),
        });
    }
    Ok(())
}

/// How far `M` may go beyond the number of declared variables.
/// Ids index the node arena, so a sparse numbering costs memory.
const MAX_UNUSED_VARS: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    m: u64,
    i: u64,
    o: u64,
    a: u64,
}

impl TryFrom<&str> for Header {
    type Error = ParserError;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        let tokens = line.split_whitespace().collect::<Vec<&str>>();

        if tokens.len() < 6 {
            return Err(ParserError::InvalidToken {
                line: 1,
                msg: "missing header tokens".to_string(),
            });
        }

        match tokens[0] {
            "aag" => (),
            "aig" => {
                return Err(ParserError::UnsupportedFeature(
                    "binary AIGER, only aag is read".to_string(),
                ));
            }
            other => {
                return Err(ParserError::InvalidToken {
                    line: 1,
                    msg: format!("expected aag, got {}", other),
                });
            }
        }

        if tokens.len() > 6 {
            return Err(ParserError::UnsupportedFeature(
                "header only supports M I L O A".to_string(),
            ));
        }

        let m = read_u64(tokens[1], 1)?;
        let i = read_u64(tokens[2], 1)?;
        let l = read_u64(tokens[3], 1)?;
        let o = read_u64(tokens[4], 1)?;
        let a = read_u64(tokens[5], 1)?;

        if l > 0 {
            return Err(ParserError::UnsupportedFeature(
                "latches, only combinational circuits are handled".to_string(),
            ));
        }

        // Outputs get ids M + 1 ..= M + O
        if m.checked_add(o).and_then(|last| NodeId::try_from(last).ok()).is_none() {
            return Err(ParserError::InvalidToken {
                line: 1,
                msg: format!("M + O = {} + {} exceeds the node id range", m, o),
            });
        }
        if m > i.saturating_add(a).saturating_add(MAX_UNUSED_VARS) {
            return Err(ParserError::InvalidToken {
                line: 1,
                msg: format!(
                    "M = {} is far above the {} declared variables",
                    m,
                    i.saturating_add(a)
                ),
            });
        }

        Ok(Header { m, i, o, a })
    }
}

impl Header {
    /// Id of the `k`-th primary output.
    fn output_id(&self, k: u64) -> std::result::Result<NodeId, ParserError> {
        self.m
            .checked_add(1)
            .and_then(|first| first.checked_add(k))
            .and_then(|id| NodeId::try_from(id).ok())
            .ok_or(ParserError::InvalidToken {
                line: 1,
                msg: format!("output {} has no valid id with M = {}", k, self.m),
            })
    }
}

/// Line reader keeping track of the (1-based) line number.
struct Lines<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Lines {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// The next line, or None at the end of the file.
    fn next(&mut self) -> std::result::Result<Option<&str>, ParserError> {
        self.buf.clear();
        let n = self
            .reader
            .read_line(&mut self.buf)
            .map_err(|e| ParserError::IoError(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }

    /// The next line, which must exist.
    fn expect(&mut self, what: &str) -> std::result::Result<&str, ParserError> {
        let line = self.line + 1;
        self.next()?.ok_or(ParserError::InvalidToken {
            line,
            msg: format!("unexpected end of file, expected {}", what),
        })
    }
}

/// Parses a single literal, bound-checked against the header's `M`.
fn read_literal(tokens: &str, m: u64, line: usize) -> std::result::Result<u64, ParserError> {
    let tokens = tokens.split_whitespace().collect::<Vec<&str>>();
    match tokens.len() {
        0 => Err(ParserError::InvalidToken {
            line,
            msg: "expected a literal, got nothing".to_string(),
        }),
        1 => {
            let lit = read_u64(tokens[0], line)?;
            check_bound(lit, m, line)?;
            Ok(lit)
        }
        _ => Err(ParserError::InvalidToken {
            line,
            msg: format!("expected nothing after literal, got {}", tokens[1]),
        }),
    }
}

fn check_bound(lit: u64, m: u64, line: usize) -> std::result::Result<(), ParserError> {
    if lit >> 1 > m {
        return Err(ParserError::InvalidToken {
            line,
            msg: format!("literal {} exceeds maximum variable index {}", lit, m),
        });
    }
    Ok(())
}

fn read_and(line_str: &str, m: u64, line: usize) -> std::result::Result<(u64, u64, u64), ParserError> {
    let tokens = line_str.split_whitespace().collect::<Vec<&str>>();

    if tokens.len() < 3 {
        return Err(ParserError::InvalidToken {
            line,
            msg: "not enough and tokens".to_string(),
        });
    }

    if tokens.len() > 3 {
        return Err(ParserError::InvalidToken {
            line,
            msg: format!("expected nothing after and tokens, got {}", tokens[3]),
        });
    }

    let lhs = read_u64(tokens[0], line)?;
    let rhs0 = read_u64(tokens[1], line)?;
    let rhs1 = read_u64(tokens[2], line)?;
    check_even(lhs, line)?;
    for lit in [lhs, rhs0, rhs1] {
        check_bound(lit, m, line)?;
    }
    Ok((lhs, rhs0, rhs1))
}

/// Parses `iN name` / `oN name`.
fn read_symbol(line_str: &str, line: usize) -> std::result::Result<(char, usize, String), ParserError> {
    let invalid = |msg: &str| ParserError::InvalidToken {
        line,
        msg: msg.to_string(),
    };
    let (position, name) = line_str
        .split_once(' ')
        .ok_or_else(|| invalid("expected a symbol name"))?;
    let mut chars = position.chars();
    let mode = chars.next().ok_or_else(|| invalid("empty symbol line"))?;
    let index = chars
        .as_str()
        .parse::<usize>()
        .map_err(|_| invalid("expected symbol position"))?;
    if name.is_empty() {
        return Err(invalid("empty symbol name"));
    }
    Ok((mode, index, name.to_string()))
}

impl Aig {
    /// Creates an AIG from an open .aag file using the ASCII AIGER format.
    ///
    /// Only combinational circuits are handled (`L` must be 0).
    /// Primary outputs get ids `M + 1, ..., M + O` in declaration order.
    /// Fanins referring to variables that are never defined become [`NodeKind::Undefined`] nodes.
    ///
    /// [`NodeKind::Undefined`]: crate::NodeKind::Undefined
    pub fn from_ascii(reader: impl BufRead) -> Result<Self> {
        let mut lines = Lines::new(reader);
        let header = Header::try_from(lines.expect("a header")?)?;

        let mut aig = Aig::new();

        for _ in 0..header.i {
            let line = lines.line + 1;
            let lit = read_literal(lines.expect("an input")?, header.m, line)?;
            check_even(lit, line)?;
            aig.add_input((lit >> 1) as NodeId, line)?;
        }

        for k in 0..header.o {
            let line = lines.line + 1;
            let lit = read_literal(lines.expect("an output")?, header.m, line)?;
            let id = header.output_id(k)?;
            aig.add_output(id, AigEdge::from_literal(lit), line)?;
        }

        for _ in 0..header.a {
            let line = lines.line + 1;
            let (lhs, rhs0, rhs1) = read_and(lines.expect("an and gate")?, header.m, line)?;
            aig.add_and(
                (lhs >> 1) as NodeId,
                AigEdge::from_literal(rhs0),
                AigEdge::from_literal(rhs1),
                line,
            )?;
        }

        // Symbols, until the comment section
        loop {
            let line = lines.line + 1;
            let Some(text) = lines.next()? else {
                break;
            };
            if text == "c" {
                break;
            }
            let (mode, index, name) = read_symbol(text, line)?;
            let id = match mode {
                'i' => aig.inputs.get(index).copied(),
                'o' => aig.outputs.get(index).copied(),
                _ => {
                    return Err(ParserError::UnsupportedFeature(format!(
                        "symbol kind '{}' at line {}",
                        mode, line
                    ))
                    .into());
                }
            };
            let id = id.ok_or(ParserError::InvalidToken {
                line,
                msg: format!("no {}{} to name", mode, index),
            })?;
            aig.set_symbol(id, name)?;
        }

        aig.set_max_var(header.m as usize);
        aig.rebuild_dfs();

        // Is the AIG okay?
        aig.check_integrity()?;

        Ok(aig)
    }

    /// Creates an AIG from an .aag file.
    ///
    /// Warning, this uses a homemade "parser" which definitely does not support all
    /// AIG features (only the combinational bare minimum).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("aag") => (),
            _ => {
                return Err(
                    ParserError::IoError("invalid extension, expected .aag".to_string()).into(),
                );
            }
        }
        let f = File::open(path.as_ref()).map_err(|z| ParserError::IoError(z.to_string()))?;
        Aig::from_ascii(BufReader::new(f))
    }

    /// Writes the logic reachable from the outputs in the ASCII AIGER format.
    ///
    /// Gates are listed in evaluation order, all inputs are kept (even unused ones).
    pub fn write_aag(&self, w: &mut impl Write) -> Result<()> {
        let mut dfs = Dfs::from_outputs(self);
        let mut ands = Vec::new();
        while let Some(id) = dfs.next(self) {
            if self.node(id).is_and() {
                ands.push(id);
            }
        }

        writeln!(
            w,
            "aag {} {} 0 {} {}",
            self.max_var,
            self.inputs.len(),
            self.outputs.len(),
            ands.len()
        )?;
        for &id in &self.inputs {
            writeln!(w, "{}", AigEdge::new(id, false).to_literal())?;
        }
        for &id in &self.outputs {
            writeln!(w, "{}", self.node(id).fanins[0].to_literal())?;
        }
        for &id in &ands {
            let fanins = &self.node(id).fanins;
            writeln!(
                w,
                "{} {} {}",
                AigEdge::new(id, false).to_literal(),
                fanins[0].to_literal(),
                fanins[1].to_literal()
            )?;
        }
        for (k, &id) in self.inputs.iter().enumerate() {
            if let Some(symbol) = self.node(id).symbol() {
                writeln!(w, "i{} {}", k, symbol)?;
            }
        }
        for (k, &id) in self.outputs.iter().enumerate() {
            if let Some(symbol) = self.node(id).symbol() {
                writeln!(w, "o{} {}", k, symbol)?;
            }
        }
        writeln!(w, "c")?;
        writeln!(w, "AAG output by fraigr")?;
        Ok(())
    }
}
