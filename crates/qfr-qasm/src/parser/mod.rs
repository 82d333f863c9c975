//! Recursive-descent parser for `OpenQASM` 2.0.
//!
//! The parser appends operations directly to a [`QuantumComputation`]
//! while it walks the token stream. Gate declarations are flattened into a
//! store of four primitive kinds (`U`, `CX`, `CU`, `MCX`) at declaration
//! time; invocation expands them, handling implicit controls (the `c…`
//! name prefix convention) and whole-register broadcasting.

mod expression;
mod gates;

use std::mem::discriminant;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use qfr_ir::{
    ClassicControlledOperation, ClbitId, NonUnitaryOperation, Operation, QuantumComputation,
    QubitId,
};

use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token};
use crate::scanner::Scanner;

use gates::CompoundGate;

/// Parse an `OpenQASM` 2.0 program.
pub fn parse(source: &str) -> ParseResult<QuantumComputation> {
    parse_named(source, "qasm", None)
}

/// Parse an `OpenQASM` 2.0 program, naming the circuit and resolving
/// includes against the given directory.
pub fn parse_named(
    source: &str,
    name: &str,
    include_dir: Option<PathBuf>,
) -> ParseResult<QuantumComputation> {
    let mut parser = Parser::new(source, include_dir)?;
    parser.qc.set_name(name);
    parser.run()?;
    let mut qc = parser.qc;
    scrape_io_layout(source, &mut qc);
    Ok(qc)
}

pub(crate) struct Parser {
    scanner: Scanner,
    la: Option<SpannedToken>,
    last_pos: (u32, u32),
    qc: QuantumComputation,
    gates: FxHashMap<String, CompoundGate>,
}

impl Parser {
    fn new(source: &str, include_dir: Option<PathBuf>) -> ParseResult<Self> {
        // the standard library is always available, include or not
        let mut parser = Self {
            scanner: Scanner::new(crate::qelib1::QELIB1, None)?,
            la: None,
            last_pos: (0, 0),
            qc: QuantumComputation::new("qasm"),
            gates: FxHashMap::default(),
        };
        parser.la = parser.scanner.next();
        parser.preload_standard_gates()?;

        parser.scanner = Scanner::new(source, include_dir)?;
        parser.la = parser.scanner.next();
        parser.last_pos = (0, 0);
        Ok(parser)
    }

    fn preload_standard_gates(&mut self) -> ParseResult<()> {
        while self.la.is_some() {
            match self.peek() {
                Some(Token::Gate) => self.gate_decl()?,
                Some(Token::Opaque) => self.opaque_decl()?,
                _ => return Err(self.syntax_error("gate declaration")),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.la.as_ref().map(|t| &t.token)
    }

    fn bump(&mut self) -> Option<SpannedToken> {
        let t = self.la.take();
        if let Some(tok) = &t {
            self.last_pos = (tok.line, tok.col);
        }
        self.la = self.scanner.next();
        t
    }

    fn check(&self, kind: &Token) -> bool {
        self.peek()
            .is_some_and(|t| discriminant(t) == discriminant(kind))
    }

    fn consume(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &Token) -> ParseResult<SpannedToken> {
        match &self.la {
            Some(t) if discriminant(&t.token) == discriminant(kind) => {
                Ok(self.bump().expect("lookahead present"))
            }
            Some(t) => Err(ParseError::Syntax {
                line: t.line,
                col: t.col,
                expected: kind.to_string(),
                found: t.token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof(kind.to_string())),
        }
    }

    fn syntax_error(&self, expected: impl Into<String>) -> ParseError {
        match &self.la {
            Some(t) => ParseError::Syntax {
                line: t.line,
                col: t.col,
                expected: expected.into(),
                found: t.token.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.into()),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        let t = self.expect(&Token::Identifier(String::new()))?;
        match t.token {
            Token::Identifier(s) => Ok(s),
            _ => unreachable!("expect() checked the kind"),
        }
    }

    fn expect_integer(&mut self) -> ParseResult<u64> {
        let t = self.expect(&Token::NnInteger(0))?;
        match t.token {
            Token::NnInteger(v) => Ok(v),
            _ => unreachable!("expect() checked the kind"),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        let t = self.expect(&Token::Str(String::new()))?;
        match t.token {
            Token::Str(s) => Ok(s),
            _ => unreachable!("expect() checked the kind"),
        }
    }

    // =========================================================================
    // Program level
    // =========================================================================

    fn run(&mut self) -> ParseResult<()> {
        self.expect(&Token::OpenQasm)?;
        // version number; `2.0` lexes as a real
        self.expect(&Token::Real(0.0))?;
        self.expect(&Token::Semicolon)?;

        while let Some(token) = self.peek().cloned() {
            match token {
                Token::QReg => self.qreg_decl()?,
                Token::CReg => self.creg_decl()?,
                Token::Gate => self.gate_decl()?,
                Token::Opaque => self.opaque_decl()?,
                Token::Include => self.include_stmt()?,
                Token::Barrier => self.barrier_stmt()?,
                Token::If => self.if_stmt()?,
                Token::Snapshot => self.snapshot_stmt()?,
                Token::Probabilities => self.probabilities_stmt()?,
                Token::GateU
                | Token::GateCx
                | Token::Swap
                | Token::Identifier(_)
                | Token::Measure
                | Token::Reset => {
                    let op = self.qop()?;
                    self.qc.push(op);
                }
                _ => return Err(self.syntax_error("statement")),
            }
        }
        Ok(())
    }

    fn qreg_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::QReg)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let n = self.expect_integer()?;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        self.qc.add_qubit_register(n as u32, &name)?;
        Ok(())
    }

    fn creg_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::CReg)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let n = self.expect_integer()?;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        self.qc.add_classical_register(n as u32, &name)?;
        Ok(())
    }

    fn include_stmt(&mut self) -> ParseResult<()> {
        self.expect(&Token::Include)?;
        let path = self.expect_string()?;
        // the standard library is preloaded; anything else is read from disk
        if path != "qelib1.inc" {
            self.scanner.push_file(&path)?;
        }
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn barrier_stmt(&mut self) -> ParseResult<()> {
        self.expect(&Token::Barrier)?;
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let mut qubits = vec![];
        for (start, size) in args {
            for i in 0..size {
                qubits.push(QubitId(start + i));
            }
        }
        let total = self.qc.total_qubits();
        self.qc.push(NonUnitaryOperation::barrier(total, qubits));
        Ok(())
    }

    fn if_stmt(&mut self) -> ParseResult<()> {
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::EqEq)?;
        let expected = self.expect_integer()?;
        self.expect(&Token::RParen)?;

        let reg = self
            .qc
            .classical_register(&name)
            .ok_or(ParseError::UnknownRegister {
                name: name.clone(),
                kind: "classical",
            })?;

        let op = self.qop()?;
        self.qc.push(Operation::ClassicControlled(ClassicControlledOperation {
            op: Box::new(op),
            creg_start: ClbitId(reg.start),
            creg_size: reg.size,
            expected,
        }));
        Ok(())
    }

    fn snapshot_stmt(&mut self) -> ParseResult<()> {
        self.expect(&Token::Snapshot)?;
        self.expect(&Token::LParen)?;
        let n = self.expect_integer()?;
        self.expect(&Token::RParen)?;
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let mut qubits = vec![];
        for (start, size) in args {
            if size != 1 {
                return Err(ParseError::Unsupported(
                    "snapshot arguments must be single qubits".into(),
                ));
            }
            qubits.push(QubitId(start));
        }
        let total = self.qc.total_qubits();
        self.qc.push(NonUnitaryOperation::snapshot(total, qubits, n));
        Ok(())
    }

    fn probabilities_stmt(&mut self) -> ParseResult<()> {
        self.expect(&Token::Probabilities)?;
        self.expect(&Token::Semicolon)?;
        let total = self.qc.total_qubits();
        self.qc.push(NonUnitaryOperation::show_probabilities(total));
        Ok(())
    }

    /// A quantum operation: gate application, measurement or reset.
    fn qop(&mut self) -> ParseResult<Operation> {
        match self.peek() {
            Some(Token::GateU | Token::GateCx | Token::Swap | Token::Identifier(_)) => self.gate(),
            Some(Token::Measure) => self.measure_stmt(),
            Some(Token::Reset) => self.reset_stmt(),
            _ => Err(self.syntax_error("quantum operation")),
        }
    }

    fn measure_stmt(&mut self) -> ParseResult<Operation> {
        self.expect(&Token::Measure)?;
        let (qstart, qsize) = self.argument_qreg()?;
        self.expect(&Token::Arrow)?;
        let (cstart, csize) = self.argument_creg()?;
        self.expect(&Token::Semicolon)?;

        if qsize != csize {
            return Err(ParseError::RegisterSizeMismatch("measure".into()));
        }
        let qubits = (0..qsize).map(|i| QubitId(qstart + i)).collect();
        let classics = (0..csize).map(|i| ClbitId(cstart + i)).collect();
        let total = self.qc.total_qubits();
        Ok(NonUnitaryOperation::measure(total, qubits, classics)?.into())
    }

    fn reset_stmt(&mut self) -> ParseResult<Operation> {
        self.expect(&Token::Reset)?;
        let (start, size) = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        let qubits = (0..size).map(|i| QubitId(start + i)).collect();
        let total = self.qc.total_qubits();
        Ok(NonUnitaryOperation::reset(total, qubits).into())
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    /// A quantum argument: `name` (whole register) or `name[i]` (one
    /// qubit). Returns the physical start index and the run length.
    fn argument_qreg(&mut self) -> ParseResult<(u32, u32)> {
        let name = self.expect_identifier()?;
        let reg = self
            .qc
            .quantum_register(&name)
            .ok_or(ParseError::UnknownRegister {
                name: name.clone(),
                kind: "quantum",
            })?;

        if self.consume(&Token::LBracket) {
            let index = self.expect_integer()? as u32;
            self.expect(&Token::RBracket)?;
            if index >= reg.size {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index,
                    size: reg.size,
                });
            }
            Ok((reg.start + index, 1))
        } else {
            Ok((reg.start, reg.size))
        }
    }

    /// A classical argument, analogous to [`argument_qreg`](Self::argument_qreg).
    fn argument_creg(&mut self) -> ParseResult<(u32, u32)> {
        let name = self.expect_identifier()?;
        let reg = self
            .qc
            .classical_register(&name)
            .ok_or(ParseError::UnknownRegister {
                name: name.clone(),
                kind: "classical",
            })?;

        if self.consume(&Token::LBracket) {
            let index = self.expect_integer()? as u32;
            self.expect(&Token::RBracket)?;
            if index >= reg.size {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index,
                    size: reg.size,
                });
            }
            Ok((reg.start + index, 1))
        } else {
            Ok((reg.start, reg.size))
        }
    }

    fn arg_list(&mut self) -> ParseResult<Vec<(u32, u32)>> {
        let mut args = vec![self.argument_qreg()?];
        while self.consume(&Token::Comma) {
            args.push(self.argument_qreg()?);
        }
        Ok(args)
    }

    fn id_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.expect_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.expect_identifier()?);
        }
        Ok(ids)
    }
}

/// Scrape `// i …` and `// o …` layout comment lines into the circuit's
/// permutations. Falls back to identity for the initial layout; without an
/// `o` line, idle qubits are withheld from the output permutation.
fn scrape_io_layout(source: &str, qc: &mut QuantumComputation) {
    let total = qc.total_qubits();
    let mut found_output = false;

    for line in source.lines() {
        let Some(rest) = line.trim_start().strip_prefix("//") else {
            continue;
        };
        let mut fields = rest.split_whitespace();
        match fields.next() {
            Some("i") => {
                let physicals: Vec<u32> = fields.map_while(|f| f.parse().ok()).collect();
                // an incomplete line cannot describe the layout; keep identity
                if physicals.len() >= total as usize {
                    let layout = qc.initial_layout_mut();
                    layout.clear();
                    for (logical, phys) in physicals.into_iter().take(total as usize).enumerate() {
                        layout.insert(QubitId(phys), QubitId(logical as u32));
                    }
                }
            }
            Some("o") => {
                let physicals: Vec<u32> = fields.map_while(|f| f.parse().ok()).collect();
                let complete = physicals.len() >= total as usize;
                let permutation = qc.output_permutation_mut();
                permutation.clear();
                for (logical, phys) in physicals.into_iter().take(total as usize).enumerate() {
                    permutation.insert(QubitId(phys), QubitId(logical as u32));
                }
                if !complete {
                    // an incomplete output permutation marks the remaining
                    // logical qubits as garbage
                    let observed: Vec<QubitId> =
                        qc.output_permutation().values().copied().collect();
                    let unobserved: Vec<QubitId> = qc
                        .initial_layout()
                        .values()
                        .copied()
                        .filter(|l| !observed.contains(l))
                        .collect();
                    for logical in unobserved {
                        qc.set_garbage(logical);
                    }
                }
                found_output = true;
                break;
            }
            _ => {}
        }
    }

    if !found_output {
        let idle: Vec<QubitId> = qc
            .output_permutation()
            .keys()
            .copied()
            .filter(|p| qc.is_idle_qubit(*p))
            .collect();
        for phys in idle {
            qc.output_permutation_mut().remove(&phys);
        }
    }
}
