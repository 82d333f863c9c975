//! Gate declarations, the compound-gate store, and the expansion
//! algorithm: implicit controls, Toffoli synthesis, controlled-U
//! rewriting, and whole-register broadcasting.

use rustc_hash::FxHashMap;

use qfr_ir::expr::Expr;
use qfr_ir::{CompoundOperation, Control, OpType, Operation, QubitId, StandardOperation};

use super::Parser;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

/// One primitive of a flattened gate body. User gates invoked inside a
/// declaration are inlined into these four kinds at declaration time.
#[derive(Debug, Clone)]
pub(crate) enum GatePrim {
    /// `U(theta, phi, lambda) target;`
    U {
        theta: Expr,
        phi: Expr,
        lambda: Expr,
        target: String,
    },
    /// `CX control, target;`
    Cx { control: String, target: String },
    /// A controlled `U` synthesised from an implicitly controlled name.
    Cu {
        theta: Expr,
        phi: Expr,
        lambda: Expr,
        controls: Vec<String>,
        target: String,
    },
    /// A multi-controlled X synthesised from a `c…x` name.
    Mcx {
        controls: Vec<String>,
        target: String,
    },
}

/// A user-declared gate macro: parameter names, argument names, and a
/// flat body over the primitive alphabet.
#[derive(Debug, Clone)]
pub(crate) struct CompoundGate {
    pub params: Vec<String>,
    pub args: Vec<String>,
    pub body: Vec<GatePrim>,
}

/// Strip leading `c` characters, counting them as implicit controls. At
/// least one character of the base name is kept.
pub(crate) fn peel_controls(name: &str) -> (&str, usize) {
    let mut base = name;
    let mut n = 0;
    while base.len() > 1 && base.starts_with('c') {
        base = &base[1..];
        n += 1;
    }
    (base, n)
}

/// Gate names with first-class [`OpType`] kinds. Invocations of these map
/// directly onto standard operations instead of macro bodies.
pub(crate) fn builtin_gate(name: &str) -> Option<OpType> {
    Some(match name {
        "id" => OpType::I,
        "x" => OpType::X,
        "y" => OpType::Y,
        "z" => OpType::Z,
        "h" => OpType::H,
        "s" => OpType::S,
        "sdg" => OpType::Sdag,
        "t" => OpType::T,
        "tdg" => OpType::Tdag,
        "sx" => OpType::V,
        "sxdg" => OpType::Vdag,
        "rx" => OpType::Rx,
        "ry" => OpType::Ry,
        "rz" => OpType::Rz,
        "u1" => OpType::U1,
        "u2" => OpType::U2,
        "u3" => OpType::U3,
        _ => return None,
    })
}

type Arg = (u32, u32);
type ArgMap = FxHashMap<String, Arg>;
type ParamEnv = FxHashMap<String, Expr>;

impl Parser {
    // =========================================================================
    // Invocation
    // =========================================================================

    /// A gate application statement: `U`, `CX`, `swap`, or an identifier.
    pub(crate) fn gate(&mut self) -> ParseResult<Operation> {
        match self.peek() {
            Some(Token::GateU) => self.builtin_u(),
            Some(Token::GateCx) => self.builtin_cx(),
            Some(Token::Swap) => self.builtin_swap(),
            Some(Token::Identifier(_)) => self.gate_invocation(),
            _ => Err(self.syntax_error("gate")),
        }
    }

    /// `U(theta, phi, lambda) arg;` with register broadcasting.
    fn builtin_u(&mut self) -> ParseResult<Operation> {
        self.expect(&Token::GateU)?;
        self.expect(&Token::LParen)?;
        let theta = self.exp()?.evaluate()?;
        self.expect(&Token::Comma)?;
        let phi = self.exp()?.evaluate()?;
        self.expect(&Token::Comma)?;
        let lambda = self.exp()?.evaluate()?;
        self.expect(&Token::RParen)?;
        let (start, size) = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        let total = self.qc.total_qubits();
        let params = [theta, phi, lambda];
        if size == 1 {
            return Ok(StandardOperation::new(total, OpType::U3, QubitId(start))
                .with_params(&params)
                .into());
        }
        let mut compound = CompoundOperation::new(total);
        for i in 0..size {
            compound.push(
                StandardOperation::new(total, OpType::U3, QubitId(start + i))
                    .with_params(&params)
                    .into(),
            );
        }
        Ok(compound.into())
    }

    /// `CX control, target;` with the classical broadcasting rule.
    fn builtin_cx(&mut self) -> ParseResult<Operation> {
        self.expect(&Token::GateCx)?;
        let control = self.argument_qreg()?;
        self.expect(&Token::Comma)?;
        let target = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        let total = self.qc.total_qubits();
        self.expand_cx(total, control, target, "CX")
    }

    /// `swap a, b;` over two single qubits.
    fn builtin_swap(&mut self) -> ParseResult<Operation> {
        self.expect(&Token::Swap)?;
        let (t0, s0) = self.argument_qreg()?;
        self.expect(&Token::Comma)?;
        let (t1, s1) = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        if s0 != 1 || s1 != 1 {
            return Err(ParseError::Unsupported(
                "swap over whole qubit registers is not supported".into(),
            ));
        }
        if t0 == t1 {
            return Err(ParseError::ControlTargetOverlap(t0));
        }
        let total = self.qc.total_qubits();
        Ok(StandardOperation::two_target(total, OpType::Swap, vec![], QubitId(t0), QubitId(t1))
            .into())
    }

    fn gate_invocation(&mut self) -> ParseResult<Operation> {
        let name = self.expect_identifier()?;
        let (base, ncontrols) = peel_controls(&name);
        let base = base.to_string();

        // controlled swap uses an explicit two-target form
        if base == "swap" {
            return self.controlled_swap(&name, ncontrols);
        }

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.exp_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        // the shared broadcast size: every whole-register argument must
        // agree on it
        let mut size = 1u32;
        for (_, s) in &args {
            if *s > 1 {
                if size != 1 && *s != size {
                    return Err(ParseError::RegisterSizeMismatch(name.clone()));
                }
                size = *s;
            }
        }

        if let Some(op) = builtin_gate(&name) {
            return self.expand_builtin(op, &name, &params, &args, size);
        }
        if let Some(gate) = self.gates.get(&name).cloned() {
            return self.expand_stored(&gate, &name, &params, &args, size);
        }
        if ncontrols > 0 {
            if let Some(op) = builtin_gate(&base) {
                return self.expand_controlled_builtin(op, &name, ncontrols, &params, &args, size);
            }
            if let Some(cgate) = self.gates.get(&base).cloned() {
                return self.expand_controlled_stored(
                    &cgate, &name, ncontrols, &params, &args, size,
                );
            }
        }
        Err(ParseError::UnknownGate(name))
    }

    fn controlled_swap(&mut self, name: &str, ncontrols: usize) -> ParseResult<Operation> {
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let expected = ncontrols + 2;
        self.check_arg_arity(name, args.len(), expected)?;
        for (_, s) in &args {
            if *s != 1 {
                return Err(ParseError::UnsupportedControlledForm {
                    gate: name.into(),
                    reason: "whole-register arguments".into(),
                });
            }
        }

        let t0 = QubitId(args[ncontrols].0);
        let t1 = QubitId(args[ncontrols + 1].0);
        if t0 == t1 {
            return Err(ParseError::ControlTargetOverlap(t0.0));
        }
        let controls = self.collect_controls(&args[..ncontrols], &[t0, t1])?;
        let total = self.qc.total_qubits();
        Ok(StandardOperation::two_target(total, OpType::Swap, controls, t0, t1).into())
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    fn expand_builtin(
        &mut self,
        op: OpType,
        name: &str,
        params: &[Expr],
        args: &[Arg],
        size: u32,
    ) -> ParseResult<Operation> {
        self.check_arg_arity(name, args.len(), 1)?;
        self.check_param_arity(name, params.len(), op.num_params())?;
        let values = eval_params(params)?;

        let total = self.qc.total_qubits();
        let (start, _) = args[0];
        if size == 1 {
            return Ok(StandardOperation::new(total, op, QubitId(start))
                .with_params(&values)
                .into());
        }
        let mut compound = CompoundOperation::new(total);
        for i in 0..size {
            compound.push(
                StandardOperation::new(total, op, QubitId(start + i))
                    .with_params(&values)
                    .into(),
            );
        }
        Ok(compound.into())
    }

    fn expand_controlled_builtin(
        &mut self,
        op: OpType,
        name: &str,
        ncontrols: usize,
        params: &[Expr],
        args: &[Arg],
        size: u32,
    ) -> ParseResult<Operation> {
        if size != 1 {
            return Err(ParseError::UnsupportedControlledForm {
                gate: name.into(),
                reason: "whole-register arguments".into(),
            });
        }
        self.check_arg_arity(name, args.len(), ncontrols + 1)?;
        self.check_param_arity(name, params.len(), op.num_params())?;
        let values = eval_params(params)?;

        let target = QubitId(args[ncontrols].0);
        let controls = self.collect_controls(&args[..ncontrols], &[target])?;
        let total = self.qc.total_qubits();

        // a pure X chain is a multi-controlled Toffoli
        if op == OpType::X {
            return Ok(StandardOperation::controlled(total, OpType::X, controls, target).into());
        }
        Ok(StandardOperation::controlled(total, op, controls, target)
            .with_params(&values)
            .into())
    }

    fn expand_controlled_stored(
        &mut self,
        cgate: &CompoundGate,
        name: &str,
        ncontrols: usize,
        params: &[Expr],
        args: &[Arg],
        size: u32,
    ) -> ParseResult<Operation> {
        if cgate.body.len() != 1 {
            return Err(ParseError::UnsupportedControlledForm {
                gate: name.into(),
                reason: format!(
                    "no definition found, and the base gate is not a single primitive ({} body gates)",
                    cgate.body.len()
                ),
            });
        }
        if size != 1 {
            return Err(ParseError::UnsupportedControlledForm {
                gate: name.into(),
                reason: "whole-register arguments".into(),
            });
        }
        self.check_arg_arity(name, args.len(), ncontrols + cgate.args.len())?;
        self.check_param_arity(name, params.len(), cgate.params.len())?;

        let env: ParamEnv = cgate
            .params
            .iter()
            .cloned()
            .zip(params.iter().cloned())
            .collect();

        let target = QubitId(args[args.len() - 1].0);
        let controls = self.collect_controls(&args[..ncontrols], &[target])?;
        let total = self.qc.total_qubits();

        match &cgate.body[0] {
            GatePrim::U {
                theta,
                phi,
                lambda,
                ..
            } => {
                let values = [
                    theta.substitute(&env).evaluate()?,
                    phi.substitute(&env).evaluate()?,
                    lambda.substitute(&env).evaluate()?,
                ];
                Ok(StandardOperation::controlled(total, OpType::U3, controls, target)
                    .with_params(&values)
                    .into())
            }
            _ => Err(ParseError::UnsupportedControlledForm {
                gate: name.into(),
                reason: "the base gate is not a U primitive".into(),
            }),
        }
    }

    fn expand_stored(
        &mut self,
        gate: &CompoundGate,
        name: &str,
        params: &[Expr],
        args: &[Arg],
        size: u32,
    ) -> ParseResult<Operation> {
        self.check_arg_arity(name, args.len(), gate.args.len())?;
        self.check_param_arity(name, params.len(), gate.params.len())?;

        let arg_map: ArgMap = gate.args.iter().cloned().zip(args.iter().copied()).collect();
        let env: ParamEnv = gate
            .params
            .iter()
            .cloned()
            .zip(params.iter().cloned())
            .collect();

        let total = self.qc.total_qubits();

        // single primitive on single qubits collapses to one standard op
        if gate.body.len() == 1 && size == 1 {
            match &gate.body[0] {
                GatePrim::U {
                    theta,
                    phi,
                    lambda,
                    target,
                } => {
                    let values = [
                        theta.substitute(&env).evaluate()?,
                        phi.substitute(&env).evaluate()?,
                        lambda.substitute(&env).evaluate()?,
                    ];
                    let (start, _) = resolve(&arg_map, target)?;
                    return Ok(StandardOperation::new(total, OpType::U3, QubitId(start))
                        .with_params(&values)
                        .into());
                }
                GatePrim::Cx { control, target } => {
                    let c = resolve(&arg_map, control)?;
                    let t = resolve(&arg_map, target)?;
                    return self.expand_cx(total, c, t, name);
                }
                _ => {}
            }
        }

        let mut compound = CompoundOperation::new(total);
        self.expand_body(&mut compound, &gate.body, &arg_map, &env)?;
        Ok(compound.into())
    }

    fn expand_body(
        &mut self,
        compound: &mut CompoundOperation,
        body: &[GatePrim],
        arg_map: &ArgMap,
        env: &ParamEnv,
    ) -> ParseResult<()> {
        let total = self.qc.total_qubits();
        for prim in body {
            match prim {
                GatePrim::U {
                    theta,
                    phi,
                    lambda,
                    target,
                } => {
                    let values = [
                        theta.substitute(env).evaluate()?,
                        phi.substitute(env).evaluate()?,
                        lambda.substitute(env).evaluate()?,
                    ];
                    let (start, size) = resolve(arg_map, target)?;
                    for i in 0..size {
                        compound.push(
                            StandardOperation::new(total, OpType::U3, QubitId(start + i))
                                .with_params(&values)
                                .into(),
                        );
                    }
                }
                GatePrim::Cx { control, target } => {
                    let c = resolve(arg_map, control)?;
                    let t = resolve(arg_map, target)?;
                    let op = self.expand_cx(total, c, t, "CX")?;
                    match op {
                        Operation::Compound(inner) => {
                            for child in inner.ops {
                                compound.push(child);
                            }
                        }
                        op => compound.push(op),
                    }
                }
                GatePrim::Mcx { controls, target } => {
                    let (tstart, tsize) = resolve(arg_map, target)?;
                    if tsize != 1 {
                        return Err(ParseError::Unsupported(
                            "multi-controlled gates over whole qubit registers are not supported"
                                .into(),
                        ));
                    }
                    let target = QubitId(tstart);
                    let controls = self.resolve_controls(arg_map, controls, &[target])?;
                    compound
                        .push(StandardOperation::controlled(total, OpType::X, controls, target).into());
                }
                GatePrim::Cu {
                    theta,
                    phi,
                    lambda,
                    controls,
                    target,
                } => {
                    let values = [
                        theta.substitute(env).evaluate()?,
                        phi.substitute(env).evaluate()?,
                        lambda.substitute(env).evaluate()?,
                    ];
                    let (tstart, tsize) = resolve(arg_map, target)?;
                    if tsize != 1 {
                        return Err(ParseError::Unsupported(
                            "multi-controlled gates over whole qubit registers are not supported"
                                .into(),
                        ));
                    }
                    let target = QubitId(tstart);
                    let controls = self.resolve_controls(arg_map, controls, &[target])?;
                    compound.push(
                        StandardOperation::controlled(total, OpType::U3, controls, target)
                            .with_params(&values)
                            .into(),
                    );
                }
            }
        }
        Ok(())
    }

    /// The classical CX broadcasting rule: fixed/fixed, pairwise,
    /// one-to-many, many-to-one.
    fn expand_cx(
        &mut self,
        total: u32,
        control: Arg,
        target: Arg,
        gate: &str,
    ) -> ParseResult<Operation> {
        let (cs, csize) = control;
        let (ts, tsize) = target;

        for i in 0..csize {
            for j in 0..tsize {
                if cs + i == ts + j {
                    return Err(ParseError::ControlTargetOverlap(cs + i));
                }
            }
        }

        let single = |c: u32, t: u32| -> Operation {
            StandardOperation::controlled(total, OpType::X, vec![Control::pos(QubitId(c))], QubitId(t))
                .into()
        };

        if csize == 1 && tsize == 1 {
            return Ok(single(cs, ts));
        }
        let mut compound = CompoundOperation::new(total);
        if csize == tsize {
            for i in 0..tsize {
                compound.push(single(cs + i, ts + i));
            }
        } else if csize == 1 {
            for i in 0..tsize {
                compound.push(single(cs, ts + i));
            }
        } else if tsize == 1 {
            for i in 0..csize {
                compound.push(single(cs + i, ts));
            }
        } else {
            return Err(ParseError::RegisterSizeMismatch(gate.into()));
        }
        Ok(compound.into())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// `gate name(params) args { body }` with declaration-time flattening.
    pub(crate) fn gate_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::Gate)?;
        let name = self.expect_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.id_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };
        let args = self.id_list()?;
        self.expect(&Token::LBrace)?;

        // a declaration whose peeled base is already known as a single
        // primitive is redundant: the implicit-control convention covers
        // the invocation, so the body is skipped
        let (base, _) = peel_controls(&name);
        let skip = self.gates.get(base).is_some_and(|g| g.body.len() <= 1);
        if skip {
            while !self.check(&Token::RBrace) {
                if self.bump().is_none() {
                    return Err(ParseError::UnexpectedEof("}".into()));
                }
            }
            self.expect(&Token::RBrace)?;
            return Ok(());
        }

        let mut body = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => break,
                Some(Token::GateU) => {
                    self.bump();
                    self.expect(&Token::LParen)?;
                    let theta = self.exp()?;
                    self.expect(&Token::Comma)?;
                    let phi = self.exp()?;
                    self.expect(&Token::Comma)?;
                    let lambda = self.exp()?;
                    self.expect(&Token::RParen)?;
                    let target = self.expect_identifier()?;
                    self.expect(&Token::Semicolon)?;
                    body.push(GatePrim::U {
                        theta,
                        phi,
                        lambda,
                        target,
                    });
                }
                Some(Token::GateCx) => {
                    self.bump();
                    let control = self.expect_identifier()?;
                    self.expect(&Token::Comma)?;
                    let target = self.expect_identifier()?;
                    self.expect(&Token::Semicolon)?;
                    body.push(GatePrim::Cx { control, target });
                }
                Some(Token::Identifier(_)) => self.inline_invocation(&mut body)?,
                Some(Token::Barrier) => {
                    // barriers inside declarations carry no semantics here
                    self.bump();
                    self.id_list()?;
                    self.expect(&Token::Semicolon)?;
                }
                Some(_) => return Err(self.syntax_error("gate body statement")),
                None => return Err(ParseError::UnexpectedEof("}".into())),
            }
        }
        self.expect(&Token::RBrace)?;

        self.gates.insert(name, CompoundGate { params, args, body });
        Ok(())
    }

    /// `opaque name(params) args;` stores a bodiless gate.
    pub(crate) fn opaque_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::Opaque)?;
        let name = self.expect_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.id_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };
        let args = self.id_list()?;
        self.expect(&Token::Semicolon)?;

        self.gates.insert(
            name,
            CompoundGate {
                params,
                args,
                body: vec![],
            },
        );
        Ok(())
    }

    /// An identifier invocation inside a gate body: inline the referenced
    /// gate's primitives under renaming and parameter rewriting.
    fn inline_invocation(&mut self, body: &mut Vec<GatePrim>) -> ParseResult<()> {
        let name = self.expect_identifier()?;
        let (base, ncontrols) = peel_controls(&name);
        let base = base.to_string();

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.exp_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };
        let args = self.id_list()?;
        self.expect(&Token::Semicolon)?;

        if let Some(gate) = self.gates.get(&name).cloned() {
            self.check_arg_arity(&name, args.len(), gate.args.len())?;
            self.check_param_arity(&name, params.len(), gate.params.len())?;

            let arg_map: FxHashMap<&str, &str> = gate
                .args
                .iter()
                .map(String::as_str)
                .zip(args.iter().map(String::as_str))
                .collect();
            let rename = |id: &str| -> ParseResult<String> {
                arg_map
                    .get(id)
                    .map(|s| (*s).to_string())
                    .ok_or_else(|| ParseError::Unsupported(format!("unbound gate argument '{id}'")))
            };
            let env: ParamEnv = gate
                .params
                .iter()
                .cloned()
                .zip(params.iter().cloned())
                .collect();

            for prim in &gate.body {
                body.push(match prim {
                    GatePrim::U {
                        theta,
                        phi,
                        lambda,
                        target,
                    } => GatePrim::U {
                        theta: theta.substitute(&env),
                        phi: phi.substitute(&env),
                        lambda: lambda.substitute(&env),
                        target: rename(target)?,
                    },
                    GatePrim::Cx { control, target } => GatePrim::Cx {
                        control: rename(control)?,
                        target: rename(target)?,
                    },
                    GatePrim::Mcx { controls, target } => GatePrim::Mcx {
                        controls: controls
                            .iter()
                            .map(|c| rename(c))
                            .collect::<ParseResult<_>>()?,
                        target: rename(target)?,
                    },
                    GatePrim::Cu {
                        theta,
                        phi,
                        lambda,
                        controls,
                        target,
                    } => GatePrim::Cu {
                        theta: theta.substitute(&env),
                        phi: phi.substitute(&env),
                        lambda: lambda.substitute(&env),
                        controls: controls
                            .iter()
                            .map(|c| rename(c))
                            .collect::<ParseResult<_>>()?,
                        target: rename(target)?,
                    },
                });
            }
            return Ok(());
        }

        if ncontrols > 0 {
            // a controlled invocation over a single-primitive base; the
            // builtin names are all present in the store, so one lookup
            // covers both
            if let Some(cgate) = self.gates.get(&base).cloned() {
                if cgate.body.len() != 1 {
                    return Err(ParseError::UnsupportedControlledForm {
                        gate: name.clone(),
                        reason: "the base gate is not a single primitive".into(),
                    });
                }
                self.check_arg_arity(&name, args.len(), ncontrols + 1)?;
                self.check_param_arity(&name, params.len(), cgate.params.len())?;

                let env: ParamEnv = cgate
                    .params
                    .iter()
                    .cloned()
                    .zip(params.iter().cloned())
                    .collect();
                let controls: Vec<String> = args[..ncontrols].to_vec();
                let target = args[args.len() - 1].clone();

                if base == "x" {
                    body.push(GatePrim::Mcx { controls, target });
                    return Ok(());
                }
                match &cgate.body[0] {
                    GatePrim::U {
                        theta,
                        phi,
                        lambda,
                        ..
                    } => {
                        body.push(GatePrim::Cu {
                            theta: theta.substitute(&env),
                            phi: phi.substitute(&env),
                            lambda: lambda.substitute(&env),
                            controls,
                            target,
                        });
                        return Ok(());
                    }
                    _ => {
                        return Err(ParseError::UnsupportedControlledForm {
                            gate: name,
                            reason: "the base gate is not a U primitive".into(),
                        });
                    }
                }
            }
        }

        Err(ParseError::UndefinedGate(name))
    }

    // =========================================================================
    // Shared checks
    // =========================================================================

    fn check_arg_arity(&self, gate: &str, got: usize, expected: usize) -> ParseResult<()> {
        if got > expected {
            Err(ParseError::TooManyArguments {
                gate: gate.into(),
                expected,
                got,
            })
        } else if got < expected {
            Err(ParseError::TooFewArguments {
                gate: gate.into(),
                expected,
                got,
            })
        } else {
            Ok(())
        }
    }

    fn check_param_arity(&self, gate: &str, got: usize, expected: usize) -> ParseResult<()> {
        if got == expected {
            Ok(())
        } else {
            Err(ParseError::WrongParameterCount {
                gate: gate.into(),
                expected,
                got,
            })
        }
    }

    /// Positive controls over the given single-qubit arguments, rejecting
    /// duplicates and overlaps with the targets.
    fn collect_controls(&self, args: &[Arg], targets: &[QubitId]) -> ParseResult<Vec<Control>> {
        let mut controls: Vec<Control> = Vec::with_capacity(args.len());
        for (start, _) in args {
            let q = QubitId(*start);
            if controls.iter().any(|c| c.qubit == q) {
                return Err(ParseError::DuplicateControl(q.0));
            }
            if targets.contains(&q) {
                return Err(ParseError::ControlTargetOverlap(q.0));
            }
            controls.push(Control::pos(q));
        }
        Ok(controls)
    }

    fn resolve_controls(
        &self,
        arg_map: &ArgMap,
        names: &[String],
        targets: &[QubitId],
    ) -> ParseResult<Vec<Control>> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let (start, size) = resolve(arg_map, name)?;
            if size != 1 {
                return Err(ParseError::Unsupported(
                    "multi-controlled gates over whole qubit registers are not supported".into(),
                ));
            }
            resolved.push((start, size));
        }
        self.collect_controls(&resolved, targets)
    }
}

fn resolve(arg_map: &ArgMap, name: &str) -> ParseResult<Arg> {
    arg_map
        .get(name)
        .copied()
        .ok_or_else(|| ParseError::Unsupported(format!("unbound gate argument '{name}'")))
}

fn eval_params(params: &[Expr]) -> ParseResult<Vec<f64>> {
    params
        .iter()
        .map(|p| p.evaluate().map_err(ParseError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peel_controls() {
        assert_eq!(peel_controls("ccx"), ("x", 2));
        assert_eq!(peel_controls("cu3"), ("u3", 1));
        assert_eq!(peel_controls("h"), ("h", 0));
        assert_eq!(peel_controls("cswap"), ("swap", 1));
        // at least one character survives
        assert_eq!(peel_controls("cc"), ("c", 1));
        assert_eq!(peel_controls("c"), ("c", 0));
        // digits stop the peel
        assert_eq!(peel_controls("c3x"), ("3x", 1));
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(builtin_gate("h"), Some(OpType::H));
        assert_eq!(builtin_gate("u3"), Some(OpType::U3));
        assert_eq!(builtin_gate("sx"), Some(OpType::V));
        assert_eq!(builtin_gate("cx"), None);
        assert_eq!(builtin_gate("swap"), None);
    }
}
