//! AST-to-Circuit lowering for QASM3.

use braq_ir::{
    Circuit, CompilerDirective, FreeParameter, FreeParameterExpression as Expr, Gate, Instruction,
    Matrix, Noise, Observable, Operator, Qubit, QubitSet, ResultType,
};
use num_complex::Complex64;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::ast::{
    BinOp, BitRef, Expression, GateCall, ObservableFactor, ObservableFactorKind,
    ObservableResultKind, Pragma, PragmaTarget, Program, QubitRef, ResultPragma, Statement,
};
use crate::error::{ParseError, ParseResult};

/// Lower an AST Program to a Circuit.
pub(crate) fn lower_to_circuit(program: &Program) -> ParseResult<Circuit> {
    let mut lowerer = Lowerer::new();
    lowerer.lower(program)
}

/// Lowers AST to Circuit.
struct Lowerer {
    /// Qubit registers: name -> (`start_id`, size). `start_id + size` never
    /// exceeds `u32::MAX`.
    qregs: FxHashMap<String, (u32, u32)>,
    /// Classical bit registers: name -> size.
    cregs: FxHashMap<String, u32>,
    /// Declared `input float` parameters.
    inputs: FxHashSet<String>,
    /// Next qubit ID.
    next_qubit: u32,
    /// A verbatim pragma is waiting for its box.
    verbatim_pending: bool,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
            inputs: FxHashSet::default(),
            next_qubit: 0,
            verbatim_pending: false,
        }
    }

    fn lower(&mut self, program: &Program) -> ParseResult<Circuit> {
        // First pass: collect declarations
        for stmt in &program.statements {
            match stmt {
                Statement::QubitDecl { name, size } => {
                    let size = size.unwrap_or(1);
                    self.declare(name)?;
                    let end = self.next_qubit.checked_add(size).ok_or_else(|| {
                        ParseError::Unsupported(format!(
                            "qubit register '{name}' of size {size} exceeds the qubit index range"
                        ))
                    })?;
                    self.qregs.insert(name.clone(), (self.next_qubit, size));
                    self.next_qubit = end;
                }
                Statement::BitDecl { name, size } => {
                    self.declare(name)?;
                    self.cregs.insert(name.clone(), size.unwrap_or(1));
                }
                Statement::InputDecl { name } => {
                    self.declare(name)?;
                    self.inputs.insert(name.clone());
                }
                _ => {}
            }
        }

        // Second pass: lower statements
        let mut circuit = Circuit::new();
        for stmt in &program.statements {
            self.lower_statement(&mut circuit, stmt)?;
        }
        if self.verbatim_pending {
            return Err(ParseError::Generic(
                "verbatim pragma must be followed by a box".into(),
            ));
        }

        Ok(circuit)
    }

    fn declare(&self, name: &str) -> ParseResult<()> {
        if self.qregs.contains_key(name)
            || self.cregs.contains_key(name)
            || self.inputs.contains(name)
        {
            return Err(ParseError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    fn lower_statement(&mut self, circuit: &mut Circuit, stmt: &Statement) -> ParseResult<()> {
        if self.verbatim_pending && !matches!(stmt, Statement::Box(_)) {
            return Err(ParseError::Generic(
                "verbatim pragma must be followed by a box".into(),
            ));
        }
        match stmt {
            Statement::QubitDecl { .. }
            | Statement::BitDecl { .. }
            | Statement::InputDecl { .. }
            | Statement::Include(_) => {
                // Already handled
                Ok(())
            }

            Statement::Gate(call) => self.lower_gate_call(circuit, call),

            Statement::Measure { qubits, bits } => {
                self.check_bits(bits)?;
                let qubits = self.resolve_qubits(qubits)?;
                circuit.measure(&qubits)?;
                Ok(())
            }

            Statement::Box(body) => {
                let verbatim = std::mem::take(&mut self.verbatim_pending);
                if verbatim {
                    circuit.add_instruction(Instruction::new(
                        Operator::CompilerDirective(CompilerDirective::StartVerbatimBox),
                        &[],
                    )?)?;
                }
                for stmt in body {
                    self.lower_statement(circuit, stmt)?;
                }
                if verbatim {
                    circuit.add_instruction(Instruction::new(
                        Operator::CompilerDirective(CompilerDirective::EndVerbatimBox),
                        &[],
                    )?)?;
                }
                Ok(())
            }

            Statement::Pragma(pragma) => self.lower_pragma(circuit, pragma),
        }
    }

    fn lower_gate_call(&self, circuit: &mut Circuit, call: &GateCall) -> ParseResult<()> {
        let qubits = self.resolve_qubits(&call.qubits)?;
        let params = call
            .params
            .iter()
            .map(|p| self.lower_expr(p))
            .collect::<ParseResult<Vec<_>>>()?;
        let gate = Gate::from_qasm_name(&call.name, &params).ok_or_else(|| {
            ParseError::UnknownGate(format!("{}/{} parameters", call.name, params.len()))
        })?;

        // Single-qubit gates broadcast over every listed qubit.
        if gate.qubit_count() == 1 && qubits.len() > 1 {
            for q in qubits {
                circuit.add_instruction(Instruction::gate(gate.clone(), &[q])?)?;
            }
        } else {
            circuit.add_instruction(Instruction::gate(gate, &qubits)?)?;
        }
        Ok(())
    }

    fn lower_pragma(&mut self, circuit: &mut Circuit, pragma: &Pragma) -> ParseResult<()> {
        match pragma {
            Pragma::Verbatim => {
                self.verbatim_pending = true;
            }
            Pragma::Unitary { matrix, qubits } => {
                let matrix = lower_matrix(matrix)?;
                let qubits = self.resolve_qubits(qubits)?;
                circuit.unitary(matrix, &qubits)?;
            }
            Pragma::Noise {
                name,
                params,
                qubits,
            } => {
                let values = params
                    .iter()
                    .map(constant)
                    .collect::<ParseResult<Vec<_>>>()?;
                let noise = Noise::from_qasm_name(name, &values)
                    .ok_or_else(|| ParseError::UnknownNoise(name.clone()))?;
                let qubits = self.resolve_qubits(qubits)?;
                circuit.noise(noise, &qubits)?;
            }
            Pragma::Result(result) => {
                circuit.add_result_type(self.lower_result(result)?)?;
            }
            Pragma::Other(text) => {
                warn!(pragma = %text, "skipping unsupported pragma");
            }
        }
        Ok(())
    }

    fn lower_result(&self, result: &ResultPragma) -> ParseResult<ResultType> {
        Ok(match result {
            ResultPragma::Observable { kind, factors } => {
                let (observable, target) = self.lower_observable(factors)?;
                match kind {
                    ObservableResultKind::Expectation => {
                        ResultType::expectation(observable, target)?
                    }
                    ObservableResultKind::Variance => ResultType::variance(observable, target)?,
                    ObservableResultKind::Sample => ResultType::sample(observable, target)?,
                }
            }
            ResultPragma::Probability(target) => {
                ResultType::probability(self.resolve_target(target)?)
            }
            ResultPragma::DensityMatrix(target) => {
                ResultType::density_matrix(self.resolve_target(target)?)
            }
            ResultPragma::StateVector => ResultType::StateVector,
            ResultPragma::Amplitude(states) => ResultType::amplitude(states.clone())?,
            ResultPragma::AdjointGradient {
                factors,
                parameters,
            } => {
                let (observable, target) = self.lower_observable(factors)?;
                let parameters = parameters
                    .iter()
                    .map(|name| {
                        if self.inputs.contains(name) {
                            Ok(FreeParameter::new(name.as_str()))
                        } else {
                            Err(ParseError::UndefinedIdentifier(name.clone()))
                        }
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                ResultType::adjoint_gradient(observable, target, parameters)?
            }
        })
    }

    /// Build an observable and its target from pragma factors.
    ///
    /// Either every factor targets `all` (an empty target) or every factor
    /// lists its qubits.
    fn lower_observable(&self, factors: &[ObservableFactor]) -> ParseResult<(Observable, QubitSet)> {
        let mut observables = Vec::with_capacity(factors.len());
        let mut target = Vec::new();
        let mut all_count = 0;
        for factor in factors {
            observables.push(match &factor.kind {
                ObservableFactorKind::Named(name) => match name.as_str() {
                    "i" => Observable::Identity,
                    "x" => Observable::PauliX,
                    "y" => Observable::PauliY,
                    "z" => Observable::PauliZ,
                    "h" => Observable::Hadamard,
                    other => return Err(ParseError::UnknownObservable(other.to_string())),
                },
                ObservableFactorKind::Hermitian(rows) => Observable::hermitian(lower_matrix(rows)?)?,
            });
            match &factor.target {
                PragmaTarget::All => all_count += 1,
                PragmaTarget::Qubits(refs) => target.extend(self.resolve_qubits(refs)?),
            }
        }
        if all_count != 0 && all_count != factors.len() {
            return Err(ParseError::Unsupported(
                "observable mixing 'all' and explicit targets".into(),
            ));
        }

        let observable = if observables.len() == 1 {
            observables.remove(0)
        } else {
            Observable::tensor_product(observables)?
        };
        Ok((observable, QubitSet::from(target)))
    }

    fn resolve_target(&self, target: &PragmaTarget) -> ParseResult<QubitSet> {
        match target {
            PragmaTarget::All => Ok(QubitSet::new()),
            PragmaTarget::Qubits(refs) => Ok(QubitSet::from(self.resolve_qubits(refs)?)),
        }
    }

    fn resolve_qubits(&self, refs: &[QubitRef]) -> ParseResult<Vec<Qubit>> {
        let mut ids = Vec::new();
        for r in refs {
            match r {
                QubitRef::Physical(n) => ids.push(Qubit(*n)),
                QubitRef::Single { register, index } => {
                    let (start, size) = self
                        .qregs
                        .get(register)
                        .ok_or_else(|| ParseError::UndefinedIdentifier(register.clone()))?;

                    if let Some(idx) = index {
                        if *idx >= *size {
                            return Err(ParseError::IndexOutOfBounds {
                                register: register.clone(),
                                index: *idx as usize,
                                size: *size as usize,
                            });
                        }
                        ids.push(Qubit(start + idx));
                    } else {
                        // Entire register
                        ids.extend((0..*size).map(|i| Qubit(start + i)));
                    }
                }
            }
        }
        Ok(ids)
    }

    fn check_bits(&self, refs: &[BitRef]) -> ParseResult<()> {
        for r in refs {
            let size = self
                .cregs
                .get(&r.register)
                .ok_or_else(|| ParseError::UndefinedIdentifier(r.register.clone()))?;
            if let Some(idx) = r.index {
                if idx >= *size {
                    return Err(ParseError::IndexOutOfBounds {
                        register: r.register.clone(),
                        index: idx as usize,
                        size: *size as usize,
                    });
                }
            }
        }
        Ok(())
    }

    /// Convert an AST expression to a gate argument.
    ///
    /// Subexpressions without identifiers are folded to a single number.
    fn lower_expr(&self, expr: &Expression) -> ParseResult<Expr> {
        if expr.is_constant() {
            return constant(expr).map(Expr::Number);
        }
        Ok(match expr {
            Expression::Identifier(name) => {
                if !self.inputs.contains(name) {
                    return Err(ParseError::UndefinedIdentifier(name.clone()));
                }
                Expr::parameter(name.as_str())
            }
            Expression::Neg(e) => Expr::Neg(Box::new(self.lower_expr(e)?)),
            Expression::Paren(e) => self.lower_expr(e)?,
            Expression::BinOp { left, op, right } => {
                let l = Box::new(self.lower_expr(left)?);
                let r = Box::new(self.lower_expr(right)?);
                match op {
                    BinOp::Add => Expr::Add(l, r),
                    BinOp::Sub => Expr::Sub(l, r),
                    BinOp::Mul => Expr::Mul(l, r),
                    BinOp::Div => Expr::Div(l, r),
                    BinOp::Pow => Expr::Pow(l, r),
                }
            }
            other => {
                return Err(ParseError::Generic(format!(
                    "Cannot convert expression to parameter: {other:?}"
                )));
            }
        })
    }
}

/// Evaluate a real constant.
fn constant(expr: &Expression) -> ParseResult<f64> {
    expr.as_f64()
        .ok_or_else(|| ParseError::Generic(format!("expected a real constant, found {expr:?}")))
}

/// Evaluate a complex constant such as `0.5 - 1.0im`.
fn complex(expr: &Expression) -> ParseResult<Complex64> {
    Ok(match expr {
        Expression::Imag(v) => Complex64::new(0.0, *v),
        Expression::Neg(e) => -complex(e)?,
        Expression::Paren(e) => complex(e)?,
        Expression::BinOp { left, op, right } => {
            let l = complex(left)?;
            let r = complex(right)?;
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powc(r),
            }
        }
        other => Complex64::new(constant(other)?, 0.0),
    })
}

fn lower_matrix(rows: &[Vec<Expression>]) -> ParseResult<Matrix> {
    let rows = rows
        .iter()
        .map(|row| row.iter().map(complex).collect::<ParseResult<Vec<_>>>())
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Matrix::new(rows)?)
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::error::ParseError;
    use braq_ir::{CompilerDirective, Gate, IrError, Noise, Observable, Operator, Qubit, ResultType};

    #[test]
    fn test_physical_qubits_and_noise() {
        let circuit = parse(
            "OPENQASM 3.0;\nh $4;\n#pragma braket noise bit_flip(0.1) $4\ncnot $4, $1;\n",
        )
        .unwrap();
        let ops: Vec<_> = circuit.instructions().map(|i| i.operator().clone()).collect();
        assert_eq!(ops[1], Operator::Noise(Noise::BitFlip { probability: 0.1 }));
        assert_eq!(circuit.instructions().last().unwrap().target().to_vec(), vec![Qubit(4), Qubit(1)]);
    }

    #[test]
    fn test_verbatim_box() {
        let circuit = parse(
            "OPENQASM 3.0;\nqubit[2] q;\n#pragma braket verbatim\nbox{\n    h q[0];\n    cnot q[0], q[1];\n}\n",
        )
        .unwrap();
        let ops: Vec<_> = circuit.instructions().map(|i| i.operator().clone()).collect();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0], Operator::CompilerDirective(CompilerDirective::StartVerbatimBox));
        assert_eq!(ops[3], Operator::CompilerDirective(CompilerDirective::EndVerbatimBox));
    }

    #[test]
    fn test_verbatim_without_box_rejected() {
        let result = parse("OPENQASM 3.0;\nqubit[1] q;\n#pragma braket verbatim\nh q[0];\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_result_pragmas() {
        let circuit = parse(
            "OPENQASM 3.0;\nqubit[2] q;\nh q[0];\ncnot q[0], q[1];\n\
             #pragma braket result expectation x(q[0]) @ x(q[1])\n\
             #pragma braket result probability all\n",
        )
        .unwrap();
        let xx = Observable::tensor_product(vec![Observable::PauliX, Observable::PauliX]).unwrap();
        assert_eq!(
            circuit.result_types()[0],
            ResultType::expectation(xx, [Qubit(0), Qubit(1)]).unwrap()
        );
        // Probability measures Z on all qubits, which conflicts with X.
        assert!(!circuit.observables_simultaneously_measurable());
    }

    #[test]
    fn test_symbolic_arguments() {
        let circuit = parse(
            "OPENQASM 3.0;\ninput float theta;\nqubit[1] q;\nrx(2 * theta - π) q[0];\n",
        )
        .unwrap();
        let gate = circuit.instructions().next().unwrap().as_gate().unwrap().clone();
        let Gate::Rx(angle) = gate else {
            panic!("expected rx");
        };
        assert!(angle.is_symbolic());
        assert_eq!(angle.free_parameters().len(), 1);
    }

    #[test]
    fn test_undeclared_parameter_rejected() {
        let result = parse("OPENQASM 3.0;\nqubit[1] q;\nrx(theta) q[0];\n");
        assert!(matches!(result, Err(ParseError::UndefinedIdentifier(n)) if n == "theta"));
    }

    #[test]
    fn test_unitary_pragma() {
        let circuit = parse(
            "OPENQASM 3.0;\nqubit[1] q;\n#pragma braket unitary([[0, 1.0im], [-1.0im, 0]]) q[0]\n",
        )
        .unwrap();
        let gate = circuit.instructions().next().unwrap().as_gate().unwrap();
        assert!(matches!(gate, Gate::Unitary(m) if m.is_unitary()));
    }

    #[test]
    fn test_circuit_errors_propagate() {
        let result = parse("OPENQASM 3.0;\nqubit[1] q;\nbit[1] b;\nb[0] = measure q[0];\nh q[0];\n");
        assert!(matches!(
            result,
            Err(ParseError::CircuitError(IrError::QubitAlreadyMeasured(_)))
        ));
    }

    #[test]
    fn test_calibration_blocks_unsupported() {
        let result = parse("OPENQASM 3.0;\ncal {\n}\n");
        assert!(matches!(result, Err(ParseError::Unsupported(_))));
    }

    #[test]
    fn test_oversized_registers_rejected() {
        let result = parse(
            "OPENQASM 3.0;\nqubit[4000000000] a;\nqubit[4000000000] c;\nh a[0];\n",
        );
        assert!(matches!(result, Err(ParseError::Unsupported(_))));

        // A single register spanning the whole index range still lowers.
        let circuit = parse("OPENQASM 3.0;\nqubit[4294967295] a;\nh a[7];\n").unwrap();
        assert_eq!(circuit.qubits().iter().collect::<Vec<_>>(), vec![Qubit(7)]);
    }
}
