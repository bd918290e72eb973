//! Free parameters and parameter expressions.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named parameter whose value is supplied at execution time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FreeParameter(String);

impl FreeParameter {
    /// Create a free parameter.
    pub fn new(name: impl Into<String>) -> Self {
        FreeParameter(name.into())
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FreeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numeric or symbolic expression used as a gate or pulse argument.
///
/// Floats compare and hash by bit pattern so that expressions can be used
/// inside calibration table keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FreeParameterExpression {
    /// A literal value.
    Number(f64),
    /// A free parameter.
    Parameter(FreeParameter),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<FreeParameterExpression>),
    /// Addition.
    Add(Box<FreeParameterExpression>, Box<FreeParameterExpression>),
    /// Subtraction.
    Sub(Box<FreeParameterExpression>, Box<FreeParameterExpression>),
    /// Multiplication.
    Mul(Box<FreeParameterExpression>, Box<FreeParameterExpression>),
    /// Division.
    Div(Box<FreeParameterExpression>, Box<FreeParameterExpression>),
    /// Exponentiation.
    Pow(Box<FreeParameterExpression>, Box<FreeParameterExpression>),
}

impl FreeParameterExpression {
    /// A literal value.
    pub fn number(value: f64) -> Self {
        FreeParameterExpression::Number(value)
    }

    /// A bare free parameter.
    pub fn parameter(name: impl Into<String>) -> Self {
        FreeParameterExpression::Parameter(FreeParameter::new(name))
    }

    /// Whether any free parameter appears in the expression.
    pub fn is_symbolic(&self) -> bool {
        match self {
            FreeParameterExpression::Parameter(_) => true,
            FreeParameterExpression::Number(_) | FreeParameterExpression::Pi => false,
            FreeParameterExpression::Neg(e) => e.is_symbolic(),
            FreeParameterExpression::Add(a, b)
            | FreeParameterExpression::Sub(a, b)
            | FreeParameterExpression::Mul(a, b)
            | FreeParameterExpression::Div(a, b)
            | FreeParameterExpression::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Whether every numeric literal in the expression is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            FreeParameterExpression::Number(v) => v.is_finite(),
            FreeParameterExpression::Parameter(_) | FreeParameterExpression::Pi => true,
            FreeParameterExpression::Neg(e) => e.is_finite(),
            FreeParameterExpression::Add(a, b)
            | FreeParameterExpression::Sub(a, b)
            | FreeParameterExpression::Mul(a, b)
            | FreeParameterExpression::Div(a, b)
            | FreeParameterExpression::Pow(a, b) => a.is_finite() && b.is_finite(),
        }
    }

    /// The bare parameter, if the expression is exactly one free parameter.
    pub fn as_parameter(&self) -> Option<&FreeParameter> {
        match self {
            FreeParameterExpression::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// Evaluate to a number when no free parameters remain.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FreeParameterExpression::Number(v) => Some(*v),
            FreeParameterExpression::Parameter(_) => None,
            FreeParameterExpression::Pi => Some(PI),
            FreeParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            FreeParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            FreeParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            FreeParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            FreeParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
            FreeParameterExpression::Pow(a, b) => Some(a.as_f64()?.powf(b.as_f64()?)),
        }
    }

    /// All free parameters appearing in the expression.
    pub fn free_parameters(&self) -> BTreeSet<FreeParameter> {
        let mut set = BTreeSet::new();
        self.collect_parameters(&mut set);
        set
    }

    pub(crate) fn collect_parameters(&self, set: &mut BTreeSet<FreeParameter>) {
        match self {
            FreeParameterExpression::Number(_) | FreeParameterExpression::Pi => {}
            FreeParameterExpression::Parameter(p) => {
                set.insert(p.clone());
            }
            FreeParameterExpression::Neg(e) => e.collect_parameters(set),
            FreeParameterExpression::Add(a, b)
            | FreeParameterExpression::Sub(a, b)
            | FreeParameterExpression::Mul(a, b)
            | FreeParameterExpression::Div(a, b)
            | FreeParameterExpression::Pow(a, b) => {
                a.collect_parameters(set);
                b.collect_parameters(set);
            }
        }
    }

    /// Substitute values for free parameters and fold what became constant.
    ///
    /// Parameters missing from `values` stay symbolic.
    #[must_use]
    pub fn subs(&self, values: &FxHashMap<String, f64>) -> Self {
        let substituted = self.substitute(values);
        substituted.simplify()
    }

    fn substitute(&self, values: &FxHashMap<String, f64>) -> Self {
        use FreeParameterExpression as E;
        let bin = |a: &E, b: &E| (Box::new(a.substitute(values)), Box::new(b.substitute(values)));
        match self {
            E::Parameter(p) => match values.get(p.name()) {
                Some(v) => E::Number(*v),
                None => self.clone(),
            },
            E::Number(_) | E::Pi => self.clone(),
            E::Neg(e) => E::Neg(Box::new(e.substitute(values))),
            E::Add(a, b) => {
                let (a, b) = bin(a, b);
                E::Add(a, b)
            }
            E::Sub(a, b) => {
                let (a, b) = bin(a, b);
                E::Sub(a, b)
            }
            E::Mul(a, b) => {
                let (a, b) = bin(a, b);
                E::Mul(a, b)
            }
            E::Div(a, b) => {
                let (a, b) = bin(a, b);
                E::Div(a, b)
            }
            E::Pow(a, b) => {
                let (a, b) = bin(a, b);
                E::Pow(a, b)
            }
        }
    }

    /// Collapse the expression to a number if it has no free parameters.
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self.as_f64() {
            Some(v) if !matches!(self, FreeParameterExpression::Pi) => {
                FreeParameterExpression::Number(v)
            }
            _ => self.clone(),
        }
    }
}

impl PartialEq for FreeParameterExpression {
    fn eq(&self, other: &Self) -> bool {
        use FreeParameterExpression as E;
        match (self, other) {
            (E::Number(a), E::Number(b)) => a.to_bits() == b.to_bits(),
            (E::Parameter(a), E::Parameter(b)) => a == b,
            (E::Pi, E::Pi) => true,
            (E::Neg(a), E::Neg(b)) => a == b,
            (E::Add(a1, b1), E::Add(a2, b2))
            | (E::Sub(a1, b1), E::Sub(a2, b2))
            | (E::Mul(a1, b1), E::Mul(a2, b2))
            | (E::Div(a1, b1), E::Div(a2, b2))
            | (E::Pow(a1, b1), E::Pow(a2, b2)) => a1 == a2 && b1 == b2,
            _ => false,
        }
    }
}

impl Eq for FreeParameterExpression {}

impl Hash for FreeParameterExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use FreeParameterExpression as E;
        std::mem::discriminant(self).hash(state);
        match self {
            E::Number(v) => v.to_bits().hash(state),
            E::Parameter(p) => p.hash(state),
            E::Pi => {}
            E::Neg(e) => e.hash(state),
            E::Add(a, b) | E::Sub(a, b) | E::Mul(a, b) | E::Div(a, b) | E::Pow(a, b) => {
                a.hash(state);
                b.hash(state);
            }
        }
    }
}

/// Format a literal the way OpenQASM expects it.
///
/// Exact multiples of π collapse to `π`, `τ` and their negations; everything
/// else is the shortest float literal that round-trips.
pub fn format_number(value: f64) -> String {
    if value == PI {
        "π".into()
    } else if value == -PI {
        "-π".into()
    } else if value == TAU {
        "τ".into()
    } else if value == -TAU {
        "-τ".into()
    } else {
        format!("{value:?}")
    }
}

impl fmt::Display for FreeParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FreeParameterExpression as E;
        match self {
            E::Number(v) => f.write_str(&format_number(*v)),
            E::Parameter(p) => write!(f, "{p}"),
            E::Pi => f.write_str("π"),
            E::Neg(e) => write!(f, "-({e})"),
            E::Add(a, b) => write!(f, "({a} + {b})"),
            E::Sub(a, b) => write!(f, "({a} - {b})"),
            E::Mul(a, b) => write!(f, "({a} * {b})"),
            E::Div(a, b) => write!(f, "({a} / {b})"),
            E::Pow(a, b) => write!(f, "({a} ** {b})"),
        }
    }
}

impl From<f64> for FreeParameterExpression {
    fn from(value: f64) -> Self {
        FreeParameterExpression::Number(value)
    }
}

impl From<i32> for FreeParameterExpression {
    fn from(value: i32) -> Self {
        FreeParameterExpression::Number(f64::from(value))
    }
}

impl From<FreeParameter> for FreeParameterExpression {
    fn from(value: FreeParameter) -> Self {
        FreeParameterExpression::Parameter(value)
    }
}

impl std::ops::Add for FreeParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        FreeParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for FreeParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        FreeParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for FreeParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        FreeParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for FreeParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        FreeParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for FreeParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        FreeParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_is_literal() {
        let p = FreeParameterExpression::number(0.45);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(0.45));
        assert!(p.free_parameters().is_empty());
    }

    #[test]
    fn test_parameter_is_symbolic() {
        let p = FreeParameterExpression::parameter("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.as_parameter().map(FreeParameter::name), Some("theta"));
    }

    #[test]
    fn test_subs_folds_constants() {
        let expr = FreeParameterExpression::number(2.0) * FreeParameterExpression::parameter("a")
            + FreeParameterExpression::parameter("b");
        let mut values = FxHashMap::default();
        values.insert("a".to_string(), 1.5);

        let partial = expr.subs(&values);
        assert!(partial.is_symbolic());
        assert_eq!(
            partial.free_parameters().into_iter().collect::<Vec<_>>(),
            vec![FreeParameter::new("b")]
        );

        values.insert("b".to_string(), 1.0);
        assert_eq!(expr.subs(&values), FreeParameterExpression::Number(4.0));
    }

    #[test]
    fn test_format_number_pi_forms() {
        assert_eq!(format_number(PI), "π");
        assert_eq!(format_number(2.0 * PI), "τ");
        assert_eq!(format_number(-PI), "-π");
        assert_eq!(format_number(0.45), "0.45");
        assert_eq!(format_number(1.0), "1.0");
    }

    #[test]
    fn test_bitwise_equality() {
        assert_eq!(
            FreeParameterExpression::number(0.1),
            FreeParameterExpression::number(0.1)
        );
        assert_ne!(
            FreeParameterExpression::number(0.0),
            FreeParameterExpression::number(-0.0)
        );
    }
}
