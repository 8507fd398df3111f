//! Operator selection and dispatch

use volalg_core::{Algorithm, Error, Result, Volume, VoxelElement};

use super::{add, divide, exp, log, multiply, power, ExpParams, MultiplyParams};

/// One of the voxelwise operators, with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VolumeOp {
    #[default]
    Add,
    Multiply(MultiplyParams),
    Divide,
    Power { exponent: f64 },
    Exp(ExpParams),
    Log,
}

impl VolumeOp {
    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            VolumeOp::Add => "add",
            VolumeOp::Multiply(_) => "multiply",
            VolumeOp::Divide => "divide",
            VolumeOp::Power { .. } => "power",
            VolumeOp::Exp(_) => "exp",
            VolumeOp::Log => "log",
        }
    }

    /// Number of volume operands the operator takes
    pub fn arity(&self) -> usize {
        match self {
            VolumeOp::Add | VolumeOp::Multiply(_) | VolumeOp::Divide => 2,
            VolumeOp::Power { .. } | VolumeOp::Exp(_) | VolumeOp::Log => 1,
        }
    }

    /// Run the operator on `a` and, for binary operators, `b`.
    ///
    /// Fails with `InvalidParameter` when the number of operands does not
    /// match [`arity`](Self::arity).
    pub fn apply<T: VoxelElement>(&self, a: &Volume<T>, b: Option<&Volume<T>>) -> Result<Volume<f64>> {
        match (*self, b) {
            (VolumeOp::Add, Some(b)) => add(a, b),
            (VolumeOp::Multiply(params), Some(b)) => multiply(a, b, params),
            (VolumeOp::Divide, Some(b)) => divide(a, b),
            (VolumeOp::Power { exponent }, None) => power(a, exponent),
            (VolumeOp::Exp(params), None) => exp(a, params),
            (VolumeOp::Log, None) => log(a),
            (op, None) => Err(Error::InvalidParameter {
                name: "b",
                value: "none".into(),
                reason: format!("{} needs a second volume", op.name()),
            }),
            (op, Some(_)) => Err(Error::InvalidParameter {
                name: "b",
                value: "volume".into(),
                reason: format!("{} takes a single volume", op.name()),
            }),
        }
    }
}

/// Voxelwise algebra as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct Algebra;

impl Algorithm for Algebra {
    type Input = (Volume<f64>, Option<Volume<f64>>);
    type Output = Volume<f64>;
    type Params = VolumeOp;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Algebra"
    }

    fn description(&self) -> &'static str {
        "Elementwise arithmetic between one or two volumes"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (a, b) = input;
        params.apply(&a, b.as_ref())
    }
}
