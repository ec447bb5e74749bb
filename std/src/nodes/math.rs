use ligature_core::{LoopState, StepError, StepResult, StepSpec, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MathOperation {
    Add,
    Sub,
    Mul,
    Div,
}

/// Applies `operation` to the first argument and a fixed operand.
///
/// Integer inputs stay integers unless the result overflows or the operand is
/// fractional; everything else is computed in `f64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathNode {
    pub operation: MathOperation,
    pub operand: Value,
}

impl MathNode {
    pub fn new(operation: MathOperation, operand: impl Into<Value>) -> Self {
        Self {
            operation,
            operand: operand.into(),
        }
    }

    pub fn spec(&self) -> StepSpec {
        let node = self.clone();
        let label = format!("{:?}", self.operation).to_lowercase();
        StepSpec::direct(label, move |args| {
            let input = args.first().cloned().unwrap_or_else(|| json!(0));
            node.apply(&input)
        })
    }

    fn apply(&self, input: &Value) -> StepResult<Value> {
        if let (Some(a), Some(b)) = (input.as_i64(), self.operand.as_i64()) {
            let exact = match self.operation {
                MathOperation::Add => a.checked_add(b),
                MathOperation::Sub => a.checked_sub(b),
                MathOperation::Mul => a.checked_mul(b),
                MathOperation::Div if b == 0 => return Err(StepError::custom("division by zero")),
                MathOperation::Div if a.checked_rem(b) == Some(0) => a.checked_div(b),
                MathOperation::Div => None,
            };
            if let Some(n) = exact {
                return Ok(json!(n));
            }
        }

        let (Some(a), Some(b)) = (input.as_f64(), self.operand.as_f64()) else {
            return Err(StepError::custom(format!(
                "cannot apply {:?} to {input} and {}",
                self.operation, self.operand
            )));
        };
        let result = match self.operation {
            MathOperation::Add => a + b,
            MathOperation::Sub => a - b,
            MathOperation::Mul => a * b,
            MathOperation::Div if b == 0.0 => return Err(StepError::custom("division by zero")),
            MathOperation::Div => a / b,
        };
        Ok(json!(result))
    }
}

/// Loop body that adds `step` to its first argument and feeds the new count
/// to both the predicate and the next iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterNode {
    pub step: i64,
}

impl CounterNode {
    pub fn new(step: i64) -> Self {
        Self { step }
    }

    pub fn spec(&self) -> StepSpec {
        let step = self.step;
        StepSpec::direct(format!("count+{step}"), move |args| {
            let n = args.first().and_then(Value::as_i64).unwrap_or_default() + step;
            Ok(LoopState::new(vec![json!(n)], vec![json!(n)]).into_value())
        })
    }
}

impl Default for CounterNode {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_math_stays_integral() {
        let add = MathNode::new(MathOperation::Add, 2).spec();
        assert_eq!(add.call(vec![json!(40)]).unwrap(), json!(42));

        let div = MathNode::new(MathOperation::Div, 4).spec();
        assert_eq!(div.call(vec![json!(8)]).unwrap(), json!(2));
        assert_eq!(div.call(vec![json!(10)]).unwrap(), json!(2.5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let div = MathNode::new(MathOperation::Div, 0).spec();
        assert!(div.call(vec![json!(1)]).is_err());
    }

    #[test]
    fn non_numeric_input_is_an_error() {
        let mul = MathNode::new(MathOperation::Mul, 3).spec();
        assert!(mul.call(vec![json!("three")]).is_err());
    }

    #[test]
    fn counter_produces_loop_state() {
        let value = CounterNode::new(5).spec().call(vec![json!(1)]).unwrap();
        let state = LoopState::from_value(value).unwrap();
        assert_eq!(state, LoopState::new(vec![json!(6)], vec![json!(6)]));
    }
}
