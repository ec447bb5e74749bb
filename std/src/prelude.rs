pub use crate::nodes::flow::{ConstantNode, IdentityNode};
pub use crate::nodes::logic::{LessThanNode, NotNode, PredicateNode, SwitchNode};
pub use crate::nodes::math::{CounterNode, MathNode, MathOperation};
pub use crate::{constant, counter, identity, less_than, not, predicate, switch_on};
