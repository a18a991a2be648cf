//! Well-known op types
//!
//! Op types the graph itself assigns meaning to. Everything else is an opaque
//! tag compared by string equality.

/// Graph input placeholder
pub const DATA: &str = "Data";

/// Constant node holding a materialized value
pub const CONST: &str = "Const";

/// Alternative spelling for constant nodes
pub const CONSTANT: &str = "Constant";

/// Constant-producing op types
pub const CONSTANT_OPS: &[&str] = &[CONST, CONSTANT];

/// Check if an op type produces a constant value
pub fn is_constant_op(op_type: &str) -> bool {
    CONSTANT_OPS.contains(&op_type)
}
