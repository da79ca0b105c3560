//! Adjustment steps of a deterministic node's arithmetic pipeline.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Binary operation combining the accumulator with a freshly adjusted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdjustOp {
    #[default]
    Add,
    Sub,
    SMin,
    SMax,
    UMin,
    UMax,
    SDiv,
    SMod,
    UDiv,
    UMod,
    Mul,
    And,
    Or,
    Xor,
    /// Pass the new value through, discarding the accumulator
    Replace,
}

impl AdjustOp {
    /// Map a raw operation code. Unrecognized codes become [`AdjustOp::Replace`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => AdjustOp::Add,
            0x01 => AdjustOp::Sub,
            0x02 => AdjustOp::SMin,
            0x03 => AdjustOp::SMax,
            0x04 => AdjustOp::UMin,
            0x05 => AdjustOp::UMax,
            0x06 => AdjustOp::SDiv,
            0x07 => AdjustOp::SMod,
            0x08 => AdjustOp::UDiv,
            0x09 => AdjustOp::UMod,
            0x0A => AdjustOp::Mul,
            0x0B => AdjustOp::And,
            0x0C => AdjustOp::Or,
            0x0D => AdjustOp::Xor,
            _ => AdjustOp::Replace,
        }
    }
}

/// Optional division step applied after add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DivMod {
    /// No add and no division
    #[default]
    None,
    /// Signed division in the node's width
    Div,
    /// Unsigned remainder in the node's width
    Mod,
}

/// One step of a deterministic node's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adjustment {
    pub variable: u8,
    #[serde(default)]
    pub parameter: u8,
    #[serde(default)]
    pub shift: u8,
    #[serde(default = "full_mask")]
    pub and_mask: u32,
    #[serde(default)]
    pub operation: AdjustOp,
    #[serde(default)]
    pub divmod: DivMod,
    #[serde(default)]
    pub add_value: u32,
    #[serde(default)]
    pub divmod_value: u32,
    /// Node evaluated when `variable` is the subroutine variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subroutine: Option<NodeId>,
}

fn full_mask() -> u32 {
    u32::MAX
}

impl Default for Adjustment {
    fn default() -> Self {
        Self {
            variable: 0,
            parameter: 0,
            shift: 0,
            and_mask: full_mask(),
            operation: AdjustOp::Add,
            divmod: DivMod::None,
            add_value: 0,
            divmod_value: 0,
            subroutine: None,
        }
    }
}

impl Adjustment {
    /// A plain step reading `variable` and combining it with `operation`.
    pub fn new(variable: u8, operation: AdjustOp) -> Self {
        Self { variable, operation, ..Default::default() }
    }

    pub fn with_parameter(mut self, parameter: u8) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn with_shift_mask(mut self, shift: u8, and_mask: u32) -> Self {
        self.shift = shift;
        self.and_mask = and_mask;
        self
    }

    /// Enable the add step followed by the given division kind.
    pub fn with_divmod(mut self, add_value: u32, divmod: DivMod, divmod_value: u32) -> Self {
        self.add_value = add_value;
        self.divmod = divmod;
        self.divmod_value = divmod_value;
        self
    }

    pub fn with_subroutine(mut self, node: NodeId) -> Self {
        self.subroutine = Some(node);
        self
    }
}
