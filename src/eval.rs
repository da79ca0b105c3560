//! Fixed-width evaluation of adjustment steps
//!
//! Each deterministic node runs its adjustments in 8, 16 or 32 bit arithmetic.
//! Every intermediate result is truncated to that width, so an 8-bit pipeline
//! wraps exactly like `u8`/`i8` would at each step, not only at the end.

use crate::models::{AdjustOp, Adjustment, DivMod, ValueWidth};

/// Shift then mask a raw variable value. Shifts of 32 or more yield 0.
pub fn shift_mask(fetched: u32, shift: u8, and_mask: u32) -> u32 {
    fetched.checked_shr(u32::from(shift)).unwrap_or(0) & and_mask
}

macro_rules! eval_in_width {
    ($name:ident, $u:ty, $s:ty) => {
        #[allow(clippy::unnecessary_cast)]
        fn $name(adjust: &Adjustment, last_value: u32, fetched: u32) -> u32 {
            let mut value = shift_mask(fetched, adjust.shift, adjust.and_mask) as $u;

            match adjust.divmod {
                DivMod::None => {}
                DivMod::Div => {
                    value = value.wrapping_add(adjust.add_value as $u);
                    let divisor = adjust.divmod_value as $u as $s;
                    if divisor != 0 {
                        value = (value as $s).wrapping_div(divisor) as $u;
                    }
                }
                DivMod::Mod => {
                    value = value.wrapping_add(adjust.add_value as $u);
                    let divisor = adjust.divmod_value as $u;
                    if divisor != 0 {
                        value %= divisor;
                    }
                }
            }

            let last = last_value as $u;
            let result: $u = match adjust.operation {
                AdjustOp::Add => last.wrapping_add(value),
                AdjustOp::Sub => last.wrapping_sub(value),
                AdjustOp::SMin => (last as $s).min(value as $s) as $u,
                AdjustOp::SMax => (last as $s).max(value as $s) as $u,
                AdjustOp::UMin => last.min(value),
                AdjustOp::UMax => last.max(value),
                AdjustOp::SDiv if value == 0 => last,
                AdjustOp::SDiv => (last as $s).wrapping_div(value as $s) as $u,
                AdjustOp::SMod if value == 0 => last,
                AdjustOp::SMod => (last as $s).wrapping_rem(value as $s) as $u,
                AdjustOp::UDiv if value == 0 => last,
                AdjustOp::UDiv => last / value,
                AdjustOp::UMod if value == 0 => last,
                AdjustOp::UMod => last % value,
                AdjustOp::Mul => last.wrapping_mul(value),
                AdjustOp::And => last & value,
                AdjustOp::Or => last | value,
                AdjustOp::Xor => last ^ value,
                AdjustOp::Replace => value,
            };
            result as u32
        }
    };
}

eval_in_width!(eval_byte, u8, i8);
eval_in_width!(eval_word, u16, i16);
eval_in_width!(eval_dword, u32, i32);

/// Run one adjustment step.
///
/// `last_value` is the accumulator from the previous step and `fetched` the raw
/// variable value. The result is the new accumulator, zero-extended to 32 bits.
pub fn eval_adjust(width: ValueWidth, adjust: &Adjustment, last_value: u32, fetched: u32) -> u32 {
    match width {
        ValueWidth::Byte => eval_byte(adjust, last_value, fetched),
        ValueWidth::Word => eval_word(adjust, last_value, fetched),
        ValueWidth::Dword => eval_dword(adjust, last_value, fetched),
    }
}
