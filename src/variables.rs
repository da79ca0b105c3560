//! Variable access for deterministic nodes
//!
//! A small set of variable IDs have the same meaning for every host: the current
//! date, the callback being answered, the running accumulator and a few world
//! settings. Those are answered here from the [`ResolverContext`]. Every other ID
//! is passed to the [`ResolverHost`] verbatim.
//!
//! # Example
//!
//! ```
//! use variantgraph::context::{Globals, ResolverContext};
//! use variantgraph::host::FixedHost;
//! use variantgraph::variables::{get_variable, VAR_LAST_VALUE};
//!
//! let host = FixedHost::new().with_variable(0x40, 7);
//! let ctx = ResolverContext::new(Globals::default()).with_last_value(3);
//!
//! assert_eq!(get_variable(&ctx, &host, VAR_LAST_VALUE, 0), 3);
//! assert_eq!(get_variable(&ctx, &host, 0x40, 0), 7);
//! ```

use crate::context::{Landscape, ResolverContext, ResolverHost};

/// Value returned for variables the host does not support.
pub const UNSUPPORTED: u32 = u32::MAX;

/// First year of the original calendar exposed to graphs.
pub const ORIGINAL_BASE_YEAR: i32 = 1920;
/// Last year representable by the year variable.
pub const ORIGINAL_MAX_YEAR: i32 = 2090;
/// Days from year 0 to 1920-01-01.
pub const DAYS_TILL_ORIGINAL_BASE_YEAR: i32 = 365 * ORIGINAL_BASE_YEAR + ORIGINAL_BASE_YEAR / 4
    - ORIGINAL_BASE_YEAR / 100
    + ORIGINAL_BASE_YEAR / 400;

pub const VAR_DATE: u8 = 0x00;
pub const VAR_YEAR: u8 = 0x01;
pub const VAR_MONTH: u8 = 0x02;
pub const VAR_LANDSCAPE: u8 = 0x03;
pub const VAR_DATE_FRACTION: u8 = 0x09;
pub const VAR_TICK_COUNTER: u8 = 0x0A;
pub const VAR_CALLBACK: u8 = 0x0C;
pub const VAR_CALLBACK_PARAM1: u8 = 0x10;
pub const VAR_ZERO: u8 = 0x11;
pub const VAR_CALLBACK_PARAM2: u8 = 0x18;
pub const VAR_ALL_ONES: u8 = 0x1A;
pub const VAR_DISPLAY_OPTIONS: u8 = 0x1B;
pub const VAR_LAST_VALUE: u8 = 0x1C;
pub const VAR_SNOW_LINE: u8 = 0x20;
/// Evaluates the adjustment's subroutine node; handled by the resolver.
pub const VAR_SUBROUTINE: u8 = 0x7E;

/// Snow line reported outside arctic climates.
pub const NO_SNOW_LINE: u32 = 0xFF;

/// Whether `variable` is answered without consulting the host.
pub fn is_reserved(variable: u8) -> bool {
    matches!(
        variable,
        VAR_DATE
            | VAR_YEAR
            | VAR_MONTH
            | VAR_LANDSCAPE
            | VAR_DATE_FRACTION
            | VAR_TICK_COUNTER
            | VAR_CALLBACK
            | VAR_CALLBACK_PARAM1
            | VAR_ZERO
            | VAR_CALLBACK_PARAM2
            | VAR_ALL_ONES
            | VAR_DISPLAY_OPTIONS
            | VAR_LAST_VALUE
            | VAR_SNOW_LINE
    )
}

/// Fetch the 32-bit value of `variable`.
pub fn get_variable<H: ResolverHost + ?Sized>(
    ctx: &ResolverContext,
    host: &H,
    variable: u8,
    parameter: u8,
) -> u32 {
    let globals = &ctx.globals;
    match variable {
        VAR_DATE => globals.date.saturating_sub(DAYS_TILL_ORIGINAL_BASE_YEAR).max(0) as u32,
        VAR_YEAR => {
            (globals.year.clamp(ORIGINAL_BASE_YEAR, ORIGINAL_MAX_YEAR) - ORIGINAL_BASE_YEAR) as u32
        }
        VAR_MONTH => u32::from(globals.month),
        VAR_LANDSCAPE => globals.landscape.code(),
        VAR_DATE_FRACTION => u32::from(globals.date_fraction),
        VAR_TICK_COUNTER => u32::from(globals.tick_counter),
        VAR_CALLBACK => u32::from(ctx.callback),
        VAR_CALLBACK_PARAM1 => ctx.callback_param1,
        VAR_ZERO => 0,
        VAR_CALLBACK_PARAM2 => ctx.callback_param2,
        VAR_ALL_ONES => u32::MAX,
        VAR_DISPLAY_OPTIONS => u32::from(globals.display_options & 0x3F),
        VAR_LAST_VALUE => ctx.last_value,
        VAR_SNOW_LINE => {
            if globals.landscape == Landscape::Arctic {
                u32::from(globals.snow_line)
            } else {
                NO_SNOW_LINE
            }
        }
        _ => host.variable(ctx, variable, parameter),
    }
}
