//! Implied volatility solver
//!
//! Inverts the Black-Scholes-Merton price for one quote at a time with a bounded
//! Newton-Raphson iteration. The iterate is clipped to `[SIGMA_MIN, SIGMA_MAX]`
//! after every update, so the pricing function is never evaluated at a
//! non-positive volatility. Failures are reported per quote and never abort a
//! surface build.

pub mod solver;
pub mod types;

pub use solver::*;
pub use types::*;
