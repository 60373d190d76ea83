//! DNS traffic generation.
//!
//! Lookups go through the host resolver; they exist only so that DNS
//! responses cross the captured interface.

mod driver;
mod resolver;

pub use driver::QueryDriver;
pub use resolver::{Resolver, SystemResolver};
