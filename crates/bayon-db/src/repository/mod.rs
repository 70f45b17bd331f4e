//! # Repository Implementations
//!
//! One repository per aggregate, each holding a clone of the pool.
//!
//! Repositories expose READ paths (plus catalog/intake inserts used by
//! seeding). Checkout and void writes belong exclusively to the sale
//! ledger so that every mutation of sale, inventory, and warranty state
//! happens inside one transaction.

pub mod product;
pub mod sale;
pub mod serial;
pub mod warranty;
