//! Billing core
//!
//! | Module | Role |
//! |--------|------|
//! | [`id_gen`] | `#B-` / `#O-` daily sequential display ids |
//! | [`cart`] | editable cart with pending kitchen deltas |
//! | [`reconcile`] | save / remove / cancel against bills and kitchen orders |
//! | [`settlement`] | tender validation and bill payment |
//! | [`tables`] | open-bill discovery per table |
//! | [`removal`] | confirm-before-remove state machine |
//! | [`receipt`] | receipt and KOT print data |

pub mod cart;
pub mod id_gen;
pub mod receipt;
pub mod reconcile;
pub mod removal;
pub mod settlement;
pub mod tables;

pub use cart::{Cart, DecrementOutcome};
pub use id_gen::{IdGenerator, IdKind};
pub use reconcile::{BillingEngine, SaveOutcome};
pub use removal::{RemovalFlow, RemovalState};
pub use settlement::{Settlement, Tender};
pub use tables::{SelectionAction, TableAction, TableChoice, TableSelection};
