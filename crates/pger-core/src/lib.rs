//! Core library for pger.
//!
//! - [`index`]: the two repository index documents (`list.xml`,
//!   `full_list.xml`) and the upsert protocol that folds manifests into them.
//! - [`ledger`]: the per-machine package state ledger (`pges.xml`).
//! - [`publish`]: the pipeline that turns a content directory into a sealed
//!   archive and indexes it.
//! - [`io`]: the archive and digest collaborators the pipeline consumes.

mod document;
pub mod index;
pub mod io;
pub mod ledger;
pub mod paths;
pub mod publish;
pub mod reporter;

pub use index::{FullIndex, IndexError, LatestIndex};
pub use ledger::{BuildState, Ledger, LedgerError, PackageState, StateUpdate};
pub use paths::*;
pub use publish::{PublishError, PublishOutcome, Publisher};
pub use reporter::{NullReporter, Reporter};
