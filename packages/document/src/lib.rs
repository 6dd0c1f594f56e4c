//! # Motif Document
//!
//! In-memory model of a Motif design document: nodes, stylesheets,
//! assets, design-system foundations, and variables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ sync: partial JSON updates → CRUD merges    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: typed entity stores               │
//! │  - identity-keyed lookup, no merge logic    │
//! │  - structural node attach/detach            │
//! │  - foundation ordering by childIndex        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ runtime: document → live instance tree      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The stores here are deliberately dumb: merge policy (which fields
//! win, what a CRUD marker means) lives in `motif-sync`. The one
//! exception is the foundation registry, which owns the ordering
//! contract for its entries and publishes change events.
//!
//! Exactly one `Document` is live per runtime session and it has a
//! single logical writer; there is no internal locking.

mod asset;
mod document;
mod foundation;
mod node;
mod stylesheet;
mod variable;

pub use asset::{Asset, AssetKind, AssetMeta, AssetState, FontMeta, ImageMeta, SizeVariant};
pub use document::{Document, DocumentError, TabBarData};
pub use foundation::{
    FoundationAction, FoundationEntry, FoundationEvent, FoundationKind, FoundationRegistry,
};
pub use node::{Node, NodeKind};
pub use stylesheet::StyleSheet;
pub use variable::{Variable, VariableCollection};
