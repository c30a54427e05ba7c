#![warn(missing_docs)]
//! Spellcheck Core - Incremental On-the-Fly Validation Engine
//!
//! # Overview
//!
//! `spellcheck-core` is the scheduling heart of an editor's on-the-fly spell
//! checker. It continuously re-validates words of an editable document while
//! it is being edited and scrolled, without ever re-checking the whole
//! document and without blocking the editing session. It deliberately does
//! *not* decide which words are wrong: that judgment belongs to an external
//! backend session. This crate does the bookkeeping around that judgment:
//!
//! - **Tracked intervals**: document ranges whose endpoints survive
//!   insertions/deletions elsewhere, held in a generation-checked arena
//! - **Deferred edit batching**: edit notifications buffered and processed as
//!   one batch per scheduler iteration
//! - **Word-aligned partitioning**: contraction-aware word boundaries,
//!   dictionary sub-range splitting, highlighting-eligibility runs
//! - **LIFO check scheduling**: freshest edits are validated first; pending
//!   jobs never overlap (overlaps merge into their union)
//! - **Single-session discipline**: at most one in-flight backend check,
//!   cancelled synchronously whenever an edit invalidates it
//! - **Per-view visibility**: only what some view shows is checked, and
//!   results hidden from every view are pruned
//!
//! # Concurrency model
//!
//! Single-threaded, cooperative, lock-free. The host calls
//! [`OnTheFlyEngine::poll`] once per event-loop iteration; everything
//! deferred (edit batches, debounced scrolls, backend results) happens there.
//! Notification entry points never do heavy work inline.
//!
//! # Quick start
//!
//! ```rust
//! use spellcheck_core::{
//!     BufferDocument, CheckContext, Document, OnTheFlyEngine,
//!     PlainTextEligibility, StaticDictionaryMap, ViewId,
//! };
//!
//! let doc = BufferDocument::new("helo world\n");
//! let highlight = PlainTextEligibility;
//! let dictionaries = StaticDictionaryMap::new("en_US");
//!
//! // No backend installed: the engine degrades to "nothing is misspelled".
//! let mut engine = OnTheFlyEngine::without_backend();
//! let ctx = CheckContext::new(&doc, &highlight, &dictionaries);
//! engine.view_created(&ctx, ViewId::new(1), doc.document_range());
//! engine.poll(&ctx);
//! assert!(engine.misspellings().is_empty());
//! ```
//!
//! # Module description
//!
//! - [`position`] - line/column coordinates and half-open ranges
//! - [`interval`] - the tracked-interval arena and lifecycle events
//! - [`collaborators`] - the document/highlighting/dictionary/backend seams
//! - [`document`] - a rope-backed reference document
//! - [`partition`] - word boundaries and range partitioning
//! - [`queue`] - the deferred modification batch and the LIFO check queue
//! - [`active`] - the at-most-one in-flight job
//! - [`misspellings`] - the set of confirmed-misspelled ranges
//! - [`visibility`] - per-view visible-range tracking and pruning
//! - [`engine`] - the orchestrating engine and its notifications

pub mod active;
pub mod collaborators;
pub mod document;
pub mod engine;
pub mod interval;
pub mod misspellings;
pub mod partition;
pub mod position;
pub mod queue;
pub mod visibility;

pub use collaborators::{
    AttributeId, CheckContext, DecodedText, DictionaryMap, Document, HighlightSource,
    HighlightToken, PlainTextEligibility, SessionEvent, StaticDictionaryMap, ValidationSession,
};
pub use document::BufferDocument;
pub use engine::{CheckEvent, CheckEventCallback, EngineConfig, OnTheFlyEngine};
pub use interval::{GrowthPolicy, IntervalArena, IntervalEvent, IntervalEventKind, IntervalHandle};
pub use misspellings::MisspelledSet;
pub use partition::{find_word_boundaries, partition_by_dictionary, partition_by_eligibility};
pub use position::{DocRange, Position};
pub use queue::{CheckQueue, ModificationQueue};
pub use visibility::{ViewId, ViewVisibilityTracker, VisibilityDelta};
