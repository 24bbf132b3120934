//! Resource and coded-text model.
//!
//! This module defines the locale-neutral intermediate representation that
//! bridges extraction and reconstruction: fragments of text with inline
//! codes, their grouping into segments, the resources carrying them and the
//! events streaming those resources.

pub mod annotation;
mod balance;
mod code;
mod container;
mod event;
mod extension;
mod fragment;
mod locale;
mod nodes;
mod part;
mod resource;

pub use annotation::{AnnotationItem, AnnotationStore, Annotations, AnnotatorsRef, GroupRef, StandoffGroup};
pub use balance::BalanceReport;
pub use code::{Code, CodeRole, TagType, REF_MARKER_START};
pub use container::Container;
pub use event::{Event, EventKind};
pub use extension::{ExtAttribute, ExtAttributes, ExtChild, ExtElement};
pub use fragment::{
    index_symbol, is_marker, is_reserved, symbol_index, CodeAnomalies, Fragment, Piece, MARKER_CLOSING, MARKER_ISOLATED,
    MARKER_OPENING, MAX_CODES,
};
pub use locale::LocaleId;
pub use nodes::{AppliesTo, GlossEntry, Match, MetaEntry, MetadataGroup, Note};
pub use part::{MissingTarget, Part, PartKind, TargetState};
pub use resource::{
    DocumentPart, Ending, Properties, StartDocument, StartGroup, StartSubDocument, TextUnit,
};
