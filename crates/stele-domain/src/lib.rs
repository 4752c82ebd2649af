#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod alias;
pub mod content;
pub mod language;
pub mod location;
pub mod path;

pub use alias::{Action, ActionKind, AliasId, AliasRow, NewAliasRow, ROOT_PARENT};
pub use content::{ContentInfo, ContentStatus};
pub use language::{
    pick_best_translation, LanguageError, LanguageId, LanguageMask, LanguageSet, ALWAYS_AVAILABLE,
};
pub use location::{Location, NewLocation, SortField, SortOrder, TrashedLocation};
pub use path::{slug, text_md5, PathError, PathString};
