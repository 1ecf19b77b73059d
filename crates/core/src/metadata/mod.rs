//! Upload metadata: the canonical record and the store capability.
//!
//! Records reach us in more than one stored shape (the legacy flat JSON
//! file, Firestore documents). Every store funnels what it reads through
//! [`normalize_record`] and returns lists ordered by
//! [`sort_newest_first`], so callers only ever see [`UploadRecord`].

mod error;
mod normalize;
mod record;
mod store;

#[cfg(test)]
mod normalize_props;

pub use error::MetadataError;
pub use normalize::{normalize_record, parse_timestamp, sort_newest_first};
pub use record::UploadRecord;
pub use store::MetadataStore;
