//! Identifier generation for notes, folders, checklist items and history.
//!
//! # Invariants
//! - Generated ids are random v4 UUIDs in hyphenated form.
//! - Ids are opaque strings everywhere else: imported data may carry ids in
//!   any format and is never re-keyed.

use uuid::Uuid;

/// Returns a new collision-resistant local id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
