//! Built-in clause processors.
//!
//! Each module exposes a `TYPE_KEY`, the processor type, its
//! `documentation()`, and a `register` function adding it to a
//! [`Registry`](crate::registry::Registry).
//!
//! | Type          | Compiles to                                        |
//! |---------------|----------------------------------------------------|
//! | `label`       | `query_string` on `label`                          |
//! | `path`        | `prefix` on `path`                                 |
//! | `owner`       | nested `userPermissions` with `own` permission     |
//! | `permissions` | nested `userPermissions` for a set of users        |
//! | `created`     | range on `dateCreated`                             |
//! | `modified`    | range on `dateModified`                            |
//! | `size`        | range on `fileSize`                                |
//! | `metadata`    | nested `metadata`, optionally through child docs   |
//! | `tag`         | terms lookups against tag documents                |

pub mod created;
mod date_range;
pub mod label;
pub mod metadata;
pub mod modified;
pub mod owned_tag;
pub mod owner;
pub mod path;
pub mod permissions;
pub mod size;
pub mod tag;
pub mod utils;

pub use date_range::DateRangeProcessor;
