//! # retouch
//!
//! A single-image, non-destructive editing engine. Load one raster image,
//! adjust it with a fixed set of filters, rotate, flip, crop and resize it
//! (or fit it to a social media preset), step back and forth through a
//! linear undo history, and export it to PNG, JPEG, WebP or AVIF, optionally
//! searching encoder quality to land near a target file size.
//!
//! # Architecture: Recompute From The Original
//!
//! The decoded original is never modified. Every edit changes a small
//! [`EditRecipe`](imaging::EditRecipe) and the frame on screen is rendered
//! again from the original:
//!
//! ```text
//! original ─▶ filters ─▶ transforms ─▶ crop ─▶ resize ─▶ frame ─▶ surface
//! ```
//!
//! This keeps combinations of edits unambiguous (the order they were made in
//! does not matter, only the recipe does) and makes undo trivial: a history
//! entry is just a recipe plus the frame it rendered to.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | The editing session: state machine, history commits, jobs, surface redraws |
//! | [`document`] | The loaded image: immutable original plus the current frame |
//! | [`imaging`] | Pixel work: filters, transforms, crop/resize, codecs, export search |
//! | [`history`] | Generic linear undo/redo with a cursor |
//! | [`presets`] | Static social media dimension table |
//! | [`surface`] | Trait for the caller-owned draw target, plus an in-memory one |
//! | [`config`] | `retouch.toml` loading, merging and validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Silent Engine
//!
//! Nothing in the library prints. Every operation returns a
//! [`SessionStatus`](session::SessionStatus), an
//! [`ExportOutcome`](imaging::ExportOutcome) or an
//! [`EditError`](session::EditError); a missed size target is a warning inside
//! a successful result. Diagnostics go through `tracing` at debug level and
//! only show up if the host installs a subscriber.
//!
//! ## Reject, Don't Queue
//!
//! Decode and encode run on the rayon pool. While one is in flight the session
//! is `Processing` and refuses every mutating call with
//! [`OperationInProgress`](session::EditError::OperationInProgress). There is
//! no cancellation: a job ends with its own success or failure.
//!
//! ## Borrowed Surface
//!
//! The session draws into a [`Surface`](surface::Surface) it borrows from the
//! caller. It never creates, resizes or disposes it, and always redraws the
//! whole frame.

pub mod config;
pub mod document;
pub mod history;
pub mod imaging;
pub mod output;
pub mod presets;
pub mod session;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_helpers;
