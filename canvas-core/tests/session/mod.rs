//! Session tests
//!
//! The chat/canvas loop end to end: turns produce artifact versions, the
//! editor revises them, and later turns carry the revision.

mod workflow;
