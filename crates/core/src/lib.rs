//! Core logic for pourbot: transcript change detection and stateless dispatch
//! of utterances to an action-selecting oracle.
//!
//! The pieces compose left to right: a [`watcher::TranscriptWatcher`] surfaces
//! each newly appended transcript line exactly once, a
//! [`dispatcher::Dispatcher`] submits it to an [`oracle::Oracle`] together
//! with the declared [`actions::ActionRegistry`], and the dispatch outcome
//! tells the hosting loop whether a physical dispense completed.

pub mod actions;
pub mod dispatcher;
pub mod oracle;
pub mod watcher;
