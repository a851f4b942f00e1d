use grove_dag::History;
use grove_store::{Commit, ObjectStore};
use grove_types::ObjectId;

use crate::error::GroveResult;

/// One commit in a history listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

impl LogEntry {
    /// `<short id> <summary>`
    pub fn oneline(&self) -> String {
        format!("{} {}", self.id.short_hex(), self.commit.summary())
    }
}

/// Lazy newest-first history. Created by [`crate::Grove::log`].
///
/// Stops after the first error.
pub struct Log<'r> {
    history: History<'r>,
    store: &'r dyn ObjectStore,
    done: bool,
}

impl<'r> Log<'r> {
    pub(crate) fn new(history: History<'r>, store: &'r dyn ObjectStore) -> Self {
        Self {
            history,
            store,
            done: false,
        }
    }
}

impl Iterator for Log<'_> {
    type Item = GroveResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let entry = match self.history.next()? {
            Ok(node) => self
                .store
                .get_commit(&node.id)
                .map(|commit| LogEntry {
                    id: node.id,
                    commit,
                })
                .map_err(Into::into),
            Err(e) => Err(e.into()),
        };
        self.done = entry.is_err();
        Some(entry)
    }
}
