// ============================================================================
// EDIT HISTORY — linear version store with a cursor
// ============================================================================
//
// Every committed edit becomes an immutable `ImageVersion`; the cursor picks
// the current one.  Invariant: `cursor ∈ [-1, len-1]`, with -1 only for the
// empty store.  The history is the sole owner of "current image" — tools
// read it, never write it.

use std::time::SystemTime;

use crate::io::ImagePayload;

/// One committed image plus when it was produced.
#[derive(Clone, Debug)]
pub struct ImageVersion {
    payload: ImagePayload,
    created_at: SystemTime,
}

impl ImageVersion {
    fn new(payload: ImagePayload) -> Self {
        Self {
            payload,
            created_at: SystemTime::now(),
        }
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    pub fn name(&self) -> &str {
        self.payload.name()
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

/// Append-only, branch-truncating version store.
///
/// A commit after undo discards the redo branch permanently.
/// `reset_to_original` only moves the cursor, so redo can still walk back to
/// versions produced before the reset.
#[derive(Default)]
pub struct EditHistory {
    versions: Vec<ImageVersion>,
    cursor: isize,
    /// Bumped on every mutation so dependents can detect version changes.
    generation: u64,
}

impl EditHistory {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
            cursor: -1,
            generation: 0,
        }
    }

    /// Drop every version after the cursor, append `payload`, and move the
    /// cursor onto it.  Redo is unavailable until a later undo.
    pub fn commit(&mut self, payload: ImagePayload) {
        self.versions.truncate((self.cursor + 1) as usize);
        self.versions.push(ImageVersion::new(payload));
        self.cursor = self.versions.len() as isize - 1;
        self.generation += 1;
        log_info!(
            "History: commit '{}' (version {}/{})",
            self.versions[self.cursor as usize].name(),
            self.cursor + 1,
            self.versions.len()
        );
    }

    /// Move the cursor back one version.  Returns false (no error) at the
    /// lower bound.
    pub fn undo(&mut self) -> bool {
        if self.cursor <= 0 {
            return false;
        }
        self.cursor -= 1;
        self.generation += 1;
        log_info!("History: undo to version {}", self.cursor);
        true
    }

    /// Move the cursor forward one version.  Returns false at the upper bound.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 >= self.versions.len() as isize {
            return false;
        }
        self.cursor += 1;
        self.generation += 1;
        log_info!("History: redo to version {}", self.cursor);
        true
    }

    /// Jump the cursor back to the first version without truncating — later
    /// versions stay reachable through redo.
    pub fn reset_to_original(&mut self) -> bool {
        if self.versions.is_empty() || self.cursor == 0 {
            return false;
        }
        self.cursor = 0;
        self.generation += 1;
        log_info!("History: reset to original");
        true
    }

    /// Discard everything and start a fresh single-version history.
    pub fn replace_all(&mut self, payload: ImagePayload) {
        log_info!("History: replaced with '{}'", payload.name());
        self.versions.clear();
        self.versions.push(ImageVersion::new(payload));
        self.cursor = 0;
        self.generation += 1;
    }

    // ---- accessors ----------------------------------------------------

    pub fn current(&self) -> Option<&ImagePayload> {
        if self.cursor < 0 {
            return None;
        }
        self.versions.get(self.cursor as usize).map(|v| v.payload())
    }

    pub fn original(&self) -> Option<&ImagePayload> {
        self.versions.first().map(|v| v.payload())
    }

    pub fn versions(&self) -> &[ImageVersion] {
        &self.versions
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.versions.len() as isize
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
