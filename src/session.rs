//! An editing session: one uploaded image, its version history, and the
//! names derived from it.  Nothing here survives the process.

use uuid::Uuid;

use crate::components::history::EditHistory;
use crate::io::ImagePayload;

pub struct EditSession {
    pub id: Uuid,
    pub history: EditHistory,
    /// File name of the uploaded image, kept for download naming.
    original_name: String,
}

impl EditSession {
    /// Start a session over a freshly uploaded image.
    pub fn new(upload: ImagePayload) -> Self {
        let original_name = upload.name().to_string();
        let mut history = EditHistory::new();
        history.replace_all(upload);
        log_info!("Session started over '{}'", original_name);
        Self {
            id: Uuid::new_v4(),
            history,
            original_name,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Name the current image downloads under.
    pub fn download_name(&self) -> String {
        format!("edited-{}", self.original_name)
    }

    /// The current image as a downloadable payload.
    pub fn download(&self) -> Option<ImagePayload> {
        let current = self.history.current()?;
        Some(ImagePayload::from_bytes(
            self.download_name(),
            current.bytes().to_vec(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_seeds_history_with_upload() {
        let session = EditSession::new(ImagePayload::from_bytes("cat.jpg", vec![1, 2, 3]));
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history.cursor(), 0);
        assert_eq!(session.original_name(), "cat.jpg");
    }

    #[test]
    fn test_download_uses_edited_prefix_and_current_bytes() {
        let mut session = EditSession::new(ImagePayload::from_bytes("cat.jpg", vec![1]));
        session
            .history
            .commit(ImagePayload::from_bytes("adjusted-1.png", vec![9, 9]));

        let dl = session.download().unwrap();
        assert_eq!(dl.name(), "edited-cat.jpg");
        assert_eq!(dl.bytes(), &[9, 9]);
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = EditSession::new(ImagePayload::from_bytes("a.png", vec![0]));
        let b = EditSession::new(ImagePayload::from_bytes("b.png", vec![0]));
        assert_ne!(a.id, b.id);
    }
}
