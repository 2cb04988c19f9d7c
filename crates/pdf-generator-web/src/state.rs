use pdf_generator_core::{
    AcceptedImage, AppConfig, GeneratorSession, PdfGenerator, Result, Surface,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

// =============================================================================
// Preview Grid
// =============================================================================

/// One filled cell of the preview grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCell {
    /// Acceptance index, used in the preview image URL
    pub index: usize,
    pub name: String,
}

/// A row of the preview grid, created the first time the row is used.
#[derive(Debug, Clone)]
pub struct RowContainer {
    pub row: usize,
    pub cells: Vec<Option<PreviewCell>>,
}

impl Surface for RowContainer {
    fn create(row: usize, columns: usize) -> Self {
        Self {
            row,
            cells: vec![None; columns],
        }
    }

    fn show(&mut self, column: usize, image: &AcceptedImage) {
        if let Some(cell) = self.cells.get_mut(column) {
            *cell = Some(PreviewCell {
                index: image.index,
                name: image.image.name().to_string(),
            });
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Session data for one user's upload-preview-download interaction
pub struct Session {
    pub generator: GeneratorSession<RowContainer>,
    pub created_at: Instant,
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    pub generator: PdfGenerator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            generator: PdfGenerator::new(config)?,
        })
    }

    pub fn config(&self) -> &AppConfig {
        self.generator.config()
    }

    /// Register a session whose first pass has already been committed.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self, generator: GeneratorSession<RowContainer>) -> String {
        let id = Uuid::new_v4();

        let session = Session {
            generator,
            created_at: Instant::now(),
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Drop a session and its preview grid. Returns whether it existed.
    pub async fn remove_session(&self, id: &str) -> bool {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return false;
        };
        self.sessions.write().await.remove(&uuid).is_some()
    }

    /// Drop sessions older than the configured TTL. Returns how many were dropped.
    pub async fn cleanup_old_sessions(&self) -> usize {
        let max_age = Duration::from_secs(self.config().session_ttl_seconds);
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| now.duration_since(session.created_at) < max_age);

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Evicted {} expired sessions", removed);
        }
        removed
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are only taken inside synchronous closures, so no guard is ever
/// held across an `.await`:
///
/// ```ignore
/// // Lock is released before any await
/// let pages = session.with_session(|s| s.generator.pages()).await?;
/// assemble_in_background(pages).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    ///
    /// The closure runs synchronously while holding a read lock.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    ///
    /// The closure runs synchronously while holding a write lock.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state_with_ttl(seconds: u64) -> AppState {
        AppState::new(AppConfig {
            session_ttl_seconds: seconds,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_row_container_ignores_out_of_range_column() {
        let mut row = RowContainer::create(0, 2);
        let generator = PdfGenerator::new(AppConfig::default()).unwrap();
        let mut session = generator.new_session::<()>();
        assert!(session.is_empty());

        let png = {
            let img = image::DynamicImage::new_rgb8(2, 2);
            let mut out = std::io::Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png).unwrap();
            out.into_inner()
        };
        let upload = pdf_generator_core::UploadedImage::new("a.png", png).unwrap();
        generator.process(&mut session, vec![upload]).unwrap();
        let accepted = &session.accepted()[0];

        row.show(5, accepted);
        assert_eq!(row.cells, vec![None, None]);

        row.show(1, accepted);
        assert_eq!(
            row.cells[1],
            Some(PreviewCell {
                index: 0,
                name: "a.png".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state_with_ttl(3600);
        let id = state.create_session(state.generator.new_session()).await;

        assert!(state.get_session(&id).await.is_some());
        assert!(state.get_session("not-a-uuid").await.is_none());

        assert!(state.remove_session(&id).await);
        assert!(!state.remove_session(&id).await);
        assert!(state.get_session(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_evicts_expired_sessions() {
        let state = state_with_ttl(0);
        state.create_session(state.generator.new_session()).await;
        state.create_session(state.generator.new_session()).await;

        assert_eq!(state.cleanup_old_sessions().await, 2);
        assert_eq!(state.session_count().await, 0);

        let state = state_with_ttl(3600);
        state.create_session(state.generator.new_session()).await;
        assert_eq!(state.cleanup_old_sessions().await, 0);
        assert_eq!(state.session_count().await, 1);
    }
}
