//! Font loading and caching

use crate::RenderError;
use ab_glyph::FontArc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Shared cache of parsed fonts, keyed by file path
///
/// Cloning is cheap; clones share the same cache, so batch workers parse
/// each font file once.
#[derive(Clone, Default)]
pub struct FontCache {
    fonts: Arc<RwLock<HashMap<PathBuf, FontArc>>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a font, loading it from disk on first use
    ///
    /// # Arguments
    /// * `path` - TrueType/OpenType font file
    pub fn load(&self, path: &Path) -> Result<FontArc, RenderError> {
        if let Some(font) = self.fonts.read().get(path) {
            return Ok(font.clone());
        }

        let data = std::fs::read(path).map_err(|e| RenderError::FontNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontArc::try_from_vec(data).map_err(|e| RenderError::FontNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded font");

        // Another worker may have loaded it meanwhile; keep the first copy
        let mut fonts = self.fonts.write();
        Ok(fonts.entry(path.to_path_buf()).or_insert(font).clone())
    }

    /// Number of fonts loaded so far
    pub fn len(&self) -> usize {
        self.fonts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.read().is_empty()
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache").field("fonts", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dejavu() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fonts/DejaVuSans.ttf")
    }

    #[test]
    fn test_load_caches_font() {
        let cache = FontCache::new();
        cache.load(&dejavu()).unwrap();
        cache.load(&dejavu()).unwrap();
        assert_eq!(cache.len(), 1);

        let shared = cache.clone();
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_missing_font() {
        let cache = FontCache::new();
        let err = cache.load(Path::new("no/such/font.ttf")).unwrap_err();
        assert!(matches!(err, RenderError::FontNotFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unparsable_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        let err = FontCache::new().load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Font not found: "));
    }
}
