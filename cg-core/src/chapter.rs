//! Chapter discovery and loading.
//!
//! A chapter lives in `<root>/<id>/` with a `stage.toml` manifest next to its
//! script file and (optionally) a font.

use std::path::{Path, PathBuf};

use cg_script::{parse_source, Script};
use walkdir::WalkDir;

use crate::error::{CgError, Result};
use crate::stage::StageLayout;

pub const MANIFEST: &str = "stage.toml";

#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: String,
    pub dir: PathBuf,
    pub layout: StageLayout,
    pub script: Script,
    pub font: Option<PathBuf>,
}

impl Chapter {
    /// Reads the manifest and script of chapter `id` under `root`.
    ///
    /// Fails with [`CgError::ResourceNotReady`] when the manifest names a
    /// font that is not on disk.
    pub async fn load(root: impl AsRef<Path>, id: &str) -> Result<Self> {
        let dir = root.as_ref().join(id);
        let manifest = read(&dir.join(MANIFEST)).await?;
        let layout = StageLayout::from_toml(&manifest)?;

        let font = match &layout.font {
            Some(name) => {
                let path = dir.join(name);
                if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Err(CgError::ResourceNotReady(format!("font {}", path.display())));
                }
                Some(path)
            }
            None => None,
        };

        let script_path = dir.join(&layout.script);
        let src = read(&script_path).await?;
        let script = parse_source(&script_path, &src)?;

        log::info!(
            "Loaded chapter '{}': {} line(s), {} scene(s), {} dialog box(es)",
            id,
            script.len(),
            layout.scenes.len(),
            layout.dialogs.len()
        );

        Ok(Self {
            id: id.to_string(),
            dir,
            layout,
            script,
            font,
        })
    }

    /// Builds a chapter that never touched the disk.
    pub fn from_parts(id: impl Into<String>, layout: StageLayout, script: Script) -> Self {
        Self {
            id: id.into(),
            dir: PathBuf::new(),
            layout,
            script,
            font: None,
        }
    }
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|source| CgError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Ids of every chapter below `root`, sorted.
pub fn list_chapters(root: impl AsRef<Path>) -> Vec<String> {
    let root = root.as_ref();
    let mut ids: Vec<String> = WalkDir::new(root)
        .min_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST)
        .filter_map(|e| {
            let dir = e.path().parent()?;
            let rel = dir.strip_prefix(root).ok()?;
            Some(rel.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    ids.sort();
    ids
}
