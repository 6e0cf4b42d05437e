use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::chunk::Chunk;
use crate::index::{IndexBuilder, IndexSnapshot};
use crate::lexical::Bm25Index;
use crate::store::FlatIndex;
use crate::Result;

const META_FILE: &str = "meta.json";
const VECTOR_FILE: &str = "vectors.bin";
const LEXICAL_FILE: &str = "bm25.json";

/// On-disk home of a snapshot: three co-located artifacts.
///
/// - `meta.json`: ordered `{id, text, meta}` records
/// - `vectors.bin`: the vector index, rows in the same order
/// - `bm25.json`: ordered `{id, text, meta}` records the lexical index is rebuilt from
///
/// There is no write locking; concurrent saves must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    fn vector_path(&self) -> PathBuf {
        self.dir.join(VECTOR_FILE)
    }

    fn lexical_path(&self) -> PathBuf {
        self.dir.join(LEXICAL_FILE)
    }

    /// Returns `true` if all three artifacts exist.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.meta_path().is_file() && self.vector_path().is_file() && self.lexical_path().is_file()
    }

    /// Load the persisted snapshot.
    ///
    /// Missing artifacts and an empty chunk list both mean "absent"
    /// (`Ok(None)`). Unreadable or inconsistent artifacts are errors.
    pub fn load(&self) -> Result<Option<IndexSnapshot>> {
        if !self.exists() {
            info!(dir = %self.dir.display(), "no persisted index");
            return Ok(None);
        }

        let chunks: Vec<Chunk> = serde_json::from_slice(&fs::read(self.meta_path())?)?;
        if chunks.is_empty() {
            warn!(dir = %self.dir.display(), "persisted chunk list is empty; treating index as absent");
            return Ok(None);
        }

        let vectors = FlatIndex::from_bytes(&fs::read(self.vector_path())?)?;
        let records: Vec<Chunk> = serde_json::from_slice(&fs::read(self.lexical_path())?)?;
        let lexical = Bm25Index::build(records.iter().map(|r| (r.id.as_str(), r.text.as_str())));

        let snapshot = IndexSnapshot::from_parts(chunks, vectors, lexical)?;
        info!(chunks = snapshot.len(), dir = %self.dir.display(), "loaded index");
        Ok(Some(snapshot))
    }

    /// Write all three artifacts. Each file is replaced atomically.
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let records: Vec<&Chunk> = snapshot.chunks().iter().map(AsRef::as_ref).collect();
        let json = serde_json::to_vec_pretty(&records)?;

        write_atomic(&self.meta_path(), &json)?;
        write_atomic(&self.vector_path(), &snapshot.vectors().to_bytes()?)?;
        write_atomic(&self.lexical_path(), &json)?;

        info!(chunks = snapshot.len(), dir = %self.dir.display(), "saved index");
        Ok(())
    }

    /// Build a fresh snapshot from the corpus and persist it.
    ///
    /// Nothing is written if the build fails.
    pub fn rebuild(&self, builder: &IndexBuilder<'_>) -> Result<IndexSnapshot> {
        let snapshot = builder.build()?;
        self.save(&snapshot)?;
        Ok(snapshot)
    }

    /// Load the persisted snapshot, rebuilding when it is absent or unusable.
    pub fn open_or_build(&self, builder: &IndexBuilder<'_>) -> Result<IndexSnapshot> {
        match self.load() {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => {
                info!("building index");
                self.rebuild(builder)
            }
            Err(e) => {
                warn!(error = %e, "failed to load index; rebuilding");
                self.rebuild(builder)
            }
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
