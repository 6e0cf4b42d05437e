//! End-to-end: corpus on disk -> persisted index -> agent answer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use courtside_lib::agent::{AgentLoop, AgentState};
use courtside_lib::config::Config;
use courtside_lib::embed::{Embedder, HashingEmbedder};
use courtside_lib::index::{IndexBuilder, IndexStore, SnapshotHandle};
use courtside_lib::reader::{ReaderSet, TextReader};
use courtside_lib::search::HybridRetriever;
use courtside_lib::Error;

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("Basketball_Shooting.txt"),
        "Aim for a 45 degree entry angle so the ball drops through the rim.",
    )
    .unwrap();
    fs::write(
        dir.join("Basketball_Finishing.md"),
        "A higher release creates a steeper entry angle on floaters.",
    )
    .unwrap();
    fs::write(
        dir.join("Basketball_Follow_Through.txt"),
        "Hold the follow-through with a relaxed wrist until the ball lands.",
    )
    .unwrap();
}

fn config(root: &Path) -> Config {
    let mut config = Config::default();
    config.corpus_dir = root.join("kb");
    config.index_dir = root.join("index");
    config
}

#[test]
fn test_build_persist_reload_and_answer() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    write_corpus(&config.corpus_dir);

    let readers = ReaderSet::new().with_reader(TextReader);
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
    let builder = IndexBuilder::new(&config, &readers, embedder.as_ref()).unwrap();
    let store = IndexStore::new(&config.index_dir);

    let handle = Arc::new(SnapshotHandle::new());
    let built = handle.init(&store, &builder).unwrap();
    assert_eq!(built.len(), 3);
    for name in ["meta.json", "vectors.bin", "bm25.json"] {
        assert!(config.index_dir.join(name).is_file(), "{name} missing");
    }

    // a second process would load the same snapshot from disk
    let reloaded = store.load().unwrap().expect("persisted snapshot");
    let built_ids: Vec<&str> = built.chunks().iter().map(|c| c.id.as_str()).collect();
    let reloaded_ids: Vec<&str> = reloaded.chunks().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(built_ids, reloaded_ids);

    let retriever = HybridRetriever::new(handle.current().unwrap(), embedder.as_ref(), &config.retrieval);
    assert_eq!(retriever.search("entry angle", 6).unwrap().len(), 3);

    let agent = AgentLoop::new(Arc::clone(&handle), embedder, &config);
    let state = agent.run("improve shot angle").unwrap();
    assert!(state.subgoals.len() >= 2);
    assert!(state.issues.is_empty());
    assert_eq!(state.trace.last(), Some(&AgentState::Done));

    let follow = state.draft.find("follow-through").unwrap();
    assert!(state.draft.find("45 degree").unwrap() < follow);
    assert!(state.draft.contains("_Source:_ (Basketball_"));

    handle.teardown();
    assert!(matches!(agent.run("anything"), Err(Error::IndexUnavailable(_))));
}

#[test]
fn test_empty_corpus_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    fs::create_dir_all(&config.corpus_dir).unwrap();

    let readers = ReaderSet::new().with_reader(TextReader);
    let embedder = HashingEmbedder::default();
    let builder = IndexBuilder::new(&config, &readers, &embedder).unwrap();
    let store = IndexStore::new(&config.index_dir);

    let result = SnapshotHandle::new().init(&store, &builder);

    assert!(matches!(result, Err(Error::EmptyCorpus(_))));
    assert!(!config.index_dir.exists());
}

#[test]
fn test_corrupt_index_is_rebuilt() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path());
    write_corpus(&config.corpus_dir);

    let readers = ReaderSet::new().with_reader(TextReader);
    let embedder = HashingEmbedder::default();
    let builder = IndexBuilder::new(&config, &readers, &embedder).unwrap();
    let store = IndexStore::new(&config.index_dir);
    store.rebuild(&builder).unwrap();

    fs::write(config.index_dir.join("vectors.bin"), b"not an index").unwrap();
    assert!(store.load().is_err());

    let snapshot = store.open_or_build(&builder).unwrap();
    assert_eq!(snapshot.len(), 3);
    assert!(store.load().unwrap().is_some());
}
