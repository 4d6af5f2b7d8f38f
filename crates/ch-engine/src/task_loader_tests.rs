use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use ch_adapters::FakeObjectStore;
use ch_core::{ExecutionStrategy, Resource};

use super::*;
use crate::resource_loader::{ObjectStoreFactory, S3SchemeLoader};

struct OneStore(Arc<dyn ch_adapters::ObjectStore>);

impl ObjectStoreFactory for OneStore {
    fn for_bucket(&self, _bucket: &str) -> Arc<dyn ch_adapters::ObjectStore> {
        self.0.clone()
    }
}

fn task(input: &str, output: &str) -> Task {
    Task::new(Resource::new(input), Resource::new(output), ExecutionStrategy::docker("img"), "mov", std::time::Duration::from_secs(1), "0.1")
}

fn loader(store: Arc<dyn ch_adapters::ObjectStore>) -> ResourceLoader {
    let mut registry: HashMap<String, Arc<dyn crate::resource_loader::SchemeLoader>> = HashMap::new();
    registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(OneStore(store))));
    ResourceLoader::new(registry)
}

#[tokio::test]
async fn create_workspace_makes_three_dirs_mode_0700() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeObjectStore::new());
    let tl = TaskLoader::new(loader(store), dir.path());
    let mut t = task("s3://b/in/x.mov", "s3://b/out/x.mov/");

    tl.create_workspace(&mut t).await.unwrap();

    let ws = t.workspace.clone().unwrap();
    for d in [&ws.input_dir, &ws.output_dir, &ws.internal_dir] {
        let meta = std::fs::metadata(d).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o700);
    }
}

#[tokio::test]
async fn download_resets_input_dir_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeObjectStore::new());
    store.put_bytes("in/x.mov", b"clip".to_vec());
    let tl = TaskLoader::new(loader(store), dir.path());
    let mut t = task("s3://b/in/x.mov", "s3://b/out/x.mov/");
    tl.create_workspace(&mut t).await.unwrap();

    let stale = t.workspace.as_ref().unwrap().input_dir.join("stale.txt");
    std::fs::write(&stale, b"old").unwrap();

    tl.download(&t).await.unwrap();

    assert!(!stale.exists());
    assert_eq!(std::fs::read(t.workspace.as_ref().unwrap().input_dir.join("x.mov")).unwrap(), b"clip");
}

#[tokio::test]
async fn upload_rejects_empty_filepath() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeObjectStore::new());
    let tl = TaskLoader::new(loader(store), dir.path());
    let mut t = task("s3://b/in/x.mov", "s3://b/out/x.mov/");
    tl.create_workspace(&mut t).await.unwrap();

    let err = tl.upload(&t, Path::new("")).await.unwrap_err();
    assert!(matches!(err, TaskLoaderError::EmptyFilePath));
}

#[tokio::test]
async fn clean_removes_the_task_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeObjectStore::new());
    let tl = TaskLoader::new(loader(store), dir.path());
    let mut t = task("s3://b/in/x.mov", "s3://b/out/x.mov/");
    tl.create_workspace(&mut t).await.unwrap();
    let root = dir.path().join(t.hash());
    assert!(root.exists());

    tl.clean(&t).await.unwrap();
    assert!(!root.exists());
}
