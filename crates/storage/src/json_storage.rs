//! JSON file storage implementation.
//!
//! Stores each record as a JSON file under a data directory:
//! `targets/<name>.json` for target records, `status/<name>/<task>.json` for
//! per-task statuses, and `changelog/<name>/<entry-id>.json` for changelog
//! entries. Entry IDs are ULIDs, so filename order matches creation order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use waypoint_core::{
    ChangelogEntry, ChangelogKind, EvaluationOutcome, Target, TaskState, TaskStatus,
};

use super::trait_::{Result, Storage, StorageError};

/// File-based JSON storage backend.
///
/// Clones share the same data directory and lock table, so cloned handles
/// can serve overlapping refreshes safely.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    // One lock per target name. Overlapping refreshes of the same target
    // must not interleave their updates; refreshes of different targets
    // must not block one another.
    write_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl JsonStorage {
    /// Create storage rooted at a data directory, creating the layout if
    /// needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("targets")).await?;
        fs::create_dir_all(root.join("status")).await?;
        fs::create_dir_all(root.join("changelog")).await?;

        Ok(Self {
            root,
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Lock guarding status write-backs for one target.
    async fn target_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.entry(name.to_string()).or_default().clone()
    }

    fn target_path(&self, name: &str) -> PathBuf {
        self.root.join("targets").join(format!("{}.json", name))
    }

    fn status_dir(&self, name: &str) -> PathBuf {
        self.root.join("status").join(name)
    }

    fn status_path(&self, name: &str, task: &str) -> PathBuf {
        self.status_dir(name).join(format!("{}.json", task))
    }

    fn changelog_dir(&self, name: &str) -> PathBuf {
        self.root.join("changelog").join(name)
    }

    async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json.as_bytes()).await?;
        Ok(())
    }

    async fn append_changelog(
        &self,
        name: &str,
        kind: ChangelogKind,
        message: impl Into<String>,
    ) -> Result<()> {
        let entry = ChangelogEntry::new(kind, message);
        let dir = self.changelog_dir(name);
        fs::create_dir_all(&dir).await?;
        Self::write_json(&dir.join(format!("{}.json", entry.id)), &entry).await
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn create_target(&mut self, target: &Target) -> Result<()> {
        let path = self.target_path(&target.name);
        if fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists(target.name.clone()));
        }

        fs::create_dir_all(self.status_dir(&target.name)).await?;
        fs::create_dir_all(self.changelog_dir(&target.name)).await?;
        Self::write_json(&path, target).await
    }

    async fn find_target(&self, name: &str) -> Result<Option<Target>> {
        read_json(&self.target_path(name)).await
    }

    async fn list_targets(&self) -> Result<Vec<Target>> {
        let mut targets: Vec<Target> = list_dir(&self.root.join("targets")).await?;
        targets.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        Ok(targets)
    }

    async fn update_status(&mut self, name: &str, outcome: &EvaluationOutcome) -> Result<Target> {
        let lock = self.target_lock(name).await;
        let _guard = lock.lock().await;

        let mut target: Target = read_json(&self.target_path(name))
            .await?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;

        self.append_changelog(name, ChangelogKind::Deploy, "Deployed the app")
            .await?;

        for (task_name, status) in &outcome.tasks {
            let path = self.status_path(name, task_name);
            let previous: Option<TaskStatus> = read_json(&path).await?;
            let newly_passed = status.status == TaskState::Pass
                && previous.map_or(true, |p| p.status != TaskState::Pass);
            if newly_passed {
                self.append_changelog(
                    name,
                    ChangelogKind::TaskDone,
                    format!("Completed task {}.", task_name),
                )
                .await?;
            }
            Self::write_json(&path, status).await?;
        }

        if let Some(current) = &outcome.current_task {
            target.current_task = current.clone();
        }

        let statuses = self.task_statuses(name).await?;
        target.score = statuses
            .values()
            .filter(|s| s.status == TaskState::Pass)
            .count() as u32;
        target.last_updated = chrono::Utc::now();
        Self::write_json(&self.target_path(name), &target).await?;

        debug!(
            "recorded status for {}: current_task={} score={}",
            target.name, target.current_task, target.score
        );
        Ok(target)
    }

    async fn task_statuses(&self, name: &str) -> Result<HashMap<String, TaskStatus>> {
        let mut statuses = HashMap::new();
        for (stem, status) in named_entries::<TaskStatus>(&self.status_dir(name)).await? {
            statuses.insert(stem, status);
        }
        Ok(statuses)
    }

    async fn changelog(&self, name: &str) -> Result<Vec<ChangelogEntry>> {
        let mut entries: Vec<ChangelogEntry> = list_dir(&self.changelog_dir(name)).await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read every `.json` file in a directory. A missing directory is empty,
/// not an error.
async fn named_entries<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<(String, T)>> {
    let mut items = Vec::new();
    let mut rd = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if let Some(item) = read_json(&path).await? {
            items.push((stem, item));
        }
    }
    Ok(items)
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    Ok(named_entries(dir)
        .await?
        .into_iter()
        .map(|(_, item)| item)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::CheckStatus;

    async fn storage() -> (tempfile::TempDir, JsonStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    fn passing(task: &str) -> (String, TaskStatus) {
        (
            task.to_string(),
            TaskStatus::from_checks(vec![CheckStatus::pass("c")]),
        )
    }

    fn failing(task: &str) -> (String, TaskStatus) {
        (
            task.to_string(),
            TaskStatus::from_checks(vec![CheckStatus::fail("c", "nope")]),
        )
    }

    fn outcome(tasks: Vec<(String, TaskStatus)>, current: &str) -> EvaluationOutcome {
        EvaluationOutcome {
            tasks,
            current_task: Some(current.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_dir, mut storage) = storage().await;
        let target = Target::new("alice", "http://alice.test", "homepage");

        storage.create_target(&target).await.unwrap();
        let found = storage.find_target("alice").await.unwrap().unwrap();
        assert_eq!(found.name, "alice");
        assert_eq!(found.current_task, "homepage");
        assert_eq!(found.score, 0);

        assert!(storage.find_target("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let (_dir, mut storage) = storage().await;
        let target = Target::new("alice", "http://alice.test", "homepage");

        storage.create_target(&target).await.unwrap();
        let err = storage.create_target(&target).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_update_status_unknown_target() {
        let (_dir, mut storage) = storage().await;
        let err = storage
            .update_status("ghost", &outcome(vec![], "t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_update_status_upserts_and_scores() {
        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();

        let updated = storage
            .update_status(
                "alice",
                &outcome(vec![passing("t1"), failing("t2")], "t2"),
            )
            .await
            .unwrap();

        assert_eq!(updated.current_task, "t2");
        assert_eq!(updated.score, 1);
        assert!(updated.last_updated >= updated.created_at);

        let statuses = storage.task_statuses("alice").await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert!(statuses["t1"].passed());
        assert!(!statuses["t2"].passed());
    }

    #[tokio::test]
    async fn test_update_status_is_idempotent() {
        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();
        let o = outcome(vec![passing("t1"), failing("t2")], "t2");

        let first = storage.update_status("alice", &o).await.unwrap();
        let second = storage.update_status("alice", &o).await.unwrap();

        assert_eq!(first.score, second.score);
        assert_eq!(first.current_task, second.current_task);
        assert_eq!(
            storage.task_statuses("alice").await.unwrap(),
            storage.task_statuses("alice").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_score_counts_only_passes() {
        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();

        storage
            .update_status(
                "alice",
                &outcome(vec![passing("t1"), passing("t2"), failing("t3")], "t3"),
            )
            .await
            .unwrap();

        let target = storage.find_target("alice").await.unwrap().unwrap();
        assert_eq!(target.score, 2);
    }

    #[tokio::test]
    async fn test_regression_drops_score() {
        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();

        storage
            .update_status("alice", &outcome(vec![passing("t1")], "t1"))
            .await
            .unwrap();
        let target = storage
            .update_status("alice", &outcome(vec![failing("t1")], "t1"))
            .await
            .unwrap();

        assert_eq!(target.score, 0);
        assert!(!storage.task_statuses("alice").await.unwrap()["t1"].passed());
    }

    #[tokio::test]
    async fn test_changelog_records_deploy_and_first_pass() {
        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();

        storage
            .update_status("alice", &outcome(vec![passing("t1")], "t1"))
            .await
            .unwrap();
        storage
            .update_status("alice", &outcome(vec![passing("t1")], "t1"))
            .await
            .unwrap();

        let entries = storage.changelog("alice").await.unwrap();
        let deploys = entries
            .iter()
            .filter(|e| e.kind == ChangelogKind::Deploy)
            .count();
        let completions: Vec<_> = entries
            .iter()
            .filter(|e| e.kind == ChangelogKind::TaskDone)
            .collect();

        assert_eq!(deploys, 2);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].message, "Completed task t1.");
    }

    #[tokio::test]
    async fn test_list_targets_ordered_by_score() {
        let (_dir, mut storage) = storage().await;
        for name in ["alice", "bob", "carol"] {
            storage
                .create_target(&Target::new(name, format!("http://{}.test", name), "t1"))
                .await
                .unwrap();
        }
        storage
            .update_status("bob", &outcome(vec![passing("t1"), passing("t2")], "t2"))
            .await
            .unwrap();
        storage
            .update_status("carol", &outcome(vec![passing("t1")], "t1"))
            .await
            .unwrap();

        let targets = storage.list_targets().await.unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol", "alice"]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_different_targets() {
        let (_dir, storage) = storage().await;
        let mut s1 = storage.clone();
        let mut s2 = storage.clone();
        s1.create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();
        s2.create_target(&Target::new("bob", "http://bob.test", "t1"))
            .await
            .unwrap();

        let o1 = outcome(vec![passing("t1")], "t1");
        let o2 = outcome(vec![failing("t1")], "t1");
        let (a, b) = tokio::join!(
            async { s1.update_status("alice", &o1).await },
            async { s2.update_status("bob", &o2).await },
        );

        assert_eq!(a.unwrap().score, 1);
        assert_eq!(b.unwrap().score, 0);
        assert!(storage.task_statuses("alice").await.unwrap()["t1"].passed());
        assert!(!storage.task_statuses("bob").await.unwrap()["t1"].passed());
    }

    #[tokio::test]
    async fn test_write_lock_is_per_target() {
        use std::time::Duration;

        let (_dir, mut storage) = storage().await;
        storage
            .create_target(&Target::new("alice", "http://alice.test", "t1"))
            .await
            .unwrap();
        storage
            .create_target(&Target::new("bob", "http://bob.test", "t1"))
            .await
            .unwrap();

        // Hold alice's lock: bob's refresh must still go through, while a
        // same-target refresh blocks until the lock is released.
        let lock = storage.target_lock("alice").await;
        let guard = lock.lock().await;

        let mut other = storage.clone();
        let o = outcome(vec![passing("t1")], "t1");
        tokio::time::timeout(Duration::from_secs(5), other.update_status("bob", &o))
            .await
            .expect("different-target update must not block")
            .unwrap();

        let mut same = storage.clone();
        let blocked =
            tokio::time::timeout(Duration::from_millis(100), same.update_status("alice", &o))
                .await;
        assert!(blocked.is_err());

        drop(guard);
        same.update_status("alice", &o).await.unwrap();
    }

    #[tokio::test]
    async fn test_changelog_empty_for_unknown_target() {
        let (_dir, storage) = storage().await;
        assert!(storage.changelog("ghost").await.unwrap().is_empty());
        assert!(storage.task_statuses("ghost").await.unwrap().is_empty());
    }
}
