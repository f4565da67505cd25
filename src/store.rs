//! Job state on the filesystem.
//!
//! A job is one upload-to-download session: an 8-char id mapped to an
//! input directory (`uploads/<id>/`) and an output directory
//! (`outputs/<id>/`). There is no database: directory existence IS the
//! job registry, and deleting the directories deletes the job.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

/// Length of generated job ids (hex chars of a v4 UUID).
const JOB_ID_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    JobNotFound(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Maps job ids to their directories. Safe to clone behind an `Arc`.
#[derive(Debug, Clone)]
pub struct JobStore {
    uploads_root: PathBuf,
    outputs_root: PathBuf,
}

impl JobStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let uploads_root = data_dir.join("uploads");
        let outputs_root = data_dir.join("outputs");
        std::fs::create_dir_all(&uploads_root)?;
        std::fs::create_dir_all(&outputs_root)?;
        Ok(Self {
            uploads_root,
            outputs_root,
        })
    }

    /// Create a fresh job with an empty input directory.
    pub fn create_job(&self) -> Result<Job, StoreError> {
        let id: String = Uuid::new_v4().simple().to_string()[..JOB_ID_LEN].to_string();
        let job = self.job_paths(&id);
        if job.input_dir.exists() {
            std::fs::remove_dir_all(&job.input_dir)?;
        }
        std::fs::create_dir_all(&job.input_dir)?;
        Ok(job)
    }

    /// Resolve an existing job id. `JobNotFound` if it was never created
    /// or has been deleted.
    pub fn job(&self, id: &str) -> Result<Job, StoreError> {
        if !valid_job_id(id) {
            return Err(StoreError::JobNotFound(id.to_string()));
        }
        let job = self.job_paths(id);
        if !job.input_dir.is_dir() {
            return Err(StoreError::JobNotFound(id.to_string()));
        }
        Ok(job)
    }

    /// Remove all state for a job (input dir, output dir, cached download
    /// archive). Returns `false` when there was nothing to remove.
    pub fn delete_job(&self, id: &str) -> Result<bool, StoreError> {
        if !valid_job_id(id) {
            return Ok(false);
        }
        let job = self.job_paths(id);
        let mut removed = false;
        for dir in [&job.input_dir, &job.output_dir] {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
                removed = true;
            }
        }
        let zip = job.download_zip_path();
        if zip.exists() {
            std::fs::remove_file(&zip)?;
            removed = true;
        }
        Ok(removed)
    }

    fn job_paths(&self, id: &str) -> Job {
        Job {
            id: id.to_string(),
            input_dir: self.uploads_root.join(id),
            output_dir: self.outputs_root.join(id),
            outputs_root: self.outputs_root.clone(),
        }
    }
}

/// Ids are exactly 8 lowercase hex chars; anything else can never resolve,
/// which also shuts out path traversal through the id segment.
fn valid_job_id(id: &str) -> bool {
    id.len() == JOB_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// One job's directory handles.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    outputs_root: PathBuf,
}

impl Job {
    /// All Python sources in the input directory, as paths relative to it,
    /// sorted for stable ordering. Dunder-prefixed files are skipped.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        collect_python_files(&self.input_dir, &self.input_dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Absolute path of a source file, rejecting traversal outside the job.
    pub fn input_path(&self, relative: &str) -> Result<PathBuf, StoreError> {
        Ok(self.input_dir.join(sanitize_relative(relative)?))
    }

    /// Absolute path of an output file, rejecting traversal outside the job.
    pub fn output_path(&self, relative: &str) -> Result<PathBuf, StoreError> {
        Ok(self.output_dir.join(sanitize_relative(relative)?))
    }

    /// Where the cached download archive for this job lives.
    pub fn download_zip_path(&self) -> PathBuf {
        self.outputs_root.join(format!("{}_processed.zip", self.id))
    }

    /// Creation time, taken from the input directory itself.
    pub fn created_at(&self) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
        let meta = std::fs::metadata(&self.input_dir)?;
        let time = meta.created().or_else(|_| meta.modified())?;
        Ok(time.into())
    }
}

/// Reject absolute paths and any `..` component in a client-supplied
/// relative path.
fn sanitize_relative(relative: &str) -> Result<PathBuf, StoreError> {
    let path = Path::new(relative);
    if relative.is_empty()
        || path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(StoreError::InvalidPath(relative.to_string()));
    }
    Ok(path.to_path_buf())
}

fn collect_python_files(
    dir: &Path,
    base: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<(), StoreError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_dir() {
            collect_python_files(&path, base, out)?;
        } else if name.ends_with(".py") && !name.starts_with("__") {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (JobStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store = JobStore::open(tmp.path()).unwrap();
        (store, tmp)
    }

    #[test]
    fn create_then_resolve() {
        let (store, _tmp) = test_store();
        let job = store.create_job().unwrap();
        assert_eq!(job.id.len(), 8);
        assert!(job.input_dir.is_dir());

        let resolved = store.job(&job.id).unwrap();
        assert_eq!(resolved.input_dir, job.input_dir);
    }

    #[test]
    fn unknown_job_is_not_found() {
        let (store, _tmp) = test_store();
        assert!(matches!(
            store.job("deadbeef"),
            Err(StoreError::JobNotFound(_))
        ));
    }

    #[test]
    fn malformed_id_is_not_found() {
        let (store, _tmp) = test_store();
        for id in ["../../etc", "short", "deadbeefcafe", "zzzzzzzz"] {
            assert!(store.job(id).is_err(), "id {id:?} should not resolve");
        }
    }

    #[test]
    fn source_files_skips_dunder_and_non_python() {
        let (store, _tmp) = test_store();
        let job = store.create_job().unwrap();
        std::fs::write(job.input_dir.join("a.py"), "x = 1\n").unwrap();
        std::fs::write(job.input_dir.join("__init__.py"), "").unwrap();
        std::fs::write(job.input_dir.join("notes.txt"), "hi").unwrap();
        std::fs::create_dir_all(job.input_dir.join("pkg")).unwrap();
        std::fs::write(job.input_dir.join("pkg/b.py"), "y = 2\n").unwrap();

        let files = job.source_files().unwrap();
        assert_eq!(files, vec![PathBuf::from("a.py"), PathBuf::from("pkg/b.py")]);
    }

    #[test]
    fn delete_removes_everything_and_reports_repeat() {
        let (store, _tmp) = test_store();
        let job = store.create_job().unwrap();
        std::fs::create_dir_all(&job.output_dir).unwrap();
        std::fs::write(job.download_zip_path(), b"zip").unwrap();

        assert!(store.delete_job(&job.id).unwrap());
        assert!(!job.input_dir.exists());
        assert!(!job.output_dir.exists());
        assert!(!job.download_zip_path().exists());

        // Second delete: nothing left
        assert!(!store.delete_job(&job.id).unwrap());
        assert!(store.job(&job.id).is_err());
    }

    #[test]
    fn created_at_is_recent() {
        let (store, _tmp) = test_store();
        let job = store.create_job().unwrap();
        let age = chrono::Utc::now() - job.created_at().unwrap();
        assert!(age.num_seconds().abs() < 60);
    }

    #[test]
    fn relative_paths_cannot_escape() {
        let (store, _tmp) = test_store();
        let job = store.create_job().unwrap();
        assert!(job.input_path("../outside.py").is_err());
        assert!(job.input_path("/etc/passwd").is_err());
        assert!(job.input_path("").is_err());
        assert!(job.input_path("pkg/ok.py").is_ok());
    }
}
