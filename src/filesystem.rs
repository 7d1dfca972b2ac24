//! Filesystem port backing the document store.
//!
//! The [`FileSystem`] trait is the only seam between the store and the disk,
//! so the whole pipeline can run against [`MemFileSystem`] in tests. The
//! surface is deliberately narrow: the store only ever creates its two kind
//! directories, reads and writes whole files, and enumerates flat
//! directories.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Metadata for a single path, as returned by [`FileSystem::stat`].
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub is_dir: bool,
    pub modified: SystemTime,
    pub len: u64,
}

/// A single entry from [`FileSystem::read_dir`].
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub modified: SystemTime,
}

/// Narrow filesystem capability used by the document store.
pub trait FileSystem: Send + Sync {
    fn mkdir_all(&self, path: &Path) -> io::Result<()>;
    fn stat(&self, path: &Path) -> io::Result<FileInfo>;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by the real OS filesystem.
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let meta = std::fs::metadata(path)?;
        Ok(FileInfo {
            is_dir: meta.is_dir(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            len: meta.len(),
        })
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        std::fs::write(path, data)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: meta.is_dir(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}

#[derive(Debug, Clone)]
enum MemNode {
    Dir { modified: SystemTime },
    File { data: Vec<u8>, modified: SystemTime },
}

/// In-memory [`FileSystem`] for tests.
///
/// Paths are stored normalized (no `.` components) in a flat map, so lookups
/// behave the same regardless of how the caller joins paths. `set_modified`
/// lets TTL tests age a file without sleeping.
pub struct MemFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, MemNode>>,
}

impl MemFileSystem {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Overrides the modification time of an existing file or directory.
    pub fn set_modified(&self, path: &Path, modified: SystemTime) {
        let key = normalize(path);
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(node) = nodes.get_mut(&key) {
            match node {
                MemNode::Dir { modified: m } => *m = modified,
                MemNode::File { modified: m, .. } => *m = modified,
            }
        }
    }
}

impl Default for MemFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            std::path::Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl FileSystem for MemFileSystem {
    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let key = normalize(path);
        let mut nodes = self.nodes.lock().unwrap();
        let mut cur = PathBuf::new();
        for comp in key.components() {
            cur.push(comp);
            match nodes.get(&cur) {
                Some(MemNode::File { .. }) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("not a directory: {}", cur.display()),
                    ));
                }
                Some(MemNode::Dir { .. }) => {}
                None => {
                    nodes.insert(
                        cur.clone(),
                        MemNode::Dir {
                            modified: SystemTime::now(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let key = normalize(path);
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(&key) {
            Some(MemNode::Dir { modified }) => Ok(FileInfo {
                is_dir: true,
                modified: *modified,
                len: 0,
            }),
            Some(MemNode::File { data, modified }) => Ok(FileInfo {
                is_dir: false,
                modified: *modified,
                len: data.len() as u64,
            }),
            None => Err(not_found(path)),
        }
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let key = normalize(path);
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(&key) {
            Some(MemNode::File { data, .. }) => Ok(data.clone()),
            Some(MemNode::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let key = normalize(path);
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(parent) = key.parent() {
            if !parent.as_os_str().is_empty() && !nodes.contains_key(parent) {
                return Err(not_found(parent));
            }
        }
        nodes.insert(
            key,
            MemNode::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let key = normalize(path);
        let nodes = self.nodes.lock().unwrap();
        if !matches!(nodes.get(&key), Some(MemNode::Dir { .. })) {
            return Err(not_found(path));
        }
        let mut entries = Vec::new();
        for (p, node) in nodes.iter() {
            if p.parent() == Some(key.as_path()) {
                let name = match p.file_name() {
                    Some(n) => n.to_string_lossy().to_string(),
                    None => continue,
                };
                let (is_dir, modified) = match node {
                    MemNode::Dir { modified } => (true, *modified),
                    MemNode::File { modified, .. } => (false, *modified),
                };
                entries.push(DirEntry {
                    name,
                    is_dir,
                    modified,
                });
            }
        }
        Ok(entries)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let key = normalize(path);
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let key = normalize(path);
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|p, _| !(p == &key || p.starts_with(&key)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn mem_fs_round_trip() {
        let fs = MemFileSystem::new();
        fs.mkdir_all(Path::new("root/cv")).unwrap();
        fs.write_file(Path::new("root/cv/a.md"), b"hello").unwrap();

        assert_eq!(fs.read_file(Path::new("root/cv/a.md")).unwrap(), b"hello");
        let info = fs.stat(Path::new("root/cv/a.md")).unwrap();
        assert!(!info.is_dir);
        assert_eq!(info.len, 5);
    }

    #[test]
    fn mem_fs_write_requires_parent() {
        let fs = MemFileSystem::new();
        let err = fs.write_file(Path::new("missing/a.md"), b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn mem_fs_read_dir_lists_direct_children_only() {
        let fs = MemFileSystem::new();
        fs.mkdir_all(Path::new("root/cv")).unwrap();
        fs.mkdir_all(Path::new("root/jd")).unwrap();
        fs.write_file(Path::new("root/cv/a.md"), b"a").unwrap();
        fs.write_file(Path::new("root/cv/b.md"), b"b").unwrap();

        let entries = fs.read_dir(Path::new("root")).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["cv", "jd"]);

        let cv_entries = fs.read_dir(Path::new("root/cv")).unwrap();
        assert_eq!(cv_entries.len(), 2);
        assert!(cv_entries.iter().all(|e| !e.is_dir));
    }

    #[test]
    fn mem_fs_set_modified_ages_a_file() {
        let fs = MemFileSystem::new();
        fs.mkdir_all(Path::new("root")).unwrap();
        fs.write_file(Path::new("root/a.md"), b"a").unwrap();

        let past = SystemTime::now() - Duration::from_secs(48 * 3600);
        fs.set_modified(Path::new("root/a.md"), past);
        assert_eq!(fs.stat(Path::new("root/a.md")).unwrap().modified, past);
    }

    #[test]
    fn mem_fs_remove() {
        let fs = MemFileSystem::new();
        fs.mkdir_all(Path::new("root")).unwrap();
        fs.write_file(Path::new("root/a.md"), b"a").unwrap();
        fs.remove(Path::new("root/a.md")).unwrap();
        assert!(fs.stat(Path::new("root/a.md")).is_err());
        assert!(fs.remove(Path::new("root/a.md")).is_err());
    }

    #[test]
    fn os_fs_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let fs = OsFileSystem;
        let dir = tmp.path().join("cv");
        fs.mkdir_all(&dir).unwrap();
        fs.write_file(&dir.join("a.md"), b"hello").unwrap();
        assert_eq!(fs.read_file(&dir.join("a.md")).unwrap(), b"hello");
        let entries = fs.read_dir(&dir).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.md");
    }
}
