// tests/helpers/testroot.rs
// A per-test unique root with its own staging directory, so parallel tests never share working copies.

use std::path::{Path, PathBuf};

use cfgkeeper::policy::Policy;
use cfgkeeper::ConfigFileBuilder;

#[derive(Debug)]
pub struct TestRoot {
    td: tempfile::TempDir,
}

impl TestRoot {
    pub fn new() -> Self { Self { td: tempfile::TempDir::new().expect("tempdir") } }
    pub fn path(&self) -> &Path { self.td.path() }
    pub fn join<P: AsRef<Path>>(&self, p: P) -> PathBuf { self.path().join(p) }
    pub fn cfg(&self, name: &str) -> PathBuf { self.join(format!("etc/{name}")) }
    pub fn staging(&self) -> PathBuf { self.join("staging") }
    pub fn policy(&self) -> Policy { Policy::default().with_temp_root(self.staging()) }
    pub fn builder(&self) -> ConfigFileBuilder { ConfigFileBuilder::new().with_policy(self.policy()) }

    /// Write a config file (and its parent directories) directly, bypassing cfgkeeper.
    pub fn write(&self, path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Files currently staged under this root's staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        let dir = self.staging().join("cfgkeeper");
        match std::fs::read_dir(dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testroot_unique() {
        let a = TestRoot::new();
        let b = TestRoot::new();
        assert_ne!(a.path(), b.path());
        a.write(&a.cfg("app.toml"), "x = \"1\"\n");
        assert!(a.cfg("app.toml").exists());
        assert!(!b.cfg("app.toml").exists());
    }
}
