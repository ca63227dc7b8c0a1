use std::{
    env, fs,
    path::{Path, PathBuf},
};

use buffer_calc_domain::{DatabaseReport, SimulationError, SimulationResult};

/// Conventional install locations of the PHREEQC database directory.
pub const INSTALL_ROOTS: &[&str] = &[
    "/usr/local/share/doc/phreeqc/database",
    "/usr/share/phreeqc/database",
    "/usr/local/share/phreeqc/database",
    "/opt/phreeqc/database",
];

/// How deep below each search root the locator descends.
pub const MAX_DEPTH: usize = 4;

/// Finds thermodynamic database files. An explicitly configured path always
/// wins for the run database; otherwise the roots are searched in order and
/// the first match is used.
#[derive(Debug, Clone, Default)]
pub struct DatabaseLocator {
    explicit: Option<PathBuf>,
    roots: Vec<PathBuf>,
}

impl DatabaseLocator {
    pub fn new(explicit: Option<PathBuf>, roots: Vec<PathBuf>) -> Self {
        Self { explicit, roots }
    }

    /// Working directory, executable directory, the caller's extra roots,
    /// then the conventional install locations.
    pub fn standard_roots(extra: &[PathBuf]) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Ok(cwd) = env::current_dir() {
            roots.push(cwd);
        }
        if let Some(dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            roots.push(dir);
        }
        roots.extend(extra.iter().cloned());
        roots.extend(INSTALL_ROOTS.iter().map(PathBuf::from));
        roots.dedup();
        roots
    }

    /// The database the engine runs against: the explicit path if one was
    /// configured, else the first `name` found under the roots.
    pub fn resolve(&self, name: &str) -> SimulationResult<PathBuf> {
        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                return Ok(explicit.clone());
            }
            return Err(SimulationError::DatabaseMissing {
                name: explicit.display().to_string(),
                searched: vec![explicit.display().to_string()],
            });
        }
        self.locate(name).ok_or_else(|| SimulationError::DatabaseMissing {
            name: name.to_string(),
            searched: self
                .roots
                .iter()
                .map(|root| root.display().to_string())
                .collect(),
        })
    }

    /// Searches the roots only, ignoring any explicit path.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .find_map(|root| find_file(root, name, MAX_DEPTH))
    }

    /// Diagnostics for `name`. The explicit path only counts when it carries
    /// the same file name.
    pub fn report(&self, name: &str) -> DatabaseReport {
        let explicit = self
            .explicit
            .as_ref()
            .filter(|path| path.file_name().is_some_and(|file| file == name));
        let path = explicit.cloned().or_else(|| self.locate(name));
        let exists = path.as_deref().is_some_and(Path::is_file);
        let mut searched = Vec::new();
        if let Some(explicit) = explicit {
            searched.push(explicit.clone());
        }
        searched.extend(self.roots.iter().cloned());
        DatabaseReport {
            name: name.to_string(),
            path,
            exists,
            searched,
        }
    }
}

// Breadth first so a shallow match wins over a nested one.
fn find_file(root: &Path, name: &str, max_depth: usize) -> Option<PathBuf> {
    let mut level = vec![root.to_path_buf()];
    for _ in 0..=max_depth {
        let mut next = Vec::new();
        for dir in &level {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false))
                .map(|entry| entry.path())
                .collect();
            children.sort();
            next.extend(children);
        }
        if next.is_empty() {
            break;
        }
        level = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"DATABASE").unwrap();
    }

    #[test]
    fn finds_nested_database_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("share/phreeqc/database/pitzer.dat");
        touch(&nested);

        let locator = DatabaseLocator::new(None, vec![dir.path().to_path_buf()]);
        assert_eq!(locator.resolve("pitzer.dat").unwrap(), nested);
        assert!(locator.locate("phreeqc.dat").is_none());
    }

    #[test]
    fn earlier_root_and_shallower_match_win() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("deep/er/pitzer.dat"));
        touch(&first.path().join("pitzer.dat"));
        touch(&second.path().join("pitzer.dat"));

        let locator = DatabaseLocator::new(
            None,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(
            locator.resolve("pitzer.dat").unwrap(),
            first.path().join("pitzer.dat")
        );
    }

    #[test]
    fn explicit_path_overrides_search() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.dat");
        touch(&custom);
        touch(&dir.path().join("pitzer.dat"));

        let locator = DatabaseLocator::new(Some(custom.clone()), vec![dir.path().to_path_buf()]);
        assert_eq!(locator.resolve("pitzer.dat").unwrap(), custom);
    }

    #[test]
    fn missing_database_lists_searched_roots() {
        let dir = tempfile::tempdir().unwrap();
        let locator = DatabaseLocator::new(None, vec![dir.path().to_path_buf()]);
        match locator.resolve("pitzer.dat").unwrap_err() {
            SimulationError::DatabaseMissing { name, searched } => {
                assert_eq!(name, "pitzer.dat");
                assert_eq!(searched, vec![dir.path().display().to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let report = locator.report("pitzer.dat");
        assert!(!report.exists);
        assert!(report.path.is_none());
        assert_eq!(report.searched, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn missing_explicit_file_is_reported() {
        let locator = DatabaseLocator::new(Some(PathBuf::from("/nonexistent/pitzer.dat")), vec![]);
        assert!(matches!(
            locator.resolve("pitzer.dat"),
            Err(SimulationError::DatabaseMissing { .. })
        ));
        let report = locator.report("pitzer.dat");
        assert_eq!(report.path, Some(PathBuf::from("/nonexistent/pitzer.dat")));
        assert!(!report.exists);
    }

    #[test]
    fn standard_roots_end_with_install_locations() {
        let extra = vec![PathBuf::from("/srv/db")];
        let roots = DatabaseLocator::standard_roots(&extra);
        assert!(roots.contains(&PathBuf::from("/srv/db")));
        assert_eq!(
            roots.last().unwrap(),
            &PathBuf::from(*INSTALL_ROOTS.last().unwrap())
        );
    }
}
