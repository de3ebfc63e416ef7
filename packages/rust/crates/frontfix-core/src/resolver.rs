//! File set resolution.
//!
//! Produces a deterministic, lexicographically sorted list of candidate files
//! under a root. Symbolic links are never followed, so traversal cannot leave
//! the root or loop.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::EngineError;
use crate::report::FileFailure;

/// A file selected for rewriting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileCandidate {
    /// Path relative to the root (sort key).
    pub relative: PathBuf,
    /// Full path on disk.
    pub path: PathBuf,
    /// The configured extension that matched.
    pub extension: String,
}

/// Options for file resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory to scan.
    pub root: PathBuf,
    /// Accepted file-name suffixes (`twig`, `.css`, `.de.yaml`).
    pub extensions: Vec<String>,
    /// Glob patterns matched against the path relative to the root.
    pub exclude: Vec<String>,
    /// Directory names skipped anywhere in the tree.
    pub skip_dirs: Vec<String>,
    /// Backup suffix; files ending with it are never candidates.
    pub backup_suffix: String,
    /// Restrict the run to this one file.
    pub target: Option<PathBuf>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extensions: vec![".twig".to_string()],
            exclude: Vec::new(),
            skip_dirs: vec![".git".to_string(), "node_modules".to_string()],
            backup_suffix: ".bak".to_string(),
            target: None,
        }
    }
}

/// Normalize an extension to dotted form (`twig` -> `.twig`).
fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

fn build_exclusions(patterns: &[String]) -> Result<GlobSet, EngineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| EngineError::Config(format!("invalid exclude glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| EngineError::Config(format!("invalid exclude globs: {e}")))
}

struct Filter {
    extensions: Vec<String>,
    exclude: GlobSet,
    backup_suffix: String,
}

impl Filter {
    /// The matching extension, if `relative` is a candidate.
    fn accept(&self, relative: &Path) -> Option<String> {
        let name = relative.file_name()?.to_string_lossy();
        if !self.backup_suffix.is_empty() && name.ends_with(&self.backup_suffix) {
            return None;
        }
        if self.exclude.is_match(relative) {
            return None;
        }
        self.extensions
            .iter()
            .filter(|ext| name.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .cloned()
    }
}

/// Candidate files plus the parts of the tree that could not be walked.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFiles {
    /// Sorted candidates.
    pub files: Vec<FileCandidate>,
    /// Directories or entries the walk could not read, in walk order.
    pub skipped: Vec<FileFailure>,
}

impl ResolvedFiles {
    /// Number of candidate files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

fn walk_failure(root: &Path, error: &walkdir::Error) -> FileFailure {
    let path = relative_to(root, error.path().unwrap_or(root));
    let reason = error
        .io_error()
        .map_or_else(|| error.to_string(), ToString::to_string);
    warn!(path = %path.display(), error = %reason, "directory walk failed");
    FileFailure {
        path,
        reason: format!("walk failed: {reason}"),
    }
}

/// Enumerate candidate files.
///
/// Unreadable directories do not abort the walk; they are returned in
/// [`ResolvedFiles::skipped`] so the run can report them.
///
/// # Errors
/// `RootNotFound` if the root is not a directory, `TargetNotFound` if a
/// target is given but missing or outside the root, `Config` for bad
/// exclusion globs.
pub fn resolve_files(options: &ResolveOptions) -> Result<ResolvedFiles, EngineError> {
    if !options.root.is_dir() {
        return Err(EngineError::RootNotFound(options.root.clone()));
    }

    let filter = Filter {
        extensions: options
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect(),
        exclude: build_exclusions(&options.exclude)?,
        backup_suffix: options.backup_suffix.clone(),
    };

    if let Some(target) = &options.target {
        let files = resolve_target(&options.root, target, &filter)?;
        return Ok(ResolvedFiles {
            files: files.into_iter().collect(),
            skipped: Vec::new(),
        });
    }

    let mut resolved = ResolvedFiles::default();
    let walker = WalkDir::new(&options.root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !options
                    .skip_dirs
                    .iter()
                    .any(|d| entry.file_name().to_string_lossy() == d.as_str())
        });

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                resolved.skipped.push(walk_failure(&options.root, &e));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&options.root).map(Path::to_path_buf) else {
            continue;
        };
        if let Some(extension) = filter.accept(&relative) {
            resolved.files.push(FileCandidate {
                relative,
                path: entry.into_path(),
                extension,
            });
        }
    }

    resolved.files.sort();
    debug!(
        root = %options.root.display(),
        count = resolved.files.len(),
        skipped = resolved.skipped.len(),
        "resolved files"
    );
    Ok(resolved)
}

/// Resolve a single target. A target the filters reject yields no files.
///
/// The target must be a regular file inside the root once `..` and
/// symlinked parents are resolved.
fn resolve_target(
    root: &Path,
    target: &Path,
    filter: &Filter,
) -> Result<Option<FileCandidate>, EngineError> {
    let path = if target.is_absolute() || target.starts_with(root) {
        target.to_path_buf()
    } else {
        root.join(target)
    };
    let is_file = path
        .symlink_metadata()
        .map(|m| m.file_type().is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(EngineError::TargetNotFound(path));
    }

    let (Ok(canonical_root), Ok(canonical_path)) = (root.canonicalize(), path.canonicalize())
    else {
        return Err(EngineError::TargetNotFound(path));
    };
    let Ok(relative) = canonical_path
        .strip_prefix(&canonical_root)
        .map(Path::to_path_buf)
    else {
        debug!(target = %path.display(), "target outside root");
        return Err(EngineError::TargetNotFound(path));
    };

    Ok(filter.accept(&relative).map(|extension| FileCandidate {
        relative,
        path,
        extension,
    }))
}
