use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::grammar::Language;

/// Discover source files from the given paths, respecting .gitignore and the
/// configured exclude globs.
///
/// Directories are walked for files with the language's extensions. Explicit
/// files are taken as given. A path that does not exist but contains glob
/// metacharacters is expanded, matching files of any extension.
pub fn discover_files(
    paths: &[PathBuf],
    language: Language,
    excludes: &[String],
) -> Result<Vec<PathBuf>> {
    let excludes = build_globset(excludes)?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_directory(path, language, &excludes)?);
        } else if is_glob(path) {
            files.extend(expand_glob(path, &excludes)?);
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build exclude patterns")
}

fn is_excluded(excludes: &GlobSet, root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    excludes.is_match(relative) || excludes.is_match(path)
}

fn walk_directory(dir: &Path, language: Language, excludes: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);
    builder.hidden(true).git_ignore(true).git_global(true);

    let extensions = language.extensions();
    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.context("error walking directory")?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
            && !is_excluded(excludes, dir, path)
        {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_glob(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| s.contains(['*', '?', '[', '{']))
}

fn expand_glob(pattern: &Path, excludes: &GlobSet) -> Result<Vec<PathBuf>> {
    let text = pattern
        .to_str()
        .with_context(|| format!("glob is not valid UTF-8: {}", pattern.display()))?;
    let matcher = Glob::new(text)
        .with_context(|| format!("invalid glob: {text}"))?
        .compile_matcher();

    // Walk from the longest leading part without metacharacters.
    let mut root = PathBuf::new();
    for component in pattern.components() {
        let wild = match component {
            Component::Normal(part) => part.to_str().is_some_and(|s| s.contains(['*', '?', '[', '{'])),
            _ => false,
        };
        if wild {
            break;
        }
        root.push(component);
    }
    if root.as_os_str().is_empty() {
        root.push(".");
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(&root).build() {
        let entry = entry.context("error walking directory")?;
        let path = entry.path();
        let candidate = path.strip_prefix("./").unwrap_or(path);
        if path.is_file() && matcher.is_match(candidate) && !is_excluded(excludes, &root, path) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn discovers_language_files_in_directory() {
        let dir = setup_dir();
        fs::write(dir.path().join("a.py"), "").unwrap();
        fs::write(dir.path().join("b.py"), "").unwrap();
        fs::write(dir.path().join("c.go"), "").unwrap();

        let files = discover_files(&[dir.path().to_path_buf()], Language::Python, &[]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "py"));

        let files = discover_files(&[dir.path().to_path_buf()], Language::Go, &[]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn javascript_module_extensions() {
        let dir = setup_dir();
        for name in ["a.js", "b.mjs", "c.cjs", "d.ts"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files =
            discover_files(&[dir.path().to_path_buf()], Language::JavaScript, &[]).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn direct_file_bypasses_extension_filter() {
        let dir = setup_dir();
        let script = dir.path().join("script");
        fs::write(&script, "import neo4j").unwrap();

        let files = discover_files(&[script.clone()], Language::Python, &[]).unwrap();
        assert_eq!(files, vec![script]);
    }

    #[test]
    fn nonexistent_path_errors() {
        let result = discover_files(&[PathBuf::from("/no/such/path")], Language::Python, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn results_are_sorted_and_deduped() {
        let dir = setup_dir();
        for name in ["z.py", "a.py", "m.py"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let root = dir.path().to_path_buf();
        let files = discover_files(&[root.clone(), root], Language::Python, &[]).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "m.py", "z.py"]);
    }

    #[test]
    fn exclude_globs_skip_walked_files() {
        let dir = setup_dir();
        let vendor = dir.path().join("vendor");
        fs::create_dir_all(&vendor).unwrap();
        fs::write(dir.path().join("app.py"), "").unwrap();
        fs::write(vendor.join("lib.py"), "").unwrap();

        let files = discover_files(
            &[dir.path().to_path_buf()],
            Language::Python,
            &["vendor/**".to_string()],
        )
        .unwrap();
        assert_eq!(files, vec![dir.path().join("app.py")]);
    }

    #[test]
    fn invalid_exclude_is_error() {
        let dir = setup_dir();
        let result = discover_files(
            &[dir.path().to_path_buf()],
            Language::Python,
            &["a[".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn glob_paths_expand() {
        let dir = setup_dir();
        let sub = dir.path().join("pkg");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("one.py"), "").unwrap();
        fs::write(sub.join("two.txt"), "").unwrap();
        fs::write(dir.path().join("top.py"), "").unwrap();

        let pattern = dir.path().join("pkg").join("*.py");
        let files = discover_files(&[pattern], Language::Python, &[]).unwrap();
        assert_eq!(files, vec![sub.join("one.py")]);
    }
}
