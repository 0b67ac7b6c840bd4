use anyhow::{Context, Result};
use fs_extra::dir::CopyOptions;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{
    config::{Invocation, INITIAL_VERSION},
    manifest, trace, warn,
};

/// Entries refreshed by `--update`, relative to the project root.
pub const UPDATE_ALLOW_LIST: [&str; 7] = [
    "config",
    ".editorconfig",
    ".eslintrc.js",
    "babel.config.js",
    "jsconfig.json",
    "package.json",
    "postcss.config.js",
];

/// Removes whatever is at `path`: symlink, file or directory tree.
///
/// # Errors
///
/// Returns an [`Err`] if `path` does not exist or cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let file_type = path.symlink_metadata()?.file_type();

    if file_type.is_symlink() {
        // https://stackoverflow.com/questions/76351822/creating-and-removing-symlinks

        #[cfg(target_os = "windows")]
        std::fs::remove_dir(path).or_else(|_| std::fs::remove_file(path))?;

        #[cfg(not(target_os = "windows"))]
        std::fs::remove_file(path)?;
    } else if file_type.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }

    Ok(())
}

/// Copies the contents of `from` into `to`, replacing files that already
/// exist and leaving everything else in `to` alone.
///
/// # Errors
///
/// Returns an [`Err`] on any IO error.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;

    if crate::log::verbose() {
        for entry in WalkDir::new(from).min_depth(1).into_iter().flatten() {
            if entry.file_type().is_file() {
                if let Ok(relative) = entry.path().strip_prefix(from) {
                    trace!("Copying {}", relative.display());
                }
            }
        }
    }

    fs_extra::dir::copy(from, to, &options).with_context(|| {
        format!(
            "Failed to copy {} into {}",
            from.display(),
            to.display()
        )
    })?;

    Ok(())
}

/// Fills a freshly created project from the fetched template and stamps the
/// manifest with the project's name and [`INITIAL_VERSION`].
///
/// # Errors
///
/// Returns an [`Err`] if copying fails or the manifest cannot be rewritten.
pub fn create(inv: &Invocation, fetched: &Path) -> Result<()> {
    copy_tree(fetched, inv.root())?;
    manifest::rewrite(&inv.manifest_path(), inv.app_name(), INITIAL_VERSION)
}

/// Copies every entry of [`UPDATE_ALLOW_LIST`] from the fetched template over
/// the project. Returns the paths that were replaced.
///
/// # Errors
///
/// Returns an [`Err`] on any IO error.
pub fn update(inv: &Invocation, fetched: &Path) -> Result<Vec<PathBuf>> {
    let mut replaced = Vec::with_capacity(UPDATE_ALLOW_LIST.len());

    for entry in UPDATE_ALLOW_LIST {
        let source = fetched.join(entry);
        let target = inv.root().join(entry);

        if source.symlink_metadata().is_err() {
            warn!("Template has no {entry}, leaving it as is");
            continue;
        }

        replace_entry(&source, &target)
            .with_context(|| format!("Failed to update {}", target.display()))?;
        trace!("Updated {}", target.display());
        replaced.push(target);
    }

    Ok(replaced)
}

fn replace_entry(source: &Path, target: &Path) -> Result<()> {
    let source_is_dir = source.is_dir();

    if let Ok(meta) = target.symlink_metadata() {
        if meta.is_dir() != source_is_dir || meta.file_type().is_symlink() {
            remove_path(target)?;
        }
    }

    if source_is_dir {
        copy_tree(source, target)
    } else {
        std::fs::copy(source, target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use std::fs;

    fn invocation(root: &Path) -> Invocation {
        Invocation::builder()
            .root(root)
            .original_dir(root.parent().unwrap())
            .template("tpl")
            .mode(Mode::Update)
            .build()
            .unwrap()
    }

    #[test]
    fn copy_tree_merges_into_existing_dir() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();

        fs::create_dir_all(from.path().join("src/views")).unwrap();
        fs::write(from.path().join("src/views/Home.vue"), "new").unwrap();
        fs::write(from.path().join(".gitignore"), "node_modules").unwrap();
        fs::create_dir_all(to.path().join("src/views")).unwrap();
        fs::write(to.path().join("src/views/Home.vue"), "old").unwrap();
        fs::write(to.path().join("keep.txt"), "keep").unwrap();

        copy_tree(from.path(), to.path()).unwrap();

        assert_eq!(
            fs::read_to_string(to.path().join("src/views/Home.vue")).unwrap(),
            "new"
        );
        assert!(to.path().join(".gitignore").is_file());
        assert_eq!(fs::read_to_string(to.path().join("keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn update_touches_only_the_allow_list() {
        let fetched = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();

        fs::create_dir_all(fetched.path().join("config")).unwrap();
        fs::write(fetched.path().join("config/index.js"), "tpl").unwrap();
        fs::write(fetched.path().join(".editorconfig"), "tpl").unwrap();
        fs::write(fetched.path().join("package.json"), "{\"name\":\"tpl\"}").unwrap();
        fs::write(fetched.path().join("README.md"), "tpl").unwrap();

        fs::create_dir_all(project.path().join("config")).unwrap();
        fs::write(project.path().join("config/index.js"), "mine").unwrap();
        fs::write(project.path().join("config/local.js"), "mine").unwrap();
        fs::write(project.path().join(".editorconfig"), "mine").unwrap();
        fs::write(project.path().join("README.md"), "mine").unwrap();
        fs::write(project.path().join("babel.config.js"), "mine").unwrap();

        let replaced = update(&invocation(project.path()), fetched.path()).unwrap();

        assert_eq!(
            replaced,
            vec![
                project.path().join("config"),
                project.path().join(".editorconfig"),
                project.path().join("package.json"),
            ]
        );
        let read = |p: &str| fs::read_to_string(project.path().join(p)).unwrap();
        assert_eq!(read("config/index.js"), "tpl");
        assert_eq!(read("config/local.js"), "mine");
        assert_eq!(read(".editorconfig"), "tpl");
        assert_eq!(read("package.json"), "{\"name\":\"tpl\"}");
        assert_eq!(read("README.md"), "mine");
        assert_eq!(read("babel.config.js"), "mine");
    }

    #[test]
    fn update_replaces_file_with_directory() {
        let fetched = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();

        fs::create_dir_all(fetched.path().join("config")).unwrap();
        fs::write(fetched.path().join("config/index.js"), "tpl").unwrap();
        fs::write(project.path().join("config"), "a file").unwrap();

        update(&invocation(project.path()), fetched.path()).unwrap();

        assert!(project.path().join("config/index.js").is_file());
    }

    #[test]
    fn remove_path_handles_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        let tree = dir.path().join("tree/inner");

        fs::write(&file, "x").unwrap();
        fs::create_dir_all(&tree).unwrap();

        remove_path(&file).unwrap();
        remove_path(&dir.path().join("tree")).unwrap();

        assert!(!file.exists());
        assert!(!dir.path().join("tree").exists());
        assert!(remove_path(&file).is_err());
    }
}
