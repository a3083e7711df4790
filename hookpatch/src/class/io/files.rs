use std::{
    fs,
    path::{Path, PathBuf},
};

use indicatif::ProgressBar;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::{
    class::modification::patcher::apply_transformations,
    hook::{diagnostics::Diagnostics, policy::RewritePolicy},
    types::RunSummary,
};

const CLASS_EXT: &str = "class";

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Print every file as it is processed and rewritten, plus totals
    pub verbose: bool,
    pub show_progress: bool,
}

/// Expand command-line paths into the files to process.
///
/// Files are taken as named; directories are walked recursively for `.class` files.
pub fn collect_class_files<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", path.display(), err);
                    continue;
                }
            };
            let is_class = entry.path().extension().is_some_and(|ext| ext == CLASS_EXT);
            if entry.file_type().is_file() && is_class {
                files.push(entry.into_path());
            }
        }
    }
    files
}

/// Patch every file in `files`, writing back the ones that changed.
///
/// Missing, unreadable and unparsable files are reported and skipped.
pub fn process_files<P, D>(
    files: &[PathBuf],
    options: ProcessOptions,
    policy: &P,
    diagnostics: &mut D,
) -> RunSummary
where
    P: RewritePolicy + ?Sized,
    D: Diagnostics + ?Sized,
{
    let mut summary = RunSummary::default();

    let bar = if options.show_progress {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    for file in files {
        bar.inc(1);
        let shown = absolute(file);

        if !file.is_file() {
            bar.suspend(|| println!("Cannot find file '{}'", shown.display()));
            continue;
        }
        summary.visited += 1;

        if options.verbose {
            bar.suspend(|| println!("Processing {}", shown.display()));
        }

        let original = match fs::read(file) {
            Ok(data) => data,
            Err(err) => {
                error!("Cannot read {}: {}", shown.display(), err);
                summary.failed += 1;
                continue;
            }
        };

        let file_name = file.to_string_lossy();
        let transformed = match apply_transformations(&original, &file_name, policy, diagnostics) {
            Ok(Some(transformed)) => transformed,
            Ok(None) => continue,
            Err(err) => {
                error!("Skipping {}: {}", shown.display(), err);
                summary.failed += 1;
                continue;
            }
        };

        // Reassembly is not byte-identical, only write real changes
        if transformed == original {
            debug!("{} reassembled to identical bytes", shown.display());
            continue;
        }

        if options.verbose {
            bar.suspend(|| println!("Rewriting {}", shown.display()));
        }
        if let Err(err) = fs::write(file, &transformed) {
            error!("Cannot write {}: {}", shown.display(), err);
            summary.failed += 1;
            continue;
        }
        summary.touched += 1;
    }

    bar.finish_and_clear();

    if options.verbose {
        println!(
            "Total files visited: {} total files changed: {}",
            summary.visited, summary.touched
        );
    }

    summary
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{diagnostics::NoDiagnostics, policy::DiagnoseOnly};

    #[test]
    fn directories_are_walked_for_class_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("Top.class"), b"").unwrap();
        fs::write(nested.join("Deep.class"), b"").unwrap();
        fs::write(nested.join("notes.txt"), b"").unwrap();

        let files = collect_class_files([dir.path()]);
        let names: Vec<_> = files
            .iter()
            .map(|file| file.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["Top.class", "Deep.class"]);
    }

    #[test]
    fn named_files_are_kept_as_is() {
        let files = collect_class_files(["does/not/exist.txt"]);
        assert_eq!(files, [PathBuf::from("does/not/exist.txt")]);
    }

    #[test]
    fn missing_files_are_not_visited() {
        let dir = tempfile::tempdir().unwrap();
        let files = [dir.path().join("Missing.class")];

        let summary =
            process_files(&files, ProcessOptions::default(), &DiagnoseOnly, &mut NoDiagnostics);

        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn unparsable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Broken.class");
        fs::write(&file, b"not a class").unwrap();

        let summary = process_files(
            &[file.clone()],
            ProcessOptions::default(),
            &DiagnoseOnly,
            &mut NoDiagnostics,
        );

        assert_eq!(summary.visited, 1);
        assert_eq!(summary.touched, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(fs::read(&file).unwrap(), b"not a class");
    }
}
