use std::path::{Path, PathBuf};

use crate::shared::constants::{INPUT_EXTENSIONS, OUTPUT_EXTENSION};

/// An input image and the output path it is written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

fn is_input(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| INPUT_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(ext)))
}

/// Inputs in `input_dir` that have no output in `output_dir` yet, sorted by
/// file name and capped at `max_files`.
pub fn pending_jobs(input_dir: &Path, output_dir: &Path, max_files: usize) -> std::io::Result<Vec<ImageJob>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if is_input(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();

    let jobs: Vec<ImageJob> = inputs
        .into_iter()
        .filter_map(|input| {
            let mut name = input.file_stem()?.to_os_string();
            name.push(".");
            name.push(OUTPUT_EXTENSION);
            let output = output_dir.join(name);
            if output.exists() {
                log::debug!("Skipping {}, output exists", input.display());
                return None;
            }
            Some(ImageJob { input, output })
        })
        .take(max_files)
        .collect();
    Ok(jobs)
}
