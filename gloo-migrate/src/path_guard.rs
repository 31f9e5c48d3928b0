use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse an output path that is one of the inputs or sits inside an input
/// directory; the next run would read the output back in as source.
pub fn ensure_output_outside_inputs(output: &Path, inputs: &[PathBuf]) -> Result<()> {
    let out_norm = normalize_for_compare(output)
        .with_context(|| format!("failed to normalize output path {}", output.display()))?;

    for input in inputs {
        let in_norm = normalize_for_compare(input)
            .with_context(|| format!("failed to normalize input path {}", input.display()))?;
        if out_norm == in_norm {
            bail!(
                "refusing to overwrite source file: output {} matches input {}",
                output.display(),
                input.display()
            );
        }
        if in_norm.is_dir() && out_norm.starts_with(&in_norm) {
            bail!(
                "refusing to write output {} inside input directory {}",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}

fn normalize_for_compare(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("canonicalize {}", path.display()));
    }

    // `..` is not resolved for paths that do not exist yet.
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent.exists() => {
            let name = path.file_name().unwrap_or_default();
            return Ok(parent
                .canonicalize()
                .with_context(|| format!("canonicalize {}", parent.display()))?
                .join(name));
        }
        _ if path.is_absolute() => PathBuf::new(),
        _ => std::env::current_dir().context("current_dir")?,
    };
    Ok(base.join(path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::ensure_output_outside_inputs;

    #[test]
    fn rejects_output_equal_to_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("vs.yaml");
        fs::write(&input, "kind: VirtualService\n").expect("write");
        let err = ensure_output_outside_inputs(&input, &[input.clone()]).expect_err("same path");
        assert!(err.to_string().contains("refusing to overwrite"));
    }

    #[test]
    fn rejects_new_file_inside_input_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("out.yaml");
        let err = ensure_output_outside_inputs(&output, &[dir.path().to_path_buf()]).expect_err("inside dir");
        assert!(err.to_string().contains("inside input directory"));
    }

    #[test]
    fn accepts_unrelated_output() {
        let inputs = tempfile::tempdir().expect("tempdir");
        let outputs = tempfile::tempdir().expect("tempdir");
        let output = outputs.path().join("out.yaml");
        assert!(ensure_output_outside_inputs(&output, &[inputs.path().to_path_buf()]).is_ok());
    }
}
