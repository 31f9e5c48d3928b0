//! Structured-resource front end: reads YAML/JSON documents into a
//! [`SourceCache`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::source::{Provenance, SourceCache, SourceResource};

/// Errors raised while reading source documents. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid {kind} document {name:?} in {path}: {source}")]
    Document {
        path: PathBuf,
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Load every document under the given files and directories.
///
/// Directories are walked recursively; files are read in sorted path order so
/// a later duplicate always wins the same way.
pub fn load_paths(paths: &[PathBuf]) -> Result<SourceCache, LoadError> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path, &mut files)?;
    }
    files.sort();
    files.dedup();

    let mut cache = SourceCache::new();
    for file in &files {
        let text = fs::read_to_string(file).map_err(|source| LoadError::Io {
            path: file.clone(),
            source,
        })?;
        for resource in parse_documents(&text, file)? {
            insert(&mut cache, resource);
        }
    }
    debug!(files = files.len(), resources = cache.len(), "loaded source documents");
    Ok(cache)
}

/// Parse a multi-document YAML (or JSON) stream.
///
/// `kind: List` wrappers are unwrapped; documents of kinds the migration does
/// not read are skipped.
pub fn parse_documents(text: &str, path: &Path) -> Result<Vec<SourceResource>, LoadError> {
    let mut out = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        collect_document(value, path, &mut out)?;
    }
    Ok(out)
}

fn collect_document(value: Value, path: &Path, out: &mut Vec<SourceResource>) -> Result<(), LoadError> {
    if value.is_null() {
        return Ok(());
    }
    let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();
    if kind == "List" {
        if let Some(Value::Array(items)) = value.get("items") {
            for item in items.clone() {
                collect_document(item, path, out)?;
            }
        }
        return Ok(());
    }
    if kind.is_empty() {
        warn!(path = %path.display(), "skipping document without kind");
        return Ok(());
    }

    let name = value
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    match SourceResource::from_document(&kind, value) {
        Ok(Some(mut resource)) => {
            resource.set_provenance(Provenance::File(path.to_path_buf()));
            out.push(resource);
        }
        Ok(None) => debug!(kind = %kind, name = %name, "skipping unrelated document"),
        Err(source) => {
            return Err(LoadError::Document {
                path: path.to_path_buf(),
                kind,
                name,
                source,
            })
        }
    }
    Ok(())
}

fn insert(cache: &mut SourceCache, resource: SourceResource) {
    let identity = resource.identity();
    if cache.insert(resource).is_some() {
        warn!(resource = %identity, "duplicate document, keeping the last one read");
    }
}

fn collect_files(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = fs::metadata(path).map_err(io)?;
    if meta.is_file() {
        out.push(path.to_path_buf());
        return Ok(());
    }
    for entry in fs::read_dir(path).map_err(io)? {
        let entry_path = entry.map_err(io)?.path();
        if entry_path.is_dir() {
            collect_files(&entry_path, out)?;
        } else if has_document_extension(&entry_path) {
            out.push(entry_path);
        }
    }
    Ok(())
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::{load_paths, parse_documents, LoadError};
    use crate::identity::SourceKind;

    const TWO_DOCS: &str = r#"
apiVersion: gloo.solo.io/v1
kind: Upstream
metadata:
  name: petstore
  namespace: gloo-system
spec:
  kube:
    serviceName: petstore
    serviceNamespace: default
    servicePort: 8080
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: unrelated
"#;

    #[test]
    fn multi_document_stream_skips_unrelated_kinds() {
        let docs = parse_documents(TWO_DOCS, Path::new("in.yaml")).expect("parses");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind(), SourceKind::Upstream);
    }

    #[test]
    fn list_wrapper_is_unwrapped() {
        let text = r#"{"kind": "List", "items": [
            {"kind": "Upstream", "metadata": {"name": "a", "namespace": "ns"}, "spec": {}},
            {"kind": "Upstream", "metadata": {"name": "b", "namespace": "ns"}, "spec": {}}
        ]}"#;
        let docs = parse_documents(text, Path::new("list.json")).expect("parses");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn wrongly_typed_spec_is_a_document_error() {
        let text = "kind: Gateway\nmetadata:\n  name: gw\nspec:\n  bindPort: not-a-port\n";
        let err = parse_documents(text, Path::new("gw.yaml")).expect_err("must fail");
        assert!(matches!(err, LoadError::Document { ref kind, .. } if kind == "Gateway"));
    }

    #[test]
    fn directories_are_walked_for_document_files() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        fs::write(dir.path().join("upstream.yaml"), TWO_DOCS).expect("write");
        fs::write(
            nested.join("vs.yml"),
            "kind: VirtualService\nmetadata:\n  name: vs\n  namespace: gloo-system\n",
        )
        .expect("write");
        fs::write(dir.path().join("notes.txt"), "kind: Upstream").expect("write");

        let cache = load_paths(&[dir.path().to_path_buf()]).expect("loads");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.count(SourceKind::VirtualService), 1);
    }

    #[test]
    fn missing_path_is_io_error() {
        let err = load_paths(&["/nonexistent/gloo".into()]).expect_err("must fail");
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
