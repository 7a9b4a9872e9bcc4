//! Pipeline collection
//!
//! An immutable set of compiled pipelines keyed by their pipeline URL.
//! Members are validated when the collection is built and shared as
//! `Arc<PipelineJson>` afterwards.

use crate::compiler::{CompilerOptions, PipelineCompiler};
use crate::error::{CompileError, Result};
use crate::validator::validate_pipeline;
use ptbk_core::PipelineJson;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MARKDOWN_EXTENSION: &str = ".ptbk.md";
const JSON_EXTENSION: &str = ".ptbk.json";

/// Compiled pipelines addressable by URL
#[derive(Debug, Clone, Default)]
pub struct PipelineCollection {
    pipelines: BTreeMap<String, Arc<PipelineJson>>,
}

impl PipelineCollection {
    /// Build a collection from already compiled pipelines
    pub fn from_json(pipelines: Vec<PipelineJson>) -> Result<Self> {
        let mut collection = Self::default();
        for pipeline in pipelines {
            collection.insert(pipeline)?;
        }
        Ok(collection)
    }

    /// Compile markdown sources into a collection
    pub fn from_sources(sources: &[&str], options: &CompilerOptions) -> Result<Self> {
        let compiler = PipelineCompiler::with_options(options.clone());
        let pipelines = sources
            .iter()
            .map(|source| compiler.compile(source))
            .collect::<Result<Vec<_>>>()?;
        Self::from_json(pipelines)
    }

    /// Load every `*.ptbk.md` and `*.ptbk.json` file below a directory
    pub fn from_directory(path: impl AsRef<Path>, options: &CompilerOptions) -> Result<Self> {
        let mut files = Vec::new();
        collect_pipeline_files(path.as_ref(), &mut files)?;
        files.sort();

        let compiler = PipelineCompiler::with_options(options.clone());
        let mut collection = Self::default();

        for file in files {
            let content = std::fs::read_to_string(&file).map_err(|e| io_error(&file, e))?;
            let name = file_name(&file);

            let pipeline = if name.ends_with(JSON_EXTENSION) {
                PipelineJson::from_json(&content)?
            } else {
                compiler.compile(&content)?
            };

            log::debug!("loaded pipeline from {}", file.display());
            collection.insert(pipeline).map_err(|e| match e {
                CompileError::Collection(message) => {
                    CompileError::Collection(format!("{}: {message}", file.display()))
                }
                other => other,
            })?;
        }

        Ok(collection)
    }

    fn insert(&mut self, pipeline: PipelineJson) -> Result<()> {
        let Some(url) = pipeline.pipeline_url.clone() else {
            return Err(CompileError::Collection(format!(
                "pipeline {:?} has no PROMPTBOOK URL",
                pipeline.title
            )));
        };

        validate_pipeline(&pipeline)?;

        if self.pipelines.contains_key(&url) {
            return Err(CompileError::Collection(format!(
                "pipeline URL {url} is used more than once"
            )));
        }

        self.pipelines.insert(url, Arc::new(pipeline));
        Ok(())
    }

    /// Look up a pipeline by its URL
    pub fn get_by_url(&self, url: &str) -> Result<Arc<PipelineJson>> {
        self.pipelines.get(url).cloned().ok_or_else(|| {
            CompileError::Collection(format!(
                "pipeline {url} not found, available: {}",
                self.pipelines.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// URLs of all pipelines, sorted
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &Arc<PipelineJson>> {
        self.pipelines.values()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

fn collect_pipeline_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_pipeline_files(&path, files)?;
        } else {
            let name = file_name(&path);
            if name.ends_with(MARKDOWN_EXTENSION) || name.ends_with(JSON_EXTENSION) {
                files.push(path);
            }
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn io_error(path: &Path, error: std::io::Error) -> CompileError {
    CompileError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_URL: &str = r#"# Greeting

- PROMPTBOOK URL https://promptbook.example.com/samples/greeting.ptbk.md
- OUTPUT PARAMETER {greeting}

## Prompt

```text
Hello
```

-> {greeting}
"#;

    #[test]
    fn test_lookup_by_url() {
        let collection = PipelineCollection::from_sources(&[WITH_URL], &CompilerOptions::default()).unwrap();
        assert_eq!(collection.len(), 1);

        let pipeline = collection
            .get_by_url("https://promptbook.example.com/samples/greeting.ptbk.md")
            .unwrap();
        assert_eq!(pipeline.title, "Greeting");

        let err = collection.get_by_url("https://promptbook.example.com/missing").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_duplicate_url_is_rejected() {
        let err = PipelineCollection::from_sources(&[WITH_URL, WITH_URL], &CompilerOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let err = PipelineCollection::from_json(vec![PipelineJson::new("Anonymous")]).unwrap_err();
        assert!(matches!(err, CompileError::Collection(_)));
    }
}
