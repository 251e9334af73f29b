// src/transform/pipeline.rs

//! Serial transform-and-aggregate batch job over input documents.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::model::TransformSection;
use crate::errors::{BuildrigError, Result};
use crate::fs::FileSystem;
use crate::tasks::TaskAction;
use crate::transform::converter::{ConvertedDocument, Converter};

/// Static description of one pipeline invocation: where documents come from
/// and where the aggregate artifact goes.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub src_dir: PathBuf,
    pub extension: String,
    pub out: PathBuf,
}

impl TransformJob {
    pub fn from_section(section: &TransformSection) -> Self {
        Self {
            src_dir: PathBuf::from(&section.src_dir),
            extension: section.extension.clone(),
            out: PathBuf::from(&section.out),
        }
    }
}

/// One input document: identifier (base file name) plus its path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DocumentRef {
    id: String,
    path: PathBuf,
}

/// Reads every matching document, converts them strictly one at a time, and
/// writes the keyed aggregate only when all of them succeeded.
///
/// The serial one-at-a-time discipline bounds load on the shared external
/// converter and keeps the artifact reproducible; a single failure aborts the
/// whole job with the artifact untouched.
pub struct TransformPipeline {
    fs: Arc<dyn FileSystem>,
    converter: Arc<dyn Converter>,
    job: TransformJob,
}

impl fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

impl TransformPipeline {
    pub fn new(fs: Arc<dyn FileSystem>, converter: Arc<dyn Converter>, job: TransformJob) -> Self {
        Self { fs, converter, job }
    }

    pub fn job(&self) -> &TransformJob {
        &self.job
    }

    /// Run the whole job: discover, convert in order, aggregate, persist.
    pub async fn execute(&self) -> Result<()> {
        let docs = self.discover()?;
        info!(
            documents = docs.len(),
            src_dir = ?self.job.src_dir,
            "transforming documents"
        );

        let mut results: BTreeMap<String, ConvertedDocument> = BTreeMap::new();

        for doc in &docs {
            debug!(document = %doc.id, "transforming document");

            let content = self.fs.read_to_string(&doc.path)?;

            let converted = self
                .converter
                .convert(&content)
                .await
                .map_err(|source| BuildrigError::TransformAbort {
                    document: doc.id.clone(),
                    source,
                })?;

            results.insert(doc.id.clone(), converted);
        }

        // Every document resolved; this is the only write the job performs.
        let mut artifact = serde_json::to_string_pretty(&results)?;
        artifact.push('\n');
        self.fs.write_atomic(&self.job.out, artifact.as_bytes())?;

        info!(
            artifact = ?self.job.out,
            documents = results.len(),
            "aggregate artifact written"
        );
        Ok(())
    }

    /// List matching documents one level deep, sorted by identifier so
    /// repeated runs over identical inputs process and emit identically.
    fn discover(&self) -> Result<Vec<DocumentRef>> {
        let mut docs = Vec::new();

        for path in self.fs.list_dir(&self.job.src_dir)? {
            if !self.fs.is_file(&path) {
                continue;
            }
            let matches_ext = path
                .extension()
                .map(|ext| ext.to_string_lossy() == self.job.extension.as_str())
                .unwrap_or(false);
            if !matches_ext {
                continue;
            }
            if let Some(name) = path.file_name() {
                docs.push(DocumentRef {
                    id: name.to_string_lossy().into_owned(),
                    path: path.clone(),
                });
            }
        }

        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}

impl TaskAction for TransformPipeline {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.execute())
    }
}
