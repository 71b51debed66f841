use std::{
    cell::OnceCell,
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, anyhow};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    analysis::{AnalysisError, CancellationToken, analyze_document},
    cli::args::CommonArgs,
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::file_scanner::scan_files,
    issues::{FormattableStringIssue, ParseErrorIssue},
    semantic::DeclarationIndex,
    syntax::Document,
};

/// Parsed documents keyed by path, plus the files that failed to parse.
struct ParsedFiles {
    documents: BTreeMap<String, Document>,
    errors: Vec<ParseErrorIssue>,
}

/// Analysis context for one source root.
///
/// # Pipeline
///
/// 1. **Collection**: scan `*.cs` files, then read and parse them in parallel
/// 2. **Indexing**: build the [`DeclarationIndex`] over every parsed file
/// 3. **Analysis**: run the detector over every document in parallel
///
/// Each stage is computed on first access, so `init` or `--help` never parse
/// anything.
pub struct CheckContext {
    pub config: Config,

    /// Project root directory.
    pub root_dir: PathBuf,

    /// All source files to analyze.
    pub files: HashSet<String>,

    pub verbose: bool,

    /// Initialized on first call to `documents()`.
    parsed: OnceCell<ParsedFiles>,

    /// Initialized on first call to `index()`.
    index: OnceCell<DeclarationIndex>,
}

impl CheckContext {
    /// Load the config found from `--source-root` (or the current directory)
    /// and collect the files to analyze.
    pub fn new(common_args: &CommonArgs) -> Result<Self> {
        let root_dir = common_args
            .source_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let path = root_dir
            .to_str()
            .with_context(|| anyhow!("Invalid path: {:?}", root_dir))?;

        let config_result = load_config(Path::new(path))?;
        if !config_result.from_file {
            info!("no {CONFIG_FILE_NAME} found, using default configuration");
        }
        let config = config_result.config;

        let scan_result = scan_files(
            path,
            &config.includes,
            &config.ignores,
            config.ignore_test_files,
        );
        if scan_result.skipped_count > 0 {
            eprintln!(
                "Warning: {} path(s) skipped due to access errors{}",
                scan_result.skipped_count,
                if common_args.verbose {
                    ""
                } else {
                    " (use -v for details)"
                }
            );
        }
        debug!(files = scan_result.files.len(), root = path, "source files collected");

        Ok(Self {
            config,
            root_dir,
            files: scan_result.files,
            verbose: common_args.verbose,
            parsed: OnceCell::new(),
            index: OnceCell::new(),
        })
    }

    /// Every file that parsed, in path order (lazy initialization).
    ///
    /// Reading and parsing run in parallel. Failures are kept apart and can be
    /// retrieved via `parse_errors()`.
    pub fn documents(&self) -> &BTreeMap<String, Document> {
        &self.parsed().documents
    }

    /// Files that could not be read or parsed.
    pub fn parse_errors(&self) -> &[ParseErrorIssue] {
        &self.parsed().errors
    }

    fn parsed(&self) -> &ParsedFiles {
        self.parsed.get_or_init(|| {
            let results: Vec<(String, Result<Document>)> = self
                .files
                .par_iter()
                .map(|file_path| {
                    let document = std::fs::read_to_string(file_path)
                        .map_err(|e| anyhow!("Failed to read file: {}", e))
                        .and_then(|text| {
                            Document::parse(file_path.as_str(), text)
                                .map_err(|e| anyhow!("Failed to parse: {}", e))
                        });
                    (file_path.clone(), document)
                })
                .collect();

            let mut documents = BTreeMap::new();
            let mut errors = Vec::new();
            for (file_path, result) in results {
                match result {
                    Ok(document) => {
                        documents.insert(file_path, document);
                    }
                    Err(e) => {
                        warn!(file = %file_path, "{e}");
                        errors.push(ParseErrorIssue {
                            file_path,
                            error: e.to_string(),
                        });
                    }
                }
            }
            errors.sort_by(|a, b| a.file_path.cmp(&b.file_path));

            ParsedFiles { documents, errors }
        })
    }

    /// Declarations of every parsed file (lazy initialization).
    pub fn index(&self) -> &DeclarationIndex {
        self.index.get_or_init(|| {
            let index = DeclarationIndex::build(self.documents().values().map(Document::unit));
            debug!(methods = index.len(), "declaration index built");
            index
        })
    }

    /// Findings of every document, grouped by file in path order.
    pub fn findings(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<FormattableStringIssue>, AnalysisError> {
        let index = self.index();
        let per_file: Vec<Vec<FormattableStringIssue>> = self
            .documents()
            .par_iter()
            .map(|(_, document)| analyze_document(document, index, cancel))
            .collect::<Result<_, _>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    /// Source files that parsed.
    pub fn source_files_checked(&self) -> usize {
        self.documents().len()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn common_args(root: &Path) -> CommonArgs {
        CommonArgs {
            source_root: Some(root.to_path_buf()),
            verbose: false,
        }
    }

    #[test]
    fn test_findings_across_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join("Logger.cs"),
            "class Logger { public static void Info(string format, params object[] args) { } }",
        )
        .unwrap();
        fs::write(
            dir.path().join("Service.cs"),
            "class Service { void Run() { Logger.Info(\"{0}\", $\"user {1}\"); } }",
        )
        .unwrap();

        let ctx = CheckContext::new(&common_args(dir.path())).unwrap();
        assert_eq!(ctx.files.len(), 2);
        assert_eq!(ctx.source_files_checked(), 2);

        let findings = ctx.findings(&CancellationToken::new()).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].context.file_path().ends_with("Service.cs"));
        assert_eq!(findings[0].callee, "Logger.Info");
    }

    #[test]
    fn test_parse_errors_are_collected() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("Broken.cs"), "class Broken { void M() { Foo($\"x); } }")
            .unwrap();
        fs::write(dir.path().join("Fine.cs"), "class Fine { }").unwrap();

        let ctx = CheckContext::new(&common_args(dir.path())).unwrap();
        assert_eq!(ctx.documents().len(), 1);
        assert_eq!(ctx.parse_errors().len(), 1);
        assert!(ctx.parse_errors()[0].file_path.ends_with("Broken.cs"));
        assert_eq!(ctx.findings(&CancellationToken::new()).unwrap(), vec![]);
    }

    #[test]
    fn test_config_ignores_are_applied() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let obj = dir.path().join("obj");
        fs::create_dir(&obj).unwrap();
        fs::write(obj.join("Generated.cs"), "class Generated { }").unwrap();
        fs::write(dir.path().join("App.cs"), "class App { }").unwrap();

        let ctx = CheckContext::new(&common_args(dir.path())).unwrap();
        assert_eq!(ctx.files.len(), 1);
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "ignores": ["[broken"] }"#,
        )
        .unwrap();

        assert!(CheckContext::new(&common_args(dir.path())).is_err());
    }
}
