//! Contract compiler proxy.
//!
//! Each request gets its own temporary directory holding a single
//! `<ContractName>.sol`; the compiler runs inside it with a hard timeout and
//! the directory is removed when the request finishes, whatever the outcome.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::data::duration::format_duration;
use crate::data::validate::{validate_contract_name, ValidationError};

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Compiler executable, resolved through `PATH` if not absolute.
    pub binary: PathBuf,
    /// Arguments placed before the source file name.
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Maximum source length in characters.
    pub max_source_len: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("solc"),
            args: vec!["--combined-json".to_string(), "abi,bin".to_string()],
            timeout: Duration::from_secs(30),
            max_source_len: 50_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("source is empty")]
    EmptySource,

    #[error("source is {len} characters; the limit is {max}")]
    SourceTooLarge { len: usize, max: usize },

    #[error(transparent)]
    InvalidName(#[from] ValidationError),

    #[error("failed to prepare compiler workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("failed to start compiler: {0}")]
    Spawn(String),

    #[error("compiler timed out after {}", format_duration(*.0))]
    Timeout(Duration),

    #[error("compilation failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("malformed compiler output: {0}")]
    MalformedOutput(String),

    #[error("contract {0} not found in compiler output")]
    ContractNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledContract {
    pub contract_name: String,
    /// Creation bytecode, `0x`-prefixed.
    pub bytecode: String,
    pub abi: Value,
}

#[derive(Debug, Clone)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Compile `source` and return the artifact for `contract_name`.
    pub async fn compile(
        &self,
        source: &str,
        contract_name: &str,
    ) -> Result<CompiledContract, CompileError> {
        if source.trim().is_empty() {
            return Err(CompileError::EmptySource);
        }
        let len = source.chars().count();
        if len > self.config.max_source_len {
            return Err(CompileError::SourceTooLarge {
                len,
                max: self.config.max_source_len,
            });
        }
        validate_contract_name(contract_name)?;

        let workspace = tempfile::Builder::new()
            .prefix("chainwatch-compile-")
            .tempdir()?;
        let result = self.run_in(workspace.path(), source, contract_name).await;

        let dir = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!(dir = %dir.display(), error = %e, "failed to remove compiler workspace");
        }
        result
    }

    async fn run_in(
        &self,
        dir: &Path,
        source: &str,
        contract_name: &str,
    ) -> Result<CompiledContract, CompileError> {
        let file_name = format!("{}.sol", contract_name);
        tokio::fs::write(dir.join(&file_name), source).await?;

        let mut command = Command::new(&self.config.binary);
        command
            .args(&self.config.args)
            .arg(&file_name)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(binary = %self.config.binary.display(), contract = contract_name, "running compiler");
        let output = match tokio::time::timeout(self.config.timeout, command.output()).await {
            Err(_) => return Err(CompileError::Timeout(self.config.timeout)),
            Ok(Err(e)) => return Err(CompileError::Spawn(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(CompileError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_combined_json(&output.stdout, contract_name)
    }
}

/// Extract one contract from `solc --combined-json abi,bin` output.
///
/// Artifacts are keyed `"<file>:<Contract>"`; older compilers emit the ABI
/// as a JSON string rather than an array.
pub fn parse_combined_json(
    stdout: &[u8],
    contract_name: &str,
) -> Result<CompiledContract, CompileError> {
    let output: Value = serde_json::from_slice(stdout)
        .map_err(|e| CompileError::MalformedOutput(e.to_string()))?;
    let contracts = output
        .get("contracts")
        .and_then(Value::as_object)
        .ok_or_else(|| CompileError::MalformedOutput("missing \"contracts\" object".to_string()))?;

    let artifact = contracts
        .iter()
        .find(|(key, _)| key.rsplit(':').next() == Some(contract_name))
        .map(|(_, artifact)| artifact)
        .ok_or_else(|| CompileError::ContractNotFound(contract_name.to_string()))?;

    let bin = artifact
        .get("bin")
        .and_then(Value::as_str)
        .ok_or_else(|| CompileError::MalformedOutput("missing \"bin\"".to_string()))?;
    if bin.is_empty() {
        return Err(CompileError::MalformedOutput(format!(
            "{} has no bytecode (abstract contract or interface)",
            contract_name
        )));
    }

    let abi = match artifact.get("abi") {
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| CompileError::MalformedOutput(format!("abi: {}", e)))?,
        Some(abi @ Value::Array(_)) => abi.clone(),
        _ => return Err(CompileError::MalformedOutput("missing \"abi\"".to_string())),
    };

    let bytecode = if bin.starts_with("0x") {
        bin.to_string()
    } else {
        format!("0x{}", bin)
    };

    Ok(CompiledContract {
        contract_name: contract_name.to_string(),
        bytecode,
        abi,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn compiler_with(binary: &str, args: &[&str]) -> Compiler {
        Compiler::new(CompilerConfig {
            binary: PathBuf::from(binary),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(5),
            max_source_len: 100,
        })
    }

    #[test]
    fn parses_combined_json() {
        let stdout = json!({
            "contracts": {
                "Vault.sol:Ownable": { "abi": [], "bin": "" },
                "Vault.sol:Vault": { "abi": [{"type": "constructor"}], "bin": "6080" }
            },
            "version": "0.8.24"
        });
        let compiled = parse_combined_json(stdout.to_string().as_bytes(), "Vault").unwrap();
        assert_eq!(compiled.bytecode, "0x6080");
        assert_eq!(compiled.abi[0]["type"], "constructor");

        assert!(matches!(
            parse_combined_json(stdout.to_string().as_bytes(), "Ownable"),
            Err(CompileError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_combined_json(stdout.to_string().as_bytes(), "Missing"),
            Err(CompileError::ContractNotFound(_))
        ));
    }

    #[test]
    fn parses_legacy_string_abi() {
        let stdout = json!({
            "contracts": { "A.sol:A": { "abi": "[]", "bin": "00" } }
        });
        let compiled = parse_combined_json(stdout.to_string().as_bytes(), "A").unwrap();
        assert_eq!(compiled.abi, json!([]));
    }

    #[test]
    fn rejects_garbage_output() {
        assert!(matches!(
            parse_combined_json(b"Error: nope", "A"),
            Err(CompileError::MalformedOutput(_))
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_and_empty_source() {
        let compiler = compiler_with("solc", &[]);
        let big = "a".repeat(101);
        assert!(matches!(
            compiler.compile(&big, "A").await,
            Err(CompileError::SourceTooLarge { len: 101, max: 100 })
        ));
        assert!(matches!(
            compiler.compile("   ", "A").await,
            Err(CompileError::EmptySource)
        ));
        assert!(matches!(
            compiler.compile("contract A {}", "../A").await,
            Err(CompileError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn source_limit_counts_characters_not_bytes() {
        let compiler = compiler_with("/nonexistent/solc", &[]);
        // 100 multi-byte characters are within a 100-character limit
        let source = "é".repeat(100);
        assert!(matches!(
            compiler.compile(&source, "A").await,
            Err(CompileError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_compiler_in_isolated_dir() {
        // `sh -c <script> <file>` stands in for the compiler: it echoes an
        // artifact named after the file it was given.
        let script = r#"name=$(basename "$0" .sol); test -f "$0" || exit 3; printf '{"contracts":{"%s:%s":{"abi":[],"bin":"6001"}}}' "$0" "$name""#;
        let compiler = compiler_with("sh", &["-c", script]);
        let compiled = compiler.compile("contract Vault {}", "Vault").await.unwrap();
        assert_eq!(compiled.contract_name, "Vault");
        assert_eq!(compiled.bytecode, "0x6001");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn surfaces_compiler_failure() {
        let compiler = compiler_with("sh", &["-c", "echo 'ParserError: boom' >&2; exit 1"]);
        match compiler.compile("contract A {", "A").await {
            Err(CompileError::Failed { stderr, .. }) => assert!(stderr.contains("ParserError")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn enforces_timeout() {
        let compiler = Compiler::new(CompilerConfig {
            binary: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
            timeout: Duration::from_millis(200),
            max_source_len: 100,
        });
        let err = compiler.compile("contract A {}", "A").await.unwrap_err();
        assert!(matches!(err, CompileError::Timeout(_)));
        assert_eq!(err.to_string(), "compiler timed out after 200.00ms");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn removes_workspace_after_each_request() {
        let script = r#"pwd >&2; exit 1"#;
        let compiler = compiler_with("sh", &["-c", script]);
        let Err(CompileError::Failed { stderr, .. }) = compiler.compile("x", "A").await else {
            panic!("expected failure");
        };
        assert!(stderr.contains("chainwatch-compile-"));
        assert!(!Path::new(&stderr).exists());
    }
}
