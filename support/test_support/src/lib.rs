use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    Success,
    SyntaxError,
    RuntimeError,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BenchConfig {
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Execution limits a case runs under. Mirrors the library's `RunConfig`.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct CaseLimits {
    pub step_limit: Option<u64>,
    pub range_limit: Option<usize>,
    pub sequence_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExpectedOutcome {
    pub output_file: Option<String>,
    /// Exact error message.
    pub error: Option<String>,
    /// Substring the error message must contain.
    pub error_contains: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseSpec {
    pub class: CaseClass,
    #[serde(default)]
    pub limits: CaseLimits,
    #[serde(default)]
    pub bench: BenchConfig,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub spec: CaseSpec,
}

impl Case {
    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }

    pub fn read_program(&self) -> Result<String> {
        fs::read_to_string(&self.program_path)
            .with_context(|| format!("Reading {}", self.program_path.display()))
    }

    /// Expected output lines for a `success` case.
    pub fn expected_lines(&self) -> Result<Vec<String>> {
        let output_file = self
            .spec
            .expected
            .output_file
            .as_deref()
            .with_context(|| format!("Missing output_file in {}", self.name))?;
        let expected = normalize_output(&self.read_text(output_file)?);
        if expected.is_empty() {
            return Ok(Vec::new());
        }
        Ok(expected.split('\n').map(str::to_string).collect())
    }

    /// Checks an error message against the case's expectation.
    pub fn check_error(&self, actual: &str) -> Result<()> {
        let expected = &self.spec.expected;
        if let Some(exact) = &expected.error {
            ensure!(
                actual == exact,
                "Expected error '{exact}' in {}, got '{actual}'",
                self.name
            );
        }
        if let Some(fragment) = &expected.error_contains {
            ensure!(
                actual.contains(fragment.as_str()),
                "Expected error containing '{fragment}' in {}, got '{actual}'",
                self.name
            );
        }
        ensure!(
            expected.error.is_some() || expected.error_contains.is_some(),
            "Case {} expects an error but names none",
            self.name
        );
        Ok(())
    }
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.py");
        ensure!(
            program_path.exists(),
            "Missing program.py for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}
