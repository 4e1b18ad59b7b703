use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_FILE: &str = "migration_report.json";
pub const DEFAULT_LOG_FILE: &str = "migration_run.log";

/// Immutable run configuration, built once from a TOML document.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationConfig {
    pub run: RunConfig,
    pub paths: PathsConfig,
    pub inputs: InputsConfig,
    pub transform: TransformConfig,
    pub outputs: OutputsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_run_name")]
    pub name: String,
    #[serde(default = "default_run_mode")]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub create_missing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputsConfig {
    pub source_file: String,
    pub expected_columns: Vec<String>,
    pub delimiter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Keyed by source column, or by the new column's name for `derive` rules.
    /// Declaration order is kept; derived columns are appended in that order.
    #[serde(default)]
    pub rules: IndexMap<String, ColumnRule>,
    pub filter: Option<RowFilter>,
    #[serde(default)]
    pub add_columns: AuditColumns,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub rename: Option<String>,
    pub cast: Option<CastType>,
    pub derive: Option<Derivation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastType {
    Integer,
    Float,
    String,
    Boolean,
}

impl CastType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastType::Integer => "integer",
            CastType::Float => "float",
            CastType::String => "string",
            CastType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Derivation {
    Copy {
        from: String,
    },
    Constant {
        value: String,
    },
    Concat {
        from: Vec<String>,
        #[serde(default)]
        separator: String,
    },
    Uppercase {
        from: String,
    },
    Lowercase {
        from: String,
    },
    Trim {
        from: String,
    },
    Scale {
        from: String,
        factor: f64,
    },
}

impl Derivation {
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Derivation::Constant { .. } => Vec::new(),
            Derivation::Concat { from, .. } => from.iter().map(String::as_str).collect(),
            Derivation::Copy { from }
            | Derivation::Uppercase { from }
            | Derivation::Lowercase { from }
            | Derivation::Trim { from }
            | Derivation::Scale { from, .. } => vec![from.as_str()],
        }
    }
}

/// Keeps rows whose `column` parses as a number >= `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub min: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditColumns {
    #[serde(default)]
    pub migrated_at_utc: bool,
    #[serde(default)]
    pub run_id: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputsConfig {
    pub output_file: Option<String>,
    pub report_file: String,
    pub log_file: String,
    pub allow_overwrite: bool,
    pub report_policy: ReportPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPolicy {
    #[default]
    Overwrite,
    Timestamped,
}

// Permission bits do not reflect ownership or ACLs; only a real create does.
fn ensure_writable(field: &str, dir: &Path) -> Result<()> {
    let not_writable = |e: std::io::Error| {
        EtlError::config(format!("{} is not writable ({}): {}", field, dir.display(), e))
    };

    let marker = dir.join(format!(".migrate-write-test-{}", std::process::id()));
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
        .map_err(not_writable)?;
    fs::remove_file(&marker).map_err(not_writable)
}

// Wire shape: everything optional so a missing key is reported by its dotted name.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    run: Option<RunConfig>,
    paths: Option<RawPaths>,
    inputs: Option<RawInputs>,
    transform: Option<TransformConfig>,
    outputs: Option<RawOutputs>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    raw_dir: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    reports_dir: Option<PathBuf>,
    logs_dir: Option<PathBuf>,
    create_missing: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInputs {
    source_file: Option<String>,
    expected_columns: Option<Vec<String>>,
    delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOutputs {
    output_file: Option<String>,
    report_file: Option<String>,
    log_file: Option<String>,
    allow_overwrite: Option<bool>,
    report_policy: Option<ReportPolicy>,
}

fn default_run_name() -> String {
    "migration".to_string()
}

fn default_run_mode() -> String {
    "full".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            mode: default_run_mode(),
        }
    }
}

impl MigrationConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let raw: RawConfig = toml::from_str(&processed_content)
            .map_err(|e| EtlError::config(format!("TOML parsing error: {}", e)))?;

        Self::from_raw(raw)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| EtlError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let raw_paths = raw.paths.unwrap_or_default();
        let raw_inputs = raw.inputs.unwrap_or_default();
        let raw_outputs = raw.outputs.unwrap_or_default();

        let paths = PathsConfig {
            raw_dir: validation::validate_required_field("paths.raw_dir", &raw_paths.raw_dir)?
                .clone(),
            staging_dir: validation::validate_required_field(
                "paths.staging_dir",
                &raw_paths.staging_dir,
            )?
            .clone(),
            output_dir: validation::validate_required_field(
                "paths.output_dir",
                &raw_paths.output_dir,
            )?
            .clone(),
            reports_dir: validation::validate_required_field(
                "paths.reports_dir",
                &raw_paths.reports_dir,
            )?
            .clone(),
            logs_dir: validation::validate_required_field("paths.logs_dir", &raw_paths.logs_dir)?
                .clone(),
            create_missing: raw_paths.create_missing.unwrap_or(true),
        };

        let inputs = InputsConfig {
            source_file: validation::validate_required_field(
                "inputs.source_file",
                &raw_inputs.source_file,
            )?
            .clone(),
            expected_columns: validation::validate_required_field(
                "inputs.expected_columns",
                &raw_inputs.expected_columns,
            )?
            .clone(),
            delimiter: raw_inputs.delimiter.unwrap_or_else(|| ",".to_string()),
        };

        let outputs = OutputsConfig {
            output_file: raw_outputs.output_file,
            report_file: raw_outputs
                .report_file
                .unwrap_or_else(|| DEFAULT_REPORT_FILE.to_string()),
            log_file: raw_outputs
                .log_file
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            allow_overwrite: raw_outputs.allow_overwrite.unwrap_or(false),
            report_policy: raw_outputs.report_policy.unwrap_or_default(),
        };

        Ok(Self {
            run: raw.run.unwrap_or_default(),
            paths,
            inputs,
            transform: raw.transform.unwrap_or_default(),
            outputs,
        })
    }

    pub fn directories(&self) -> [(&'static str, &Path); 5] {
        [
            ("paths.raw_dir", self.paths.raw_dir.as_path()),
            ("paths.staging_dir", self.paths.staging_dir.as_path()),
            ("paths.output_dir", self.paths.output_dir.as_path()),
            ("paths.reports_dir", self.paths.reports_dir.as_path()),
            ("paths.logs_dir", self.paths.logs_dir.as_path()),
        ]
    }

    /// Ensures every configured directory exists and is writable.
    pub fn prepare_directories(&self) -> Result<()> {
        for (field, dir) in self.directories() {
            if !dir.exists() {
                if !self.paths.create_missing {
                    return Err(EtlError::config(format!(
                        "{} does not exist: {}",
                        field,
                        dir.display()
                    )));
                }
                fs::create_dir_all(dir).map_err(|e| {
                    EtlError::config(format!("cannot create {} ({}): {}", field, dir.display(), e))
                })?;
                tracing::debug!("Created {} at {}", field, dir.display());
            }

            let metadata = fs::metadata(dir).map_err(|e| {
                EtlError::config(format!("cannot inspect {} ({}): {}", field, dir.display(), e))
            })?;
            if !metadata.is_dir() {
                return Err(EtlError::config(format!(
                    "{} is not a directory: {}",
                    field,
                    dir.display()
                )));
            }
            ensure_writable(field, dir)?;
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        validation::validate_delimiter("inputs.delimiter", &self.inputs.delimiter)
    }

    pub fn input_path(&self) -> PathBuf {
        self.paths.raw_dir.join(&self.inputs.source_file)
    }

    /// Source file name without its extension, used to name derived artifacts.
    pub fn source_stem(&self) -> String {
        Path::new(&self.inputs.source_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.inputs.source_file.clone())
    }

    pub fn staging_path(&self) -> PathBuf {
        self.paths
            .staging_dir
            .join(format!("staged_{}.csv", self.source_stem()))
    }

    pub fn output_path(&self) -> PathBuf {
        let file_name = self
            .outputs
            .output_file
            .clone()
            .unwrap_or_else(|| format!("{}_migrated.csv", self.source_stem()));
        self.paths.output_dir.join(file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.paths.logs_dir.join(&self.outputs.log_file)
    }

    fn validate_rules(&self) -> Result<()> {
        let expected: HashSet<&str> = self
            .inputs
            .expected_columns
            .iter()
            .map(String::as_str)
            .collect();
        let mut rename_targets = HashSet::new();

        for (column, rule) in &self.transform.rules {
            let field = format!("transform.rules.{}", column);
            validation::validate_non_empty_string(&field, column)?;

            if rule.rename.is_none() && rule.cast.is_none() && rule.derive.is_none() {
                return Err(EtlError::InvalidConfigValueError {
                    field,
                    value: column.clone(),
                    reason: "Rule must set at least one of rename, cast or derive".to_string(),
                });
            }

            if let Some(derivation) = &rule.derive {
                if rule.rename.is_some() || rule.cast.is_some() {
                    return Err(EtlError::InvalidConfigValueError {
                        field,
                        value: column.clone(),
                        reason: "A derive rule cannot also rename or cast".to_string(),
                    });
                }
                if expected.contains(column.as_str()) {
                    return Err(EtlError::InvalidConfigValueError {
                        field,
                        value: column.clone(),
                        reason: "Derived column name collides with an expected column".to_string(),
                    });
                }
                if let Derivation::Concat { from, .. } = derivation {
                    if from.is_empty() {
                        return Err(EtlError::InvalidConfigValueError {
                            field: format!("{}.derive.from", field),
                            value: "[]".to_string(),
                            reason: "concat needs at least one source column".to_string(),
                        });
                    }
                }
                if let Derivation::Scale { factor, .. } = derivation {
                    if !factor.is_finite() {
                        return Err(EtlError::InvalidConfigValueError {
                            field: format!("{}.derive.factor", field),
                            value: factor.to_string(),
                            reason: "factor must be a finite number".to_string(),
                        });
                    }
                }
            }

            if let Some(target) = &rule.rename {
                validation::validate_non_empty_string(&format!("{}.rename", field), target)?;
                if !rename_targets.insert(target.as_str()) {
                    return Err(EtlError::InvalidConfigValueError {
                        field: format!("{}.rename", field),
                        value: target.clone(),
                        reason: "Two rules rename onto the same column".to_string(),
                    });
                }
            }
        }

        if let Some(filter) = &self.transform.filter {
            validation::validate_non_empty_string("transform.filter.column", &filter.column)?;
        }

        Ok(())
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        for (field, dir) in self.directories() {
            validation::validate_path(field, &dir.to_string_lossy())?;
        }
        validation::validate_file_name("inputs.source_file", &self.inputs.source_file)?;
        validation::validate_unique_names(
            "inputs.expected_columns",
            &self.inputs.expected_columns,
        )?;
        self.delimiter_byte()?;
        validation::validate_file_name("outputs.report_file", &self.outputs.report_file)?;
        validation::validate_file_name("outputs.log_file", &self.outputs.log_file)?;
        if let Some(output_file) = &self.outputs.output_file {
            validation::validate_file_name("outputs.output_file", output_file)?;
        }
        self.validate_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const BASIC: &str = r#"
[run]
name = "patients"

[paths]
raw_dir = "/data/raw"
staging_dir = "/data/staging"
output_dir = "/data/output"
reports_dir = "/data/reports"
logs_dir = "/data/logs"

[inputs]
source_file = "patients.csv"
expected_columns = ["patient_id", "age", "site"]
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = MigrationConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.run.name, "patients");
        assert_eq!(config.run.mode, "full");
        assert_eq!(config.paths.raw_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.inputs.expected_columns.len(), 3);
        assert_eq!(config.inputs.delimiter, ",");
        assert!(!config.outputs.allow_overwrite);
        assert_eq!(config.outputs.report_file, DEFAULT_REPORT_FILE);
        assert_eq!(config.outputs.log_file, DEFAULT_LOG_FILE);
        assert_eq!(config.outputs.report_policy, ReportPolicy::Overwrite);
        assert!(config.transform.rules.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_artifact_paths() {
        let config = MigrationConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.input_path(), PathBuf::from("/data/raw/patients.csv"));
        assert_eq!(
            config.staging_path(),
            PathBuf::from("/data/staging/staged_patients.csv")
        );
        assert_eq!(
            config.output_path(),
            PathBuf::from("/data/output/patients_migrated.csv")
        );
        assert_eq!(
            config.log_path(),
            PathBuf::from("/data/logs/migration_run.log")
        );
    }

    #[test]
    fn test_missing_required_keys_are_named() {
        let without_raw = BASIC.replace("raw_dir = \"/data/raw\"\n", "");
        match MigrationConfig::from_toml_str(&without_raw) {
            Err(EtlError::MissingConfigError { field }) => assert_eq!(field, "paths.raw_dir"),
            other => panic!("unexpected result: {:?}", other),
        }

        let without_output = BASIC.replace("output_dir = \"/data/output\"\n", "");
        match MigrationConfig::from_toml_str(&without_output) {
            Err(EtlError::MissingConfigError { field }) => assert_eq!(field, "paths.output_dir"),
            other => panic!("unexpected result: {:?}", other),
        }

        let without_source = BASIC.replace("source_file = \"patients.csv\"\n", "");
        match MigrationConfig::from_toml_str(&without_source) {
            Err(EtlError::MissingConfigError { field }) => {
                assert_eq!(field, "inputs.source_file")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = MigrationConfig::from_toml_str("[paths\nraw_dir = ");
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = MigrationConfig::from_file("/definitely/not/here/migration.toml");
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MIGRATE_ETL_TEST_ROOT", "/mnt/volume");

        let content = BASIC.replace("/data/raw", "${MIGRATE_ETL_TEST_ROOT}/raw");
        let config = MigrationConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.paths.raw_dir, PathBuf::from("/mnt/volume/raw"));

        std::env::remove_var("MIGRATE_ETL_TEST_ROOT");
    }

    #[test]
    fn test_parse_transform_rules() {
        let content = format!(
            r#"{}
[transform.rules.age]
cast = "integer"

[transform.rules.site]
rename = "site_code"

[transform.rules.label]
derive = {{ op = "concat", from = ["patient_id", "site"], separator = "-" }}

[transform.filter]
column = "age"
min = 18

[transform.add_columns]
run_id = true

[outputs]
allow_overwrite = true
report_policy = "timestamped"
output_file = "final.csv"
"#,
            BASIC
        );
        let config = MigrationConfig::from_toml_str(&content).unwrap();

        assert_eq!(config.transform.rules["age"].cast, Some(CastType::Integer));
        assert_eq!(
            config.transform.rules["site"].rename.as_deref(),
            Some("site_code")
        );
        assert_eq!(
            config.transform.rules["label"].derive,
            Some(Derivation::Concat {
                from: vec!["patient_id".to_string(), "site".to_string()],
                separator: "-".to_string(),
            })
        );
        assert_eq!(config.transform.filter.as_ref().unwrap().min, 18.0);
        assert!(config.transform.add_columns.run_id);
        assert!(!config.transform.add_columns.migrated_at_utc);
        assert!(config.outputs.allow_overwrite);
        assert_eq!(config.outputs.report_policy, ReportPolicy::Timestamped);
        assert_eq!(
            config.output_path(),
            PathBuf::from("/data/output/final.csv")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rules_keep_declaration_order() {
        let content = format!(
            r#"{}
[transform.rules.zip_label]
derive = {{ op = "constant", value = "z" }}

[transform.rules.age]
cast = "integer"

[transform.rules.alpha_label]
derive = {{ op = "constant", value = "a" }}
"#,
            BASIC
        );
        let config = MigrationConfig::from_toml_str(&content).unwrap();

        let keys: Vec<&str> = config.transform.rules.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zip_label", "age", "alpha_label"]);
    }

    #[test]
    fn test_semantic_validation_rejects_bad_values() {
        let dupes = BASIC.replace(
            r#"["patient_id", "age", "site"]"#,
            r#"["patient_id", "age", "age"]"#,
        );
        let config = MigrationConfig::from_toml_str(&dupes).unwrap();
        assert!(config.validate().is_err());

        let nested = BASIC.replace("patients.csv", "../patients.csv");
        let config = MigrationConfig::from_toml_str(&nested).unwrap();
        assert!(config.validate().is_err());

        let empty_rule = format!("{}\n[transform.rules.age]\n", BASIC);
        let config = MigrationConfig::from_toml_str(&empty_rule).unwrap();
        assert!(config.validate().is_err());

        let derive_and_cast = format!(
            "{}\n[transform.rules.extra]\ncast = \"integer\"\nderive = {{ op = \"copy\", from = \"age\" }}\n",
            BASIC
        );
        let config = MigrationConfig::from_toml_str(&derive_and_cast).unwrap();
        assert!(config.validate().is_err());

        let bad_delimiter = BASIC.replace(
            "expected_columns",
            "delimiter = \";;\"\nexpected_columns",
        );
        let config = MigrationConfig::from_toml_str(&bad_delimiter).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prepare_directories_creates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap().replace('\\', "/");
        let content = BASIC.replace("/data", &root);
        let config = MigrationConfig::from_toml_str(&content).unwrap();

        config.prepare_directories().unwrap();

        for (_, dir) in config.directories() {
            assert!(dir.is_dir());
        }
    }

    #[test]
    fn test_prepare_directories_without_create_missing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap().replace('\\', "/");
        let content = BASIC
            .replace("/data", &root)
            .replace("logs_dir", "create_missing = false\nlogs_dir");
        let config = MigrationConfig::from_toml_str(&content).unwrap();

        assert!(matches!(
            config.prepare_directories(),
            Err(EtlError::ConfigError { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_directories_rejects_unwritable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap().replace('\\', "/");
        let config = MigrationConfig::from_toml_str(&BASIC.replace("/data", &root)).unwrap();
        config.prepare_directories().unwrap();

        let staging = temp_dir.path().join("staging");
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o555)).unwrap();
        // root ignores mode bits; nothing to check there
        if fs::write(staging.join("root-check"), b"").is_ok() {
            return;
        }

        let result = config.prepare_directories();
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(EtlError::ConfigError { message }) => {
                assert!(message.contains("paths.staging_dir"));
                assert!(message.contains("not writable"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_directories_leaves_no_marker_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap().replace('\\', "/");
        let config = MigrationConfig::from_toml_str(&BASIC.replace("/data", &root)).unwrap();

        config.prepare_directories().unwrap();
        config.prepare_directories().unwrap();

        for (_, dir) in config.directories() {
            assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = MigrationConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.inputs.source_file, "patients.csv");
    }
}
