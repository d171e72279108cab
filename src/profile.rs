use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::RequiredPath;
use crate::env::EnvOverride;
use crate::schema;

pub const PROFILE_VERSION: &str = "1";

pub const MODELS_DIR: &str = "models";
pub const MODEL_FILE: &str = "Qwen2.5-3B-Instruct-Q4_K_M.gguf";
pub const CUDA_TOOLKIT_PATH: &str = r"C:\Program Files\NVIDIA GPU Computing Toolkit\CUDA\v13.0";

/// Top-level launch profile document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LaunchProfile {
    pub version: String,

    /// Relative to the directory holding the profile file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub on_failure: FailureMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub banner: Vec<String>,

    #[serde(default)]
    pub env: Vec<EnvSpec>,

    #[serde(default)]
    pub require: Vec<RequireSpec>,

    /// `[program, args...]`
    pub command: Vec<String>,
}

/// What happens after a failure message is shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Wait for the operator to acknowledge before exiting.
    #[default]
    Pause,
    /// Exit straight away (scripted use).
    Exit,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum EnvSpec {
    Set(SetVar),
    Prepend(PrependVar),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SetVar {
    pub set: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PrependVar {
    pub prepend: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequireSpec {
    Dir(DirRequirement),
    File(FileRequirement),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DirRequirement {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileRequirement {
    pub file: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl EnvSpec {
    pub fn name(&self) -> &str {
        match self {
            EnvSpec::Set(s) => &s.set,
            EnvSpec::Prepend(p) => &p.prepend,
        }
    }

    pub fn to_override(&self) -> EnvOverride {
        match self {
            EnvSpec::Set(s) => EnvOverride::Set {
                name: s.set.clone(),
                value: s.value.clone(),
            },
            EnvSpec::Prepend(p) => EnvOverride::Prepend {
                name: p.prepend.clone(),
                entries: p.entries.clone(),
            },
        }
    }
}

impl RequireSpec {
    pub fn to_required_path(&self) -> RequiredPath {
        match self {
            RequireSpec::Dir(d) => RequiredPath::Directory(d.dir.clone()),
            RequireSpec::File(f) => RequiredPath::File {
                path: f.file.clone(),
                hint: f.hint.clone(),
            },
        }
    }

    fn path(&self) -> &Path {
        match self {
            RequireSpec::Dir(d) => &d.dir,
            RequireSpec::File(f) => &f.file,
        }
    }
}

impl LaunchProfile {
    /// The swarm runner setup: CUDA build flags, toolkit on PATH, the Qwen
    /// model under `models/`, and `uv run main_agent_runner.py`.
    pub fn builtin() -> Self {
        let model_rel = format!("{MODELS_DIR}/{MODEL_FILE}");
        Self {
            version: PROFILE_VERSION.to_string(),
            working_dir: None,
            on_failure: FailureMode::Pause,
            banner: vec![
                "==========================================================".to_string(),
                "   DRISHTI-AX // SENTINEL SWARM".to_string(),
                "   GPU: CUDA 13.0  |  Model: Qwen2.5-3B-Instruct (Q4_K_M)".to_string(),
                "==========================================================".to_string(),
            ],
            env: vec![
                EnvSpec::Set(SetVar {
                    set: "CMAKE_ARGS".to_string(),
                    value: "-DGGML_CUDA=on".to_string(),
                }),
                EnvSpec::Set(SetVar {
                    set: "FORCE_CMAKE".to_string(),
                    value: "1".to_string(),
                }),
                EnvSpec::Set(SetVar {
                    set: "CUDA_PATH".to_string(),
                    value: CUDA_TOOLKIT_PATH.to_string(),
                }),
                EnvSpec::Prepend(PrependVar {
                    prepend: "PATH".to_string(),
                    entries: vec![
                        r"${CUDA_PATH}\bin".to_string(),
                        r"${CUDA_PATH}\libnvvp".to_string(),
                    ],
                }),
            ],
            require: vec![
                RequireSpec::Dir(DirRequirement {
                    dir: PathBuf::from(MODELS_DIR),
                }),
                RequireSpec::File(FileRequirement {
                    file: PathBuf::from(&model_rel),
                    hint: Some(format!(
                        "Download it and place it in the {MODELS_DIR} folder:\n  \
                         uvx hf download bartowski/Qwen2.5-3B-Instruct-GGUF --include '{MODEL_FILE}' --local-dir ./{MODELS_DIR}"
                    )),
                }),
            ],
            command: vec![
                "uv".to_string(),
                "run".to_string(),
                "main_agent_runner.py".to_string(),
            ],
        }
    }

    /// Load a profile YAML file: schema check, parse, then semantic validation.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read launch profile: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("load launch profile: {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        schema::validate_profile_yaml(text)?;
        let profile: LaunchProfile =
            serde_yaml::from_str(text).context("parse launch profile yaml")?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serialize launch profile")
    }

    /// Semantic checks the schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim() != PROFILE_VERSION {
            return Err(anyhow!(
                "unsupported profile version '{}' (supported: {})",
                self.version,
                PROFILE_VERSION
            ));
        }

        match self.command.first() {
            None => return Err(anyhow!("command must not be empty")),
            Some(program) if program.trim().is_empty() => {
                return Err(anyhow!("command[0] (program) must not be blank"))
            }
            Some(_) => {}
        }

        for (idx, spec) in self.env.iter().enumerate() {
            let name = spec.name();
            if name.trim().is_empty() {
                return Err(anyhow!("env[{idx}] has an empty variable name"));
            }
            if name.contains('=') || name.contains('\0') {
                return Err(anyhow!("env[{idx}] variable name '{name}' is not valid"));
            }
            if let EnvSpec::Prepend(p) = spec {
                if p.entries.is_empty() {
                    return Err(anyhow!("env[{idx}] prepend '{name}' has no entries"));
                }
            }
        }

        for (idx, req) in self.require.iter().enumerate() {
            if req.path().as_os_str().is_empty() {
                return Err(anyhow!("require[{idx}] has an empty path"));
            }
        }

        Ok(())
    }
}
