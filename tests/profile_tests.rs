use std::fs;
use std::path::PathBuf;

use swarm_launcher::context::{LaunchContext, RequiredPath};
use swarm_launcher::env::EnvOverride;
use swarm_launcher::profile::{EnvSpec, FailureMode, LaunchProfile, RequireSpec};
use swarm_launcher::schema::{profile_schema_json, validate_profile_yaml};

const FULL_PROFILE: &str = r#"
version: "1"
working_dir: app
on_failure: exit
banner: ["hello"]
env:
  - set: CUDA_PATH
    value: /opt/cuda
  - prepend: PATH
    entries: ["${CUDA_PATH}/bin"]
require:
  - dir: models
  - file: models/m.gguf
    hint: fetch it
command: ["uv", "run", "main_agent_runner.py"]
"#;

#[test]
fn full_profile_parses_into_structs() {
    let p = LaunchProfile::from_yaml(FULL_PROFILE).expect("profile should load");

    assert_eq!(p.on_failure, FailureMode::Exit);
    assert_eq!(p.working_dir, Some(PathBuf::from("app")));
    assert_eq!(p.env.len(), 2);
    assert!(matches!(&p.env[0], EnvSpec::Set(s) if s.set == "CUDA_PATH" && s.value == "/opt/cuda"));
    assert!(matches!(&p.env[1], EnvSpec::Prepend(s) if s.prepend == "PATH"));
    assert!(matches!(&p.require[0], RequireSpec::Dir(_)));
    assert!(matches!(&p.require[1], RequireSpec::File(f) if f.hint.as_deref() == Some("fetch it")));
}

#[test]
fn minimal_profile_uses_defaults() {
    let p = LaunchProfile::from_yaml("version: \"1\"\ncommand: [agent]\n").expect("load");
    assert_eq!(p.on_failure, FailureMode::Pause);
    assert!(p.env.is_empty() && p.require.is_empty() && p.banner.is_empty());
}

#[test]
fn context_keeps_override_and_requirement_order() {
    let p = LaunchProfile::from_yaml(FULL_PROFILE).expect("load");
    let ctx = LaunchContext::from_profile(&p, PathBuf::from("/work")).expect("ctx");

    assert_eq!(
        ctx.overrides,
        vec![
            EnvOverride::Set {
                name: "CUDA_PATH".into(),
                value: "/opt/cuda".into()
            },
            EnvOverride::Prepend {
                name: "PATH".into(),
                entries: vec!["${CUDA_PATH}/bin".into()]
            },
        ]
    );
    assert_eq!(
        ctx.required_paths[0],
        RequiredPath::Directory(PathBuf::from("models"))
    );
    assert_eq!(ctx.command.program, "uv");
    assert_eq!(ctx.command.args, vec!["run", "main_agent_runner.py"]);
}

#[test]
fn schema_rejects_unknown_top_level_fields() {
    let bad = "version: \"1\"\ncommand: [a]\nextra_nope: true\n";
    let err = validate_profile_yaml(bad).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("schema validation failed"));
    assert!(msg.contains("unknown top-level key 'extra_nope'"), "{msg}");
    assert_eq!(msg.matches("extra_nope").count(), 1, "{msg}");
}

#[test]
fn schema_rejects_missing_command() {
    let err = LaunchProfile::from_yaml("version: \"1\"\n").unwrap_err();
    assert!(format!("{err:#}").contains("schema validation failed"));
}

#[test]
fn schema_rejects_env_entry_of_neither_shape() {
    let bad = r#"
version: "1"
env:
  - set: A
command: [a]
"#;
    assert!(validate_profile_yaml(bad).is_err());
}

#[test]
fn schema_rejects_unknown_failure_mode() {
    let bad = "version: \"1\"\non_failure: shrug\ncommand: [a]\n";
    assert!(validate_profile_yaml(bad).is_err());
}

#[test]
fn unsupported_version_is_rejected() {
    let err = LaunchProfile::from_yaml("version: \"2\"\ncommand: [a]\n").unwrap_err();
    assert!(format!("{err:#}").contains("unsupported profile version"));
}

#[test]
fn empty_command_is_rejected() {
    let err = LaunchProfile::from_yaml("version: \"1\"\ncommand: []\n").unwrap_err();
    assert!(format!("{err:#}").contains("command must not be empty"));
}

#[test]
fn empty_prepend_is_rejected() {
    let yaml = r#"
version: "1"
env:
  - prepend: PATH
    entries: []
command: [a]
"#;
    let err = LaunchProfile::from_yaml(yaml).unwrap_err();
    assert!(format!("{err:#}").contains("has no entries"));
}

#[test]
fn load_from_file_names_the_file_on_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("broken.yaml");
    fs::write(&path, "version: [").expect("write");

    let err = LaunchProfile::load_from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.yaml"));
}

#[test]
fn demo_profile_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/sentinel-swarm.launch.yaml");
    let p = LaunchProfile::load_from_file(&path).expect("demo profile should load");
    assert_eq!(p, LaunchProfile::builtin());
}

#[test]
fn generated_schema_requires_version_and_command() {
    let schema = profile_schema_json();
    let required = schema
        .get("required")
        .and_then(|v| v.as_array())
        .expect("required list");
    let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
    assert!(names.contains(&"version") && names.contains(&"command"));
}
