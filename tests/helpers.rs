use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

#[allow(dead_code)]
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

#[allow(dead_code)]
fn env_lock() -> MutexGuard<'static, ()> {
    match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(g) => g,
        // A test that panicked while holding the lock must not wedge the rest.
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// RAII guard for test-only env var mutation.
///
/// All mutations through this guard are serialized with a global lock;
/// mutations that bypass it are not controlled.
#[must_use]
#[allow(dead_code)]
pub struct EnvVarGuard {
    key: String,
    old: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

#[allow(dead_code)]
impl EnvVarGuard {
    pub fn set<K: Into<String>, V: AsRef<OsStr>>(key: K, value: V) -> Self {
        let key = key.into();
        let lock = env_lock();
        let old = env::var_os(&key);
        env::set_var(&key, value);

        Self {
            key,
            old,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.old {
            Some(v) => env::set_var(&self.key, v),
            None => env::remove_var(&self.key),
        }
    }
}

#[allow(dead_code)]
pub const MODEL_REL: &str = "models/Qwen2.5-3B-Instruct-Q4_K_M.gguf";

/// A profile that mirrors the built-in one but runs `sh -c <script>` and uses
/// Unix paths, so the CLI can be exercised end to end.
#[allow(dead_code)]
pub fn write_profile(dir: &Path, script: &str, on_failure: &str) -> PathBuf {
    let yaml = format!(
        r#"version: "1"
on_failure: {on_failure}
banner:
  - "== TEST SWARM =="
env:
  - set: CMAKE_ARGS
    value: "-DGGML_CUDA=on"
  - set: FORCE_CMAKE
    value: "1"
  - set: CUDA_PATH
    value: /opt/cuda-test
  - prepend: PATH
    entries: ["${{CUDA_PATH}}/bin", "${{CUDA_PATH}}/libnvvp"]
require:
  - dir: models
  - file: {MODEL_REL}
    hint: "Download it and place it in the models folder."
command: ["sh", "-c", {script:?}]
"#
    );
    let path = dir.join("launch.yaml");
    fs::write(&path, yaml).expect("write profile");
    path
}

#[allow(dead_code)]
pub fn place_model(dir: &Path) {
    let model = dir.join(MODEL_REL);
    fs::create_dir_all(model.parent().expect("model parent")).expect("mkdir models");
    fs::write(model, b"GGUF").expect("write model");
}
