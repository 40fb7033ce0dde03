use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fedwire_core::{KeyStore, LocalUser, Payload, ReceiveContext, handle_receive};
use serde::Deserialize;
use serde_json::Value;

const NORMALIZED_CREATED_AT: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaseOptions {
    user: Option<String>,
    skip_author_verification: bool,
}

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() || !path.join("payload").exists() {
            continue;
        }
        regenerate_one(&path)?;
    }

    Ok(())
}

fn regenerate_one(dir: &Path) -> Result<(), String> {
    let payload_path = dir.join("payload");
    let payload = fs::read(&payload_path)
        .map(Payload::from)
        .map_err(|err| format!("failed to read {}: {}", payload_path.display(), err))?;
    let options = load_options(dir)?;
    let keys = load_keys(dir)?;
    let user = options.user.map(LocalUser::new);

    let mut context =
        ReceiveContext::new().with_author_verification_skipped(options.skip_author_verification);
    if let Some(user) = user.as_ref() {
        context = context.with_user(user);
    }
    if let Some(keys) = keys.as_ref() {
        context = context.with_sender_key_fetcher(keys);
    }

    let result_path = dir.join("expected_result.json");
    let error_path = dir.join("expected_error.txt");
    match handle_receive(&payload, &context) {
        Ok(result) => {
            let mut value = serde_json::to_value(&result)
                .map_err(|err| format!("JSON serialization failed: {}", err))?;
            normalize(&mut value);
            let json = serde_json::to_string_pretty(&value)
                .map_err(|err| format!("JSON serialization failed: {}", err))?;
            write(&result_path, &format!("{json}\n"))?;
            remove_stale(&error_path)
        }
        Err(err) => {
            write(&error_path, &format!("{err}\n"))?;
            remove_stale(&result_path)
        }
    }
}

fn load_options(dir: &Path) -> Result<CaseOptions, String> {
    let path = dir.join("options.json");
    if !path.exists() {
        return Ok(CaseOptions::default());
    }
    let json = fs::read_to_string(&path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&json).map_err(|err| format!("invalid {}: {}", path.display(), err))
}

fn load_keys(dir: &Path) -> Result<Option<KeyStore>, String> {
    let path = dir.join("keys.json");
    if !path.exists() {
        return Ok(None);
    }
    KeyStore::load(&path)
        .map(Some)
        .map_err(|err| format!("invalid {}: {}", path.display(), err))
}

fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if key == "created_at" {
                    *item = Value::from(NORMALIZED_CREATED_AT);
                } else {
                    normalize(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize),
        _ => {}
    }
}

fn write(path: &Path, contents: &str) -> Result<(), String> {
    fs::write(path, contents).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

fn remove_stale(path: &Path) -> Result<(), String> {
    if path.exists() {
        fs::remove_file(path)
            .map_err(|err| format!("failed to remove {}: {}", path.display(), err))?;
    }
    Ok(())
}
