use cloudship_core::{EnvFile, Error};
use tempfile::TempDir;

#[test]
fn missing_file_reads_as_empty() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("absent"));

    assert!(env.read().unwrap().is_empty());
    assert!(env.get("REGION").unwrap().is_none());
}

#[test]
fn append_creates_file_and_reads_back() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));

    env.append("REGION", "us-east1").unwrap();

    assert_eq!(env.get("REGION").unwrap().as_deref(), Some("us-east1"));
    assert_eq!(
        std::fs::read_to_string(env.path()).unwrap(),
        "REGION=us-east1\n"
    );
}

#[test]
fn existing_key_is_never_overwritten() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));
    env.append("REGION", "us-east1").unwrap();

    let err = env.append("REGION", "europe-west1").unwrap_err();

    assert!(matches!(err, Error::EnvKeyExists { ref key, .. } if key == "REGION"));
    assert_eq!(env.get("REGION").unwrap().as_deref(), Some("us-east1"));
}

#[test]
fn append_all_is_all_or_nothing() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));
    env.append("IMAGE_NAME", "img").unwrap();

    let result = env.append_all(&[("REGION", "us-east1"), ("IMAGE_NAME", "other")]);

    assert!(matches!(result, Err(Error::EnvKeyExists { .. })));
    assert!(env.get("REGION").unwrap().is_none());
}

#[test]
fn duplicate_keys_in_one_batch_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));

    let result = env.append_all(&[("REGION", "a"), ("REGION", "b")]);

    assert!(matches!(result, Err(Error::EnvKeyExists { .. })));
    assert!(!env.path().exists());
}

#[test]
fn foreign_lines_are_preserved() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("env");
    std::fs::write(&path, "CI=true").unwrap();
    let env = EnvFile::new(&path);

    env.append("REGION", "us-east1").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "CI=true\nREGION=us-east1\n"
    );
    assert_eq!(env.get("CI").unwrap().as_deref(), Some("true"));
}

#[test]
fn multiline_value_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));

    let result = env.append("REGION", "us-east1\nIMAGE_NAME=evil");

    assert!(matches!(result, Err(Error::EnvInvalidEntry { .. })));
    assert!(!env.path().exists());
}

#[test]
fn invalid_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let env = EnvFile::new(tmp.path().join("env"));

    assert!(matches!(
        env.append("1REGION", "x"),
        Err(Error::EnvInvalidEntry { .. })
    ));
    assert!(matches!(
        env.append("IMAGE-NAME", "x"),
        Err(Error::EnvInvalidEntry { .. })
    ));
}
