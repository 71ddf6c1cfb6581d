use genera_loader::{load_model_file, LoadError, ModelFile};
use genera_types::{render_type, TypeEnv};
use tempfile::tempdir;

const JSON_MODEL: &str = r#"{
  "classes": [
    {
      "name": "com.example.Box",
      "type_params": [{ "name": "T", "bounds": ["Number"] }],
      "fields": [{ "name": "items", "type": "java.util.List<T>" }]
    }
  ]
}"#;

const TOML_MODEL: &str = r#"
[[classes]]
name = "com.example.Box"
type_params = [{ name = "T", bounds = ["Number"] }]

[[classes.fields]]
name = "items"
type = "java.util.List<T>"
"#;

#[test]
fn json_and_toml_files_load_the_same_model() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("model.json");
    let toml = dir.path().join("model.TOML");
    std::fs::write(&json, JSON_MODEL).unwrap();
    std::fs::write(&toml, TOML_MODEL).unwrap();

    assert_eq!(ModelFile::read(&json).unwrap(), ModelFile::read(&toml).unwrap());

    let model = load_model_file(&json).unwrap();
    let store = model.store();
    let class = store.class(model.class("Box").unwrap()).unwrap();
    assert_eq!(render_type(store, &class.fields[0].ty), "List<T>");
}

#[test]
fn file_errors_carry_the_path() {
    let dir = tempdir().unwrap();

    let yaml = dir.path().join("model.yaml");
    std::fs::write(&yaml, "classes: []").unwrap();
    assert!(matches!(
        ModelFile::read(&yaml).unwrap_err(),
        LoadError::UnsupportedFormat { .. }
    ));

    let missing = dir.path().join("missing.json");
    let err = ModelFile::read(&missing).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err}");
    assert!(err.to_string().contains("missing.json"), "{err}");

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"classes\": [").unwrap();
    let err = ModelFile::read(&broken).unwrap_err();
    match err {
        LoadError::Json { path, .. } => assert!(path.ends_with("broken.json"), "{path}"),
        other => panic!("unexpected error: {other}"),
    }
}
