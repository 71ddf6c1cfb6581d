mod files;
mod loading;

use genera_loader::{load_model, Model, ModelFile};

pub(crate) fn load_toml(text: &str) -> Model {
    let file = ModelFile::from_toml_str(text).expect("model should parse");
    load_model(&file).expect("model should load")
}
