//! Language-specific resources and constructors for ready-to-use annotators.

/// Loads the options of the given type for a language from the configs collated by the build script.
#[allow(unused)]
macro_rules! lang_options {
    ($options: ty, $lang_code:literal, $config_name:literal) => {{
        let configs: std::collections::HashMap<String, $options> = serde_json::from_str(
            include_str!(concat!(env!("OUT_DIR"), "/", $config_name, "_configs.json")),
        )
        .expect(ERROR_MSG);

        configs.get($lang_code).cloned().expect(ERROR_MSG)
    }};
}

#[allow(unused)]
const ERROR_MSG: &str = "language configs are pre-tested.";

pub mod en;
