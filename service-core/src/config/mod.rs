use crate::error::AppError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load settings from `<config_dir>/base.yaml`, overridden by environment
/// variables such as `APP_API__BASE_URL`.
///
/// A `.env` file in the working directory is loaded first if present.
pub fn load_layered<T: DeserializeOwned>(config_dir: &Path, prefix: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}

/// Resolve the configuration directory of a workspace member, whether the
/// process runs from the workspace root or from the member itself.
pub fn config_dir_for(member: &str) -> Result<std::path::PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(member) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(member).join("config"))
    }
}
