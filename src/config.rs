use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

use crate::data::model::VolcanoId;

pub const DEFAULT_IMAGE_EXTENSIONS: &str = "png,jpg,jpeg,tif,tiff";

/// Runtime settings, read once from the environment at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Volcano pre-filled in the contribution form.
    pub volcano: Option<VolcanoId>,
    /// Lower-case extensions treated as particle images.
    pub image_extensions: Vec<String>,
    /// Descend into sub-folders when importing a folder.
    pub recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volcano: None,
            image_extensions: parse_extensions(DEFAULT_IMAGE_EXTENSIONS),
            recursive: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self {
            volcano: var("ASH_VOLCANO_NUMBER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| VolcanoId::parse(&v)),
            image_extensions: parse_extensions(&try_load_string(
                "ASH_IMAGE_EXTENSIONS",
                DEFAULT_IMAGE_EXTENSIONS,
            )),
            recursive: try_load("ASH_RECURSIVE", true),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set, using default");
    })
}

fn try_load_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(()) => default,
    }
}

fn parse_or<T: FromStr + Display>(key: &str, raw: &str, default: T) -> T
where
    T::Err: Display,
{
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
        default
    })
}

/// Split a comma list into lower-case extensions without leading dots.
pub fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_normalised() {
        assert_eq!(
            parse_extensions(" PNG, .jpg,,tif "),
            vec!["png".to_string(), "jpg".to_string(), "tif".to_string()]
        );
    }

    #[test]
    fn invalid_values_fall_back_to_default() {
        assert!(parse_or("ASH_RECURSIVE", "maybe", true));
        assert!(!parse_or("ASH_RECURSIVE", " false ", true));
    }

    #[test]
    fn default_config_accepts_common_image_types() {
        let config = Config::default();
        assert_eq!(config.volcano, None);
        assert!(config.recursive);
        assert!(config.image_extensions.contains(&"tiff".to_string()));
    }
}
