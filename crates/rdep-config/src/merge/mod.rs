//! Configuration layering, file discovery, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::toml::RdepToml;
use crate::ConfigResult;
use rdep_core::error::RdepError;

/// Project configuration file name
pub const CONFIG_FILE: &str = "rdep.toml";

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "RDEP_";

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Global config file, `~/.rdep/config.toml` unless overridden
    global_path: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// File a configuration layer was read from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Global(Utf8PathBuf),
    Project(Utf8PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Utf8Path {
        match self {
            ConfigSource::Global(path) | ConfigSource::Project(path) => path,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            global_path: default_global_path(),
        }
    }

    /// Use a different global config file (or none)
    pub fn with_global_path(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());
        while let Some(dir) = current {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }

    /// Load the nearest rdep.toml, if there is one
    pub async fn load_project_config(&self) -> ConfigResult<Option<(RdepToml, ConfigSource)>> {
        match self.resolve_config_path(CONFIG_FILE) {
            Some(path) => {
                let config = crate::toml::load_from_file(&path).await?;
                Ok(Some((config, ConfigSource::Project(path))))
            }
            None => Ok(None),
        }
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<(RdepToml, ConfigSource)>> {
        match self.global_path {
            Some(ref path) if path.is_file() => {
                let config = crate::toml::load_from_file(path).await?;
                Ok(Some((config, ConfigSource::Global(path.clone()))))
            }
            _ => Ok(None),
        }
    }

    /// Load every layer and merge them, lowest priority first: global file,
    /// project file, environment, command line
    pub async fn load(
        &self,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<(RdepToml, Vec<ConfigSource>)> {
        let mut sources = Vec::new();

        let global = self.load_global_config().await?.map(|(config, source)| {
            sources.push(source);
            config
        });
        let project = self.load_project_config().await?.map(|(config, source)| {
            sources.push(source);
            config
        });

        for source in &sources {
            debug!(path = %source.path(), "loaded configuration file");
        }

        let merged = ConfigLayering::merge_configs(global, project, env_overrides, cli_overrides)?;
        Ok((merged, sources))
    }
}

impl ConfigLayering {
    /// Merge multiple configuration layers
    pub fn merge_configs(
        global_config: Option<RdepToml>,
        project_config: Option<RdepToml>,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<RdepToml> {
        let mut merged = global_config.unwrap_or_default();

        // Project settings win over global ones
        if let Some(project) = project_config {
            merged.overlay(project);
        }

        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // CLI flags have the highest priority
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        crate::toml::validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut RdepToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "RDEP_PACKAGES" => Self::apply(config, "packages", value, key)?,
                "RDEP_MISSING_VERSION" => Self::apply(config, "missing-version", value, key)?,
                "RDEP_REVISIT" => Self::apply(config, "revisit", value, key)?,
                "RDEP_SELECT" => Self::apply(config, "select", value, key)?,
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        config: &mut RdepToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            Self::apply(config, key, value, &format!("--{}", key))?;
        }

        Ok(())
    }

    /// Set one named setting from its string form; `origin` names the flag
    /// or variable in error messages
    fn apply(config: &mut RdepToml, key: &str, value: &str, origin: &str) -> ConfigResult<()> {
        let annotate = |e: RdepError| match e {
            RdepError::ConfigValidation { reason, .. } => RdepError::ConfigValidation {
                field: origin.to_string(),
                reason,
            },
            other => other,
        };

        match key {
            "packages" => config.repository.packages = Some(value.to_string()),
            "missing-version" => {
                config.parser.missing_version = Some(value.parse().map_err(annotate)?)
            }
            "revisit" => config.resolver.revisit = Some(value.parse().map_err(annotate)?),
            "select" => config.resolver.select = Some(value.parse().map_err(annotate)?),
            _ => {
                // Unknown override, ignore
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn default_global_path() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    let home = Utf8PathBuf::try_from(home).ok()?;
    Some(home.join(".rdep").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdep_repo::MissingVersion;
    use rdep_resolver::{RevisitPolicy, Selection};
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[tokio::test]
    async fn test_resolve_config_path_walks_up() {
        let (_guard, root) = temp_root();
        let nested = root.join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(root.join(CONFIG_FILE), "[parser]\nskip = [\"R\"]\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(nested).with_global_path(None);
        assert_eq!(
            loader.resolve_config_path(CONFIG_FILE),
            Some(root.join(CONFIG_FILE))
        );

        let (config, source) = loader.load_project_config().await.unwrap().unwrap();
        assert_eq!(config.parser.skip, Some(vec!["R".to_string()]));
        assert_eq!(source, ConfigSource::Project(root.join(CONFIG_FILE)));
    }

    #[tokio::test]
    async fn test_no_config_files() {
        let (_guard, root) = temp_root();
        let loader = ConfigLoader::new(root.clone()).with_global_path(Some(root.join("absent.toml")));

        assert!(loader.load_project_config().await.unwrap().is_none());
        assert!(loader.load_global_config().await.unwrap().is_none());

        let (config, sources) = loader.load(HashMap::new(), HashMap::new()).await.unwrap();
        assert_eq!(config, RdepToml::default());
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_load_all_layers() {
        let (_guard, root) = temp_root();
        let global = root.join("global.toml");
        tokio::fs::write(
            &global,
            "[repository]\npackages = \"/srv/PACKAGES\"\n[resolver]\nselect = \"lowest\"\n",
        )
        .await
        .unwrap();
        tokio::fs::write(root.join(CONFIG_FILE), "[resolver]\nrevisit = \"skip-visited\"\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(root.clone()).with_global_path(Some(global.clone()));
        let env = HashMap::from([("RDEP_SELECT".to_string(), "highest".to_string())]);
        let (config, sources) = loader.load(env, HashMap::new()).await.unwrap();

        assert_eq!(config.packages_path(), "/srv/PACKAGES");
        assert_eq!(config.revisit_policy(), RevisitPolicy::SkipVisited);
        assert_eq!(config.selection(), Selection::Highest);
        assert_eq!(
            sources,
            vec![
                ConfigSource::Global(global),
                ConfigSource::Project(root.join(CONFIG_FILE))
            ]
        );
    }

    #[tokio::test]
    async fn test_broken_project_file_is_an_error() {
        let (_guard, root) = temp_root();
        tokio::fs::write(root.join(CONFIG_FILE), "[parser\n").await.unwrap();

        let loader = ConfigLoader::new(root).with_global_path(None);
        let err = loader.load_project_config().await.unwrap_err();
        match err {
            RdepError::TomlParse { message, .. } => assert!(message.contains(CONFIG_FILE)),
            other => panic!("expected TomlParse, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_configs() {
        let global = crate::toml::parse_rdep_toml(
            "[repository]\npackages = \"global\"\n[parser]\nskip = [\"R\"]\n",
        )
        .unwrap();
        let project =
            crate::toml::parse_rdep_toml("[repository]\npackages = \"project\"\n").unwrap();

        let env_overrides = HashMap::from([
            ("RDEP_MISSING_VERSION".to_string(), "assume-zero".to_string()),
            ("RDEP_UNRELATED".to_string(), "ignored".to_string()),
        ]);
        let cli_overrides = HashMap::from([("packages".to_string(), "cli".to_string())]);

        let merged =
            ConfigLayering::merge_configs(Some(global), Some(project), env_overrides, cli_overrides)
                .unwrap();

        // CLI beats project beats global
        assert_eq!(merged.packages_path(), "cli");
        // Global settings not overridden survive
        assert_eq!(merged.parser.skip, Some(vec!["R".to_string()]));
        assert_eq!(merged.parser.missing_version, Some(MissingVersion::AssumeZero));
    }

    #[test]
    fn test_invalid_override_names_its_origin() {
        let env = HashMap::from([("RDEP_REVISIT".to_string(), "never".to_string())]);
        let err = ConfigLayering::merge_configs(None, None, env, HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            RdepError::ConfigValidation { ref field, .. } if field == "RDEP_REVISIT"
        ));

        let cli = HashMap::from([("select".to_string(), "newest".to_string())]);
        let err = ConfigLayering::merge_configs(None, None, HashMap::new(), cli).unwrap_err();
        assert!(matches!(
            err,
            RdepError::ConfigValidation { ref field, .. } if field == "--select"
        ));
    }

    #[test]
    fn test_collect_env_overrides() {
        std::env::set_var("RDEP_TEST_COLLECT", "1");
        std::env::set_var("NOT_RDEP_TEST_COLLECT", "ignored");

        let overrides = ConfigLayering::collect_env_overrides();

        assert!(overrides.contains_key("RDEP_TEST_COLLECT"));
        assert!(!overrides.contains_key("NOT_RDEP_TEST_COLLECT"));

        std::env::remove_var("RDEP_TEST_COLLECT");
        std::env::remove_var("NOT_RDEP_TEST_COLLECT");
    }
}
