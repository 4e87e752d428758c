//! Configuration readable from a config file.
//!
//! All settings have defaults matching a stock Plan 9 installation, so the
//! file is optional. Command line options take precedence over it.
//!
//! ```toml
//! mount_point = "~/mnt/factotum"
//! key_helpers = ["/boot/factotum", "factotum"]
//! prompt = true
//! max_key_retries = 3
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::key::{HelperKeyResolver, DEFAULT_KEY_HELPERS};
use crate::rpc::Limits;
use crate::transport::DEFAULT_MOUNT_POINT;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactotumConfig {
    /// where the factotum file system is mounted
    pub mount_point: PathBuf,

    /// programs run (with `-g attrs`) to prompt for missing keys, first match wins
    pub key_helpers: Vec<PathBuf>,

    /// whether missing keys are prompted for at all
    pub prompt: bool,

    /// give up after asking for a key this many times during one call
    pub max_key_retries: Option<usize>,

    /// give up after this many rounds of a proxied conversation
    pub max_rounds: Option<usize>,

    /// path to the file which provided this configuration
    ///
    /// This item is of course not read from the TOML but is added by the algorithm that parses
    /// the config file.
    #[serde(skip)]
    pub config_file_path: PathBuf,
}

impl Default for FactotumConfig {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            key_helpers: DEFAULT_KEY_HELPERS.iter().map(PathBuf::from).collect(),
            prompt: true,
            max_key_retries: None,
            max_rounds: None,
            config_file_path: PathBuf::new(),
        }
    }
}

impl FactotumConfig {
    /// load configuration from a TOML file
    ///
    /// NOTE: no validation is conducted, e.g. the mount point is not checked for existence.
    pub fn load<P: AsRef<Path>>(p: P) -> anyhow::Result<Self> {
        let p = p.as_ref();
        let raw = fs::read_to_string(p)
            .with_context(|| format!("could not read config file {}", p.display()))?;
        let mut config: Self =
            toml::from_str(&raw).with_context(|| format!("invalid config file {}", p.display()))?;

        // resolve `~`
        use util::resolve_path_with_tilde;
        resolve_path_with_tilde(&mut config.mount_point)?;
        for helper in config.key_helpers.iter_mut() {
            resolve_path_with_tilde(helper)?;
        }

        config.config_file_path = p.to_owned();
        Ok(config)
    }

    /// Write a config to a file
    pub fn store<P: AsRef<Path>>(&self, p: P) -> anyhow::Result<()> {
        let serialized_config = toml::to_string_pretty(&self)?;
        fs::write(p, serialized_config)?;
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_key_retries: self.max_key_retries,
            max_rounds: self.max_rounds,
        }
    }

    /// The key resolver described by this configuration, if prompting is enabled
    pub fn key_resolver(&self) -> Option<HelperKeyResolver> {
        self.prompt
            .then(|| HelperKeyResolver::new(self.key_helpers.clone()))
    }
}

pub mod util {
    use std::path::PathBuf;

    use anyhow::Context;

    /// takes a path that can potentially start with a `~` and resolves that `~` to the user's home directory
    ///
    /// ## Example
    /// ```
    /// use factotum::config::util::resolve_path_with_tilde;
    /// std::env::set_var("HOME","/home/dummy");
    /// let mut path = std::path::PathBuf::from("~/mnt/factotum");
    /// resolve_path_with_tilde(&mut path).unwrap();
    /// assert!(path == std::path::PathBuf::from("/home/dummy/mnt/factotum"));
    /// ```
    pub fn resolve_path_with_tilde(path: &mut PathBuf) -> anyhow::Result<()> {
        if let Some(first_segment) = path.iter().next() {
            if !path.has_root() && first_segment == "~" {
                let home_dir = home::home_dir()
                    .context("config file contains \"~\" but can not determine home directory")?;
                let orig_path = path.clone();
                path.clear();
                path.push(home_dir);
                for segment in orig_path.iter().skip(1) {
                    path.push(segment);
                }
            }
        }
        Ok(())
    }

}
