//! Obtaining missing keys and managing keys through the control file.

use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use log::{debug, warn};

use crate::transport::{Endpoint, Transport, CTL_FILE};
use crate::FactotumError;

#[derive(thiserror::Error, Debug)]
pub enum GetKeyError {
    #[error("no key helper program found")]
    HelperNotFound,
    #[error("could not run key helper")]
    Spawn(#[source] io::Error),
    #[error("key helper failed: {0}")]
    HelperFailed(ExitStatus),
    #[error("key declined: {0}")]
    Declined(String),
}

/// Strategy used when factotum reports a missing or incomplete key.
///
/// `attrs` is the attribute-value list describing the key factotum is looking
/// for. Returning `Ok(())` means a key was (hopefully) installed and the rpc
/// call should be retried.
pub trait KeyResolver {
    fn get_key(&mut self, attrs: &str) -> Result<(), GetKeyError>;
}

impl<F> KeyResolver for F
where
    F: FnMut(&str) -> Result<(), GetKeyError>,
{
    fn get_key(&mut self, attrs: &str) -> Result<(), GetKeyError> {
        self(attrs)
    }
}

/// Helper locations tried by [HelperKeyResolver::default]
pub const DEFAULT_KEY_HELPERS: [&str; 2] = ["/boot/factotum", "factotum"];

/// Prompts for the key by running `factotum -g attrs`.
///
/// Candidates are tried in order; a candidate given as an absolute path is
/// skipped when no such file exists. The last candidate is always run and
/// may be a bare name looked up in `PATH`.
#[derive(Debug, Clone)]
pub struct HelperKeyResolver {
    helpers: Vec<PathBuf>,
}

impl Default for HelperKeyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_HELPERS.iter().map(PathBuf::from).collect())
    }
}

impl HelperKeyResolver {
    pub fn new(helpers: Vec<PathBuf>) -> Self {
        Self { helpers }
    }

    pub fn helpers(&self) -> &[PathBuf] {
        &self.helpers
    }

    /// The helper that will be run
    pub fn helper(&self) -> Option<&PathBuf> {
        let (last, rest) = self.helpers.split_last()?;
        Some(
            rest.iter()
                .find(|p| !p.is_absolute() || p.is_file())
                .unwrap_or(last),
        )
    }
}

impl KeyResolver for HelperKeyResolver {
    fn get_key(&mut self, attrs: &str) -> Result<(), GetKeyError> {
        let helper = self.helper().ok_or(GetKeyError::HelperNotFound)?;
        debug!("running key helper {} -g {attrs}", helper.display());

        let status = match Command::new(helper).arg("-g").arg(attrs).status() {
            Ok(status) => status,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("key helper {} not found", helper.display());
                return Err(GetKeyError::HelperNotFound);
            }
            Err(e) => return Err(GetKeyError::Spawn(e)),
        };

        match status.success() {
            true => Ok(()),
            false => Err(GetKeyError::HelperFailed(status)),
        }
    }
}

/// The control file of factotum.
///
/// Writes are forwarded verbatim; factotum parses the attribute list.
#[derive(Debug)]
pub struct Control<E: Endpoint> {
    endpoint: E,
}

impl<E: Endpoint> Control<E> {
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }

    pub fn open<T>(transport: &T) -> Result<Self, FactotumError>
    where
        T: Transport<Endpoint = E>,
    {
        Ok(Self::new(transport.open(CTL_FILE)?))
    }

    /// Installs the key described by `attrs`
    pub fn add_key(&mut self, attrs: &str) -> Result<(), FactotumError> {
        self.command("key", attrs)
    }

    /// Deletes the keys matching `attrs`
    pub fn delete_key(&mut self, attrs: &str) -> Result<(), FactotumError> {
        self.command("delkey", attrs)
    }

    fn command(&mut self, verb: &str, attrs: &str) -> Result<(), FactotumError> {
        debug!("factotum ctl: {verb}");
        let msg = format!("{verb} {attrs}");
        self.endpoint.send_msg(msg.as_bytes())?;
        Ok(())
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils::RecordingEndpoint;

    #[test]
    fn control_forwards_commands() {
        let mut ctl = Control::new(RecordingEndpoint::default());
        ctl.add_key("proto=pass dom=example.com user=glenda !password=x")
            .unwrap();
        ctl.delete_key("proto=pass dom=example.com").unwrap();
        assert_eq!(
            ctl.endpoint().sent,
            vec![
                b"key proto=pass dom=example.com user=glenda !password=x".to_vec(),
                b"delkey proto=pass dom=example.com".to_vec(),
            ]
        );
    }

    #[test]
    fn closures_resolve_keys() {
        let mut seen = Vec::new();
        let mut resolver = |attrs: &str| -> Result<(), GetKeyError> {
            seen.push(attrs.to_owned());
            Ok(())
        };
        resolver.get_key("proto=pass").unwrap();
        assert_eq!(seen, ["proto=pass"]);
    }

    #[test]
    fn helper_selection() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("factotum");
        std::fs::write(&present, b"").unwrap();
        let missing = dir.path().join("missing");

        let resolver = HelperKeyResolver::new(vec![missing.clone(), present.clone()]);
        assert_eq!(resolver.helper(), Some(&present));

        let resolver = HelperKeyResolver::new(vec![present.clone(), missing.clone()]);
        assert_eq!(resolver.helper(), Some(&present));

        let resolver =
            HelperKeyResolver::new(vec![missing.clone(), PathBuf::from("factotum")]);
        assert_eq!(resolver.helper(), Some(&PathBuf::from("factotum")));

        assert_eq!(HelperKeyResolver::new(vec![]).helper(), None);
    }

    #[test]
    fn missing_helper_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = HelperKeyResolver::new(vec![dir.path().join("no-such-helper")]);
        assert!(matches!(
            resolver.get_key("proto=pass"),
            Err(GetKeyError::HelperNotFound)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn helper_exit_status_is_checked() {
        let mut ok = HelperKeyResolver::new(vec![PathBuf::from("true")]);
        assert!(ok.get_key("proto=pass").is_ok());

        let mut failing = HelperKeyResolver::new(vec![PathBuf::from("false")]);
        assert!(matches!(
            failing.get_key("proto=pass"),
            Err(GetKeyError::HelperFailed(_))
        ));
    }
}
