//! Connection configuration for zos-client.
//!
//! Connection values are resolved from, in priority order:
//! - Command-line arguments (highest priority)
//! - Environment variables (`ZOSMF_*`)
//! - A named profile in `~/.config/zos-client/config.toml`, or a
//!   standalone profile file passed to `--profile`
//! - Built-in defaults
//!
//! [`ResolvedConnection::session`] is the only place a [`ZosmfSession`]
//! is built. A missing password is prompted for there, never stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use zosmf_sdk::{Protocol, ZosmfAuth, ZosmfConnection, ZosmfSession};

/// Environment variable naming an alternate profile file.
pub const CONFIG_PATH_ENV: &str = "ZOS_CLIENT_CONFIG";

const DEFAULT_PORT: u16 = 443;

/// Connection options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectArgs {
    /// z/OSMF host name.
    #[arg(long, global = true, env = "ZOSMF_HOST")]
    pub host: Option<String>,

    /// z/OSMF port.
    #[arg(long, global = true, env = "ZOSMF_PORT")]
    pub port: Option<u16>,

    /// User ID for basic authentication.
    #[arg(long, short = 'u', global = true, env = "ZOSMF_USER")]
    pub user: Option<String>,

    /// Password for basic authentication. Prompted for when a user is
    /// configured without one.
    #[arg(long, global = true, env = "ZOSMF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Verify the server certificate chain. Pass false for systems
    /// with self-signed certificates.
    #[arg(long, global = true, env = "ZOSMF_REJECT_UNAUTHORIZED", value_name = "BOOL")]
    pub reject_unauthorized: Option<bool>,

    /// Token cookie name, jwtToken when unset. Pass `bearer` to send
    /// the token in the Authorization header instead.
    #[arg(long, global = true, env = "ZOSMF_TOKEN_TYPE")]
    pub token_type: Option<String>,

    /// Token value from an earlier `auth login`.
    #[arg(long, global = true, env = "ZOSMF_TOKEN_VALUE", hide_env_values = true)]
    pub token_value: Option<String>,

    /// Path prefix in front of /zosmf, for gateway installations.
    #[arg(long, global = true, env = "ZOSMF_BASE_PATH")]
    pub base_path: Option<String>,

    /// http or https.
    #[arg(long, global = true, env = "ZOSMF_PROTOCOL")]
    pub protocol: Option<String>,

    /// Profile name in the config file, or a path to a profile TOML.
    #[arg(long, global = true, env = "ZOSMF_PROFILE")]
    pub profile: Option<String>,
}

/// One profile's worth of connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Profile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub reject_unauthorized: Option<bool>,
    pub token_type: Option<String>,
    pub token_value: Option<String>,
    pub base_path: Option<String>,
    pub protocol: Option<String>,
}

/// Layout of the config file: named profiles plus an optional default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfigFile {
    pub default_profile: Option<String>,
    pub profiles: BTreeMap<String, Profile>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not parse config file {}", path.display()))
    }

    /// Pick the requested profile, or the file's default when no name
    /// was given. With neither, an empty profile.
    pub fn select(&self, name: Option<&str>) -> Result<Profile> {
        let Some(name) = name.or(self.default_profile.as_deref()) else {
            return Ok(Profile::default());
        };
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| miette!("profile '{name}' is not defined in the config file"))
    }
}

/// Path of the user config file, `$ZOS_CLIENT_CONFIG` or
/// `~/.config/zos-client/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("zos-client").join("config.toml"))
}

/// Fully resolved connection settings, ready to build a session from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConnection {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub reject_unauthorized: bool,
    pub base_path: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token_type: Option<String>,
    pub token_value: Option<String>,
}

impl ConnectArgs {
    /// Resolve the connection from arguments, the selected profile,
    /// and defaults.
    pub fn resolve(&self) -> Result<ResolvedConnection> {
        let profile = self.load_profile()?;
        self.merge(&profile)
    }

    /// Load the profile the arguments point at. A `--profile` value
    /// that names an existing file is read as a standalone profile;
    /// anything else selects a named profile in the user config file.
    fn load_profile(&self) -> Result<Profile> {
        if let Some(reference) = &self.profile {
            let path = Path::new(reference);
            if path.is_file() {
                let content = std::fs::read_to_string(path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("could not read profile {}", path.display()))?;
                return toml::from_str(&content)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("could not parse profile {}", path.display()));
            }
        }
        match user_config_path() {
            Some(path) if path.is_file() => {
                ConfigFile::load(&path)?.select(self.profile.as_deref())
            }
            _ if self.profile.is_some() => Err(miette!(
                "profile '{}' was requested but no config file exists",
                self.profile.as_deref().unwrap_or_default()
            )),
            _ => Ok(Profile::default()),
        }
    }

    /// Lay arguments over profile values, then fill defaults.
    fn merge(&self, profile: &Profile) -> Result<ResolvedConnection> {
        let host = self
            .host
            .clone()
            .or_else(|| profile.host.clone())
            .ok_or_else(|| {
                miette!(
                    "no z/OSMF host configured; pass --host, set ZOSMF_HOST, \
                     or add one to a profile"
                )
            })?;
        let protocol = match self.protocol.as_deref().or(profile.protocol.as_deref()) {
            Some(raw) => raw.parse::<Protocol>()?,
            None => Protocol::Https,
        };
        Ok(ResolvedConnection {
            host,
            port: self.port.or(profile.port).unwrap_or(DEFAULT_PORT),
            protocol,
            reject_unauthorized: self
                .reject_unauthorized
                .or(profile.reject_unauthorized)
                .unwrap_or(true),
            base_path: self.base_path.clone().or_else(|| profile.base_path.clone()),
            user: self.user.clone().or_else(|| profile.user.clone()),
            password: self.password.clone().or_else(|| profile.password.clone()),
            token_type: self.token_type.clone().or_else(|| profile.token_type.clone()),
            token_value: self.token_value.clone().or_else(|| profile.token_value.clone()),
        })
    }
}

impl ResolvedConnection {
    /// Build the session every handler works through. Tokens win over
    /// basic credentials; a configured user without a password is
    /// prompted for one.
    pub fn session(&self) -> Result<ZosmfSession> {
        let connection = ZosmfConnection {
            host: self.host.clone(),
            port: self.port,
            protocol: self.protocol,
            reject_unauthorized: self.reject_unauthorized,
            base_path: self.base_path.clone(),
        };
        let auth = match (&self.token_value, &self.user) {
            (Some(token), _) => match &self.token_type {
                Some(kind) if kind.eq_ignore_ascii_case("bearer") => ZosmfAuth::Bearer {
                    token: token.clone(),
                },
                Some(kind) => ZosmfAuth::Token {
                    token_type: kind.clone(),
                    token_value: token.clone(),
                },
                None => ZosmfAuth::Token {
                    token_type: zosmf_sdk::auth::TOKEN_TYPE_JWT.to_string(),
                    token_value: token.clone(),
                },
            },
            (None, Some(user)) => {
                let password = match &self.password {
                    Some(password) => password.clone(),
                    None => prompt_password(&format!("Password for {user}: "))?,
                };
                ZosmfAuth::Basic {
                    user: user.clone(),
                    password,
                }
            }
            (None, None) => {
                tracing::debug!("no credentials configured, sending unauthenticated requests");
                ZosmfAuth::None
            }
        };
        Ok(ZosmfSession::new(connection, auth)?)
    }
}

/// Read a secret from the terminal without echoing it.
pub fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label)
        .into_diagnostic()
        .wrap_err("could not read the password from the terminal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_with(profile: Option<&str>) -> ConnectArgs {
        ConnectArgs {
            profile: profile.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_arguments_override_profile_values() {
        let args = ConnectArgs {
            host: Some("cli.example.com".to_string()),
            port: Some(1443),
            ..Default::default()
        };
        let profile = Profile {
            host: Some("profile.example.com".to_string()),
            port: Some(10443),
            user: Some("ibmuser".to_string()),
            reject_unauthorized: Some(false),
            ..Default::default()
        };
        let resolved = args.merge(&profile).unwrap();
        assert_eq!(resolved.host, "cli.example.com");
        assert_eq!(resolved.port, 1443);
        assert_eq!(resolved.user.as_deref(), Some("ibmuser"));
        assert!(!resolved.reject_unauthorized);
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let args = ConnectArgs {
            host: Some("zosmf.example.com".to_string()),
            ..Default::default()
        };
        let resolved = args.merge(&Profile::default()).unwrap();
        assert_eq!(resolved.port, 443);
        assert_eq!(resolved.protocol, Protocol::Https);
        assert!(resolved.reject_unauthorized);
        assert!(resolved.base_path.is_none());
    }

    #[test]
    fn test_missing_host_is_an_error() {
        let err = ConnectArgs::default()
            .merge(&Profile::default())
            .unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_config_file_selects_named_and_default_profiles() {
        let parsed: ConfigFile = toml::from_str(
            r#"
default-profile = "dev"

[profiles.dev]
host = "dev.example.com"
port = 10443
user = "devuser"

[profiles.prod]
host = "prod.example.com"
reject-unauthorized = true
"#,
        )
        .unwrap();
        let dev = parsed.select(None).unwrap();
        assert_eq!(dev.host.as_deref(), Some("dev.example.com"));
        assert_eq!(dev.port, Some(10443));
        let prod = parsed.select(Some("prod")).unwrap();
        assert_eq!(prod.host.as_deref(), Some("prod.example.com"));
        assert!(parsed.select(Some("missing")).is_err());
    }

    #[test]
    fn test_profile_flag_accepts_a_toml_path() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "host = \"file.example.com\"\nport = 2443").unwrap();
        let args = args_with(file.path().to_str());
        let resolved = args.resolve().unwrap();
        assert_eq!(resolved.host, "file.example.com");
        assert_eq!(resolved.port, 2443);
    }

    #[test]
    fn test_token_wins_over_basic_credentials() {
        let resolved = ResolvedConnection {
            host: "zosmf.example.com".to_string(),
            port: 443,
            user: Some("ibmuser".to_string()),
            password: Some("secret".to_string()),
            token_type: Some("LtpaToken2".to_string()),
            token_value: Some("tok".to_string()),
            ..Default::default()
        };
        let session = resolved.session().unwrap();
        assert!(matches!(session.auth(), ZosmfAuth::Token { .. }));
    }

    #[test]
    fn test_bearer_token_type_uses_authorization_header() {
        let resolved = ResolvedConnection {
            host: "gw.example.com".to_string(),
            port: 443,
            token_type: Some("bearer".to_string()),
            token_value: Some("tok".to_string()),
            ..Default::default()
        };
        let session = resolved.session().unwrap();
        assert!(matches!(session.auth(), ZosmfAuth::Bearer { .. }));
    }
}
