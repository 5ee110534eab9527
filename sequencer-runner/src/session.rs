// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-wide context shared by every test in a run.
//!
//! The context holds the platform and object-storage credentials along with the names of the
//! shared space and bucket that tests operate on. It is loaded once, before any test runs, and is
//! read-only afterwards.

use crate::{
    errors::{SessionContextError, WriteOutputError},
    output_format::{OutputFormat, Styles},
};
use camino::Utf8Path;
use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::{fmt, io};
use tracing::debug;

/// The prefix for environment variables that override credential values.
///
/// For example, `SEQUENCER_PLATFORM__URL` overrides `platform.url`.
pub const ENV_PREFIX: &str = "SEQUENCER";

/// The environment variable that overrides the space name.
pub const SPACE_NAME_ENV: &str = "SPACE_NAME";

/// The environment variable that overrides the bucket name.
pub const BUCKET_NAME_ENV: &str = "BUCKET_NAME";

/// The space name used if none is configured.
pub const DEFAULT_SPACE_NAME: &str = "regression_tests_sdk_space";

/// The bucket name used if none is configured.
pub const DEFAULT_BUCKET_NAME: &str = "prompt-tuning-sdk-tests";

const REDACTED: &str = "<redacted>";

/// Read-only context for a test session.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionContext {
    platform: PlatformCredentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    cos: Option<CosCredentials>,
    space_name: String,
    bucket_name: String,
    default_scope: DefaultScope,
}

impl SessionContext {
    /// Loads the session context from `credentials_file`, with overrides from the process
    /// environment.
    pub fn from_file(credentials_file: &Utf8Path) -> Result<Self, SessionContextError> {
        Self::from_sources(credentials_file, std::env::vars())
    }

    /// Loads the session context from `credentials_file`, with overrides from `env`.
    pub fn from_sources(
        credentials_file: &Utf8Path,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, SessionContextError> {
        let env: Map<String, String> = env.into_iter().collect();
        let load_err = |err: ConfigError| SessionContextError::Load {
            credentials_file: credentials_file.to_owned(),
            err: Box::new(err),
        };

        let config = Config::builder()
            .set_default("space_name", DEFAULT_SPACE_NAME)
            .map_err(load_err)?
            .set_default("bucket_name", DEFAULT_BUCKET_NAME)
            .map_err(load_err)?
            .add_source(File::new(credentials_file.as_str(), FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env.clone())),
            )
            .set_override_option("space_name", env.get(SPACE_NAME_ENV).cloned())
            .map_err(load_err)?
            .set_override_option("bucket_name", env.get(BUCKET_NAME_ENV).cloned())
            .map_err(load_err)?
            .build()
            .map_err(load_err)?;

        let deserialized: SessionContextDeserialize =
            config.try_deserialize().map_err(load_err)?;
        let context = deserialized.validate(credentials_file)?;

        debug!(
            %credentials_file,
            scope = %context.default_scope,
            space_name = %context.space_name,
            has_cos = context.cos.is_some(),
            "loaded session context",
        );
        Ok(context)
    }

    /// Returns the platform credentials.
    pub fn platform(&self) -> &PlatformCredentials {
        &self.platform
    }

    /// Returns the object storage credentials, if configured.
    pub fn cos(&self) -> Option<&CosCredentials> {
        self.cos.as_ref()
    }

    /// Returns the name of the shared space.
    pub fn space_name(&self) -> &str {
        &self.space_name
    }

    /// Returns the name of the shared bucket.
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Returns whether work targets the space or the project.
    pub fn default_scope(&self) -> DefaultScope {
        self.default_scope
    }

    /// Returns the configured ID for the default scope.
    ///
    /// For [`DefaultScope::Space`] this may be `None`, in which case the space is looked up by
    /// [`space_name`](Self::space_name).
    pub fn scope_id(&self) -> Option<&str> {
        match self.default_scope {
            DefaultScope::Space => self.platform.space_id.as_deref(),
            DefaultScope::Project => self.platform.project_id.as_deref(),
        }
    }

    /// Outputs this context in the given format to the given writer. Secrets are redacted.
    pub fn write(
        &self,
        output_format: OutputFormat,
        mut writer: impl io::Write,
        colorize: bool,
    ) -> Result<(), WriteOutputError> {
        match output_format {
            OutputFormat::Human { verbose } => self
                .write_human(&mut writer, verbose, colorize)
                .map_err(WriteOutputError::Io),
            OutputFormat::Serializable(format) => format
                .to_writer(self, &mut writer)
                .map_err(WriteOutputError::Json),
        }
    }

    fn write_human(
        &self,
        mut writer: impl io::Write,
        verbose: bool,
        colorize: bool,
    ) -> io::Result<()> {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }

        let field = |name: &'static str| styles.field.style(name);
        let platform = &self.platform;

        writeln!(writer, "{} {}", field("platform url:"), platform.url)?;
        writeln!(writer, "{} {}", field("auth:"), platform.auth)?;
        writeln!(writer, "{} {}", field("default scope:"), self.default_scope)?;
        writeln!(
            writer,
            "{} {}",
            field("scope id:"),
            self.scope_id().unwrap_or("(resolved by name)")
        )?;
        writeln!(writer, "{} {}", field("space name:"), self.space_name)?;
        writeln!(writer, "{} {}", field("bucket name:"), self.bucket_name)?;

        if verbose {
            if let Some(instance_id) = &platform.instance_id {
                writeln!(writer, "{} {instance_id}", field("instance id:"))?;
            }
            if let Some(version) = &platform.version {
                writeln!(writer, "{} {version}", field("version:"))?;
            }
        }

        match &self.cos {
            Some(cos) => {
                writeln!(writer, "{} {}", field("cos endpoint:"), cos.endpoint_url)?;
                if verbose {
                    writeln!(
                        writer,
                        "{} {}",
                        field("cos resource instance id:"),
                        cos.resource_instance_id
                    )?;
                    writeln!(
                        writer,
                        "{} {}",
                        field("cos hmac keys:"),
                        if cos.has_hmac_keys() { REDACTED } else { "(none)" }
                    )?;
                }
            }
            None => writeln!(writer, "{} (not configured)", field("cos:"))?,
        }

        Ok(())
    }
}

/// Whether work targets a deployment space or a project.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultScope {
    /// Work targets the shared space.
    #[default]
    Space,

    /// Work targets the project.
    Project,
}

impl fmt::Display for DefaultScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultScope::Space => write!(f, "space"),
            DefaultScope::Project => write!(f, "project"),
        }
    }
}

/// Credentials for the remote platform.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformCredentials {
    url: String,
    auth: PlatformAuth,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    space_id: Option<String>,
}

impl PlatformCredentials {
    /// Returns the platform URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns how to authenticate against the platform.
    pub fn auth(&self) -> &PlatformAuth {
        &self.auth
    }

    /// Returns the service instance ID, if any.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// Returns the platform version, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the project ID, if any.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Returns the space ID, if any.
    pub fn space_id(&self) -> Option<&str> {
        self.space_id.as_deref()
    }
}

/// How to authenticate against the platform.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum PlatformAuth {
    /// An API key.
    ApiKey {
        /// The key.
        apikey: Secret,
    },

    /// A username and password.
    Password {
        /// The username.
        username: String,

        /// The password.
        password: Secret,
    },
}

impl fmt::Display for PlatformAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformAuth::ApiKey { apikey } => write!(f, "api key {apikey}"),
            PlatformAuth::Password { username, password } => {
                write!(f, "user {username}, password {password}")
            }
        }
    }
}

/// Credentials for cloud object storage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CosCredentials {
    endpoint_url: String,
    resource_instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    apikey: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_key_id: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_access_key: Option<Secret>,
}

impl CosCredentials {
    /// Returns the storage endpoint URL.
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Returns the storage resource instance ID.
    pub fn resource_instance_id(&self) -> &str {
        &self.resource_instance_id
    }

    /// Returns the storage API key, if any.
    pub fn apikey(&self) -> Option<&Secret> {
        self.apikey.as_ref()
    }

    /// Returns the HMAC access key ID and secret access key, if both are configured.
    pub fn hmac_keys(&self) -> Option<(&Secret, &Secret)> {
        self.access_key_id.as_ref().zip(self.secret_access_key.as_ref())
    }

    fn has_hmac_keys(&self) -> bool {
        self.hmac_keys().is_some()
    }
}

/// A secret value. Displayed, debug-printed and serialized as `<redacted>`.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(REDACTED)
    }
}

// ---
// Deserialization
// ---

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct SessionContextDeserialize {
    #[serde(default)]
    platform: PlatformDeserialize,
    #[serde(default)]
    cos: Option<CosDeserialize>,
    space_name: String,
    bucket_name: String,
    #[serde(default)]
    default_scope: DefaultScope,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct PlatformDeserialize {
    url: Option<String>,
    apikey: Option<Secret>,
    username: Option<String>,
    password: Option<Secret>,
    instance_id: Option<String>,
    version: Option<String>,
    project_id: Option<String>,
    space_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct CosDeserialize {
    endpoint_url: Option<String>,
    resource_instance_id: Option<String>,
    apikey: Option<Secret>,
    access_key_id: Option<Secret>,
    secret_access_key: Option<Secret>,
}

impl SessionContextDeserialize {
    fn validate(self, credentials_file: &Utf8Path) -> Result<SessionContext, SessionContextError> {
        let missing = |key: &'static str| SessionContextError::MissingKey {
            credentials_file: credentials_file.to_owned(),
            key,
        };

        let Self {
            platform,
            cos,
            space_name,
            bucket_name,
            default_scope,
        } = self;

        let url = non_empty(platform.url).ok_or_else(|| missing("platform.url"))?;
        let auth = match (
            platform.apikey.filter(|s| !s.0.is_empty()),
            non_empty(platform.username),
            platform.password.filter(|s| !s.0.is_empty()),
        ) {
            (Some(apikey), _, _) => PlatformAuth::ApiKey { apikey },
            (None, Some(username), Some(password)) => PlatformAuth::Password { username, password },
            (None, Some(_), None) => return Err(missing("platform.password")),
            (None, None, _) => return Err(missing("platform.apikey")),
        };

        let project_id = non_empty(platform.project_id);
        if default_scope == DefaultScope::Project && project_id.is_none() {
            return Err(missing("platform.project_id"));
        }

        let cos = cos
            .map(|cos| {
                Ok::<_, SessionContextError>(CosCredentials {
                    endpoint_url: non_empty(cos.endpoint_url)
                        .ok_or_else(|| missing("cos.endpoint_url"))?,
                    resource_instance_id: non_empty(cos.resource_instance_id)
                        .ok_or_else(|| missing("cos.resource_instance_id"))?,
                    apikey: cos.apikey,
                    access_key_id: cos.access_key_id,
                    secret_access_key: cos.secret_access_key,
                })
            })
            .transpose()?;

        Ok(SessionContext {
            platform: PlatformCredentials {
                url,
                auth,
                instance_id: non_empty(platform.instance_id),
                version: non_empty(platform.version),
                project_id,
                space_id: non_empty(platform.space_id),
            },
            cos,
            space_name,
            bucket_name,
            default_scope,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
