use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration as StdDuration,
};

use chrono::{Duration, Utc};

use config::{Config as ConfigLoader, Environment};
use is_terminal::IsTerminal;
use once_cell::sync::Lazy;
use serde::Deserialize;

const PREFIX: &str = "TOKENGATE";

pub static CONFIG: Lazy<Config> = Lazy::new(|| init_config());

#[derive(Debug)]
pub enum LogStyle {
    Auto,
    Always,
    Never,
}

impl Default for LogStyle {
    fn default() -> Self {
        Self::Auto
    }
}

impl LogStyle {
    pub fn is_color(&self) -> bool {
        match self {
            LogStyle::Auto => std::io::stdout().is_terminal(),
            LogStyle::Always => true,
            LogStyle::Never => false,
        }
    }
}

impl<'de> Deserialize<'de> for LogStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?.to_lowercase();
        match s.as_str() {
            "auto" => Ok(LogStyle::Auto),
            "always" => Ok(LogStyle::Always),
            "never" => Ok(LogStyle::Never),
            _ => Err(serde::de::Error::unknown_field(
                &s,
                &["auto", "always", "never"],
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Log {
    pub level: String,
    pub style: LogStyle,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: Self::level(),
            style: LogStyle::default(),
        }
    }
}

impl Log {
    fn level() -> String {
        String::from("tokengate=info")
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Auth {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_ttl_seconds: u64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: String::from("HS256"),
            access_token_ttl_seconds: 900,
        }
    }
}

impl Auth {
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_key.is_empty() {
            return Err("authentication secret key must be set".into());
        }
        self.access_token_ttl()?;
        crate::auth::parse_algorithm(&self.algorithm).map(|_| ())
    }

    /// Rejects zero and any ttl that would push a token's expiry out of range.
    pub fn access_token_ttl(&self) -> Result<Duration, String> {
        if self.access_token_ttl_seconds == 0 {
            return Err("access token ttl must be greater than zero".into());
        }
        let ttl = Duration::from_std(StdDuration::from_secs(self.access_token_ttl_seconds))
            .map_err(|err| format!("invalid access token ttl: {err}"))?;
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err("access token ttl is out of range".into());
        }
        Ok(ttl)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("secret_key_set", &!self.secret_key.is_empty())
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .finish()
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub log: Log,
    pub addr: SocketAddr,
    pub database_url: String,
    pub debug: bool,
    pub auth: Auth,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log: Log::default(),
            addr: Self::addr(),
            database_url: Self::database_url(),
            debug: true,
            auth: Auth::default(),
        }
    }
}

impl Config {
    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 3030)
    }

    fn database_url() -> String {
        String::from("data/tokengate.db")
    }
}

pub fn init_config() -> Config {
    let config = ConfigLoader::builder()
        .add_source(
            Environment::with_prefix(PREFIX)
                .separator("_")
                .try_parsing(true),
        )
        .add_source(
            Environment::with_prefix(PREFIX)
                .separator("__")
                .prefix_separator("_")
                .try_parsing(true),
        )
        .build()
        .and_then(|cfg| cfg.try_deserialize::<Config>());

    match config {
        Ok(config) => {
            if let Err(err) = config.auth.validate() {
                panic!("{}", err);
            }
            println!("{:#?}", config);
            config
        }
        Err(err) => {
            panic!("{:?}", err);
        }
    }
}
