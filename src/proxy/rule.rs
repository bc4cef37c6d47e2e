//! Compiled proxy rules.

use axum::http::uri::{Authority, Scheme};
use serde::Serialize;
use url::Url;

use crate::config::ProxyRuleConfig;
use crate::routing::{Matcher, PathPrefixMatcher};

/// Why a target origin was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("scheme '{0}' is not supported, use http")]
    Scheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid authority '{0}'")]
    Authority(String),

    #[error("'{0}' is not a bare origin, drop the path, query and fragment")]
    NotAnOrigin(String),
}

/// Parse and check a proxy target origin.
pub fn parse_target_origin(raw: &str) -> Result<Url, TargetError> {
    let url = Url::parse(raw)?;
    if url.scheme() != "http" {
        return Err(TargetError::Scheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(TargetError::MissingHost);
    }
    // Requests keep their own path, so the target may only name the server.
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(TargetError::NotAnOrigin(raw.to_string()));
    }
    Ok(url)
}

/// A reverse proxy rule ready to serve requests.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyRule {
    #[serde(rename = "match_prefix", serialize_with = "serialize_matcher")]
    matcher: PathPrefixMatcher,
    target_origin: Url,
    #[serde(skip)]
    authority: Authority,
    change_origin: bool,
    xfwd: bool,
}

fn serialize_matcher<S: serde::Serializer>(
    matcher: &PathPrefixMatcher,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(matcher.prefix())
}

impl ProxyRule {
    /// Create a rule forwarding `match_prefix` to `target_origin`.
    pub fn new(
        match_prefix: impl Into<String>,
        target_origin: &str,
        change_origin: bool,
    ) -> Result<Self, TargetError> {
        let target_origin = parse_target_origin(target_origin)?;
        let host = target_origin.host_str().ok_or(TargetError::MissingHost)?;
        let authority_str = match target_origin.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = authority_str
            .parse::<Authority>()
            .map_err(|_| TargetError::Authority(authority_str.clone()))?;

        Ok(Self {
            matcher: PathPrefixMatcher::new(match_prefix),
            target_origin,
            authority,
            change_origin,
            xfwd: false,
        })
    }

    pub fn from_config(config: &ProxyRuleConfig) -> Result<Self, TargetError> {
        let mut rule = Self::new(
            config.match_prefix.clone(),
            &config.target_origin,
            config.change_origin,
        )?;
        rule.xfwd = config.xfwd;
        Ok(rule)
    }

    pub fn with_xfwd(mut self, xfwd: bool) -> Self {
        self.xfwd = xfwd;
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    pub fn match_prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target_origin(&self) -> &Url {
        &self.target_origin
    }

    /// Target `host[:port]`, used for the URI and a rewritten Host header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn scheme(&self) -> Scheme {
        Scheme::HTTP
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn xfwd(&self) -> bool {
        self.xfwd
    }
}

/// Ordered set of proxy rules.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProxyRules {
    rules: Vec<ProxyRule>,
}

impl ProxyRules {
    pub fn new(rules: Vec<ProxyRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(configs: &[ProxyRuleConfig]) -> Result<Self, TargetError> {
        let rules = configs
            .iter()
            .map(ProxyRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First rule, in declared order, whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
