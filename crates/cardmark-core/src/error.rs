use thiserror::Error;

/// Why an href could not be treated as an absolute web destination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HrefError {
    #[error("href is site-relative or a fragment")]
    Relative,
    #[error("href `{href}` is not a valid URL: {source}")]
    Unparseable {
        href: String,
        #[source]
        source: url::ParseError,
    },
    #[error("scheme `{0}` is not http or https")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("card proxy `{value}` is not a valid URL: {source}")]
    InvalidCardProxy {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("card proxy must use http or https, got `{0}`")]
    CardProxyScheme(String),
    #[error("trusted host must not be empty")]
    EmptyTrustedHost,
}
