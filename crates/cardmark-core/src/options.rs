use serde::Deserialize;
use url::Url;

use crate::error::OptionsError;

pub const DEFAULT_CARD_PROXY: &str = "https://card.zenn.dev/";
pub const DEFAULT_TRUSTED_HOST: &str = "zenn.dev";

/// Rendering switches. Every field has a default, so partial configs are fine.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOptions {
    /// Render soft line breaks as `<br>`.
    pub breaks: bool,
    /// Turn bare URLs and e-mail addresses into links.
    pub linkify: bool,
    /// Promote standalone bare URLs into embeds.
    pub embeds: bool,
    /// Base URL of the link-card iframe; the encoded href is appended as `url=`.
    pub card_proxy: String,
    /// Host whose links open in a new tab without `rel` restrictions.
    pub trusted_host: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            linkify: true,
            embeds: true,
            card_proxy: DEFAULT_CARD_PROXY.to_string(),
            trusted_host: DEFAULT_TRUSTED_HOST.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        let proxy = Url::parse(&self.card_proxy).map_err(|source| {
            OptionsError::InvalidCardProxy {
                value: self.card_proxy.clone(),
                source,
            }
        })?;
        if !matches!(proxy.scheme(), "http" | "https") {
            return Err(OptionsError::CardProxyScheme(proxy.scheme().to_string()));
        }
        if self.trusted_host.trim().is_empty() {
            return Err(OptionsError::EmptyTrustedHost);
        }
        Ok(())
    }

    /// The `src` of a card iframe for an already-encoded href. A proxy that
    /// carries its own query gets `url` appended to it.
    pub(crate) fn card_src(&self, encoded_href: &str) -> String {
        let has_query = Url::parse(&self.card_proxy).is_ok_and(|proxy| proxy.query().is_some());
        let separator = if has_query { '&' } else { '?' };
        format!("{}{}url={}", self.card_proxy, separator, encoded_href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(RenderOptions::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options: RenderOptions =
            serde_json::from_str(r#"{ "breaks": false }"#).expect("deserialize");
        assert!(!options.breaks);
        assert!(options.linkify);
        assert_eq!(options.card_proxy, DEFAULT_CARD_PROXY);
    }

    #[test]
    fn rejects_non_http_proxy() {
        let options = RenderOptions {
            card_proxy: "ftp://cards.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            options.validate(),
            Err(OptionsError::CardProxyScheme("ftp".to_string()))
        );
    }

    #[test]
    fn rejects_unparseable_proxy() {
        let options = RenderOptions {
            card_proxy: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::InvalidCardProxy { .. })
        ));
    }

    #[test]
    fn card_src_joins_an_existing_query() {
        let options = RenderOptions {
            card_proxy: "https://cards.example.org/?v=2".to_string(),
            ..Default::default()
        };
        assert_eq!(
            options.card_src("https%3A%2F%2Fexample.com"),
            "https://cards.example.org/?v=2&url=https%3A%2F%2Fexample.com"
        );
        assert_eq!(
            RenderOptions::default().card_src("x"),
            "https://card.zenn.dev/?url=x"
        );
    }

    #[test]
    fn rejects_blank_trusted_host() {
        let options = RenderOptions {
            trusted_host: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::EmptyTrustedHost));
    }
}
