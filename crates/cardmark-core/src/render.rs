use crate::emit::emit_html;
use crate::error::OptionsError;
use crate::options::RenderOptions;
use crate::parser::parse;
use crate::resolver::resolve;

/// A configured markdown-to-HTML pipeline.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parses, resolves and serializes `text`.
    ///
    /// Empty input comes back unchanged; input with no blocks renders to an
    /// empty string.
    pub fn render(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let _span = tracing::debug_span!("render", len = text.len()).entered();

        let document = parse(text, &self.options);
        if document.is_empty() {
            return String::new();
        }
        let document = resolve(document, &self.options);
        let html = emit_html(&document, &self.options);
        tracing::trace!(bytes = html.len(), "rendered html");
        html
    }
}

/// Renders with default options.
pub fn markdown_to_html(text: &str) -> String {
    Renderer::default().render(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_options() {
        let options = RenderOptions {
            card_proxy: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Renderer::new(options),
            Err(OptionsError::InvalidCardProxy { .. })
        ));
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(markdown_to_html(""), "");
        assert_eq!(markdown_to_html("\n\n  \n"), "");
    }

    #[test]
    fn plain_paragraph() {
        assert_eq!(markdown_to_html("hello"), "<p>hello</p>\n");
    }
}
