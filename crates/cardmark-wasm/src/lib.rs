use cardmark_core::{RenderOptions, Renderer, markdown_to_html};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = renderHtml)]
pub fn render_html(source: &str) -> String {
    markdown_to_html(source)
}

/// `options` is a plain object with any of `breaks`, `linkify`, `embeds`,
/// `cardProxy` and `trustedHost`; `null`/`undefined` means defaults.
#[wasm_bindgen(js_name = renderHtmlWithOptions)]
pub fn render_html_with_options(source: &str, options: JsValue) -> Result<String, JsValue> {
    let renderer = renderer_from_js(options)?;
    Ok(renderer.render(source))
}

fn renderer_from_js(value: JsValue) -> Result<Renderer, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(Renderer::default());
    }
    let options: RenderOptions =
        serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    Renderer::new(options).map_err(|err| JsValue::from_str(&err.to_string()))
}
