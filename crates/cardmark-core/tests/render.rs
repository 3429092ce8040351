use cardmark_core::{OptionsError, RenderOptions, Renderer, markdown_to_html};
use pretty_assertions::assert_eq;
use rstest::rstest;

const UNTRUSTED: &str = r#" target="_blank" rel="nofollow noopener noreferrer""#;

fn card(href: &str, encoded: &str) -> String {
    format!(
        r#"<div class="embed-zenn-link"><iframe src="https://card.zenn.dev/?url={}" frameborder="0" scrolling="no" loading="lazy"></iframe></div><a href="{}" style="display: none"{}>{}</a>"#,
        encoded, href, UNTRUSTED, href
    )
}

fn anchor(href: &str) -> String {
    format!(r#"<a href="{}"{}>{}</a>"#, href, UNTRUSTED, href)
}

#[test]
fn empty_input_is_returned_unchanged() {
    assert_eq!(markdown_to_html(""), "");
}

#[test]
fn paragraph_with_a_single_url_becomes_a_card() {
    assert_eq!(
        markdown_to_html("https://example.com"),
        format!("<p>{}</p>\n", card("https://example.com", "https%3A%2F%2Fexample.com"))
    );
}

#[test]
fn card_link_keeps_its_original_href_in_the_fallback() {
    let href = "https://example.com/path?q=a&r=b";
    let html = markdown_to_html(href);
    assert!(html.contains(
        r#"iframe src="https://card.zenn.dev/?url=https%3A%2F%2Fexample.com%2Fpath%3Fq%3Da%26r%3Db""#
    ));
    assert!(html.contains(r#"<a href="https://example.com/path?q=a&amp;r=b" style="display: none""#));
}

#[rstest]
#[case::list_item("- https://example.com\n")]
#[case::ordered_item("1. https://example.com\n")]
#[case::blockquote("> https://example.com\n")]
#[case::message(":::message\nhttps://example.com\n:::\n")]
#[case::details(":::details more\nhttps://example.com\n:::\n")]
#[case::loose_list("- a\n\n- https://example.com\n")]
fn nested_urls_stay_links(#[case] source: &str) {
    let html = markdown_to_html(source);
    assert!(!html.contains("embed-zenn-link"), "{}", html);
    assert!(html.contains(&anchor("https://example.com")), "{}", html);
}

#[test]
fn footnote_bodies_are_not_promoted() {
    let html = markdown_to_html("see[^n]\n\n[^n]: https://example.com\n");
    assert!(!html.contains("embed-zenn-link"));
    assert!(html.contains(&anchor("https://example.com")));
}

#[rstest]
#[case::inline("[https://example.com](https://example.com)")]
#[case::reference("[https://example.com][r]\n\n[r]: https://example.com")]
#[case::angle("<https://example.com>")]
fn explicit_links_are_never_promoted(#[case] source: &str) {
    let html = markdown_to_html(source);
    assert_eq!(html, format!("<p>{}</p>\n", anchor("https://example.com")));
}

#[rstest]
#[case::twitter("https://twitter.com/jack/status/20")]
#[case::x("https://x.com/jack/status/20")]
#[case::www("https://www.twitter.com/jack/status/20")]
#[case::mobile("https://mobile.twitter.com/jack/status/20")]
fn status_posts_become_tweets(#[case] href: &str) {
    let html = markdown_to_html(href);
    assert!(html.starts_with(&format!(
        r#"<p><div class="embed-tweet"><embed-tweet src="{}"></embed-tweet></div>"#,
        href
    )));
}

#[rstest]
#[case::profile("https://twitter.com/jack")]
#[case::plain_http("http://twitter.com/jack/status/20")]
#[case::lookalike("https://twitter.com.example.com/jack/status/20")]
fn other_urls_become_cards(#[case] href: &str) {
    let html = markdown_to_html(href);
    assert!(html.contains("embed-zenn-link"), "{}", html);
    assert!(!html.contains("embed-tweet"), "{}", html);
}

#[test]
fn trusted_host_is_exact() {
    assert_eq!(
        markdown_to_html("[a](https://zenn.dev/a) [b](https://zenn.dev.evil.com/) [c](https://api.zenn.dev/)"),
        "<p><a href=\"https://zenn.dev/a\" target=\"_blank\">a</a> <a href=\"https://zenn.dev.evil.com/\" target=\"_blank\" rel=\"nofollow noopener noreferrer\">b</a> <a href=\"https://api.zenn.dev/\" target=\"_blank\" rel=\"nofollow noopener noreferrer\">c</a></p>\n"
    );
}

#[test]
fn non_web_links_get_strict_attributes() {
    assert_eq!(
        markdown_to_html("[mail](mailto:me@example.com) [rel](./a)"),
        format!(
            "<p><a href=\"mailto:me@example.com\"{u}>mail</a> <a href=\"./a\"{u}>rel</a></p>\n",
            u = UNTRUSTED
        )
    );
}

#[test]
fn raw_html_is_escaped() {
    assert_eq!(
        markdown_to_html("<div>hi</div>\n\na <span>b</span><!-- c -->"),
        "<p>&lt;div&gt;hi&lt;/div&gt;</p>\n<p>a &lt;span&gt;b&lt;/span&gt;</p>\n"
    );
}

#[test]
fn breaks_off_keeps_soft_breaks_as_newlines() {
    let renderer = Renderer::new(RenderOptions {
        breaks: false,
        ..Default::default()
    })
    .expect("valid options");
    assert_eq!(renderer.render("a\nb"), "<p>a\nb</p>\n");
    assert_eq!(
        renderer.render("a\nhttps://example.com"),
        format!(
            "<p>a<br style=\"display: none\">\n{}</p>\n",
            card("https://example.com", "https%3A%2F%2Fexample.com")
        )
    );
}

#[test]
fn embeds_off_leaves_links_inline() {
    let renderer = Renderer::new(RenderOptions {
        embeds: false,
        ..Default::default()
    })
    .expect("valid options");
    assert_eq!(
        renderer.render("https://example.com"),
        format!("<p>{}</p>\n", anchor("https://example.com"))
    );
}

#[test]
fn custom_proxy_and_trusted_host() {
    let renderer = Renderer::new(RenderOptions {
        card_proxy: "https://cards.example.org/embed".to_string(),
        trusted_host: "example.org".to_string(),
        ..Default::default()
    })
    .expect("valid options");
    assert_eq!(
        renderer.render("https://example.org/post"),
        "<p><div class=\"embed-zenn-link\"><iframe src=\"https://cards.example.org/embed?url=https%3A%2F%2Fexample.org%2Fpost\" frameborder=\"0\" scrolling=\"no\" loading=\"lazy\"></iframe></div><a href=\"https://example.org/post\" style=\"display: none\" target=\"_blank\">https://example.org/post</a></p>\n"
    );
}

#[test]
fn options_deserialize_from_camel_case() {
    let options: RenderOptions =
        serde_json::from_str(r#"{"breaks": false, "trustedHost": "example.org"}"#)
            .expect("valid json");
    assert!(!options.breaks);
    assert!(options.linkify);
    assert_eq!(options.trusted_host, "example.org");
    assert_eq!(options.card_proxy, "https://card.zenn.dev/");

    let err = serde_json::from_str::<RenderOptions>(r#"{"cardproxy": "x"}"#);
    assert!(err.is_err());
}

#[test]
fn invalid_options_are_rejected() {
    let err = Renderer::new(RenderOptions {
        card_proxy: "ftp://cards.example.org/".to_string(),
        ..Default::default()
    })
    .expect_err("ftp proxy");
    assert_eq!(err, OptionsError::CardProxyScheme("ftp".to_string()));

    let err = Renderer::new(RenderOptions {
        trusted_host: "  ".to_string(),
        ..Default::default()
    })
    .expect_err("blank host");
    assert_eq!(err, OptionsError::EmptyTrustedHost);
}
