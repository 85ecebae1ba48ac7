// Link rewriting for pages served from the local mirror

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;

use crate::config::subsystems::ProcessorConfig;

lazy_static! {
    static ref ARTICLE_LINK: Regex = Regex::new(r#"href="(/wiki/[^"]+)""#).unwrap();
    static ref ANCHOR_LINK: Regex = Regex::new(r##"href="(#[^"]+)""##).unwrap();
    static ref STYLESHEET: Regex = Regex::new(r#"href="(/w/[^"]*\.css[^"]*)""#).unwrap();
    static ref SCRIPT: Regex = Regex::new(r#"src="(/w/[^"]*\.js[^"]*)""#).unwrap();
    static ref IMAGE: Regex =
        Regex::new(r#"src="(/w/[^"]*\.(?:png|jpg|jpeg|gif|svg|webp)[^"]*)""#).unwrap();
    static ref UPLOAD_IMAGE: Regex = Regex::new(r#"src="(//upload\.wikimedia\.org/[^"]*)""#).unwrap();
    static ref STATIC_ASSET: Regex = Regex::new(r#"src="(/static/[^"]*)""#).unwrap();
}

/// Points article links, in-page anchors and static assets at the local API.
///
/// Already rewritten links no longer match any pattern, so a second pass
/// leaves the markup unchanged.
pub fn rewrite_links(html: &str, page_key: &str, config: &ProcessorConfig) -> String {
    let prefix = config.api_prefix.trim_end_matches('/');
    let static_prefix = format!("{}/wiki-static", prefix);

    let html = ARTICLE_LINK.replace_all(html, |c: &Captures| format!(r#"href="{}{}""#, prefix, &c[1]));
    let html = replace(html, &ANCHOR_LINK, |c| format!(r#"href="{}/wiki/{}{}""#, prefix, page_key, &c[1]));
    let html = replace(html, &STYLESHEET, |c| format!(r#"href="{}{}""#, static_prefix, &c[1]));
    let html = replace(html, &SCRIPT, |c| format!(r#"src="{}{}""#, static_prefix, &c[1]));
    let html = replace(html, &IMAGE, |c| format!(r#"src="{}{}""#, static_prefix, &c[1]));
    let html = replace(html, &UPLOAD_IMAGE, |c| format!(r#"src="https:{}""#, &c[1]));
    let html = replace(html, &STATIC_ASSET, |c| format!(r#"src="{}{}""#, static_prefix, &c[1]));

    html.into_owned()
}

fn replace<'a, F>(html: Cow<'a, str>, pattern: &Regex, rewrite: F) -> Cow<'a, str>
where
    F: Fn(&Captures) -> String,
{
    let changed = match pattern.replace_all(&html, |c: &Captures| rewrite(c)) {
        Cow::Borrowed(_) => None,
        Cow::Owned(changed) => Some(changed),
    };
    changed.map_or(html, Cow::Owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProcessorConfig {
        ProcessorConfig::default()
    }

    #[test]
    fn test_rewrites_links_and_assets() {
        let html = concat!(
            r#"<link href="/w/load.php?modules=site.styles&only=styles.css">"#,
            r##"<a href="/wiki/Moon">Moon</a> <a href="#History">history</a>"##,
            r#"<img src="/w/images/logo.png"><img src="//upload.wikimedia.org/a/b.jpg">"#,
            r#"<script src="/w/load.js"></script><img src="/static/images/icon.svg">"#,
            r#"<a href="https://example.org/wiki/Other">ext</a>"#,
        );
        let out = rewrite_links(html, "Apollo_11", &config());

        assert!(out.contains(r#"href="/api/wiki-static/w/load.php?modules=site.styles&only=styles.css""#));
        assert!(out.contains(r#"href="/api/wiki/Moon""#));
        assert!(out.contains(r#"href="/api/wiki/Apollo_11#History""#));
        assert!(out.contains(r#"src="/api/wiki-static/w/images/logo.png""#));
        assert!(out.contains(r#"src="https://upload.wikimedia.org/a/b.jpg""#));
        assert!(out.contains(r#"src="/api/wiki-static/w/load.js""#));
        assert!(out.contains(r#"src="/api/wiki-static/static/images/icon.svg""#));
        assert!(out.contains(r#"href="https://example.org/wiki/Other""#));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let html = r##"<a href="/wiki/Moon">Moon</a><a href="#cite">1</a>"##;
        let once = rewrite_links(html, "Sun", &config());
        assert_eq!(rewrite_links(&once, "Sun", &config()), once);
    }

    #[test]
    fn test_custom_prefix() {
        let mut config = config();
        config.api_prefix = "/mirror/".to_string();
        let out = rewrite_links(r#"<a href="/wiki/Moon">"#, "Sun", &config);
        assert_eq!(out, r#"<a href="/mirror/wiki/Moon">"#);
    }
}
