// Style rules and scroll-into-view script injected with a highlight

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::subsystems::HighlighterConfig;

lazy_static! {
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap();
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(?:\s[^>]*)?>").unwrap();
}

pub fn has_assets(document: &str, config: &HighlighterConfig) -> bool {
    document.contains(&format!("id=\"{}\"", config.style_element_id))
}

/// Inserts the highlight assets once: inside `<head>`, else after `<html>`,
/// else at the very start of the document.
pub fn inject_assets(document: &str, config: &HighlighterConfig) -> String {
    if has_assets(document, config) {
        return document.to_string();
    }
    let assets = render_assets(config);

    if let Some(head) = HEAD_OPEN.find(document) {
        return splice(document, head.end(), &assets);
    }
    if let Some(html) = HTML_OPEN.find(document) {
        return splice(document, html.end(), &format!("<head>{}</head>", assets));
    }
    let mut out = String::with_capacity(assets.len() + document.len());
    out.push_str(&assets);
    out.push_str(document);
    out
}

fn splice(document: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(document.len() + insert.len());
    out.push_str(&document[..at]);
    out.push_str(insert);
    out.push_str(&document[at..]);
    out
}

pub fn render_assets(config: &HighlighterConfig) -> String {
    format!("{}{}", render_style(config), render_script(config))
}

fn render_style(config: &HighlighterConfig) -> String {
    let HighlighterConfig {
        class_exact: exact,
        class_fuzzy: fuzzy,
        class_keyword: keyword,
        class_paragraph: paragraph,
        id_prefix,
        paragraph_id_prefix,
        style_element_id,
        ..
    } = config;

    format!(
        r#"
<style id="{style_element_id}">
.{exact} {{
    background-color: #ffff99 !important;
    padding: 1px 2px !important;
    border-radius: 2px !important;
    transition: all 0.3s ease !important;
}}
.{fuzzy} {{
    background-color: #fff3cd !important;
    padding: 1px 2px !important;
    border-radius: 2px !important;
    border-left: 3px solid #ffc107 !important;
    transition: all 0.3s ease !important;
}}
.{keyword} {{
    background-color: #f8f9fa !important;
    padding: 1px 2px !important;
    border-radius: 2px !important;
    border-left: 2px solid #6c757d !important;
    transition: all 0.3s ease !important;
}}
.{paragraph} {{
    background-color: #f0f8ff !important;
    border: 2px solid #4a90e2 !important;
    border-radius: 8px !important;
    padding: 10px !important;
    margin: 5px 0 !important;
    box-shadow: 0 2px 8px rgba(74, 144, 226, 0.15) !important;
    transition: all 0.3s ease !important;
    display: block !important;
}}
.{exact}:hover, .{fuzzy}:hover, .{keyword}:hover {{
    opacity: 0.8 !important;
}}
.{paragraph}:hover {{
    box-shadow: 0 4px 16px rgba(74, 144, 226, 0.25) !important;
    border-color: #357abd !important;
}}
[id^="{id_prefix}-"], [id^="{paragraph_id_prefix}-"] {{
    animation: wikifix-subtle-pulse 1.5s ease-in-out 2;
    scroll-margin-top: 100px;
}}
@keyframes wikifix-subtle-pulse {{
    0%, 100% {{ transform: scale(1); opacity: 1; }}
    50% {{ transform: scale(1.01); opacity: 0.9; }}
}}
</style>"#
    )
}

fn render_script(config: &HighlighterConfig) -> String {
    format!(
        r#"
<script>
(function() {{
    function sendReadyMessage() {{
        try {{
            if (window.parent && window.parent !== window) {{
                window.parent.postMessage('iframe-ready', '*');
            }}
        }} catch (e) {{}}
    }}
    function scrollToHighlight() {{
        var highlighted = document.querySelector('[id^="{id_prefix}-"]') ||
            document.querySelector('[id^="{paragraph_id_prefix}-"]');
        if (highlighted) {{
            setTimeout(function() {{
                highlighted.scrollIntoView({{ behavior: 'smooth', block: 'center', inline: 'nearest' }});
            }}, {delay});
        }}
    }}
    if (document.readyState === 'loading') {{
        document.addEventListener('DOMContentLoaded', function() {{
            scrollToHighlight();
            sendReadyMessage();
        }});
    }} else {{
        scrollToHighlight();
        sendReadyMessage();
    }}
}})();
</script>
"#,
        id_prefix = config.id_prefix,
        paragraph_id_prefix = config.paragraph_id_prefix,
        delay = config.scroll_delay_ms,
    )
}
