//! HTML fragments shown on the invoice page.

use lava_types::LinkError;

/// Escapes text for HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// The "pay now" button linking to the provider page.
pub fn pay_button(url: &str, label: &str) -> String {
    format!(
        r#"<a class="btn btn-primary" href="{}">{}</a>"#,
        escape_html(url),
        escape_html(label)
    )
}

/// An error alert for a link that could not be created.
pub fn alert(err: &LinkError) -> String {
    let text = match err {
        LinkError::Upstream(message) => format!("Lava.ru Error: {}", escape_html(message)),
        other => format!("Lava.ru: {}", escape_html(&other.to_string())),
    };
    format!(r#"<div class="alert alert-danger">{}</div>"#, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_pay_button_escapes_url_and_label() {
        assert_eq!(
            pay_button("https://pay.lava.ru/?a=1&b=\"2\"", "Pay <now>"),
            r#"<a class="btn btn-primary" href="https://pay.lava.ru/?a=1&amp;b=&quot;2&quot;">Pay &lt;now&gt;</a>"#
        );
    }

    #[test]
    fn test_alerts() {
        assert_eq!(
            alert(&LinkError::Configuration),
            r#"<div class="alert alert-danger">Lava.ru: Module not configured properly</div>"#
        );
        assert_eq!(
            alert(&LinkError::Transport("timed out".into())),
            r#"<div class="alert alert-danger">Lava.ru: Failed to connect to payment gateway</div>"#
        );
        assert_eq!(
            alert(&LinkError::Upstream("<script>".into())),
            r#"<div class="alert alert-danger">Lava.ru Error: &lt;script&gt;</div>"#
        );
        assert_eq!(
            alert(&LinkError::InvalidResponse(r#"{"a":"<x>"}"#.into())),
            r#"<div class="alert alert-danger">Lava.ru: Invalid response - {&quot;a&quot;:&quot;&lt;x&gt;&quot;}</div>"#
        );
    }
}
