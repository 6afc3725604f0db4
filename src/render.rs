//! Campaign template rendering. Logic-less Handlebars substitution plus the
//! tracking artifacts: the open pixel and the unsubscribe link. Templates can
//! use {{name}}, {{company}}, {{email}}, {{unsubscribeUrl}} and
//! {{{trackingLogo}}}.

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

use crate::models::Contact;

const TEST_BANNER: &str = r#"
        <div style="background: #f97316; color: white; padding: 12px; text-align: center; font-weight: bold; font-family: sans-serif;">
            &#9888;&#65039; THIS IS A TEST EMAIL
        </div>
    "#;

pub fn unsubscribe_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/unsubscribe/{token}")
}

/// Invisible 1x1 image pointing at the open-tracking endpoint.
pub fn tracking_pixel(base_url: &str, token: &str) -> String {
    format!(
        r#"<img src="{base_url}/track/open/{token}" alt="" width="1" height="1" style="display:block;">"#
    )
}

fn render(template: &str, vars: &serde_json::Value) -> Result<String> {
    let hb = Handlebars::new();
    Ok(hb.render_template(template, vars)?)
}

/// Renders a campaign body for a real send: personal fields filled in, open
/// pixel and unsubscribe link wired to the given tracking token.
pub fn render_campaign(
    template: &str,
    contact: &Contact,
    base_url: &str,
    token: &str,
) -> Result<String> {
    render(
        template,
        &json!({
            "name": contact.name.as_deref().unwrap_or(""),
            "company": contact.company.as_deref().unwrap_or(""),
            "email": contact.email,
            "unsubscribeUrl": unsubscribe_url(base_url, token),
            "trackingLogo": tracking_pixel(base_url, token),
        }),
    )
}

/// Test-send rendering: placeholder recipient, a visible banner on top, and
/// no tracking artifacts so a test can never record an open or unsubscribe.
pub fn render_test(template: &str, to: &str) -> Result<String> {
    let body = render(
        template,
        &json!({
            "name": "Test User",
            "company": "Test Company",
            "email": to,
            "unsubscribeUrl": "#",
            "trackingLogo": "",
        }),
    )?;
    Ok(format!("{TEST_BANNER}{body}"))
}

/// Preview rendering for the dashboard: sample data, placeholder logo,
/// dead unsubscribe link.
pub fn render_preview(template: &str) -> Result<String> {
    render(
        template,
        &json!({
            "name": "Jane Doe",
            "company": "Example Corp",
            "email": "sample@example.com",
            "unsubscribeUrl": "#",
            "trackingLogo": r#"<img src="https://via.placeholder.com/120x40?text=Logo" alt="Logo" width="120">"#,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            id: 1,
            email: "jane@example.com".into(),
            name: Some("Jane".into()),
            company: Some("Acme".into()),
            unsubscribed: false,
            unsubscribed_at: None,
            created_at: None,
        }
    }

    #[test]
    fn campaign_render_substitutes_variables() {
        let html = render_campaign(
            "<p>Hi {{name}} from {{company}} ({{email}})</p>{{{trackingLogo}}}",
            &contact(),
            "http://localhost:3001",
            "tok-123",
        )
        .unwrap();
        assert!(html.contains("Hi Jane from Acme (jane@example.com)"));
        assert!(html.contains("http://localhost:3001/track/open/tok-123"));
    }

    #[test]
    fn campaign_render_builds_unsubscribe_url() {
        let html = render_campaign(
            r#"<a href="{{unsubscribeUrl}}">bye</a>"#,
            &contact(),
            "http://localhost:3001",
            "tok-123",
        )
        .unwrap();
        assert!(html.contains("http://localhost:3001/unsubscribe/tok-123"));
    }

    #[test]
    fn missing_contact_fields_render_empty() {
        let mut c = contact();
        c.name = None;
        c.company = None;
        let html = render_campaign("[{{name}}][{{company}}]", &c, "http://x", "t").unwrap();
        assert!(html.contains("[][]"));
    }

    #[test]
    fn test_render_has_banner_and_no_pixel() {
        let html = render_test("<p>Hi {{name}}</p>{{{trackingLogo}}}", "qa@example.com").unwrap();
        assert!(html.contains("THIS IS A TEST EMAIL"));
        assert!(html.contains("Hi Test User"));
        assert!(!html.contains("/track/open/"));
    }

    #[test]
    fn preview_uses_placeholder_logo() {
        let html = render_preview("{{{trackingLogo}}} {{name}}").unwrap();
        assert!(html.contains("via.placeholder.com"));
        assert!(!html.contains("/track/open/"));
    }

    #[test]
    fn html_is_escaped_by_default() {
        let mut c = contact();
        c.name = Some("<script>alert(1)</script>".into());
        let html = render_campaign("{{name}}", &c, "http://x", "t").unwrap();
        assert!(!html.contains("<script>"));
    }
}
