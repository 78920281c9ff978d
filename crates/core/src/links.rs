//! Tracking-link composition and body personalization.
//!
//! Links are pure functions of (host, recipient, campaign, platform), so
//! the same inputs always produce the same URL and every recipient in a
//! campaign gets a distinct one.

use uuid::Uuid;

/// Literal token in a body template that gets swapped for the tracking URL.
pub const SUSPICIOUS_LINK_PLACEHOLDER: &str = "[Suspicious Link]";

/// Build the tracking URL for one (recipient, campaign, platform) triple:
/// `{host}/track/{recipient_id}/{campaign_id}/{platform}/`.
///
/// `platform` is a free-form tag echoed verbatim; it is matched against
/// the available spoofed-page templates only at render time.
pub fn compose_tracking_url(
    host: &str,
    recipient_id: Uuid,
    campaign_id: Uuid,
    platform: &str,
) -> String {
    format!(
        "{}/track/{}/{}/{}/",
        host.trim_end_matches('/'),
        recipient_id,
        campaign_id,
        platform
    )
}

/// Substitute the tracking URL into a body template. A template without
/// the placeholder is returned unchanged; the campaign's representative
/// link is still recorded separately, so a missing placeholder never
/// fails a send.
pub fn render_body(body: &str, tracking_url: &str) -> String {
    body.replace(SUSPICIOUS_LINK_PLACEHOLDER, tracking_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn url_has_expected_shape() {
        let recipient = Uuid::new_v4();
        let campaign = Uuid::new_v4();
        let url = compose_tracking_url("https://h", recipient, campaign, "facebook");
        assert_eq!(
            url,
            format!("https://h/track/{}/{}/facebook/", recipient, campaign)
        );
    }

    #[test]
    fn trailing_host_slash_is_normalized() {
        let recipient = Uuid::new_v4();
        let campaign = Uuid::new_v4();
        let a = compose_tracking_url("https://h/", recipient, campaign, "facebook");
        let b = compose_tracking_url("https://h", recipient, campaign, "facebook");
        assert_eq!(a, b);
    }

    #[test]
    fn links_are_deterministic_and_unique_per_recipient() {
        let campaign = Uuid::new_v4();
        let recipients: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        let links: Vec<String> = recipients
            .iter()
            .map(|r| compose_tracking_url("https://h", *r, campaign, "facebook"))
            .collect();

        let unique: HashSet<&String> = links.iter().collect();
        assert_eq!(unique.len(), recipients.len());

        for (r, link) in recipients.iter().zip(&links) {
            assert!(link.contains(&r.to_string()));
            assert_eq!(
                *link,
                compose_tracking_url("https://h", *r, campaign, "facebook")
            );
        }
    }

    #[test]
    fn placeholder_is_replaced() {
        let rendered = render_body("Click: [Suspicious Link]", "https://h/track/a/b/facebook/");
        assert_eq!(rendered, "Click: https://h/track/a/b/facebook/");
    }

    #[test]
    fn body_without_placeholder_is_unchanged() {
        let body = "Nothing to see here.";
        assert_eq!(render_body(body, "https://h/track/a/b/p/"), body);
    }

    #[test]
    fn free_form_platform_is_echoed() {
        let recipient = Uuid::new_v4();
        let campaign = Uuid::new_v4();
        let url = compose_tracking_url("https://h", recipient, campaign, "weird-tag");
        assert!(url.ends_with("/weird-tag/"));
    }
}
