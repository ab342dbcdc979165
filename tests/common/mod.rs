#![allow(dead_code)]

use athens_scout::config::{Config, RateLimit};
use std::time::Duration;

/// Config pointing both sites at a local mock server, with no pacing.
pub fn test_config(base: &str) -> Config {
    Config {
        spitogatos_base_url: base.to_string(),
        xe_base_url: base.to_string(),
        request_timeout: Duration::from_secs(5),
        rate_limit: RateLimit::immediate(),
        min_page_bytes: 500,
        ..Config::default()
    }
}

/// A detail page with the given headline and price text, padded like a real page.
pub fn listing_page(title: &str, price: &str, sqm: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title}</h1>
        <div class="price">{price}</div>
        <ul>
          <li>Εμβαδόν: <span class="sqm">{sqm}</span></li>
          <li>Υπνοδωμάτια: <span class="bedrooms">2</span></li>
          <li>Όροφος: <span class="floor">2ος</span></li>
          <li>Ενεργειακή κλάση: <span class="energy-class">C</span></li>
        </ul>
        <div class="address">Σκουφά 20</div>
        <div class="description">{}</div>
        </body></html>"#,
        "Ανακαινισμένο διαμέρισμα σε κεντρικό σημείο, κοντά σε μετρό. ".repeat(8)
    )
}

pub fn search_page(links: &[&str], next: Option<&str>) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<article><a href="{href}">Αγγελία</a></article>"#))
        .collect();
    let pagination = next
        .map(|href| format!(r#"<a rel="next" href="{href}">Επόμενη</a>"#))
        .unwrap_or_default();
    format!("<html><body>{anchors}<nav>{pagination}</nav></body></html>")
}
