mod common;

use athens_scout::config::RateLimit;
use athens_scout::error::{FailureKind, ScrapeError};
use athens_scout::scrapers::{Fetcher, ScraperTrait, SearchParams, SpitogatosScraper, XeScraper};
use athens_scout::ListingType;
use common::{listing_page, search_page, test_config};
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn sale_only() -> SearchParams {
    SearchParams {
        listing_types: vec![ListingType::Sale],
        ..SearchParams::default()
    }
}

#[tokio::test]
async fn spitogatos_follows_pagination_and_classifies_failures() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/en/for_sale-homes/athens-center",
        search_page(
            &["/en/property/1110000001", "/en/property/1110000002"],
            Some("/en/for_sale-homes/athens-center/page_2"),
        ),
    )
    .await;
    serve(
        &server,
        "/en/for_sale-homes/athens-center/page_2",
        search_page(&["/en/property/1110000003", "/en/property/1110000001"], None),
    )
    .await;
    serve(
        &server,
        "/en/property/1110000001",
        listing_page("Διαμέρισμα 80 τ.μ., Κολωνάκι", "€ 250.000", "80 τ.μ."),
    )
    .await;
    serve(
        &server,
        "/en/property/1110000002",
        listing_page("Διαμέρισμα 63 τ.μ., Κουκάκι", "€ 3.000", "63 τ.μ."),
    )
    .await;
    // 1110000003 is not mounted: the mock server answers 404.

    let config = test_config(&server.uri());
    let scraper = SpitogatosScraper::new(&config, sale_only()).unwrap();
    let outcome = scraper.scrape().await.unwrap();

    assert_eq!(outcome.discovered, 3);
    assert_eq!(outcome.records.len(), 1);

    let record = &outcome.records[0];
    assert_eq!(record.id, "spitogatos_1110000001");
    assert_eq!(record.price, Some(250_000.0));
    assert_eq!(record.neighborhood.as_deref(), Some("Kolonaki"));
    assert!(record.is_verified());
    assert!(record.html_source_hash.is_some());

    let kinds = outcome.failures_by_kind();
    assert_eq!(kinds.get(&FailureKind::Rejected), Some(&1));
    assert_eq!(kinds.get(&FailureKind::NotFound), Some(&1));
}

#[tokio::test]
async fn spitogatos_keeps_flagged_records_when_asked() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/en/for_sale-homes/athens-center",
        search_page(&["/en/property/1110000002"], None),
    )
    .await;
    serve(
        &server,
        "/en/property/1110000002",
        listing_page("Διαμέρισμα 63 τ.μ., Κουκάκι", "€ 3.000", "63 τ.μ."),
    )
    .await;

    let mut config = test_config(&server.uri());
    config.keep_unverified = true;
    let outcome = SpitogatosScraper::new(&config, sale_only())
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert!(!outcome.records[0].is_verified());
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn spitogatos_enumeration_stops_after_consecutive_misses() {
    let server = MockServer::start().await;
    serve(&server, "/en/for_sale-homes/athens-center", search_page(&[], None)).await;
    serve(
        &server,
        "/en/property/1110000010",
        listing_page("Διαμέρισμα 75 τ.μ., Παγκράτι", "€ 190.000", "75 τ.μ."),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/en/property/1110000013"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.enumeration_range = Some((1_110_000_010, 1_110_000_014));
    config.enumeration_max_misses = 2;
    let outcome = SpitogatosScraper::new(&config, sale_only())
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.discovered, 0);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].id, "spitogatos_1110000010");
    assert_eq!(outcome.failures_by_kind().get(&FailureKind::NotFound), Some(&2));
}

#[tokio::test]
async fn xe_filters_sitemap_and_expands_regional_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>{base}/property/d/poliseis-diamerismaton/7000001/kolonaki</loc></url>
          <url><loc>{base}/property/d/poliseis-diamerismaton/7000002/pangrati</loc></url>
          <url><loc>{base}/property/r/poliseis-diamerismaton/kolonaki</loc></url>
          <url><loc>https://elsewhere.example/property/d/poliseis/7000009/kolonaki</loc></url>
          <url><loc>{base}/about</loc></url>
        </urlset>"#
    );
    serve(&server, "/sitemap_property_poliseis-diamerismaton.xml", sitemap).await;
    serve(
        &server,
        "/property/r/poliseis-diamerismaton/kolonaki",
        search_page(
            &[
                "/property/d/poliseis-diamerismaton/7000003/kolonaki",
                "/property/d/poliseis-diamerismaton/7000001/kolonaki",
            ],
            None,
        ),
    )
    .await;
    serve(
        &server,
        "/property/d/poliseis-diamerismaton/7000001/kolonaki",
        listing_page("Διαμέρισμα 95 τ.μ., Κολωνάκι", "€ 420.000", "95 τ.μ."),
    )
    .await;
    serve(
        &server,
        "/property/d/poliseis-diamerismaton/7000003/kolonaki",
        listing_page("Διαμέρισμα 60 τ.μ., Κολωνάκι", "€ 230.000", "60 τ.μ."),
    )
    .await;

    let mut config = test_config(&base);
    config.xe_sitemaps = vec!["/sitemap_property_poliseis-diamerismaton.xml".to_string()];
    let params = SearchParams {
        neighborhoods: vec!["Kolonaki".to_string()],
        ..sale_only()
    };
    let outcome = XeScraper::new(&config, params).unwrap().scrape().await.unwrap();

    assert_eq!(outcome.discovered, 2);
    assert_eq!(outcome.skipped_out_of_area, 1);
    let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["xe_7000001", "xe_7000003"]);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn fetcher_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    serve(&server, "/flaky", "<html>ok</html>".to_string()).await;

    let fetcher = Fetcher::new("athens-scout-test", Duration::from_secs(5), RateLimit::immediate()).unwrap();
    let body = fetcher.fetch_html(&format!("{}/flaky", server.uri())).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn fetcher_gives_up_and_does_not_retry_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new("athens-scout-test", Duration::from_secs(5), RateLimit::immediate()).unwrap();

    let err = fetcher.fetch_html(&format!("{}/down", server.uri())).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Status { status: 500, .. }));

    let err = fetcher.fetch_html(&format!("{}/gone", server.uri())).await.unwrap_err();
    assert!(matches!(err, ScrapeError::NotFound { .. }));
}

async fn serve_once(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn spitogatos_labels_records_with_the_search_section() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/en/for_rent-homes/athens-center",
        search_page(&["/en/property/1120000001"], None),
    )
    .await;
    serve(
        &server,
        "/en/property/1120000001",
        listing_page("Apartment 60 sq.m., Koukaki", "€ 900", "60 τ.μ."),
    )
    .await;

    let params = SearchParams {
        listing_types: vec![ListingType::Rent],
        ..SearchParams::default()
    };
    let outcome = SpitogatosScraper::new(&test_config(&server.uri()), params)
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].listing_type, ListingType::Rent);
    assert_eq!(outcome.records[0].price, Some(900.0));
}

#[tokio::test]
async fn spitogatos_stops_paginating_at_max_pages() {
    let server = MockServer::start().await;
    serve_once(
        &server,
        "/en/for_sale-homes/athens-center",
        search_page(&[], Some("/en/for_sale-homes/athens-center/page_2")),
        1,
    )
    .await;
    serve_once(
        &server,
        "/en/for_sale-homes/athens-center/page_2",
        search_page(&[], Some("/en/for_sale-homes/athens-center/page_3")),
        1,
    )
    .await;
    serve_once(
        &server,
        "/en/for_sale-homes/athens-center/page_3",
        search_page(&[], None),
        0,
    )
    .await;

    let params = SearchParams {
        max_pages: 2,
        ..sale_only()
    };
    let outcome = SpitogatosScraper::new(&test_config(&server.uri()), params)
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.discovered, 0);
    assert_eq!(outcome.attempted(), 0);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn spitogatos_stops_at_max_properties() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/en/for_sale-homes/athens-center",
        search_page(
            &[
                "/en/property/1130000001",
                "/en/property/1130000002",
                "/en/property/1130000003",
            ],
            None,
        ),
    )
    .await;
    serve_once(
        &server,
        "/en/property/1130000001",
        listing_page("Διαμέρισμα 80 τ.μ., Κολωνάκι", "€ 250.000", "80 τ.μ."),
        1,
    )
    .await;
    serve_once(
        &server,
        "/en/property/1130000002",
        listing_page("Διαμέρισμα 70 τ.μ., Παγκράτι", "€ 180.000", "70 τ.μ."),
        1,
    )
    .await;
    serve_once(
        &server,
        "/en/property/1130000003",
        listing_page("Διαμέρισμα 90 τ.μ., Κουκάκι", "€ 230.000", "90 τ.μ."),
        0,
    )
    .await;

    let params = SearchParams {
        max_properties: 2,
        ..sale_only()
    };
    let outcome = SpitogatosScraper::new(&test_config(&server.uri()), params)
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.discovered, 3);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.attempted(), 2);
}

#[tokio::test]
async fn spitogatos_counts_listings_outside_requested_neighborhoods() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/en/for_sale-homes/athens-center",
        search_page(&["/en/property/1140000001", "/en/property/1140000002"], None),
    )
    .await;
    serve(
        &server,
        "/en/property/1140000001",
        listing_page("Διαμέρισμα 80 τ.μ., Κολωνάκι", "€ 250.000", "80 τ.μ."),
    )
    .await;
    serve(
        &server,
        "/en/property/1140000002",
        listing_page("Διαμέρισμα 75 τ.μ., Κουκάκι", "€ 210.000", "75 τ.μ."),
    )
    .await;

    let params = SearchParams {
        neighborhoods: vec!["Kolonaki".to_string()],
        ..sale_only()
    };
    let outcome = SpitogatosScraper::new(&test_config(&server.uri()), params)
        .unwrap()
        .scrape()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].neighborhood.as_deref(), Some("Kolonaki"));
    assert_eq!(outcome.skipped_out_of_area, 1);
    assert_eq!(outcome.attempted(), 2);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn xe_follows_sitemap_indexes_one_level_deep() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>{base}/sitemap_property_a.xml</loc></sitemap>
          <sitemap><loc>{base}/sitemap_nested.xml</loc></sitemap>
        </sitemapindex>"#
    );
    let pages = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>{base}/property/d/poliseis-diamerismaton/7100001/pangrati</loc></url>
        </urlset>"#
    );
    let nested = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>{base}/sitemap_too_deep.xml</loc></sitemap>
        </sitemapindex>"#
    );
    serve_once(&server, "/sitemap_index.xml", index, 1).await;
    serve_once(&server, "/sitemap_property_a.xml", pages, 1).await;
    serve_once(&server, "/sitemap_nested.xml", nested, 1).await;
    serve_once(&server, "/sitemap_too_deep.xml", String::new(), 0).await;
    serve(
        &server,
        "/property/d/poliseis-diamerismaton/7100001/pangrati",
        listing_page("Διαμέρισμα 75 τ.μ., Παγκράτι", "€ 190.000", "75 τ.μ."),
    )
    .await;

    let mut config = test_config(&base);
    config.xe_sitemaps = vec!["/sitemap_index.xml".to_string()];
    let outcome = XeScraper::new(&config, sale_only()).unwrap().scrape().await.unwrap();

    assert_eq!(outcome.discovered, 1);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].id, "xe_7100001");
    assert!(outcome.failures.is_empty());
}
