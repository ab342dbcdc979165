//! Finding listing URLs: search-result links, sitemaps and numeric ID ranges.

pub mod enumeration;
pub mod links;
pub mod sitemap;

pub use enumeration::IdEnumerator;
pub use links::{extract_listing_links, next_page_url};
pub use sitemap::{
    is_detail_url, is_property_url, is_regional_url, mentions_neighborhood, parse_sitemap,
    SitemapUrls,
};
