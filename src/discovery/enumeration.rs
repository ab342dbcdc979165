use std::collections::HashSet;

const ID_PLACEHOLDER: &str = "{id}";

/// Walks a numeric listing-ID range and yields candidate detail URLs.
///
/// Most IDs in a range are gaps, so the walk stops after `max_misses`
/// consecutive candidates that turned out not to be listings. A limit of 0
/// disables that check.
#[derive(Debug, Clone)]
pub struct IdEnumerator {
    template: String,
    next: Option<u64>,
    end: u64,
    step: u64,
    max_misses: u32,
    misses: u32,
    seen: HashSet<String>,
}

impl IdEnumerator {
    /// `template` contains `{id}`, e.g. `https://www.spitogatos.gr/en/property/{id}`.
    pub fn new(template: impl Into<String>, range: (u64, u64), step: u64, max_misses: u32) -> Self {
        let (start, end) = range;
        Self {
            template: template.into(),
            next: (start <= end).then_some(start),
            end,
            step: step.max(1),
            max_misses,
            misses: 0,
            seen: HashSet::new(),
        }
    }

    pub fn url_for(&self, id: u64) -> String {
        self.template.replace(ID_PLACEHOLDER, &id.to_string())
    }

    /// Exclude a URL found some other way (e.g. on a search page).
    pub fn mark_seen(&mut self, url: &str) {
        self.seen.insert(url.to_string());
    }

    pub fn tripped(&self) -> bool {
        self.max_misses > 0 && self.misses >= self.max_misses
    }

    /// Next unseen candidate, or `None` once the range is exhausted or the
    /// miss limit has been reached.
    pub fn next_candidate(&mut self) -> Option<String> {
        while !self.tripped() {
            let id = self.next?;
            self.next = id.checked_add(self.step).filter(|n| *n <= self.end);
            let url = self.url_for(id);
            if self.seen.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Report whether the last candidate was a listing.
    pub fn record(&mut self, hit: bool) {
        if hit {
            self.misses = 0;
        } else {
            self.misses += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://www.spitogatos.gr/en/property/{id}";

    #[test]
    fn walks_range_with_step() {
        let mut ids = IdEnumerator::new(TEMPLATE, (100, 106), 3, 0);
        let mut urls = Vec::new();
        while let Some(url) = ids.next_candidate() {
            urls.push(url);
        }
        assert_eq!(
            urls,
            vec![
                "https://www.spitogatos.gr/en/property/100",
                "https://www.spitogatos.gr/en/property/103",
                "https://www.spitogatos.gr/en/property/106",
            ]
        );
    }

    #[test]
    fn skips_urls_already_seen() {
        let mut ids = IdEnumerator::new(TEMPLATE, (1, 3), 1, 0);
        ids.mark_seen("https://www.spitogatos.gr/en/property/2");
        assert_eq!(ids.next_candidate().as_deref(), Some("https://www.spitogatos.gr/en/property/1"));
        assert_eq!(ids.next_candidate().as_deref(), Some("https://www.spitogatos.gr/en/property/3"));
        assert_eq!(ids.next_candidate(), None);
    }

    #[test]
    fn stops_after_consecutive_misses() {
        let mut ids = IdEnumerator::new(TEMPLATE, (1, 1_000), 1, 3);
        let mut probed = 0;
        let mut outcomes = [true, false, false, true, false, false, false, true].into_iter();
        while ids.next_candidate().is_some() {
            probed += 1;
            ids.record(outcomes.next().unwrap_or(false));
        }
        assert_eq!(probed, 7);
        assert!(ids.tripped());
    }

    #[test]
    fn empty_and_edge_ranges() {
        let mut reversed = IdEnumerator::new(TEMPLATE, (10, 5), 1, 0);
        assert_eq!(reversed.next_candidate(), None);

        let mut top = IdEnumerator::new(TEMPLATE, (u64::MAX, u64::MAX), 5, 0);
        assert!(top.next_candidate().is_some());
        assert_eq!(top.next_candidate(), None);
    }
}
