use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use once_cell::sync::Lazy;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Expected roster size and false-positive rate.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

pub static COACH_EMAIL_FILTER: Lazy<CoachEmailFilter> = Lazy::new(CoachEmailFilter::new);

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Membership filter over the emails stored on coach rows.
///
/// Entries are only added between rebuilds, so a deleted coach's email keeps
/// answering "maybe" until the next rebuild. Until the first rebuild every
/// email answers "maybe".
pub struct CoachEmailFilter {
    emails: RwLock<CuckooFilter<String>>,
    ready: AtomicBool,
}

impl CoachEmailFilter {
    pub fn new() -> Self {
        Self {
            emails: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// `false` means no coach row carries this email.
    pub fn might_contain(&self, email: &str) -> bool {
        if !self.is_ready() {
            return true;
        }
        let email = normalize(email);
        self.emails
            .read()
            .map(|f| f.contains(&email))
            // A poisoned filter can no longer rule anything out.
            .unwrap_or(true)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        if email.is_empty() {
            return;
        }
        if let Ok(mut filter) = self.emails.write() {
            filter.add(&email);
        }
    }

    /// Replaces the contents with `emails` and marks the filter ready.
    pub fn rebuild<I>(&self, emails: I) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let mut fresh = CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE);
        let mut total = 0usize;
        for email in emails {
            let email = normalize(&email);
            if !email.is_empty() {
                fresh.add(&email);
                total += 1;
            }
        }

        let mut filter = self
            .emails
            .write()
            .map_err(|_| anyhow!("coach email filter poisoned"))?;
        *filter = fresh;
        self.ready.store(true, Ordering::Release);

        Ok(total)
    }
}

impl Default for CoachEmailFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbuilt_filter_rules_nothing_out() {
        let filter = CoachEmailFilter::new();
        assert!(!filter.is_ready());
        assert!(filter.might_contain("anyone@academy.test"));
    }

    #[test]
    fn rebuilt_filter_answers_misses_regardless_of_case() {
        let filter = CoachEmailFilter::new();
        let total = filter
            .rebuild(vec![" Maya@Academy.test ".to_string(), "  ".to_string()])
            .unwrap();

        assert_eq!(total, 1);
        assert!(filter.might_contain("maya@academy.test"));
        assert!(!filter.might_contain("lina@academy.test"));

        filter.insert("Lina@Academy.test");
        assert!(filter.might_contain(" lina@academy.test"));
    }

    #[test]
    fn rebuild_drops_emails_no_longer_on_the_roster() {
        let filter = CoachEmailFilter::new();
        filter.rebuild(vec!["old@academy.test".to_string()]).unwrap();
        filter.rebuild(vec!["new@academy.test".to_string()]).unwrap();

        assert!(!filter.might_contain("old@academy.test"));
        assert!(filter.might_contain("new@academy.test"));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  A@X.COM "), "a@x.com");
    }
}
