//! Bounded buffer of recently broadcast events, used to replay what a
//! reconnecting subscriber missed.
//!
//! Entries are keyed by the normalized form of their id (see [`normalize_id`]),
//! so numeric ids replay in numeric order. Streams that mix numeric and
//! non-numeric ids have no meaningful relative order between the two groups.
//!
//! `History` itself is not synchronized. The [`Broadcaster`](crate::Broadcaster)
//! keeps it behind the one mutex that also covers subscriber registration and
//! replay, so `record` and `since` never interleave.
use crate::event::Event;
use log::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Number of id-bearing events kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

// Largest value that still fits the 10-digit padded form.
const MAX_PADDED_ID: u64 = 9_999_999_999;

/// Returns the sort key for an event id.
///
/// Ids that parse as a non-negative integer are left-padded with zeros to
/// 10 digits, so `"9" < "10"` holds under plain string comparison. Anything
/// else (including integers too wide for 10 digits) is used verbatim.
pub fn normalize_id(id: &str) -> Cow<'_, str> {
    match id.parse::<u64>() {
        Ok(numeric) if numeric <= MAX_PADDED_ID => Cow::Owned(format!("{numeric:010}")),
        _ => Cow::Borrowed(id),
    }
}

#[derive(Debug)]
pub struct History {
    capacity: usize,
    entries: BTreeMap<String, Event>,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `event` if it carries an id that is not buffered yet, then evicts
    /// the lowest keys until the buffer is back within capacity.
    ///
    /// Returns whether the event was stored. The first write of an id wins;
    /// later events reusing it are ignored.
    pub fn record(&mut self, event: &Event) -> bool {
        let Some(id) = event.id() else {
            return false;
        };
        let key = normalize_id(id).into_owned();
        if self.entries.contains_key(&key) {
            trace!("Ignoring event with already buffered id {id}");
            return false;
        }
        self.entries.insert(key.clone(), event.clone());

        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_first() {
                trace!("Evicted event {evicted} from history");
            }
        }
        // An id older than everything in a full buffer is evicted right away.
        self.entries.contains_key(&key)
    }

    /// Returns, in increasing key order, every buffered event whose key is
    /// strictly greater than the key of `last_id`.
    ///
    /// This is best effort. When `last_id` has already been evicted every
    /// buffered event is newer and all of them come back, so events evicted
    /// in between are silently lost to the subscriber.
    pub fn since(&self, last_id: &str) -> Vec<Event> {
        let key = normalize_id(last_id);
        self.entries
            .range::<str, _>((Bound::Excluded(key.as_ref()), Bound::Unbounded))
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_id(id: &str) -> Event {
        Event::builder().id(id).data(format!("payload {id}")).build()
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().filter_map(Event::id).collect()
    }

    #[test]
    fn test_normalize_pads_numeric_ids() {
        assert_eq!(normalize_id("9"), "0000000009");
        assert_eq!(normalize_id("10"), "0000000010");
        assert_eq!(normalize_id("007"), "0000000007");
        assert!(normalize_id("9") < normalize_id("10"));
    }

    #[test]
    fn test_normalize_leaves_other_ids_verbatim() {
        assert_eq!(normalize_id("abc"), "abc");
        assert_eq!(normalize_id("-1"), "-1");
        assert_eq!(normalize_id(""), "");
        assert_eq!(normalize_id("12345678901"), "12345678901");
    }

    #[test]
    fn test_record_ignores_events_without_id() {
        let mut history = History::new();

        assert!(!history.record(&Event::new("no id")));
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_first_write_wins() {
        let mut history = History::new();
        history.record(&Event::builder().id("1").data("first").build());

        assert!(!history.record(&Event::builder().id("1").data("second").build()));
        assert_eq!(history.since("")[0].data(), "first");
    }

    #[test]
    fn test_numeric_ids_replay_in_numeric_order() {
        let mut history = History::new();
        for id in ["2", "10", "1"] {
            history.record(&event_with_id(id));
        }

        assert_eq!(ids(&history.since("1")), vec!["2", "10"]);
    }

    #[test]
    fn test_since_excludes_the_last_seen_id() {
        let mut history = History::new();
        for id in 1..=7 {
            history.record(&event_with_id(&id.to_string()));
        }

        assert_eq!(ids(&history.since("5")), vec!["6", "7"]);
        assert!(history.since("7").is_empty());
    }

    #[test]
    fn test_since_an_evicted_id_returns_everything_buffered() {
        let mut history = History::with_capacity(3);
        for id in 1..=6 {
            history.record(&event_with_id(&id.to_string()));
        }

        assert_eq!(ids(&history.since("1")), vec!["4", "5", "6"]);
    }

    #[test]
    fn test_capacity_is_never_exceeded_and_lowest_key_goes_first() {
        let mut history = History::new();
        for id in 1..=DEFAULT_CAPACITY + 1 {
            history.record(&event_with_id(&id.to_string()));
            assert!(history.len() <= DEFAULT_CAPACITY);
        }

        let buffered = history.since("");
        assert_eq!(buffered.len(), DEFAULT_CAPACITY);
        assert!(!ids(&buffered).contains(&"1"));
        assert_eq!(ids(&buffered)[0], "2");
    }

    #[test]
    fn test_opaque_ids_compare_as_strings() {
        let mut history = History::new();
        for id in ["b", "a", "c"] {
            history.record(&event_with_id(id));
        }

        assert_eq!(ids(&history.since("a")), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut history = History::with_capacity(0);

        assert!(!history.record(&event_with_id("1")));
        assert!(history.is_empty());
    }

    #[test]
    fn test_clear_empties_the_buffer() {
        let mut history = History::new();
        history.record(&event_with_id("1"));
        history.clear();

        assert!(history.since("").is_empty());
    }
}
