// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Container pre-sizing by scanning ahead in array-backed input.
//!
//! Only allocation counts change; the values read are the same with the
//! scan disabled. Backends without random access skip it entirely.

use super::{ReadBackend, SliceBackend, Source};
use crate::repeated::RepeatedField;

impl<B: ReadBackend> Source<B> {
    /// Unread bytes up to the current limit, if the backend exposes them.
    fn lookahead_window(&self) -> Option<&[u8]> {
        let ahead = self.backend.lookahead()?;
        let until_limit = self.current_limit.saturating_sub(self.position());
        Some(&ahead[..ahead.len().min(until_limit)])
    }

    /// Before reading one non-packed element into a full container, counts
    /// the run of values sharing `tag` and reserves room for all of them.
    pub(crate) fn reserve_repeated<S: RepeatedField + ?Sized>(&self, store: &mut S, tag: u32) {
        if !self.config.reserve_lookahead || store.remaining_capacity() > 0 {
            return;
        }
        let Some(window) = self.lookahead_window() else {
            return;
        };
        let count = count_run(window, tag);
        if count > 1 {
            log::trace!("[Source] reserving {} elements for tag {:#x}", count, tag);
            store.reserve(count);
        }
    }

    /// Reserves room for a packed span of `length` bytes.
    pub(crate) fn reserve_packed<S: RepeatedField + ?Sized>(
        &self,
        store: &mut S,
        length: usize,
        fixed_size: Option<usize>,
    ) {
        if !self.config.reserve_lookahead {
            return;
        }
        let Some(window) = self.lookahead_window() else {
            return;
        };
        // the limit was already pushed, so the window is the span itself
        let span = &window[..window.len().min(length)];
        let count = match fixed_size {
            Some(size) => span.len() / size,
            None => span.iter().filter(|b| **b < 0x80).count(),
        };
        if count > store.remaining_capacity() {
            log::trace!("[Source] reserving {} packed elements", count);
            store.reserve(count);
        }
    }
}

/// Number of values in `window` for a run of `tag`, starting at the first value.
fn count_run(window: &[u8], tag: u32) -> usize {
    let mut probe = Source::new(SliceBackend::new(window));
    let mut count = 0;
    loop {
        match probe.skip_field(tag) {
            Ok(true) => count += 1,
            _ => return count,
        }
        match probe.read_tag() {
            Ok(next) if next == tag => {}
            _ => return count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::kind::{Fixed64, Int32};
    use crate::repeated::{Repeated, RepeatedString};

    #[test]
    fn test_count_run_stops_at_other_tag() {
        // value of the first element, then two more with tag 0x08, then tag 0x10
        let window = [0x01, 0x08, 0x02, 0x08, 0x03, 0x10, 0x04];
        assert_eq!(count_run(&window, 0x08), 3);
        assert_eq!(count_run(&[], 0x08), 0);
    }

    #[test]
    fn test_repeated_run_reserves_once() {
        let mut data = Vec::new();
        for i in 0..50u8 {
            data.extend_from_slice(&[0x08, i]);
        }
        let mut input = Source::from_slice(&data);
        let mut store = Repeated::<i32>::new();
        let tag = input.read_tag().unwrap();
        assert_eq!(input.read_repeated::<Int32>(&mut store, tag).unwrap(), 0);
        assert_eq!(store.len(), 50);
        assert!(store.capacity() >= 50);
        assert!(store.capacity() < 100);
    }

    #[test]
    fn test_scan_respects_limit() {
        // three strings inside a 9-byte limit, a fourth outside it
        let data = [
            0x0A, 0x01, b'a', 0x0A, 0x01, b'b', 0x0A, 0x01, b'c', 0x0A, 0x01, b'd',
        ];
        let mut input = Source::from_slice(&data);
        let old = input.push_limit(9).unwrap();
        let mut store = RepeatedString::new();
        let tag = input.read_tag().unwrap();
        assert_eq!(input.read_repeated_strings(&mut store, tag).unwrap(), 0);
        assert_eq!(store.len(), 3);
        input.pop_limit(old);
    }

    #[test]
    fn test_packed_fixed_reserves_from_length() {
        let mut data = vec![8 * 10];
        for i in 0..10u64 {
            data.extend_from_slice(&i.to_le_bytes());
        }
        let mut input = Source::from_slice(&data);
        let mut store = Repeated::new();
        input.read_packed::<Fixed64>(&mut store).unwrap();
        assert_eq!(store.len(), 10);
        assert!(store.capacity() >= 10 && store.capacity() < 20);
    }

    #[test]
    fn test_disabled_scan_reads_same_values() {
        let data = [0x04, 0x01, 0x96, 0x01, 0x02];
        let config = SourceConfig::default().with_reserve_lookahead(false);
        let mut plain = Source::with_config(SliceBackend::new(&data), config);
        let mut scanned = Source::from_slice(&data);

        let mut a = Repeated::new();
        let mut b = Repeated::new();
        plain.read_packed::<Int32>(&mut a).unwrap();
        scanned.read_packed::<Int32>(&mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_slice(), &[1, 150, 2]);
    }
}
