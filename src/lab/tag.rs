//! In-memory counter-equipped tag.
//!
//! [`SimulatedTag`] behaves like the 48-page tags the protocol targets:
//!
//! - pages 0–2 are read-only (UID, lock bits)
//! - pages at or above AUTH0 need authentication for writes, and for reads
//!   too when AUTH1 bit 0 is clear
//! - the key pages are write-only and read back as zeros
//! - writing the counter page adds the little-endian 16-bit value to the
//!   one-way counter instead of storing it
//!
//! Each `write_pages` call lands entirely or not at all. Faults are injected
//! per call, so a test can fail exactly the Nth write of an operation or pull
//! the tag out of the field between two writes.

use crate::layout::{
    AUTH0_PAGE, AUTH1_PAGE, COUNTER_PAGE, KEY_PAGE, KEY_PAGE_COUNT, PAGE_COUNT, PAGE_SIZE,
    REGION_SIZE, TICKET_START_PAGE, UID_PAGE,
};
use crate::security::{TAG_KEY_SIZE, TagKey};
use crate::transport::{TagTransport, TransportError, check_range};
use crate::types::{TagUid, UID_SIZE};
use std::collections::BTreeSet;

/// Pages that no command can write.
const READ_ONLY_PAGES: u8 = 3;

/// Largest value the hardware counter holds.
pub const COUNTER_MAX: u32 = 0xFFFF;

/// One accepted `write_pages` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWrite {
    /// First page written.
    pub start: u8,
    /// Pages written.
    pub count: u8,
}

impl PageWrite {
    /// Returns `true` if the write touched `page`.
    #[must_use]
    pub const fn touches(&self, page: u8) -> bool {
        page >= self.start && (page as u16) < self.start as u16 + self.count as u16
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    fail_reads: bool,
    fail_next_writes: usize,
    fail_pages: BTreeSet<u8>,
    writes_before_removal: Option<usize>,
    removed: bool,
}

/// A simulated tag for deterministic protocol tests.
#[derive(Debug, Clone)]
pub struct SimulatedTag {
    pages: [[u8; PAGE_SIZE]; PAGE_COUNT as usize],
    key: TagKey,
    authenticated: bool,
    counter: u32,
    faults: Faults,
    writes: Vec<PageWrite>,
}

impl SimulatedTag {
    /// A factory-fresh tag: blank user memory, no protection, counter zero,
    /// factory default key.
    #[must_use]
    pub fn new(uid: TagUid) -> Self {
        let mut pages = [[0u8; PAGE_SIZE]; PAGE_COUNT as usize];
        for (i, chunk) in uid.as_bytes().chunks_exact(PAGE_SIZE).enumerate() {
            pages[usize::from(UID_PAGE) + i].copy_from_slice(chunk);
        }
        // AUTH0 past the last page: nothing protected.
        pages[usize::from(AUTH0_PAGE)][0] = PAGE_COUNT;
        pages[usize::from(AUTH1_PAGE)][0] = 1;
        Self {
            pages,
            key: TagKey::factory_default(),
            authenticated: false,
            counter: 0,
            faults: Faults::default(),
            writes: Vec::new(),
        }
    }

    /// A fresh tag whose UID is derived from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut uid = [0u8; UID_SIZE];
        uid.copy_from_slice(&seed.to_be_bytes());
        uid[0] = 0x04;
        Self::new(TagUid::new(uid))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The tag's UID.
    #[must_use]
    pub fn uid(&self) -> TagUid {
        let mut bytes = [0u8; UID_SIZE];
        for (i, chunk) in bytes.chunks_exact_mut(PAGE_SIZE).enumerate() {
            chunk.copy_from_slice(&self.pages[usize::from(UID_PAGE) + i]);
        }
        TagUid::new(bytes)
    }

    /// The key the tag currently answers to.
    #[must_use]
    pub const fn key(&self) -> &TagKey {
        &self.key
    }

    /// Returns `true` if `key` would authenticate. No side effects.
    #[must_use]
    pub fn accepts(&self, key: &TagKey) -> bool {
        &self.key == key
    }

    /// The hardware counter.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Raw page contents, including write-only pages.
    #[must_use]
    pub fn page(&self, page: u8) -> [u8; PAGE_SIZE] {
        self.pages[usize::from(page)]
    }

    /// Raw bytes of the ticket region as a region read would return them.
    #[must_use]
    pub fn region(&self) -> [u8; REGION_SIZE] {
        let mut out = [0u8; REGION_SIZE];
        for (i, chunk) in out.chunks_exact_mut(PAGE_SIZE).enumerate() {
            chunk.copy_from_slice(&self.visible_page(TICKET_START_PAGE + i as u8));
        }
        out
    }

    /// Accepted write calls, oldest first.
    #[must_use]
    pub fn writes(&self) -> &[PageWrite] {
        &self.writes
    }

    /// Number of accepted write calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Forgets the write history.
    pub fn clear_write_log(&mut self) {
        self.writes.clear();
    }

    // ------------------------------------------------------------------
    // Direct manipulation (an attacker with a raw writer, or test setup)
    // ------------------------------------------------------------------

    /// Overwrites a page, bypassing protection.
    pub fn set_page(&mut self, page: u8, bytes: [u8; PAGE_SIZE]) {
        self.pages[usize::from(page)] = bytes;
    }

    /// Flips every bit of one byte in the ticket region.
    pub fn corrupt_region_byte(&mut self, offset: usize) {
        let page = usize::from(TICKET_START_PAGE) + offset / PAGE_SIZE;
        self.pages[page][offset % PAGE_SIZE] ^= 0xFF;
    }

    /// Replaces the authentication key.
    pub fn set_key(&mut self, key: TagKey) {
        self.pages[usize::from(KEY_PAGE)..usize::from(KEY_PAGE + KEY_PAGE_COUNT)]
            .iter_mut()
            .zip(key.as_bytes().chunks_exact(PAGE_SIZE))
            .for_each(|(page, chunk)| page.copy_from_slice(chunk));
        self.key = key;
    }

    /// Sets the hardware counter.
    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter.min(COUNTER_MAX);
    }

    // ------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------

    /// Every read fails until faults are cleared.
    pub fn fail_reads(&mut self) {
        self.faults.fail_reads = true;
    }

    /// The next write call fails.
    pub fn fail_next_write(&mut self) {
        self.faults.fail_next_writes += 1;
    }

    /// Every write touching `page` fails until faults are cleared.
    pub fn fail_writes_to(&mut self, page: u8) {
        self.faults.fail_pages.insert(page);
    }

    /// The tag leaves the field after `n` more accepted writes.
    pub fn remove_after_writes(&mut self, n: usize) {
        self.faults.writes_before_removal = Some(n);
    }

    /// The tag leaves the field now.
    pub fn remove(&mut self) {
        self.faults.removed = true;
    }

    /// Clears every fault and puts the tag back in the field. Like a real
    /// re-tap, this drops the authenticated state.
    pub fn clear_faults(&mut self) {
        self.faults = Faults::default();
        self.authenticated = false;
    }

    // ------------------------------------------------------------------

    fn auth0(&self) -> u8 {
        self.pages[usize::from(AUTH0_PAGE)][0]
    }

    fn read_protected(&self) -> bool {
        self.pages[usize::from(AUTH1_PAGE)][0] & 1 == 0
    }

    fn visible_page(&self, page: u8) -> [u8; PAGE_SIZE] {
        if page == COUNTER_PAGE {
            self.counter.to_le_bytes()
        } else if (KEY_PAGE..KEY_PAGE + KEY_PAGE_COUNT).contains(&page) {
            [0; PAGE_SIZE]
        } else {
            self.pages[usize::from(page)]
        }
    }

    fn check_present(&self) -> Result<(), TransportError> {
        if self.faults.removed {
            Err(TransportError::Removed)
        } else {
            Ok(())
        }
    }

    fn check_access(&self, start: u8, count: u8, write: bool) -> Result<(), TransportError> {
        let protected = write || self.read_protected();
        for page in start..start + count {
            if write && page < READ_ONLY_PAGES {
                return Err(TransportError::Nak { page });
            }
            if protected && !self.authenticated && page >= self.auth0() {
                return Err(TransportError::Nak { page });
            }
        }
        Ok(())
    }

    fn check_write_faults(&mut self, start: u8, count: u8) -> Result<(), TransportError> {
        if let Some(remaining) = self.faults.writes_before_removal {
            if remaining == 0 {
                self.faults.removed = true;
                return Err(TransportError::Removed);
            }
        }
        if self.faults.fail_next_writes > 0 {
            self.faults.fail_next_writes -= 1;
            return Err(TransportError::Nak { page: start });
        }
        if let Some(&page) = self
            .faults
            .fail_pages
            .iter()
            .find(|&&page| page >= start && page < start + count)
        {
            return Err(TransportError::Nak { page });
        }
        Ok(())
    }

    fn apply_write(&mut self, data: &[u8], start: u8) -> Result<(), TransportError> {
        let mut key_touched = false;
        let mut counter = self.counter;
        for (offset, chunk) in data.chunks_exact(PAGE_SIZE).enumerate() {
            let page = start + offset as u8;
            if page == COUNTER_PAGE {
                counter += u32::from(u16::from_le_bytes([chunk[0], chunk[1]]));
                if counter > COUNTER_MAX {
                    return Err(TransportError::Nak { page });
                }
            }
        }
        for (offset, chunk) in data.chunks_exact(PAGE_SIZE).enumerate() {
            let page = start + offset as u8;
            if page == COUNTER_PAGE {
                continue;
            }
            self.pages[usize::from(page)].copy_from_slice(chunk);
            key_touched |= (KEY_PAGE..KEY_PAGE + KEY_PAGE_COUNT).contains(&page);
        }
        self.counter = counter;
        if key_touched {
            let mut key = [0u8; TAG_KEY_SIZE];
            for (i, chunk) in key.chunks_exact_mut(PAGE_SIZE).enumerate() {
                chunk.copy_from_slice(&self.pages[usize::from(KEY_PAGE) + i]);
            }
            self.key = TagKey::new(key);
        }
        Ok(())
    }
}

impl TagTransport for SimulatedTag {
    fn authenticate(&mut self, key: &TagKey) -> Result<(), TransportError> {
        self.check_present()?;
        self.authenticated = self.accepts(key);
        if self.authenticated {
            Ok(())
        } else {
            Err(TransportError::AuthRejected)
        }
    }

    fn read_pages(&mut self, start: u8, count: u8) -> Result<Vec<u8>, TransportError> {
        check_range(start, count, None)?;
        self.check_present()?;
        if self.faults.fail_reads {
            return Err(TransportError::Nak { page: start });
        }
        self.check_access(start, count, false)?;
        Ok((start..start + count)
            .flat_map(|page| self.visible_page(page))
            .collect())
    }

    fn write_pages(&mut self, data: &[u8], start: u8, count: u8) -> Result<(), TransportError> {
        check_range(start, count, Some(data.len()))?;
        self.check_present()?;
        self.check_write_faults(start, count)?;
        self.check_access(start, count, true)?;
        self.apply_write(data, start)?;
        if let Some(remaining) = self.faults.writes_before_removal.as_mut() {
            *remaining -= 1;
        }
        self.writes.push(PageWrite { start, count });
        Ok(())
    }
}

impl Default for SimulatedTag {
    fn default() -> Self {
        Self::with_seed(1)
    }
}
