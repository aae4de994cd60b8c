//! Page buffer and page programming

use crate::device::MAX_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::programmer::IspTransport;
use crate::protocol::{self, ExtendedAddress};

use super::busy::BusyWait;

/// Value of an erased flash byte
const ERASED_VALUE: u8 = 0xFF;

/// One flash page worth of data
///
/// Bytes not covered by the image are left at the erased value, so
/// committing the page does not change them.
#[derive(Debug, Clone)]
pub struct PageBuffer {
    bytes: [u8; MAX_PAGE_SIZE as usize],
    size: usize,
}

impl PageBuffer {
    /// Create an erased buffer for pages of `page_size` bytes
    pub fn new(page_size: u32) -> Result<Self> {
        if page_size == 0 || page_size % 2 != 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidPageSize { page_size });
        }
        Ok(Self {
            bytes: [ERASED_VALUE; MAX_PAGE_SIZE as usize],
            size: page_size as usize,
        })
    }

    /// Refill the buffer for the page starting at `page_address`
    ///
    /// `data` starts at byte address `data_address`; only the part of it
    /// inside the page is copied.
    pub fn fill(&mut self, page_address: u32, data_address: u32, data: &[u8]) {
        let page = &mut self.bytes[..self.size];
        page.fill(ERASED_VALUE);

        let page_end = page_address as u64 + page.len() as u64;
        let data_end = data_address as u64 + data.len() as u64;
        let start = (page_address as u64).max(data_address as u64);
        let end = page_end.min(data_end);
        if start >= end {
            return;
        }

        let dst = (start - page_address as u64) as usize;
        let src = (start - data_address as u64) as usize;
        let len = (end - start) as usize;
        page[dst..dst + len].copy_from_slice(&data[src..src + len]);
    }

    /// The page contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.size]
    }

    /// Whether every byte is erased
    pub fn is_blank(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == ERASED_VALUE)
    }
}

/// Start addresses of the pages touched by `len` bytes at `address`
pub fn page_addresses(address: u32, len: usize, page_size: u32) -> impl Iterator<Item = u32> {
    let page_size = page_size.max(1);
    let first = address / page_size;
    let last = if len == 0 {
        first
    } else {
        (address as u64 + len as u64 - 1) as u32 / page_size + 1
    };
    (first..last).map(move |page| page * page_size)
}

/// Result of programming one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was loaded, committed and has finished programming
    Written,
    /// The page was entirely erased bytes and nothing was sent
    Skipped,
}

/// Program one page
///
/// Loads the page buffer word by word, selects the page's bank through
/// `cache`, commits the page and waits for completion with `busy`. A page
/// of erased bytes is skipped without any wire traffic.
pub fn program_page<T: IspTransport + ?Sized>(
    transport: &mut T,
    cache: &mut ExtendedAddress,
    busy: &BusyWait,
    page: &[u8],
    byte_address: u32,
) -> Result<PageOutcome> {
    if page.iter().all(|&b| b == ERASED_VALUE) {
        return Ok(PageOutcome::Skipped);
    }

    let page_word = byte_address / 2;
    for (index, word) in page.chunks_exact(2).enumerate() {
        protocol::load_page_word(transport, index as u8, word[0], word[1])?;
    }

    cache.select(transport, page_word)?;
    protocol::write_page(transport, page_word)?;
    busy.wait(transport, cache, page, page_word)?;

    Ok(PageOutcome::Written)
}
