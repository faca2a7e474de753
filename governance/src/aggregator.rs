//! Nervos DAO deposit weight of a single address.
//!
//! The explorer lists live cells page by page (sorted by capacity, largest
//! first). [`LiveCellPages`] walks that listing lazily; [`DepositAggregator`]
//! keeps the deposit cells and converts their capacity into whole CKB.

use crate::error::LookupError;
use tracing::{debug, warn};
use watchdog_client::{ExplorerApi, HttpTransport, LiveCell, PageFetch};
use watchdog_types::{CkbAddress, Shannons, WeightBreakdown};

/// `cell_type` of a Nervos DAO deposit cell. Withdrawing cells do not count.
pub const DEPOSIT_CELL_TYPE: &str = "nervos_dao_deposit";

/// Default bound on explorer pages for one address.
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PagerState {
    Open,
    Done,
    /// The explorer does not know the address at all.
    Unknown,
}

/// A restartable, finite walk over an address's live-cell pages.
///
/// The sequence ends after a page shorter than the page size, an empty page,
/// or a 404. A 404 on the very first page marks the address unknown; on a
/// later page it only ends the listing.
pub struct LiveCellPages<'a, T> {
    explorer: &'a ExplorerApi<T>,
    address: &'a CkbAddress,
    max_pages: u32,
    next_page: u32,
    state: PagerState,
}

impl<'a, T: HttpTransport> LiveCellPages<'a, T> {
    pub fn new(explorer: &'a ExplorerApi<T>, address: &'a CkbAddress, max_pages: u32) -> Self {
        Self {
            explorer,
            address,
            max_pages,
            next_page: 1,
            state: PagerState::Open,
        }
    }

    /// Fetch the next page, or `None` once the listing has ended.
    ///
    /// An error ends the sequence; a later call returns `None` until
    /// [`restart`](Self::restart).
    pub async fn next_page(&mut self) -> Result<Option<Vec<LiveCell>>, LookupError> {
        if self.state != PagerState::Open {
            return Ok(None);
        }
        if self.next_page > self.max_pages {
            self.state = PagerState::Done;
            return Err(LookupError::PageCap(self.max_pages));
        }

        let page = self.next_page;
        let fetched = match self.explorer.live_cells_page(self.address, page).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.state = PagerState::Done;
                return Err(e.into());
            }
        };
        self.next_page += 1;

        match fetched {
            PageFetch::NotFound => {
                self.state = if page == 1 {
                    PagerState::Unknown
                } else {
                    PagerState::Done
                };
                Ok(None)
            }
            PageFetch::Page(cells) => {
                let page_size = usize::try_from(self.explorer.page_size()).unwrap_or(usize::MAX);
                if cells.is_empty() || cells.len() < page_size {
                    self.state = PagerState::Done;
                }
                debug!(address = self.address.short(), page, cells = cells.len(), "fetched live cells");
                Ok(Some(cells))
            }
        }
    }

    /// Whether the explorer answered 404 for the first page.
    pub fn is_unknown_address(&self) -> bool {
        self.state == PagerState::Unknown
    }

    /// Number of pages fetched successfully so far.
    pub fn pages_fetched(&self) -> u32 {
        self.next_page - 1
    }

    /// Rewind to page 1.
    pub fn restart(&mut self) {
        self.next_page = 1;
        self.state = PagerState::Open;
    }
}

fn lookup_failed(address: &CkbAddress, error: LookupError) -> WeightBreakdown {
    warn!(address = address.short(), error = %error, "deposit lookup failed");
    WeightBreakdown::failed(address.clone(), error.to_string())
}

pub struct DepositAggregator<T> {
    explorer: ExplorerApi<T>,
    max_pages: u32,
}

impl<T: HttpTransport> DepositAggregator<T> {
    pub fn new(explorer: ExplorerApi<T>) -> Self {
        Self::with_max_pages(explorer, DEFAULT_MAX_PAGES)
    }

    pub fn with_max_pages(explorer: ExplorerApi<T>, max_pages: u32) -> Self {
        Self { explorer, max_pages }
    }

    pub fn pages<'a>(&'a self, address: &'a CkbAddress) -> LiveCellPages<'a, T> {
        LiveCellPages::new(&self.explorer, address, self.max_pages)
    }

    /// Floored deposit weight of `address`.
    ///
    /// Never fails: lookup problems come back as a `Failed` breakdown worth 0.
    pub async fn aggregate(&self, address: &CkbAddress) -> WeightBreakdown {
        let mut pages = self.pages(address);
        let mut total = Shannons::ZERO;
        let mut deposit_cells = 0usize;

        loop {
            let cells = match pages.next_page().await {
                Ok(Some(cells)) => cells,
                Ok(None) => break,
                Err(e) => return lookup_failed(address, e),
            };
            // Other cell types are dropped before their capacity is looked at.
            for cell in cells.iter().filter(|c| c.cell_type == DEPOSIT_CELL_TYPE) {
                let Some(capacity) = cell.capacity else {
                    return lookup_failed(address, LookupError::UnreadableDeposit(pages.pages_fetched()));
                };
                total = total + capacity;
                deposit_cells += 1;
            }
        }

        if pages.is_unknown_address() {
            debug!(address = address.short(), "address not found on explorer");
            return WeightBreakdown::not_found(address.clone());
        }
        let weight = total.to_ckb_floor();
        debug!(
            address = address.short(),
            pages = pages.pages_fetched(),
            deposit_cells,
            weight,
            "aggregated deposits"
        );
        WeightBreakdown::found(address.clone(), weight, deposit_cells)
    }
}
