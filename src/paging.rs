//! Demand paging policy
//!
//! A pure decision function over a snapshot of the process table, plus a
//! small driver that carries the decision out against a [`Pager`]. Nothing
//! here touches the lookup pipeline.
//!
//! The policy serves the first active process only: if its current page is
//! not resident it asks for that page, and if the pager refuses it frees
//! the process's other pages in order until one page-out is accepted.

/// Virtual pages per process
pub const MAX_PROC_PAGES: usize = 20;

/// Processes competing for physical pages
pub const MAX_PROCESSES: usize = 20;

/// Bytes per page
pub const PAGE_SIZE: u64 = 128;

/// One row of the process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Process is running
    pub active: bool,

    /// Program counter
    pub pc: u64,

    /// Residency of each virtual page
    pub pages: Vec<bool>,
}

impl ProcessEntry {
    /// An active process with no resident pages
    pub fn new(pc: u64) -> Self {
        Self {
            active: true,
            pc,
            pages: vec![false; MAX_PROC_PAGES],
        }
    }

    /// An exited process
    pub fn inactive() -> Self {
        Self {
            active: false,
            pc: 0,
            pages: Vec::new(),
        }
    }

    /// Page holding the program counter
    pub fn current_page(&self) -> usize {
        (self.pc / PAGE_SIZE) as usize
    }

    fn is_resident(&self, page: usize) -> bool {
        self.pages.get(page).copied().unwrap_or(false)
    }
}

/// What the policy wants done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingAction {
    /// Nothing to do
    Idle,

    /// Bring `page` of `process` in, evicting from `evict` if refused
    PageIn {
        process: usize,
        page: usize,
        evict: Vec<usize>,
    },
}

/// Decide the next paging step for a process table
pub fn plan(table: &[ProcessEntry]) -> PagingAction {
    let Some((process, entry)) = table.iter().enumerate().find(|(_, e)| e.active) else {
        return PagingAction::Idle;
    };

    let page = entry.current_page();
    if entry.is_resident(page) {
        return PagingAction::Idle;
    }

    let evict = (0..entry.pages.len()).filter(|&p| p != page).collect();
    PagingAction::PageIn {
        process,
        page,
        evict,
    }
}

/// Backend that moves pages in and out of physical memory
pub trait Pager {
    /// Request a page-in; `true` if it started, is running, or is done
    fn page_in(&mut self, process: usize, page: usize) -> bool;

    /// Request a page-out; `true` if it started, is running, or is done
    fn page_out(&mut self, process: usize, page: usize) -> bool;
}

/// Carry out a planned action
///
/// Returns the page that was paged out, if any.
pub fn apply(action: &PagingAction, pager: &mut dyn Pager) -> Option<usize> {
    let PagingAction::PageIn {
        process,
        page,
        evict,
    } = action
    else {
        return None;
    };

    if pager.page_in(*process, *page) {
        return None;
    }

    evict
        .iter()
        .copied()
        .find(|&victim| pager.page_out(*process, victim))
}
