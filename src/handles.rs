//! Tracking of the blob read sessions opened through a cursor

use rsfbdata_core::{FbError, FirebirdClient};
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::connection::FbConnection;

/// Server handle of a read session. `None` once closed.
pub(crate) type HandleSlot<H> = Rc<Cell<Option<H>>>;

// The read sessions keep the strong reference, so a dropped
// session just leaves a dead entry here
pub struct BlobHandles<C: FirebirdClient> {
    conn: FbConnection<C>,
    open: RefCell<Vec<Weak<Cell<Option<C::BlobHandle>>>>>,
}

impl<C: FirebirdClient> BlobHandles<C> {
    pub fn new(conn: FbConnection<C>) -> Self {
        BlobHandles {
            conn,
            open: RefCell::new(Vec::new()),
        }
    }

    /// Starts tracking a read session
    pub(crate) fn register(&self, slot: &HandleSlot<C::BlobHandle>) {
        let mut open = self.open.borrow_mut();

        open.retain(|weak| weak.upgrade().map(|s| s.get().is_some()).unwrap_or(false));
        open.push(Rc::downgrade(slot));
    }

    /// Number of tracked sessions still holding a server handle
    pub fn open_count(&self) -> usize {
        self.open
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// Closes every tracked session still open.
    ///
    /// All the handles are released even if some close fails, the first
    /// error is returned
    pub fn close_all(&self) -> Result<(), FbError> {
        let old = std::mem::take(&mut *self.open.borrow_mut());
        let mut res = Ok(());

        for slot in old.iter().filter_map(Weak::upgrade) {
            if let Some(handle) = slot.take() {
                let closed = self.conn.with_client(|c| c.close_blob(handle));

                if let Err(e) = closed {
                    warn!("Failed to close a blob read session: {}", e);
                    if res.is_ok() {
                        res = Err(e);
                    }
                }
            }
        }

        res
    }
}
