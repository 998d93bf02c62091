//! Per-file multi-line block state. A block opens on a boundary macro and closes on the
//! next boundary carrying the same option and setting; anything else while open is a
//! nesting error the caller reports.

use crate::types::LineState;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub option: String,
    pub setting: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBlock {
    pub key: BlockKey,
    /// 1-based line of the opening boundary.
    pub line: usize,
    pub state: LineState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryEvent {
    Opened,
    Closed(OpenBlock),
    /// A boundary for another key while `open` is still open; the block stays open.
    Mismatch { open: OpenBlock },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlockTracker {
    #[default]
    Idle,
    Open(OpenBlock),
}

impl BlockTracker {
    pub fn boundary(&mut self, key: BlockKey, line: usize, state: LineState) -> BoundaryEvent {
        match std::mem::take(self) {
            BlockTracker::Idle => {
                *self = BlockTracker::Open(OpenBlock { key, line, state });
                BoundaryEvent::Opened
            }
            BlockTracker::Open(open) if open.key == key => BoundaryEvent::Closed(open),
            BlockTracker::Open(open) => {
                *self = BlockTracker::Open(open.clone());
                BoundaryEvent::Mismatch { open }
            }
        }
    }

    pub fn open_block(&self) -> Option<&OpenBlock> {
        match self {
            BlockTracker::Idle => None,
            BlockTracker::Open(open) => Some(open),
        }
    }

    /// Consume the tracker at end of file, returning a block that was never closed.
    pub fn finish(self) -> Option<OpenBlock> {
        match self {
            BlockTracker::Idle => None,
            BlockTracker::Open(open) => Some(open),
        }
    }
}
