use crate::store::BlockStore;
use tracing::debug;

/// Drag-and-drop progress for one editor instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(String),
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match self {
            DragState::Dragging(id) => Some(id.as_str()),
            DragState::Idle => None,
        }
    }

    /// Starts dragging a block that exists in `store`. Returns `false` and
    /// stays idle for an unknown id.
    pub fn begin(&mut self, store: &BlockStore, block_id: &str) -> bool {
        if store.get(block_id).is_none() {
            *self = DragState::Idle;
            return false;
        }
        *self = DragState::Dragging(block_id.to_string());
        true
    }

    /// Drops the dragged block before `target_id`. The state is `Idle`
    /// afterwards whether or not anything moved.
    pub fn drop_on(&mut self, store: &mut BlockStore, target_id: &str) -> bool {
        let DragState::Dragging(dragged_id) = std::mem::take(self) else {
            return false;
        };
        let moved = store.reorder(&dragged_id, target_id);
        if !moved {
            debug!(dragged_id = %dragged_id, target_id, "drop ignored");
        }
        moved
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}
