// registry.rs — GoalRegistry: every goal tracked by one action server.
//
// Handles are owned by an ordered map keyed by an acceptance sequence
// number, so iteration is always in acceptance order. A second map indexes
// sequence numbers by goal id for lookups. Neither map hands out anything
// but borrows, so no caller can keep a reference to a handle across an
// `accept` or `remove`.

use std::collections::{BTreeMap, HashMap};

use act_goal::{GoalHandle, GoalId, GoalInfo};

use crate::error::ServerError;

/// The set of goals owned by one action server.
#[derive(Debug, Default)]
pub struct GoalRegistry {
    handles: BTreeMap<u64, GoalHandle>,
    index: HashMap<GoalId, u64>,
    next_seq: u64,
    /// Maximum number of tracked goals, if bounded.
    limit: Option<usize>,
}

impl GoalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses to grow past `limit` goals.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Start tracking a new goal in the Accepted state.
    ///
    /// Fails without modifying the registry if the id is already tracked
    /// or storage cannot grow.
    pub fn accept(&mut self, info: GoalInfo) -> Result<&GoalHandle, ServerError> {
        if self.index.contains_key(&info.id) {
            return Err(ServerError::DuplicateGoalId(info.id));
        }
        if let Some(limit) = self.limit {
            if self.handles.len() >= limit {
                return Err(ServerError::AllocationFailure {
                    reason: format!("goal limit of {limit} reached"),
                });
            }
        }
        self.index
            .try_reserve(1)
            .map_err(|e| ServerError::AllocationFailure {
                reason: e.to_string(),
            })?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(info.id, seq);
        let handle = self.handles.entry(seq).or_insert(GoalHandle::new(info));
        Ok(handle)
    }

    pub fn get(&self, id: &GoalId) -> Option<&GoalHandle> {
        let seq = self.index.get(id)?;
        self.handles.get(seq)
    }

    pub fn get_mut(&mut self, id: &GoalId) -> Option<&mut GoalHandle> {
        let seq = *self.index.get(id)?;
        self.handles.get_mut(&seq)
    }

    pub fn contains(&self, id: &GoalId) -> bool {
        self.index.contains_key(id)
    }

    /// All handles in acceptance order.
    pub fn all(&self) -> impl Iterator<Item = &GoalHandle> + '_ {
        self.handles.values()
    }

    /// Stop tracking a goal, returning its handle.
    pub fn remove(&mut self, id: &GoalId) -> Option<GoalHandle> {
        let seq = self.index.remove(id)?;
        self.handles.remove(&seq)
    }

    /// Drop every handle (server shutdown).
    pub fn clear(&mut self) {
        self.handles.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
