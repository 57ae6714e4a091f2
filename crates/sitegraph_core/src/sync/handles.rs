//! Connection-port heuristic for edges drawn between positioned nodes.

use crate::model::edge::Handle;
use crate::model::node::Position;

/// Source/target ports chosen for one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlePair {
    pub source: Handle,
    pub target: Handle,
}

impl HandlePair {
    const DEFAULT: Self = Self {
        source: Handle::Right,
        target: Handle::Left,
    };
}

impl Default for HandlePair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Picks ports from the dominant axis between the two endpoints.
///
/// Horizontal wins only when `|dx| > |dy|`; ties fall through to the
/// vertical rule. Missing positions yield `right -> left`.
pub fn assign_handles(source: Option<Position>, target: Option<Position>) -> HandlePair {
    let (Some(source), Some(target)) = (source, target) else {
        return HandlePair::DEFAULT;
    };

    let dx = target.x - source.x;
    let dy = target.y - source.y;

    if dx.abs() > dy.abs() {
        if dx > 0.0 {
            HandlePair {
                source: Handle::Right,
                target: Handle::Left,
            }
        } else {
            HandlePair {
                source: Handle::Left,
                target: Handle::Right,
            }
        }
    } else if dy > 0.0 {
        HandlePair {
            source: Handle::Bottom,
            target: Handle::Top,
        }
    } else {
        HandlePair {
            source: Handle::Top,
            target: Handle::Bottom,
        }
    }
}
