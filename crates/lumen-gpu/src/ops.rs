//! Queue operation sets.
//!
//! Applications describe the queues they need as two [`Operations`] masks:
//! one for roles that must merely exist (sharing allowed) and one for roles
//! that must get an exclusive queue family.

use bitflags::bitflags;

bitflags! {
    /// Set of queue roles an application can request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Operations: u32 {
        /// Graphics command submission.
        const GRAPHICS = 1 << 0;
        /// Presentation to a surface.
        const PRESENTATION = 1 << 1;
        /// Compute dispatch.
        const COMPUTE = 1 << 2;
        /// Transfer (copy) operations.
        const TRANSFER = 1 << 3;
    }
}

impl Operations {
    /// Whether this set contains the given single role.
    ///
    /// Queries on multi-bit masks indicate a logic error upstream.
    pub fn has(self, role: Operations) -> bool {
        debug_assert_eq!(role.bits().count_ones(), 1, "role query on multi-bit mask");
        self.contains(role)
    }
}

/// The queues an application asks for when building a device.
///
/// A role present in `dedicated` is implicitly requested: selection treats
/// the requested set as `supported | dedicated`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRequest {
    /// Roles that must resolve to some queue family (sharing allowed).
    pub supported: Operations,
    /// Roles that must resolve to a family no other role uses.
    pub dedicated: Operations,
}

impl QueueRequest {
    /// Every role the request mentions, shared or dedicated.
    pub fn requested(self) -> Operations {
        self.supported | self.dedicated
    }

    /// Whether `role` is requested and allowed to share a family.
    pub fn shared(self, role: Operations) -> bool {
        self.requested().has(role) && !self.dedicated.has(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_intersection() {
        let a = Operations::GRAPHICS | Operations::COMPUTE;
        let b = Operations::COMPUTE | Operations::TRANSFER;
        assert_eq!(a | b, Operations::GRAPHICS | Operations::COMPUTE | Operations::TRANSFER);
        assert_eq!(a & b, Operations::COMPUTE);
        assert!(a.has(Operations::GRAPHICS));
        assert!(!a.has(Operations::TRANSFER));
    }

    #[test]
    fn dedicated_implies_requested() {
        let request = QueueRequest {
            supported: Operations::GRAPHICS,
            dedicated: Operations::COMPUTE,
        };
        assert!(request.requested().has(Operations::COMPUTE));
        assert!(!request.shared(Operations::COMPUTE));
        assert!(request.shared(Operations::GRAPHICS));
    }

    #[test]
    fn unrequested_role_is_not_shared() {
        let request = QueueRequest {
            supported: Operations::GRAPHICS,
            dedicated: Operations::empty(),
        };
        assert!(!request.shared(Operations::PRESENTATION));
    }
}
