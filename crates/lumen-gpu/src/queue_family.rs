//! Queue family selection.
//!
//! Assigns graphics, presentation, compute, and transfer roles to the queue
//! families of a candidate device. Role combination is preferred where the
//! application allows sharing (fewer families means less submission and
//! synchronization overhead); compute and transfer additionally look for a
//! family distinct from graphics so work can run truly asynchronously.

use ash::vk;

use crate::ops::{Operations, QueueRequest};

/// Capability summary of one queue family on a physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyDescriptor {
    /// Queue family index.
    pub index: u32,
    /// Number of queues the family exposes.
    pub queue_count: u32,
    /// Supports graphics commands.
    pub graphics: bool,
    /// Supports compute dispatch.
    pub compute: bool,
    /// Supports transfer operations.
    pub transfer: bool,
    /// Supports presentation to the target surface.
    pub present: bool,
}

impl QueueFamilyDescriptor {
    /// Build a descriptor from the raw Vulkan family properties.
    ///
    /// Graphics and compute families can always transfer, even when the
    /// driver leaves the TRANSFER bit unset.
    pub fn from_vk(index: u32, props: &vk::QueueFamilyProperties, present: bool) -> Self {
        let graphics = props.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let compute = props.queue_flags.contains(vk::QueueFlags::COMPUTE);
        let transfer = props.queue_flags.contains(vk::QueueFlags::TRANSFER) || graphics || compute;

        Self {
            index,
            queue_count: props.queue_count,
            graphics,
            compute,
            transfer,
            present,
        }
    }

    fn supports(&self, role: Operations) -> bool {
        if role == Operations::GRAPHICS {
            self.graphics
        } else if role == Operations::PRESENTATION {
            self.present
        } else if role == Operations::COMPUTE {
            self.compute
        } else if role == Operations::TRANSFER {
            self.transfer
        } else {
            debug_assert!(false, "support query on multi-bit mask");
            false
        }
    }
}

/// Resolved graphics role.
///
/// Records which of the other roles the chosen family could additionally
/// serve, so the builder knows what synchronous sharing is possible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicsAssignment {
    /// Chosen family index, `None` if graphics was not requested or not found.
    pub family: Option<u32>,
    /// Queues available on the chosen family.
    pub queue_count: u32,
    /// The family can also present.
    pub supports_present: bool,
    /// The family can also run compute.
    pub supports_compute: bool,
    /// The family can also transfer.
    pub supports_transfer: bool,
}

/// Resolved presentation role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentAssignment {
    /// Chosen family index, `None` if unresolved.
    pub family: Option<u32>,
    /// Queues available on the chosen family.
    pub queue_count: u32,
}

/// Resolved compute or transfer role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsyncAssignment {
    /// Chosen family index, `None` if unresolved.
    pub family: Option<u32>,
    /// Queues available on the chosen family.
    pub queue_count: u32,
    /// The family is distinct from the graphics family, so submissions run
    /// in parallel with graphics work.
    pub asynchronous: bool,
}

/// The four role assignments for one candidate device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilySet {
    /// Graphics role.
    pub graphics: GraphicsAssignment,
    /// Presentation role.
    pub present: PresentAssignment,
    /// Compute role.
    pub compute: AsyncAssignment,
    /// Transfer role.
    pub transfer: AsyncAssignment,
}

const ROLES: [Operations; 4] = [
    Operations::GRAPHICS,
    Operations::PRESENTATION,
    Operations::COMPUTE,
    Operations::TRANSFER,
];

impl QueueFamilySet {
    /// Assign roles to queue families for one candidate device.
    ///
    /// Selection is a pure function of the family capability bits; family
    /// order only matters as the lowest-index tie-break.
    pub fn select(families: &[QueueFamilyDescriptor], request: QueueRequest) -> Self {
        let requested = request.requested();
        let mut set = Self::default();

        if requested.has(Operations::GRAPHICS) {
            set.graphics = select_graphics(families, request);
        }
        if requested.has(Operations::COMPUTE) {
            set.compute = select_async(families, set.graphics.family, Operations::COMPUTE, request);
        }
        if requested.has(Operations::TRANSFER) {
            set.transfer =
                select_async(families, set.graphics.family, Operations::TRANSFER, request);
        }
        if requested.has(Operations::PRESENTATION) {
            set.present = select_present(
                families,
                set.graphics,
                set.compute.family,
                set.transfer.family,
                request,
            );
        }

        set
    }

    /// Family index a role resolved to, if any.
    pub fn family_for(&self, role: Operations) -> Option<u32> {
        if role == Operations::GRAPHICS {
            self.graphics.family
        } else if role == Operations::PRESENTATION {
            self.present.family
        } else if role == Operations::COMPUTE {
            self.compute.family
        } else if role == Operations::TRANSFER {
            self.transfer.family
        } else {
            debug_assert!(false, "family query on multi-bit mask");
            None
        }
    }

    /// Whether `role` resolved to a family no other assigned role uses.
    ///
    /// Graphics counts as dedicated as soon as it is assigned; the other
    /// roles may share *its* family, never the reverse.
    pub fn has_dedicated_family(&self, role: Operations) -> bool {
        let Some(family) = self.family_for(role) else {
            return false;
        };
        if role == Operations::GRAPHICS {
            return true;
        }
        ROLES
            .iter()
            .filter(|&&other| other != role)
            .all(|&other| self.family_for(other) != Some(family))
    }

    /// Check the assignment against the application's request.
    ///
    /// Every supported role must have resolved; every dedicated role must
    /// have a family of its own.
    pub fn verify_support(&self, request: QueueRequest) -> bool {
        for role in ROLES {
            if request.requested().has(role) && self.family_for(role).is_none() {
                return false;
            }
            if request.dedicated.has(role) && !self.has_dedicated_family(role) {
                return false;
            }
        }
        true
    }

    /// Unique `(family index, queue count)` pairs across the assignments,
    /// in role order. One device queue-create-info is needed per entry.
    pub fn unique_families(&self) -> Vec<(u32, u32)> {
        let mut unique: Vec<(u32, u32)> = Vec::with_capacity(4);
        let counts = [
            (self.graphics.family, self.graphics.queue_count),
            (self.present.family, self.present.queue_count),
            (self.compute.family, self.compute.queue_count),
            (self.transfer.family, self.transfer.queue_count),
        ];
        for (family, count) in counts {
            if let Some(index) = family {
                if !unique.iter().any(|&(i, _)| i == index) {
                    unique.push((index, count));
                }
            }
        }
        unique
    }
}

/// Pick the graphics family.
///
/// Families are scored by how many of the requested, shareable roles they
/// cover in addition to graphics; maximal combination wins, lowest index
/// breaks ties. Roles requested as dedicated are resolved separately and
/// must not influence this choice.
fn select_graphics(families: &[QueueFamilyDescriptor], request: QueueRequest) -> GraphicsAssignment {
    let want_present = request.shared(Operations::PRESENTATION);
    let want_compute = request.shared(Operations::COMPUTE);
    let want_transfer = request.shared(Operations::TRANSFER);

    let mut best: Option<(&QueueFamilyDescriptor, u32)> = None;
    for family in families.iter().filter(|f| f.graphics) {
        let present = want_present && family.present;
        let compute = want_compute && family.compute;
        let transfer = want_transfer && family.transfer;

        let score = if want_present {
            if present && compute {
                6
            } else if present && transfer {
                5
            } else if present {
                4
            } else if compute && transfer {
                3
            } else if transfer {
                2
            } else {
                1
            }
        } else if compute && transfer {
            3
        } else if transfer {
            2
        } else {
            1
        };

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((family, score));
        }
    }

    best.map_or_else(GraphicsAssignment::default, |(family, _)| GraphicsAssignment {
        family: Some(family.index),
        queue_count: family.queue_count,
        supports_present: family.present,
        supports_compute: family.compute,
        supports_transfer: family.transfer,
    })
}

/// Pick an asynchronous compute or transfer family.
///
/// Only families other than the graphics family qualify; a family with
/// fewer additional responsibilities scores higher, so the role lands where
/// it competes least with other work. When no such family exists the role
/// falls back to sharing the graphics family synchronously, unless it was
/// requested dedicated.
fn select_async(
    families: &[QueueFamilyDescriptor],
    graphics_family: Option<u32>,
    role: Operations,
    request: QueueRequest,
) -> AsyncAssignment {
    let mut best: Option<(&QueueFamilyDescriptor, u32)> = None;
    for family in families {
        if Some(family.index) == graphics_family || !family.supports(role) {
            continue;
        }
        let (other_a, other_b) = if role == Operations::COMPUTE {
            (family.present, family.transfer)
        } else {
            (family.present, family.compute)
        };
        let score = match (other_a, other_b) {
            (false, false) => 4,
            (false, true) => 3,
            (true, false) => 2,
            (true, true) => 1,
        };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((family, score));
        }
    }

    if let Some((family, _)) = best {
        return AsyncAssignment {
            family: Some(family.index),
            queue_count: family.queue_count,
            asynchronous: true,
        };
    }

    // Synchronous fallback onto the graphics family. Forbidden for
    // dedicated roles: those must not alias any other assignment.
    if !request.dedicated.has(role) {
        if let Some(index) = graphics_family {
            if let Some(family) = families.iter().find(|f| f.index == index) {
                if family.supports(role) {
                    return AsyncAssignment {
                        family: Some(index),
                        queue_count: family.queue_count,
                        asynchronous: false,
                    };
                }
            }
        }
    }

    AsyncAssignment::default()
}

/// Pick the presentation family.
///
/// Presenting from the graphics family is preferred whenever sharing is
/// allowed. A dedicated presentation request skips that bypass and must
/// resolve to a family of its own; otherwise the remaining presenting
/// families are scored by isolation from the compute and transfer picks,
/// since overlap serializes presentation behind them.
fn select_present(
    families: &[QueueFamilyDescriptor],
    graphics: GraphicsAssignment,
    compute_family: Option<u32>,
    transfer_family: Option<u32>,
    request: QueueRequest,
) -> PresentAssignment {
    if !request.dedicated.has(Operations::PRESENTATION) {
        if let Some(index) = graphics.family {
            if graphics.supports_present {
                return PresentAssignment {
                    family: Some(index),
                    queue_count: graphics.queue_count,
                };
            }
        }
    }

    let mut best: Option<(&QueueFamilyDescriptor, u32)> = None;
    for family in families {
        if !family.present || Some(family.index) == graphics.family {
            continue;
        }
        let shares_compute = Some(family.index) == compute_family;
        let shares_transfer = Some(family.index) == transfer_family;
        let score = match (shares_compute, shares_transfer) {
            (false, false) => 4,
            (false, true) => 3,
            (true, false) => 2,
            (true, true) => 1,
        };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((family, score));
        }
    }

    best.map_or_else(PresentAssignment::default, |(family, _)| PresentAssignment {
        family: Some(family.index),
        queue_count: family.queue_count,
    })
}
