//! Canonical bone roles.
//!
//! Arm processing never matches localized bone names. Every bone it cares
//! about is addressed by a [`BoneRole`] and, for limbs, a [`Side`]. A skeleton
//! resolves a role to one of its own bones either through the canonical name
//! (see [`BoneRole::canonical_name`]) or through an explicit alias bound with
//! [`Skeleton::bind_role`](crate::Skeleton::bind_role).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Body side of a limb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// Character's left.
    Left,
    /// Character's right.
    Right,
}

impl Side {
    /// Both sides, in processing order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Short suffix used in canonical bone names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Left => "L",
            Self::Right => "R",
        }
    }

    /// The opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// A bone's function in the arm/head rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoneRole {
    /// Upper arm (shoulder joint).
    UpperArm,
    /// Elbow joint.
    Elbow,
    /// Optional helper bone halfway between elbow and wrist.
    ElbowWristMidpoint,
    /// Wrist joint.
    Wrist,
    /// Optional index fingertip.
    IndexFingertip,
    /// Head. Not sided.
    Head,
}

impl BoneRole {
    /// The three bones whose keyframes drive arm processing.
    pub const ARM: [Self; 3] = [Self::UpperArm, Self::Elbow, Self::Wrist];

    /// Whether the role exists once per side.
    #[must_use]
    pub const fn is_sided(self) -> bool {
        !matches!(self, Self::Head)
    }

    /// Stem of the canonical name, without side suffix.
    #[must_use]
    pub const fn stem(self) -> &'static str {
        match self {
            Self::UpperArm => "upper_arm",
            Self::Elbow => "elbow",
            Self::ElbowWristMidpoint => "forearm_mid",
            Self::Wrist => "wrist",
            Self::IndexFingertip => "index_tip",
            Self::Head => "head",
        }
    }

    /// Canonical bone name for this role on the given side.
    ///
    /// ```
    /// use motion_types::{BoneRole, Side};
    ///
    /// assert_eq!(BoneRole::Elbow.canonical_name(Side::Left), "elbow.L");
    /// assert_eq!(BoneRole::Head.canonical_name(Side::Right), "head");
    /// ```
    #[must_use]
    pub fn canonical_name(self, side: Side) -> String {
        if self.is_sided() {
            format!("{}.{}", self.stem(), side.suffix())
        } else {
            self.stem().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display_and_suffix() {
        assert_eq!(Side::Left.to_string(), "left");
        assert_eq!(Side::Right.suffix(), "R");
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::ALL, [Side::Left, Side::Right]);
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(BoneRole::UpperArm.canonical_name(Side::Right), "upper_arm.R");
        assert_eq!(
            BoneRole::ElbowWristMidpoint.canonical_name(Side::Left),
            "forearm_mid.L"
        );
        assert_eq!(BoneRole::IndexFingertip.canonical_name(Side::Left), "index_tip.L");
        assert_eq!(BoneRole::Head.canonical_name(Side::Left), "head");
    }
}
