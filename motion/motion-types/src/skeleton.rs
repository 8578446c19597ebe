//! Bone hierarchy, role resolution and bone chains.

use hashbrown::HashMap;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::proxy::RigidBodyProxy;
use crate::role::{BoneRole, Side};

/// Index of a bone within its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneId(pub usize);

impl BoneId {
    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bone({})", self.0)
    }
}

/// A named node in the bone hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Bone name, also the key used in the motion store.
    pub name: String,
    /// Rest position in model space.
    pub position: Point3<f64>,
    /// Parent bone, `None` for a root.
    pub parent: Option<BoneId>,
}

/// A skeleton: bones, collision proxies and arm-sizing capability.
///
/// Bones are added parent-first, so the hierarchy is acyclic by construction.
///
/// # Example
///
/// ```
/// use motion_types::{Skeleton, BoneRole, Side};
/// use nalgebra::Point3;
///
/// let mut skeleton = Skeleton::new("model");
/// skeleton.add_bone("root", Point3::origin(), None).unwrap();
/// skeleton.add_bone("upper_arm.L", Point3::new(-2.0, 10.0, 0.0), Some("root")).unwrap();
///
/// let chain = skeleton.chain_to_root("upper_arm.L").unwrap();
/// assert_eq!(chain.len(), 2);
/// assert!(skeleton.resolve_role(BoneRole::UpperArm, Side::Left).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    name: String,
    bones: Vec<Bone>,
    index: HashMap<String, BoneId>,
    role_aliases: HashMap<String, BoneId>,
    proxies: Vec<RigidBodyProxy>,
    head_proxy: Option<RigidBodyProxy>,
    can_arm_sizing: bool,
}

impl Skeleton {
    /// Create an empty skeleton.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Skeleton name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a bone under `parent` (or as a root).
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        position: Point3<f64>,
        parent: Option<&str>,
    ) -> Result<BoneId> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(MotionError::DuplicateBone(name));
        }
        let parent = match parent {
            Some(parent_name) => Some(self.id_of(parent_name).ok_or_else(|| {
                MotionError::InvalidParent {
                    bone: name.clone(),
                    parent: parent_name.to_string(),
                }
            })?),
            None => None,
        };

        let id = BoneId(self.bones.len());
        self.index.insert(name.clone(), id);
        self.bones.push(Bone {
            name,
            position,
            parent,
        });
        Ok(id)
    }

    /// Number of bones.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Look up a bone by id.
    #[must_use]
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    /// Look up a bone id by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<BoneId> {
        self.index.get(name).copied()
    }

    /// Look up a bone by name.
    #[must_use]
    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.id_of(name).and_then(|id| self.bone(id))
    }

    /// Whether a bone with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over all bones in insertion order.
    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones.iter().enumerate().map(|(i, b)| (BoneId(i), b))
    }

    /// Bind a role to an existing bone whose name is not canonical.
    pub fn bind_role(&mut self, role: BoneRole, side: Side, bone_name: &str) -> Result<()> {
        let id = self
            .id_of(bone_name)
            .ok_or_else(|| MotionError::bone_not_found(bone_name))?;
        self.role_aliases.insert(role.canonical_name(side), id);
        Ok(())
    }

    /// Resolve a role to a bone: explicit binding first, canonical name second.
    #[must_use]
    pub fn resolve_role(&self, role: BoneRole, side: Side) -> Option<BoneId> {
        let canonical = role.canonical_name(side);
        self.role_aliases
            .get(&canonical)
            .copied()
            .or_else(|| self.id_of(&canonical))
    }

    /// Add a collision proxy.
    pub fn add_proxy(&mut self, proxy: RigidBodyProxy) -> Result<()> {
        proxy.validate()?;
        self.proxies.push(proxy);
        Ok(())
    }

    /// Collision proxies in definition order.
    #[must_use]
    pub fn proxies(&self) -> &[RigidBodyProxy] {
        &self.proxies
    }

    /// Set the head collision proxy.
    pub fn set_head_proxy(&mut self, proxy: RigidBodyProxy) -> Result<()> {
        proxy.validate()?;
        self.head_proxy = Some(proxy);
        Ok(())
    }

    /// The head collision proxy, if the skeleton has one.
    #[must_use]
    pub fn head_proxy(&self) -> Option<&RigidBodyProxy> {
        self.head_proxy.as_ref()
    }

    /// Mark whether the skeleton carries a complete arm rig.
    pub fn set_arm_sizing(&mut self, capable: bool) {
        self.can_arm_sizing = capable;
    }

    /// Whether the skeleton carries a complete arm rig.
    #[must_use]
    pub fn can_arm_sizing(&self) -> bool {
        self.can_arm_sizing
    }

    /// Build the chain from the hierarchy root down to `name`.
    pub fn chain_to_root(&self, name: &str) -> Result<BoneChain> {
        let id = self
            .id_of(name)
            .ok_or_else(|| MotionError::bone_not_found(name))?;
        self.chain_to_root_from(id)
    }

    /// Build the chain from the hierarchy root down to `id`.
    pub fn chain_to_root_from(&self, id: BoneId) -> Result<BoneChain> {
        let mut bones = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let bone = self
                .bone(cur)
                .ok_or_else(|| MotionError::bone_not_found(cur.to_string()))?;
            bones.push(cur);
            current = bone.parent;
        }
        bones.reverse();
        Ok(BoneChain { bones })
    }
}

/// Ordered bones from a root down to an effector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneChain {
    bones: Vec<BoneId>,
}

impl BoneChain {
    /// Create a chain from root-first bone ids.
    #[must_use]
    pub fn new(bones: Vec<BoneId>) -> Self {
        Self { bones }
    }

    /// Bones, root first.
    #[must_use]
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    /// Number of bones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// First bone of the chain.
    #[must_use]
    pub fn root(&self) -> Option<BoneId> {
        self.bones.first().copied()
    }

    /// Last bone of the chain.
    #[must_use]
    pub fn effector(&self) -> Option<BoneId> {
        self.bones.last().copied()
    }

    /// Position of `id` within the chain.
    #[must_use]
    pub fn position_of(&self, id: BoneId) -> Option<usize> {
        self.bones.iter().position(|&b| b == id)
    }

    /// Whether `id` is part of the chain.
    #[must_use]
    pub fn contains(&self, id: BoneId) -> bool {
        self.bones.contains(&id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::proxy::ProxyShape;

    fn arm_skeleton() -> Skeleton {
        let mut s = Skeleton::new("test");
        s.add_bone("root", Point3::origin(), None).unwrap();
        s.add_bone("upper_arm.L", Point3::new(-2.0, 10.0, 0.0), Some("root"))
            .unwrap();
        s.add_bone("elbow.L", Point3::new(-5.0, 10.0, 0.0), Some("upper_arm.L"))
            .unwrap();
        s.add_bone("wrist.L", Point3::new(-8.0, 10.0, 0.0), Some("elbow.L"))
            .unwrap();
        s
    }

    #[test]
    fn test_chain_to_root() {
        let s = arm_skeleton();
        let chain = s.chain_to_root("wrist.L").unwrap();
        let names: Vec<_> = chain
            .bones()
            .iter()
            .map(|&id| s.bone(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["root", "upper_arm.L", "elbow.L", "wrist.L"]);
        assert_eq!(chain.root(), s.id_of("root"));
        assert_eq!(chain.effector(), s.id_of("wrist.L"));
        assert_eq!(chain.position_of(s.id_of("elbow.L").unwrap()), Some(2));
    }

    #[test]
    fn test_missing_bone() {
        let s = arm_skeleton();
        assert!(s.chain_to_root("nope").unwrap_err().is_bone_not_found());
    }

    #[test]
    fn test_duplicate_and_orphan_bones() {
        let mut s = arm_skeleton();
        assert_eq!(
            s.add_bone("root", Point3::origin(), None),
            Err(MotionError::DuplicateBone("root".into()))
        );
        assert!(matches!(
            s.add_bone("hand", Point3::origin(), Some("missing")),
            Err(MotionError::InvalidParent { .. })
        ));
    }

    #[test]
    fn test_role_resolution() {
        let mut s = arm_skeleton();
        assert_eq!(
            s.resolve_role(BoneRole::Elbow, Side::Left),
            s.id_of("elbow.L")
        );
        assert_eq!(s.resolve_role(BoneRole::Elbow, Side::Right), None);

        s.add_bone("RightElbow", Point3::new(5.0, 10.0, 0.0), Some("root"))
            .unwrap();
        s.bind_role(BoneRole::Elbow, Side::Right, "RightElbow").unwrap();
        assert_eq!(
            s.resolve_role(BoneRole::Elbow, Side::Right),
            s.id_of("RightElbow")
        );
        assert!(s.bind_role(BoneRole::Wrist, Side::Right, "nope").is_err());
    }

    #[test]
    fn test_proxies() {
        let mut s = arm_skeleton();
        let chest = RigidBodyProxy::new(
            "chest",
            s.id_of("root"),
            ProxyShape::sphere(2.0),
            Point3::new(0.0, 9.0, 0.0),
        );
        s.add_proxy(chest).unwrap();
        assert_eq!(s.proxies().len(), 1);
        assert!(s.head_proxy().is_none());

        let bad = RigidBodyProxy::new("bad", None, ProxyShape::sphere(0.0), Point3::origin());
        assert!(s.add_proxy(bad).is_err());
    }
}
