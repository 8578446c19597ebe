//! Per-side avoidance configuration.
//!
//! [`AvoidanceConfig::build`] resolves everything arm avoidance needs for one
//! side of one skeleton up front: the volumes to avoid (in processing order)
//! and the arm chains to keep out of them. Elbow-level chains come before
//! wrist-level chains so the elbow is settled before the wrist is checked.

use motion_kinematics::{IkChain, IkLink, forward_kinematics};
use motion_types::{BoneChain, BoneId, BoneRole, MotionStore, Side, Skeleton};
use nalgebra::Point3;
use tracing::{info, warn};

use crate::error::{AvoidError, Result};
use crate::params::AvoidanceParams;
use crate::volume::AvoidanceVolume;

/// Which joint family an arm chain checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainLevel {
    /// Elbow (and forearm midpoint) effectors, solved with the upper arm.
    Elbow,
    /// Wrist (and fingertip) effectors, solved with the elbow and upper arm.
    Wrist,
}

/// One IK attempt for an arm chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IkVariant {
    /// Bones the attempt may rotate, effector first.
    pub chain: IkChain,
    /// IK sweep budget.
    pub max_iterations: usize,
}

/// An effector kept out of the avoidance volumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmChain {
    /// Effector bone name.
    pub effector: String,
    /// Joint family.
    pub level: ChainLevel,
    /// Root-to-effector chain used for forward kinematics.
    pub fk_chain: BoneChain,
    /// IK attempts, tried in order until one is accepted.
    pub variants: Vec<IkVariant>,
}

impl ArmChain {
    /// World position of the effector at `frame`.
    pub fn effector_position(
        &self,
        skeleton: &Skeleton,
        motion: &MotionStore,
        frame: u32,
    ) -> Result<Point3<f64>> {
        let pose = forward_kinematics(skeleton, &self.fk_chain, motion, frame)?;
        Ok(pose.effector_position()?)
    }

    /// Names of the bones IK may write (every variant's links after the
    /// effector), in first-seen order.
    #[must_use]
    pub fn writable_bones(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for variant in &self.variants {
            for link in variant.chain.joints() {
                if !names.contains(&link.name.as_str()) {
                    names.push(&link.name);
                }
            }
        }
        names
    }
}

/// Everything needed to process one side of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceConfig {
    side: Side,
    volumes: Vec<AvoidanceVolume>,
    arm_chains: Vec<ArmChain>,
    watched_bones: Vec<String>,
    tracked_bones: Vec<String>,
}

impl AvoidanceConfig {
    /// Build the configuration for `side` of `skeleton`.
    ///
    /// Fails with [`AvoidError::Unsizable`] when the side is missing its
    /// upper arm, elbow or wrist, or when those bones are not ancestors of
    /// the effectors they are meant to move.
    pub fn build(skeleton: &Skeleton, side: Side, params: &AvoidanceParams) -> Result<Self> {
        let volumes = collect_volumes(skeleton, params)?;

        let upper = require_role(skeleton, BoneRole::UpperArm, side)?;
        let elbow = require_role(skeleton, BoneRole::Elbow, side)?;
        let wrist = require_role(skeleton, BoneRole::Wrist, side)?;
        let limit = params.similarity_limit;

        let mut arm_chains = Vec::new();
        for role in [BoneRole::Elbow, BoneRole::ElbowWristMidpoint] {
            if let Some(effector) = skeleton.resolve_role(role, side) {
                arm_chains.push(arm_chain(
                    skeleton,
                    ChainLevel::Elbow,
                    effector,
                    &[upper],
                    limit,
                    params.ik_iterations,
                )?);
            }
        }
        for role in [BoneRole::Wrist, BoneRole::IndexFingertip] {
            if let Some(effector) = skeleton.resolve_role(role, side) {
                arm_chains.push(arm_chain(
                    skeleton,
                    ChainLevel::Wrist,
                    effector,
                    &[elbow, upper],
                    limit,
                    params.ik_iterations,
                )?);
            }
        }

        let watched_bones = [upper, elbow, wrist]
            .iter()
            .map(|&id| bone_name(skeleton, id))
            .collect::<Result<Vec<_>>>()?;

        let mut tracked_bones: Vec<String> = Vec::new();
        for arm in &arm_chains {
            for variant in &arm.variants {
                for name in variant.chain.names() {
                    if !tracked_bones.iter().any(|n| n == name) {
                        tracked_bones.push(name.to_string());
                    }
                }
            }
        }

        info!(
            skeleton = skeleton.name(),
            %side,
            volumes = ?volumes.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            arm_chains = arm_chains.len(),
            "Avoidance volumes selected"
        );

        Ok(Self {
            side,
            volumes,
            arm_chains,
            watched_bones,
            tracked_bones,
        })
    }

    /// The side this configuration covers.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Avoidance volumes in processing order.
    #[must_use]
    pub fn volumes(&self) -> &[AvoidanceVolume] {
        &self.volumes
    }

    /// Arm chains in processing order (elbow level first).
    #[must_use]
    pub fn arm_chains(&self) -> &[ArmChain] {
        &self.arm_chains
    }

    /// Upper arm, elbow and wrist bone names; their keys drive scheduling.
    #[must_use]
    pub fn watched_bones(&self) -> &[String] {
        &self.watched_bones
    }

    /// Every bone named by any IK variant, effectors included.
    #[must_use]
    pub fn tracked_bones(&self) -> &[String] {
        &self.tracked_bones
    }
}

fn collect_volumes(skeleton: &Skeleton, params: &AvoidanceParams) -> Result<Vec<AvoidanceVolume>> {
    let mut volumes: Vec<AvoidanceVolume> = Vec::new();

    if params.avoid_head {
        match skeleton.head_proxy() {
            Some(head) if owner_exists(skeleton, head.bone) => {
                insert_volume(&mut volumes, AvoidanceVolume::track(skeleton, head)?);
            }
            Some(head) => warn!(proxy = %head.name, "Head proxy has no owning bone, not avoided"),
            None => warn!(skeleton = skeleton.name(), "No head proxy, head not avoided"),
        }
    }

    for target in params.active_targets() {
        for proxy in skeleton.proxies() {
            if proxy.name.contains(target)
                && proxy.is_bone_following()
                && owner_exists(skeleton, proxy.bone)
            {
                insert_volume(&mut volumes, AvoidanceVolume::track(skeleton, proxy)?);
            }
        }
    }

    Ok(volumes)
}

/// Insert by name; a repeated name replaces the earlier entry in place.
fn insert_volume(volumes: &mut Vec<AvoidanceVolume>, volume: AvoidanceVolume) {
    match volumes.iter_mut().find(|v| v.name == volume.name) {
        Some(existing) => *existing = volume,
        None => volumes.push(volume),
    }
}

fn owner_exists(skeleton: &Skeleton, bone: Option<BoneId>) -> bool {
    bone.is_some_and(|id| skeleton.bone(id).is_some())
}

fn require_role(skeleton: &Skeleton, role: BoneRole, side: Side) -> Result<BoneId> {
    skeleton.resolve_role(role, side).ok_or_else(|| {
        AvoidError::unsizable(format!(
            "{side} arm has no {} bone in {}",
            role.canonical_name(side),
            skeleton.name()
        ))
    })
}

fn bone_name(skeleton: &Skeleton, id: BoneId) -> Result<String> {
    skeleton
        .bone(id)
        .map(|b| b.name.clone())
        .ok_or_else(|| AvoidError::unsizable(format!("{id} is not part of {}", skeleton.name())))
}

fn arm_chain(
    skeleton: &Skeleton,
    level: ChainLevel,
    effector: BoneId,
    joints: &[BoneId],
    similarity_limit: f64,
    max_iterations: usize,
) -> Result<ArmChain> {
    let effector_name = bone_name(skeleton, effector)?;
    let fk_chain = skeleton.chain_to_root_from(effector)?;

    let mut chain = IkChain::new(IkLink::new(effector, effector_name.clone()));
    for &joint in joints {
        let name = bone_name(skeleton, joint)?;
        if !fk_chain.contains(joint) || joint == effector {
            return Err(AvoidError::unsizable(format!(
                "{name} does not move {effector_name}"
            )));
        }
        chain = chain.with_link(IkLink::new(joint, name).with_similarity_limit(similarity_limit));
    }

    Ok(ArmChain {
        effector: effector_name,
        level,
        fk_chain,
        variants: vec![IkVariant {
            chain,
            max_iterations,
        }],
    })
}
