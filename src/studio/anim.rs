//! Default pose evaluation.
//!
//! Animation channels are run-length encoded streams of 16 bit words. A header word
//! holds `valid` (low byte) and `total` (high byte): the next `valid` words are
//! values, and the last of them repeats for the remaining `total - valid` frames.

use crate::errors::BuildError;
use crate::float_types::Real;
use crate::studio::{Bone, BoneAnim, StudioModel};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// One word of a compressed animation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimValue(pub u16);

impl AnimValue {
    /// A run header.
    pub const fn header(valid: u8, total: u8) -> Self {
        AnimValue(valid as u16 | ((total as u16) << 8))
    }

    /// A value word.
    pub const fn value(v: i16) -> Self {
        AnimValue(v as u16)
    }

    #[inline]
    pub const fn valid(self) -> usize {
        (self.0 & 0xff) as usize
    }

    #[inline]
    pub const fn total(self) -> usize {
        (self.0 >> 8) as usize
    }

    #[inline]
    pub const fn as_value(self) -> i16 {
        self.0 as i16
    }
}

/// Decode the delta of `channel` at `frame`, scaled by `scale`.
///
/// Absent channels and streams that run out before `frame` yield zero.
pub fn extract_anim_value(frame: usize, channel: Option<&[AnimValue]>, scale: Real) -> Real {
    let Some(values) = channel else {
        return 0.0;
    };

    let mut run = 0;
    let mut k = frame;
    loop {
        let Some(header) = values.get(run) else {
            return 0.0;
        };
        if header.total() > k {
            break;
        }
        k -= header.total();
        run += header.valid() + 1;
        if values.get(run).is_none_or(|h| h.total() == 0) {
            return 0.0;
        }
    }

    let header = values[run];
    let slot = if header.valid() > k { run + k + 1 } else { run + header.valid() };
    values
        .get(slot)
        .map_or(0.0, |v| Real::from(v.as_value()) * scale)
}

/// Position and orientation of `bone` relative to its parent at `frame`.
pub fn bone_pose(frame: usize, bone: &Bone, anim: Option<&BoneAnim>) -> (Vector3<Real>, UnitQuaternion<Real>) {
    let mut channel = [0.0 as Real; 6];
    for (dof, value) in channel.iter_mut().enumerate() {
        let values = anim.and_then(|a| a.channels[dof].as_deref());
        *value = bone.value[dof] + extract_anim_value(frame, values, bone.scale[dof]);
    }

    let origin = Vector3::new(channel[0], channel[1], channel[2]);
    let rotation = UnitQuaternion::from_euler_angles(channel[3], channel[4], channel[5]);
    (origin, rotation)
}

/// Model space transform of every bone at `frame`.
///
/// Parents must precede their children, so one top-down pass suffices.
pub fn bone_transforms(model: &StudioModel, frame: usize) -> Result<Vec<Isometry3<Real>>, BuildError> {
    let mut transforms: Vec<Isometry3<Real>> = Vec::with_capacity(model.bones.len());

    for (i, bone) in model.bones.iter().enumerate() {
        let (origin, rotation) = bone_pose(frame, bone, model.anims.get(i));
        let local = Isometry3::from_parts(Translation3::from(origin), rotation);

        let world = match bone.parent {
            None => local,
            Some(parent) if parent < i => transforms[parent] * local,
            Some(parent) => return Err(BuildError::BadBoneHierarchy { bone: i, parent }),
        };
        transforms.push(world);
    }

    Ok(transforms)
}
