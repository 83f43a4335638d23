//! In-memory studio model: the source the collision mesh is built from.
//!
//! The host engine fills these structures from its loaded model. Only the data the
//! collision build needs is represented: the skeleton with the default animation
//! frame, the body parts with their triangle command streams, the textures and the
//! skin family table.

use crate::float_types::{MAX_STUDIO_SKINS, Real};
use bitflags::bitflags;
use nalgebra::Point3;

pub mod anim;
pub mod tricmds;

pub use anim::AnimValue;

bitflags! {
    /// Texture flags relevant to texture coordinate decoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        const FLATSHADE = 0x0001;
        /// Texture coordinates are generated at render time
        const CHROME = 0x0002;
        const FULLBRIGHT = 0x0004;
        /// Triangle commands carry half float texture coordinates
        const UV_COORDS = 1 << 31;
    }
}

/// One bone of the skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bone {
    pub name: String,
    /// Parent bone; must have a lower index than the bone itself
    pub parent: Option<usize>,
    /// Base position (0..3) and euler angles in radians (3..6)
    pub value: [Real; 6],
    /// Scale applied to the compressed animation deltas of each channel
    pub scale: [Real; 6],
}

/// Compressed animation of one bone for the default sequence.
///
/// A `None` channel contributes no delta.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoneAnim {
    pub channels: [Option<Vec<AnimValue>>; 6],
}

/// A mesh of a sub-model: one material and its triangle commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudioMesh {
    /// Index into the skin reference table
    pub skin_ref: i16,
    /// Runs of `count` followed by `|count|` vertices of four words
    /// (vertex, normal, s, t); positive counts are strips, negative fans,
    /// a zero count or the end of the vector terminates.
    pub tri_cmds: Vec<i16>,
}

/// One selectable model of a body part.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubModel {
    pub name: String,
    /// Bind pose vertices in bone space
    pub vertices: Vec<Point3<Real>>,
    /// Bone of each vertex
    pub vertex_bones: Vec<u8>,
    pub meshes: Vec<StudioMesh>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyPart {
    pub name: String,
    /// Divisor of the body value selecting among `models`
    pub base: usize,
    pub models: Vec<SubModel>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub flags: TextureFlags,
}

/// A loaded studio model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudioModel {
    /// Logical path, e.g. `models/props/crate.mdl`
    pub name: String,
    /// Content checksum; a change invalidates the `.clip` cache
    pub checksum: u32,
    pub bones: Vec<Bone>,
    /// Default sequence animation, one entry per bone (missing entries are static)
    pub anims: Vec<BoneAnim>,
    pub body_parts: Vec<BodyPart>,
    pub textures: Vec<Texture>,
    /// Skin families; each maps a skin reference to a texture index.
    /// Family 0 is the default skin.
    pub skin_families: Vec<Vec<i16>>,
}

impl StudioModel {
    /// Sub-model of `part` selected by `body`.
    pub fn select_submodel(part: &BodyPart, body: usize) -> Option<&SubModel> {
        if part.models.is_empty() {
            return None;
        }
        let index = (body / part.base.max(1)) % part.models.len();
        part.models.get(index)
    }

    /// Skin reference table of family `skin`, falling back to the default family.
    pub fn skin_table(&self, skin: usize) -> &[i16] {
        let skin = skin.min(MAX_STUDIO_SKINS);
        self.skin_families
            .get(skin)
            .filter(|_| skin != 0)
            .or_else(|| self.skin_families.first())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Texture a mesh skin reference resolves to under `skin_table`.
    pub fn texture_for(&self, skin_table: &[i16], skin_ref: i16) -> Option<&Texture> {
        let slot = usize::try_from(skin_ref).ok()?;
        let texture = usize::try_from(*skin_table.get(slot)?).ok()?;
        self.textures.get(texture)
    }
}
