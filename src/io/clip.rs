//! `.clip` collision cache files.
//!
//! Little-endian layout: a 36 byte header (ident, version, model checksum and
//! three lump descriptors) followed by the plane index, plane and facet lumps,
//! each padded to four bytes.

use crate::aabb::Aabb;
use crate::config::MeshConfig;
use crate::errors::CacheError;
use crate::float_types::Real;
use crate::io::{FileStore, IoError};
use crate::mesh::facet::{Facet, TriVertex};
use crate::mesh::plane::{Plane, PlaneType};
use crate::mesh::{CollisionMesh, MeshParts};
use crate::studio::StudioModel;
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;

/// `b"CLIP"` read as a little-endian integer.
pub const CLIP_IDENT: u32 = u32::from_le_bytes(*b"CLIP");
pub const CLIP_VERSION: i32 = 1;

pub const HEADER_SIZE: usize = 12 + Lump::COUNT * 8;
pub const PLANE_INDEX_SIZE: usize = 4;
pub const PLANE_SIZE: usize = 20;
pub const FACET_SIZE: usize = 120;

/// Data sections of a `.clip` file, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lump {
    PlaneIndexes = 0,
    Planes = 1,
    Facets = 2,
}

impl Lump {
    pub const COUNT: usize = 3;
    pub const ALL: [Lump; Lump::COUNT] = [Lump::PlaneIndexes, Lump::Planes, Lump::Facets];

    pub const fn record_size(self) -> usize {
        match self {
            Lump::PlaneIndexes => PLANE_INDEX_SIZE,
            Lump::Planes => PLANE_SIZE,
            Lump::Facets => FACET_SIZE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Lump::PlaneIndexes => "plane indexes",
            Lump::Planes => "planes",
            Lump::Facets => "facets",
        }
    }
}

/// Decoded fixed-size header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipHeader {
    pub ident: u32,
    pub version: i32,
    pub checksum: u32,
    /// `(offset, length)` of each lump in [`Lump::ALL`] order
    pub lumps: [(u32, u32); Lump::COUNT],
}

impl ClipHeader {
    pub fn parse(data: &[u8]) -> Result<Self, CacheError> {
        let header = data.get(..HEADER_SIZE).ok_or(CacheError::Truncated)?;
        let mut r = Reader::new(header);
        let ident = r.u32();
        let version = r.i32();
        let checksum = r.u32();
        let lumps = Lump::ALL.map(|_| (r.u32(), r.u32()));
        Ok(Self { ident, version, checksum, lumps })
    }

    fn write(&self, out: &mut [u8]) {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        put_u32(&mut bytes, self.ident);
        put_i32(&mut bytes, self.version);
        put_u32(&mut bytes, self.checksum);
        for (ofs, len) in self.lumps {
            put_u32(&mut bytes, ofs);
            put_u32(&mut bytes, len);
        }
        out[..HEADER_SIZE].copy_from_slice(&bytes);
    }

    /// Bytes of `lump`, validated against the record size and the file length.
    fn lump<'a>(&self, data: &'a [u8], lump: Lump) -> Result<&'a [u8], CacheError> {
        let (ofs, len) = self.lumps[lump as usize];
        let (ofs, len) = (ofs as usize, len as usize);
        if len == 0 || len % lump.record_size() != 0 {
            return Err(CacheError::BadLump { lump: lump.name(), length: len });
        }
        ofs.checked_add(len)
            .and_then(|end| data.get(ofs..end))
            .ok_or(CacheError::Truncated)
    }
}

/// Cache file of a model: `models/props/crate.mdl` becomes
/// `<cache_dir>/props/crate.clip`.
pub fn cache_path(model_name: &str, config: &MeshConfig) -> String {
    let name = model_name.strip_prefix(config.model_prefix.as_str()).unwrap_or(model_name);
    // only strip an extension of the last path component
    let stem = match name.rfind('.') {
        Some(dot) if !name[dot..].contains('/') => &name[..dot],
        _ => name,
    };
    format!("{}/{stem}.clip", config.cache_dir)
}

/// Serialize `mesh` stamped with the model `checksum`.
pub fn to_bytes(mesh: &CollisionMesh, checksum: u32) -> Vec<u8> {
    let mut out = vec![0u8; HEADER_SIZE];
    let mut header = ClipHeader {
        ident: CLIP_IDENT,
        version: CLIP_VERSION,
        checksum,
        lumps: [(0, 0); Lump::COUNT],
    };

    for lump in Lump::ALL {
        let start = out.len();
        match lump {
            Lump::PlaneIndexes => {
                for index in mesh.plane_indices() {
                    put_u32(&mut out, *index);
                }
            },
            Lump::Planes => {
                for plane in mesh.planes() {
                    put_vec(&mut out, &plane.normal);
                    put_f32(&mut out, plane.dist);
                    put_i32(&mut out, plane.kind as i32);
                }
            },
            Lump::Facets => {
                for facet in mesh.facets() {
                    put_facet(&mut out, facet);
                }
            },
        }
        header.lumps[lump as usize] = (start as u32, (out.len() - start) as u32);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    header.write(&mut out);
    out
}

/// Write the cache file of `model`.
pub fn save<S: FileStore + ?Sized>(
    mesh: &CollisionMesh,
    model: &StudioModel,
    store: &S,
    config: &MeshConfig,
) -> Result<(), CacheError> {
    if mesh.facets().is_empty() || mesh.planes().is_empty() {
        return Err(CacheError::EmptyMesh);
    }

    let num_planes = mesh.planes().len();
    if let Some(bad) = mesh.plane_indices().iter().find(|i| **i as usize >= num_planes) {
        log::error!(
            "{}: plane index {bad} exceeds plane count {num_planes}",
            model.name
        );
    }

    let path = cache_path(&model.name, config);
    let data = to_bytes(mesh, model.checksum);
    store.save_file(&path, &data)?;
    log::debug!("{}: wrote {path} ({} bytes)", model.name, data.len());
    Ok(())
}

/// Read the cache file of `model`.
///
/// The cache is rejected when it is missing, older than the model (or the times
/// cannot be compared), written by another version, or stamped with another
/// model checksum. Structural damage is reported as the matching [`CacheError`].
pub fn load<S: FileStore + ?Sized>(
    model: &StudioModel,
    store: &S,
    config: &MeshConfig,
) -> Result<MeshParts, CacheError> {
    let path = cache_path(&model.name, config);
    let data = match store.load_file(&path) {
        Ok(data) => data,
        Err(IoError::NotFound(_)) => return Err(CacheError::Missing(path)),
        Err(err) => return Err(err.into()),
    };

    match store.compare_file_time(&model.name, &path) {
        Some(Ordering::Less | Ordering::Equal) => {},
        _ => {
            log::info!("{path} is out of date");
            return Err(CacheError::Stale(path));
        },
    }

    let header = ClipHeader::parse(&data)?;
    if header.ident != CLIP_IDENT {
        let err = CacheError::BadIdent { found: header.ident, expected: CLIP_IDENT };
        log::warn!("{path}: {err}");
        return Err(err);
    }
    if header.version != CLIP_VERSION {
        let err = CacheError::BadVersion { found: header.version, expected: CLIP_VERSION };
        log::warn!("{path}: {err}");
        return Err(err);
    }
    if header.checksum != model.checksum {
        let err = CacheError::ChecksumMismatch { found: header.checksum, expected: model.checksum };
        log::info!("{path}: {err}");
        return Err(err);
    }

    let plane_indices: Vec<u32> = header
        .lump(&data, Lump::PlaneIndexes)?
        .chunks_exact(PLANE_INDEX_SIZE)
        .map(|record| Reader::new(record).u32())
        .collect();

    let planes: Vec<Plane> = header
        .lump(&data, Lump::Planes)?
        .chunks_exact(PLANE_SIZE)
        .map(read_plane)
        .collect();

    let mut facets = Vec::new();
    let mut bounds = Aabb::cleared();
    let mut cursor = 0;
    let records = header.lump(&data, Lump::Facets)?.chunks_exact(FACET_SIZE);
    for (i, record) in records.enumerate() {
        let facet = read_facet(record).ok_or(CacheError::BadFacet { facet: i })?;

        if facet.first_index != cursor {
            log::error!(
                "{path}: facet {i} plane range starts at {} instead of {cursor}",
                facet.first_index
            );
        }
        cursor = facet.first_index + facet.num_planes;

        let indices = plane_indices
            .get(facet.index_range())
            .ok_or(CacheError::BadFacet { facet: i })?;
        if facet.num_planes == 0 || indices.iter().any(|p| *p as usize >= planes.len()) {
            return Err(CacheError::BadFacet { facet: i });
        }

        for v in &facet.triangle {
            bounds.add_point(&v.point);
        }
        facets.push(facet);
    }

    log::debug!("{path}: loaded {} facets, {} planes", facets.len(), planes.len());

    Ok(MeshParts {
        name: model.name.clone(),
        num_tris: facets.len(),
        planes,
        facets,
        plane_indices,
        bounds,
    })
}

fn read_plane(record: &[u8]) -> Plane {
    let mut r = Reader::new(record);
    let normal = r.vec3();
    let dist = r.f32();
    let stored = PlaneType::from_raw(r.i32());

    let mut plane = Plane::new(normal, dist);
    plane.categorize();
    if stored != plane.kind {
        log::trace!("plane type {stored:?} recategorized as {:?}", plane.kind);
    }
    plane
}

fn read_facet(record: &[u8]) -> Option<Facet> {
    let mut r = Reader::new(record);
    let mins = Point3::from(r.vec3());
    let maxs = Point3::from(r.vec3());
    let edge1 = r.vec3();
    let edge2 = r.vec3();
    let num_planes = usize::try_from(r.i32()).ok()?;
    let skin_ref = r.i32();
    let first_index = usize::try_from(r.i32()).ok()?;
    let triangle = [(); 3].map(|_| {
        let point = Point3::from(r.vec3());
        let st = [r.f32(), r.f32()];
        TriVertex::new(point, st)
    });

    Some(Facet {
        triangle,
        edge1,
        edge2,
        bounds: Aabb::new(mins, maxs),
        skin_ref,
        first_index,
        num_planes,
    })
}

fn put_facet(out: &mut Vec<u8>, facet: &Facet) {
    put_vec(out, &facet.bounds.mins.coords);
    put_vec(out, &facet.bounds.maxs.coords);
    put_vec(out, &facet.edge1);
    put_vec(out, &facet.edge2);
    put_i32(out, facet.num_planes as i32);
    put_i32(out, facet.skin_ref);
    put_i32(out, facet.first_index as i32);
    for v in &facet.triangle {
        put_vec(out, &v.point.coords);
        put_f32(out, v.st[0]);
        put_f32(out, v.st[1]);
    }
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, v: Real) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_vec(out: &mut Vec<u8>, v: &Vector3<Real>) {
    for c in v.iter() {
        put_f32(out, *c);
    }
}

/// Sequential little-endian reads over a record whose size was already checked.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn word(&mut self) -> [u8; 4] {
        let mut word = [0u8; 4];
        if let Some(bytes) = self.data.get(self.pos..self.pos + 4) {
            word.copy_from_slice(bytes);
        }
        self.pos += 4;
        word
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.word())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.word())
    }

    fn f32(&mut self) -> Real {
        Real::from_le_bytes(self.word())
    }

    fn vec3(&mut self) -> Vector3<Real> {
        Vector3::new(self.f32(), self.f32(), self.f32())
    }
}
