//! Conversions between engine meshes and Bevy render meshes

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::Mesh as BevyMesh;
use glam::{Vec2, Vec3};

use crate::clipper::DecalMesh;
use crate::mesh::{Mesh, MeshError};

impl Mesh {
    /// Build a placement target from a Bevy mesh
    ///
    /// The mesh must have position attributes and triangle indices. Missing
    /// normals are generated; UVs are taken from `ATTRIBUTE_UV_0` if present.
    pub fn from_bevy_mesh(mesh: &BevyMesh) -> Result<Self, MeshError> {
        let positions: Vec<Vec3> = mesh
            .attribute(BevyMesh::ATTRIBUTE_POSITION)
            .and_then(|attr| attr.as_float3())
            .ok_or(MeshError::NoPositions)?
            .iter()
            .copied()
            .map(Vec3::from_array)
            .collect();

        let normals: Vec<Vec3> = mesh
            .attribute(BevyMesh::ATTRIBUTE_NORMAL)
            .and_then(|attr| attr.as_float3())
            .map(|n| n.iter().copied().map(Vec3::from_array).collect())
            .unwrap_or_default();

        let uvs: Option<Vec<Vec2>> = mesh
            .attribute(BevyMesh::ATTRIBUTE_UV_0)
            .and_then(|attr| match attr {
                VertexAttributeValues::Float32x2(v) => {
                    Some(v.iter().copied().map(Vec2::from_array).collect())
                }
                _ => None,
            });

        let indices: Vec<u32> = match mesh.indices() {
            Some(Indices::U16(idx)) => idx.iter().map(|&i| i as u32).collect(),
            Some(Indices::U32(idx)) => idx.to_vec(),
            None => return Err(MeshError::NoIndices),
        };

        Mesh::new(positions, normals, uvs, indices)
    }
}

impl DecalMesh {
    /// Convert to a Bevy mesh for rendering with the decal's image
    pub fn to_bevy_mesh(&self) -> BevyMesh {
        let positions: Vec<[f32; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|n| n.to_array()).collect();
        let uvs: Vec<[f32; 2]> = self.uvs.iter().map(|uv| uv.to_array()).collect();

        let mut mesh = BevyMesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(BevyMesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(BevyMesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(BevyMesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::{Affine3A, Quat};

    use crate::clipper::clip_mesh;
    use crate::tattoo_image::TattooImage;
    use crate::types::DecalDescriptor;

    fn create_test_quad_mesh(with_uvs: bool) -> BevyMesh {
        let mut mesh = BevyMesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(
            BevyMesh::ATTRIBUTE_POSITION,
            vec![
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0],
            ],
        );
        if with_uvs {
            mesh.insert_attribute(
                BevyMesh::ATTRIBUTE_UV_0,
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            );
        }
        mesh.insert_indices(Indices::U16(vec![0, 1, 2, 0, 2, 3]));
        mesh
    }

    #[test]
    fn test_from_bevy_mesh_generates_normals() {
        let mesh = Mesh::from_bevy_mesh(&create_test_quad_mesh(true)).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.has_uvs());
        for n in mesh.normals() {
            assert!((*n - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_from_bevy_mesh_without_indices() {
        let mut bevy_mesh = BevyMesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        bevy_mesh.insert_attribute(
            BevyMesh::ATTRIBUTE_POSITION,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        assert_eq!(
            Mesh::from_bevy_mesh(&bevy_mesh).unwrap_err(),
            MeshError::NoIndices
        );
    }

    #[test]
    fn test_decal_to_bevy_mesh() {
        let mesh = Mesh::from_bevy_mesh(&create_test_quad_mesh(false)).unwrap();
        let decal = clip_mesh(
            &mesh,
            Affine3A::IDENTITY,
            &DecalDescriptor {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
                half_extents: Vec3::splat(0.5),
            },
            Arc::new(TattooImage::solid(1, 1, [0, 0, 0, 255]).unwrap()),
        )
        .unwrap();

        let bevy_mesh = decal.to_bevy_mesh();
        assert_eq!(bevy_mesh.count_vertices(), decal.vertex_count());
        assert_eq!(
            bevy_mesh.indices().map(|i| i.len()),
            Some(decal.indices.len())
        );
    }
}
