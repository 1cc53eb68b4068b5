//! Writing placement results to disk

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tattoo::{CanvasTexture, RegisteredDecal};
use tracing::info;

/// Save a canvas as PNG
pub fn write_canvas_png(canvas: &CanvasTexture, path: &Path) -> Result<()> {
    canvas
        .to_rgba_image()
        .save(path)
        .with_context(|| format!("failed to write canvas to {}", path.display()))?;
    info!(
        "Wrote {}x{} canvas to {}",
        canvas.width(),
        canvas.height(),
        path.display()
    );
    Ok(())
}

/// Wavefront OBJ text for a set of decals, one object per decal
pub fn decals_to_obj(decals: &[RegisteredDecal]) -> String {
    let mut obj = String::from("# tattlab decals\n");
    // OBJ indices are 1-based and global across objects
    let mut base = 1usize;

    for decal in decals {
        let mesh = &decal.mesh;
        let _ = writeln!(obj, "o decal_{}", decal.id.0);
        for p in &mesh.positions {
            let _ = writeln!(obj, "v {} {} {}", p.x, p.y, p.z);
        }
        for uv in &mesh.uvs {
            let _ = writeln!(obj, "vt {} {}", uv.x, uv.y);
        }
        for n in &mesh.normals {
            let _ = writeln!(obj, "vn {} {} {}", n.x, n.y, n.z);
        }
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize + base);
            let _ = writeln!(obj, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
        }
        base += mesh.vertex_count();
    }
    obj
}

pub fn write_decals_obj(decals: &[RegisteredDecal], path: &Path) -> Result<()> {
    fs::write(path, decals_to_obj(decals))
        .with_context(|| format!("failed to write decals to {}", path.display()))?;
    info!("Wrote {} decals to {}", decals.len(), path.display());
    Ok(())
}
