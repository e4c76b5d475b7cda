// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! glTF 2.0 exporter (embedded `.gltf` and binary `.glb`)

use super::MeshBuffer;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use std::io::Write;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

/// Write a self-contained `.gltf` document; the buffer is a base64 data URI.
pub fn write_gltf<W: Write>(buffer: &MeshBuffer, writer: &mut W) -> Result<()> {
    let data = binary_payload(buffer);
    let uri = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&data));
    let document = gltf_document(buffer, data.len(), Some(uri));

    serde_json::to_writer_pretty(&mut *writer, &document).context("Failed to write glTF JSON")?;
    writer.flush()?;
    Ok(())
}

/// Write a binary `.glb` container holding the JSON and BIN chunks.
pub fn write_glb<W: Write>(buffer: &MeshBuffer, writer: &mut W) -> Result<()> {
    let data = binary_payload(buffer);
    let document = gltf_document(buffer, data.len(), None);
    let json_string = serde_json::to_string(&document)?;

    let json_length = align_to_four(json_string.len());
    let bin_length = align_to_four(data.len());
    let total_length = 12 + 8 + json_length + 8 + bin_length;

    writer.write_all(&GLB_MAGIC.to_le_bytes())?;
    writer.write_all(&2u32.to_le_bytes())?;
    writer.write_all(&(total_length as u32).to_le_bytes())?;

    writer.write_all(&(json_length as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_JSON.to_le_bytes())?;
    writer.write_all(json_string.as_bytes())?;
    writer.write_all(&vec![b' '; json_length - json_string.len()])?;

    writer.write_all(&(bin_length as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_BIN.to_le_bytes())?;
    writer.write_all(&data)?;
    writer.write_all(&vec![0u8; bin_length - data.len()])?;

    writer.flush().context("Failed to write GLB")?;
    Ok(())
}

/// Positions, then normals, then indices; all little-endian.
fn binary_payload(buffer: &MeshBuffer) -> Vec<u8> {
    let floats = buffer.positions.len() + buffer.normals.len();
    let mut data = Vec::with_capacity((floats + buffer.indices.len()) * 4);
    for v in buffer.positions.iter().chain(&buffer.normals) {
        data.extend_from_slice(&v.to_le_bytes());
    }
    for i in &buffer.indices {
        data.extend_from_slice(&i.to_le_bytes());
    }
    data
}

fn gltf_document(
    buffer: &MeshBuffer,
    byte_length: usize,
    uri: Option<String>,
) -> serde_json::Value {
    let vertex_bytes = buffer.positions.len() * 4;
    let normal_bytes = buffer.normals.len() * 4;
    let index_bytes = buffer.indices.len() * 4;
    let (min, max) = buffer.bounds().unwrap_or(([0.0; 3], [0.0; 3]));

    let mut gltf_buffer = json!({ "byteLength": byte_length });
    if let Some(uri) = uri {
        gltf_buffer["uri"] = json!(uri);
    }

    json!({
        "asset": {
            "generator": "Stockform Kernel",
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0, "NORMAL": 1 },
                "indices": 2,
                "mode": 4
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": buffer.vertex_count(),
                "type": "VEC3",
                "min": min,
                "max": max
            },
            {
                "bufferView": 1,
                "componentType": 5126,
                "count": buffer.vertex_count(),
                "type": "VEC3"
            },
            {
                "bufferView": 2,
                "componentType": 5125,
                "count": buffer.indices.len(),
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": vertex_bytes, "target": 34962 },
            {
                "buffer": 0,
                "byteOffset": vertex_bytes,
                "byteLength": normal_bytes,
                "target": 34962
            },
            {
                "buffer": 0,
                "byteOffset": vertex_bytes + normal_bytes,
                "byteLength": index_bytes,
                "target": 34963
            }
        ],
        "buffers": [gltf_buffer]
    })
}

fn align_to_four(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Triangle};
    use nalgebra::Point3;

    fn triangle_buffer() -> MeshBuffer {
        MeshBuffer::from_mesh(&Mesh::from_triangles(vec![Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        )]))
    }

    #[test]
    fn test_gltf_embeds_buffer() -> Result<()> {
        let buffer = triangle_buffer();
        let mut out = Vec::new();
        write_gltf(&buffer, &mut out)?;

        let doc: serde_json::Value = serde_json::from_slice(&out)?;
        let uri = doc["buffers"][0]["uri"].as_str().unwrap_or_default();
        let encoded = uri.strip_prefix("data:application/octet-stream;base64,").unwrap_or_default();
        let decoded = STANDARD.decode(encoded)?;

        assert_eq!(decoded.len(), (9 + 9 + 3) * 4);
        assert_eq!(doc["buffers"][0]["byteLength"], decoded.len());
        assert_eq!(doc["accessors"][0]["count"], 3);
        assert_eq!(doc["accessors"][0]["max"][1], 3.0);
        Ok(())
    }

    #[test]
    fn test_glb_header_and_alignment() -> Result<()> {
        let mut out = Vec::new();
        write_glb(&triangle_buffer(), &mut out)?;

        assert_eq!(&out[0..4], b"glTF");
        let total = u32::from_le_bytes([out[8], out[9], out[10], out[11]]) as usize;
        assert_eq!(total, out.len());
        assert_eq!(out.len() % 4, 0);
        assert_eq!(&out[16..20], b"JSON");
        Ok(())
    }
}
