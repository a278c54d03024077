//! Wire types of the shape generation server's `POST /generate` route.
//!
//! Positions arrive as base64-encoded little-endian `f32` triples and part
//! ids as base64-encoded `u8`s.  [`ShapeResponse::to_texture`] decodes both
//! into a [`ShapeTexture`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::RemoteError;
use crate::render::ShapeTexture;

/// Request body sent to `/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

/// Axis-aligned bounds of the generated cloud.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Successful `/generate` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeResponse {
    /// base64 little-endian `f32` xyz triples.
    pub positions: String,
    /// base64 `u8` part index per point.
    #[serde(default)]
    pub part_ids: String,
    #[serde(default)]
    pub part_names: Vec<String>,
    #[serde(default)]
    pub template_type: String,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub generation_time_ms: u64,
    #[serde(default)]
    pub pipeline: String,
}

impl ShapeResponse {
    /// Build a response from raw arrays (server-side encoding; used by tests
    /// and by offline fixtures).
    pub fn encode(positions: &[f32], part_ids: &[u8], part_names: Vec<String>) -> Self {
        let bytes: Vec<u8> = positions.iter().flat_map(|p| p.to_le_bytes()).collect();
        Self {
            positions: BASE64.encode(bytes),
            part_ids: BASE64.encode(part_ids),
            part_names,
            ..Self::default()
        }
    }

    /// Decode into render-ready arrays.
    pub fn to_texture(&self) -> Result<ShapeTexture, RemoteError> {
        let raw = BASE64.decode(self.positions.as_bytes())?;
        if raw.len() % 12 != 0 {
            return Err(RemoteError::Decode(format!(
                "positions length {} is not a multiple of 12 bytes",
                raw.len()
            )));
        }
        let positions: Vec<f32> = raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let part_ids = if self.part_ids.is_empty() {
            Vec::new()
        } else {
            BASE64.decode(self.part_ids.as_bytes())?
        };
        if !part_ids.is_empty() && part_ids.len() != positions.len() / 3 {
            return Err(RemoteError::Decode(format!(
                "{} part ids for {} points",
                part_ids.len(),
                positions.len() / 3
            )));
        }

        Ok(ShapeTexture {
            positions,
            part_ids,
            part_names: self.part_names.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_positions_and_parts() {
        let resp = ShapeResponse::encode(
            &[0.0, 1.0, 2.0, -1.0, 0.5, 0.25],
            &[0, 1],
            vec!["body".into(), "head".into()],
        );
        let tex = resp.to_texture().expect("decode");
        assert_eq!(tex.point_count(), 2);
        assert_eq!(tex.positions[3], -1.0);
        assert_eq!(tex.part_ids, [0, 1]);
        assert_eq!(tex.part_names[1], "head");
    }

    #[test]
    fn rejects_truncated_positions() {
        let resp = ShapeResponse {
            positions: BASE64.encode([0u8; 8]),
            ..ShapeResponse::default()
        };
        assert!(matches!(resp.to_texture(), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn rejects_mismatched_part_ids() {
        let resp = ShapeResponse::encode(&[0.0; 6], &[0, 1, 2], Vec::new());
        assert!(matches!(resp.to_texture(), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn rejects_invalid_base64() {
        let resp = ShapeResponse {
            positions: "***".into(),
            ..ShapeResponse::default()
        };
        assert!(resp.to_texture().is_err());
    }

    #[test]
    fn parses_server_json() {
        let json = serde_json::json!({
            "positions": BASE64.encode([0u8; 12]),
            "part_ids": BASE64.encode([0u8]),
            "part_names": ["body"],
            "template_type": "quadruped",
            "bounding_box": { "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0] },
            "cached": true,
            "generation_time_ms": 42,
            "pipeline": "cache"
        });
        let resp: ShapeResponse = serde_json::from_value(json).expect("parse");
        assert!(resp.cached);
        assert_eq!(resp.template_type, "quadruped");
        assert_eq!(resp.to_texture().unwrap().point_count(), 1);
    }
}
