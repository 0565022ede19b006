//! Frame-list ingestion for hosts that receive the parser's output as JSON.

use std::sync::Arc;

use gopview_protocol::Frame;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid frame list JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of frames or an object with a `frames` array")]
    MissingFrames,
}

/// Parse a frame list from either a bare JSON array or an object carrying a
/// `frames` array (other keys are ignored).
pub fn load_frames(data: &[u8]) -> Result<Arc<[Frame]>, LoadError> {
    let value: Value = serde_json::from_slice(data)?;
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut obj) => obj
            .remove("frames")
            .filter(Value::is_array)
            .ok_or(LoadError::MissingFrames)?,
        _ => return Err(LoadError::MissingFrames),
    };
    let frames: Vec<Frame> = serde_json::from_value(list)?;
    tracing::debug!(frames = frames.len(), "frame list loaded");
    Ok(frames.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopview_protocol::FrameType;

    #[test]
    fn loads_bare_array() {
        let data = br#"[{"frameIndex": 0, "frameType": "I"}, {"frameIndex": 1, "frameType": "P", "refFrames": [0]}]"#;
        let frames = load_frames(data).expect("bare array should load");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frame_type, FrameType::Inter);
        assert_eq!(frames[1].ref_frames, vec![0]);
    }

    #[test]
    fn loads_wrapped_object() {
        let data = br#"{"codec": "hevc", "frames": [{"frameIndex": 0, "frameType": "IDR_N_LP"}]}"#;
        let frames = load_frames(data).expect("wrapped list should load");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_keyframe());
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(load_frames(b"{\"codec\": \"av1\"}"), Err(LoadError::MissingFrames)));
        assert!(matches!(load_frames(b"{\"frames\": 3}"), Err(LoadError::MissingFrames)));
        assert!(matches!(load_frames(b"42"), Err(LoadError::MissingFrames)));
        assert!(matches!(load_frames(b"not json"), Err(LoadError::Json(_))));
        assert!(matches!(load_frames(b"[{\"frameType\": \"I\"}]"), Err(LoadError::Json(_))));
    }
}
