use crate::model::{Atlas, Frame};
use serde_json::{Value, json};

fn frame_fields<K: ToString>(fr: &Frame<K>) -> serde_json::Map<String, Value> {
    let mut m = serde_json::Map::new();
    m.insert(
        "frame".into(),
        json!({"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h}),
    );
    m.insert("rotated".into(), json!(fr.rotated));
    m.insert("trimmed".into(), json!(fr.trimmed));
    m.insert(
        "spriteSourceSize".into(),
        json!({"x": fr.source.x, "y": fr.source.y, "w": fr.source.w, "h": fr.source.h}),
    );
    m.insert(
        "sourceSize".into(),
        json!({"w": fr.source_size.0, "h": fr.source_size.1}),
    );
    m.insert("offset".into(), json!({"x": fr.offset.0, "y": fr.offset.1}));
    if let Some(original) = &fr.duplicate_of {
        m.insert("aliasOf".into(), json!(original.to_string()));
    }
    m
}

/// Frames keyed by name.
/// Shape: `{ frames: { name: { frame, rotated, trimmed, spriteSourceSize, sourceSize, offset, aliasOf? } }, meta }`.
/// Compatible with engine pipelines expecting TexturePacker-like JSON hash.
pub fn to_json_hash<K: ToString>(atlas: &Atlas<K>) -> Value {
    let mut frames = serde_json::Map::new();
    for fr in &atlas.frames {
        frames.insert(fr.key.to_string(), Value::Object(frame_fields(fr)));
    }
    json!({
        "frames": frames,
        "meta": meta_value(atlas),
    })
}

/// Frames as an ordered array (packing order), each carrying its `filename`.
pub fn to_json_array<K: ToString>(atlas: &Atlas<K>) -> Value {
    let frames: Vec<Value> = atlas
        .frames
        .iter()
        .map(|fr| {
            let mut m = frame_fields(fr);
            m.insert("filename".into(), json!(fr.key.to_string()));
            Value::Object(m)
        })
        .collect();
    json!({
        "frames": frames,
        "meta": meta_value(atlas),
    })
}

fn meta_value<K>(atlas: &Atlas<K>) -> Value {
    let mut meta = serde_json::to_value(&atlas.meta).unwrap_or(Value::Null);
    if let Value::Object(m) = &mut meta {
        m.insert("size".into(), json!({"w": atlas.width, "h": atlas.height}));
    }
    meta
}
