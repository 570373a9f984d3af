//! Hand-built models shared by the unit tests.

use crate::{
    Animation, BoneRef, Entity, EventKey, Eventline, KeyPayload, MainlineKey, ObjectInfo,
    ObjectRef, ObjectTransform, ObjectType, TagKey, Tagline, Timeline, TimelineKey, Transform,
};
use std::sync::Arc;

pub(crate) fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

pub(crate) fn xform(x: f32, y: f32, angle: f32) -> Transform {
    Transform {
        x,
        y,
        angle,
        ..Transform::IDENTITY
    }
}

pub(crate) fn bone_key(time: f32, transform: Transform) -> TimelineKey {
    TimelineKey {
        time,
        spin: 0,
        payload: KeyPayload::Bone(transform),
    }
}

pub(crate) fn object_key(time: f32, transform: Transform) -> TimelineKey {
    TimelineKey {
        time,
        spin: 0,
        payload: KeyPayload::Object(ObjectTransform {
            transform,
            file: Some(0),
            folder: Some(0),
            ..ObjectTransform::default()
        }),
    }
}

pub(crate) fn timeline(name: &str, object_type: ObjectType, keys: Vec<TimelineKey>) -> Timeline {
    Timeline {
        id: 0,
        name: name.to_string(),
        object_type,
        obj: None,
        keys,
        tagline: None,
    }
}

pub(crate) fn tagline(keys: Vec<(f32, Vec<&str>)>) -> Tagline {
    Tagline {
        keys: keys
            .into_iter()
            .map(|(time, tags)| TagKey {
                time,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .collect(),
    }
}

/// `bones` and `objects` are `(timeline, key, parent)` triples.
pub(crate) fn main_key(
    time: f32,
    bones: &[(usize, usize, Option<usize>)],
    objects: &[(usize, usize, Option<usize>)],
) -> MainlineKey {
    MainlineKey {
        time,
        bone_refs: bones
            .iter()
            .map(|&(timeline, key, parent)| BoneRef {
                timeline,
                key,
                parent,
            })
            .collect(),
        object_refs: objects
            .iter()
            .map(|&(timeline, key, parent)| ObjectRef {
                timeline,
                key,
                parent,
                z_index: None,
            })
            .collect(),
    }
}

pub(crate) fn eventline(name: &str, times: &[f32]) -> Eventline {
    Eventline {
        id: 0,
        name: name.to_string(),
        obj: None,
        keys: times.iter().map(|&time| EventKey { time }).collect(),
        tagline: None,
    }
}

pub(crate) fn animation(
    id: u32,
    name: &str,
    length: f32,
    looping: bool,
    mainline: Vec<MainlineKey>,
    timelines: Vec<Timeline>,
) -> Animation {
    Animation {
        id,
        name: name.to_string(),
        length,
        looping,
        mainline,
        timelines,
        eventlines: Vec::new(),
        tagline: None,
    }
}

/// One bone whose angle goes from `from` to `to` between t=0 and t=length/2, then back.
pub(crate) fn rotating_bone(id: u32, name: &str, length: f32, from: f32, to: f32) -> Animation {
    animation(
        id,
        name,
        length,
        true,
        vec![
            main_key(0.0, &[(0, 0, None)], &[]),
            main_key(length / 2.0, &[(0, 1, None)], &[]),
        ],
        vec![timeline(
            "root",
            ObjectType::Bone,
            vec![
                bone_key(0.0, xform(0.0, 0.0, from)),
                bone_key(length / 2.0, xform(0.0, 0.0, to)),
            ],
        )],
    )
}

/// One bone held at a fixed angle for the whole animation.
pub(crate) fn still_bone(id: u32, name: &str, length: f32, angle: f32) -> Animation {
    animation(
        id,
        name,
        length,
        true,
        vec![main_key(0.0, &[(0, 0, None)], &[])],
        vec![timeline(
            "root",
            ObjectType::Bone,
            vec![bone_key(0.0, xform(0.0, 0.0, angle))],
        )],
    )
}

pub(crate) fn entity(animations: Vec<Animation>) -> Arc<Entity> {
    entity_with_info(animations, Vec::new())
}

pub(crate) fn entity_with_info(animations: Vec<Animation>, obj_info: Vec<ObjectInfo>) -> Arc<Entity> {
    Arc::new(Entity {
        id: 0,
        name: "hero".to_string(),
        animations,
        obj_info,
    })
}
