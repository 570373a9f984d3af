use crate::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
fn default_one() -> f32 {
    1.0
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

/// Declared kind of a timeline. Timelines without an explicit type are sprites.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjectType {
    Bone,
    #[default]
    Sprite,
    Point,
    Box,
}

/// Local (parent-relative) spatial state of a bone or object. Angles are in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    #[cfg_attr(feature = "serde", serde(default))]
    pub x: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub y: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub angle: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_one"))]
    pub scale_x: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_one"))]
    pub scale_y: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Object keyframe payload: a transform plus the sprite-only properties.
///
/// `file`, `folder`, `pivot_x`, `pivot_y` and `z_index` stay `None` when the source omits them
/// (points never carry a texture reference).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectTransform {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub transform: Transform,
    #[cfg_attr(feature = "serde", serde(default = "default_one", rename = "a"))]
    pub alpha: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub file: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub folder: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pivot_x: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pivot_y: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub z_index: Option<i32>,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            alpha: 1.0,
            file: None,
            folder: None,
            pivot_x: None,
            pivot_y: None,
            z_index: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum KeyPayload {
    Bone(Transform),
    Object(ObjectTransform),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimelineKey {
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: f32,
    /// 0 = shortest path, > 0 forces clockwise, < 0 forces counter-clockwise.
    #[cfg_attr(feature = "serde", serde(default))]
    pub spin: i32,
    pub payload: KeyPayload,
}

impl TimelineKey {
    pub fn transform(&self) -> &Transform {
        match &self.payload {
            KeyPayload::Bone(t) => t,
            KeyPayload::Object(o) => &o.transform,
        }
    }

    pub fn object(&self) -> Option<&ObjectTransform> {
        match &self.payload {
            KeyPayload::Bone(_) => None,
            KeyPayload::Object(o) => Some(o),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagKey {
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
}

impl TagKey {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tagline {
    pub keys: Vec<TagKey>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timeline {
    pub id: u32,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub object_type: ObjectType,
    /// Index into [`Entity::obj_info`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub obj: Option<usize>,
    pub keys: Vec<TimelineKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tagline: Option<Tagline>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneRef {
    pub timeline: usize,
    pub key: usize,
    /// Position of the parent within the owning mainline key's `bone_refs`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectRef {
    pub timeline: usize,
    pub key: usize,
    /// Position of the parent bone within the owning mainline key's `bone_refs`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub z_index: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MainlineKey {
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bone_refs: Vec<BoneRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub object_refs: Vec<ObjectRef>,
}

#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventKey {
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Eventline {
    pub id: u32,
    pub name: String,
    /// Index into [`Entity::obj_info`] describing the event.
    #[cfg_attr(feature = "serde", serde(default))]
    pub obj: Option<usize>,
    pub keys: Vec<EventKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tagline: Option<Tagline>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Animation {
    pub id: u32,
    pub name: String,
    pub length: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub looping: bool,
    pub mainline: Vec<MainlineKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timelines: Vec<Timeline>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub eventlines: Vec<Eventline>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tagline: Option<Tagline>,
}

impl Animation {
    pub fn eventline(&self, name: &str) -> Option<&Eventline> {
        self.eventlines.iter().find(|e| e.name == name)
    }

    /// Checks the structural invariants the pose resolver depends on.
    pub fn validate(&self, obj_info_len: usize) -> Result<(), Error> {
        let invalid = |message: String| Error::InvalidModel {
            animation: self.name.clone(),
            message,
        };

        if !self.length.is_finite() || self.length < 0.0 {
            return Err(invalid(format!("length {} must be finite and >= 0", self.length)));
        }

        check_sorted(self.mainline.iter().map(|k| k.time))
            .map_err(|i| invalid(format!("mainline key {i} is out of time order")))?;

        for (ti, timeline) in self.timelines.iter().enumerate() {
            check_sorted(timeline.keys.iter().map(|k| k.time)).map_err(|i| {
                invalid(format!("timeline '{}' key {i} is out of time order", timeline.name))
            })?;
            if let Some(obj) = timeline.obj.filter(|&obj| obj >= obj_info_len) {
                return Err(invalid(format!(
                    "timeline {ti} references unknown obj_info {obj}"
                )));
            }
            for key in &timeline.keys {
                let is_bone = matches!(key.payload, KeyPayload::Bone(_));
                if is_bone != (timeline.object_type == ObjectType::Bone) {
                    return Err(invalid(format!(
                        "timeline '{}' mixes {:?} keys with bone payloads",
                        timeline.name, timeline.object_type
                    )));
                }
            }
        }

        for (mi, key) in self.mainline.iter().enumerate() {
            for (bi, bone) in key.bone_refs.iter().enumerate() {
                self.check_key_ref(bone.timeline, bone.key)
                    .map_err(|m| invalid(format!("mainline key {mi}, bone {bi}: {m}")))?;
                if self.timelines[bone.timeline].object_type != ObjectType::Bone {
                    return Err(invalid(format!(
                        "mainline key {mi}, bone {bi}: timeline {} is not a bone timeline",
                        bone.timeline
                    )));
                }
                if let Some(parent) = bone.parent.filter(|&parent| parent >= bi) {
                    return Err(invalid(format!(
                        "mainline key {mi}, bone {bi}: parent {parent} must precede its child"
                    )));
                }
            }
            for (oi, object) in key.object_refs.iter().enumerate() {
                self.check_key_ref(object.timeline, object.key)
                    .map_err(|m| invalid(format!("mainline key {mi}, object {oi}: {m}")))?;
                if self.timelines[object.timeline].object_type == ObjectType::Bone {
                    return Err(invalid(format!(
                        "mainline key {mi}, object {oi}: timeline {} is a bone timeline",
                        object.timeline
                    )));
                }
                if let Some(parent) = object
                    .parent
                    .filter(|&parent| parent >= key.bone_refs.len())
                {
                    return Err(invalid(format!(
                        "mainline key {mi}, object {oi}: unknown parent bone {parent}"
                    )));
                }
            }
        }

        Ok(())
    }

    fn check_key_ref(&self, timeline: usize, key: usize) -> Result<(), String> {
        let Some(t) = self.timelines.get(timeline) else {
            return Err(format!("unknown timeline {timeline}"));
        };
        if key >= t.keys.len() {
            return Err(format!("unknown key {key} on timeline '{}'", t.name));
        }
        Ok(())
    }
}

fn check_sorted(times: impl Iterator<Item = f32>) -> Result<(), usize> {
    let mut last = f32::NEG_INFINITY;
    for (i, time) in times.enumerate() {
        if !time.is_finite() || time < last {
            return Err(i);
        }
        last = time;
    }
    Ok(())
}

/// Static shape metadata for an entity component. Only boxes use the size and pivot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectInfo {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub object_type: ObjectType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pivot_x: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pivot_y: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    pub id: u32,
    pub name: String,
    pub animations: Vec<Animation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub obj_info: Vec<ObjectInfo>,
}

impl Entity {
    /// First animation with the given name, in source order.
    pub fn animation(&self, name: &str) -> Option<(usize, &Animation)> {
        self.animations
            .iter()
            .enumerate()
            .find(|(_, a)| a.name == name)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for animation in &self.animations {
            animation.validate(self.obj_info.len())?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileData {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pivot_x: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_one"))]
    pub pivot_y: f32,
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FolderData {
    pub name: String,
    pub files: Vec<FileData>,
}

/// Read-only texture/file metadata lookup handed to the rendering layer.
pub trait FileLookup {
    fn file(&self, folder: u32, file: u32) -> Option<&FileData>;
}

impl FileLookup for [FolderData] {
    fn file(&self, folder: u32, file: u32) -> Option<&FileData> {
        self.get(folder as usize)?.files.get(file as usize)
    }
}
