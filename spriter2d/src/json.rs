//! Loader for Spriter's JSON export (`.scon`).
//!
//! Parsing also normalises the data into the shape the runtime expects: defaults for omitted
//! properties, string booleans and numeric strings, tag ids resolved to names and parent
//! index `-1` mapped to "no parent".

use crate::{
    Animation, BoneRef, Entity, Error, EventKey, Eventline, FileData, FileLookup, FolderData,
    KeyPayload, MainlineKey, ObjectInfo, ObjectRef, ObjectTransform, ObjectType,
    SCON_VERSION_MAJOR, TagKey, Tagline, Timeline, TimelineKey, Transform, wrap,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(default)]
    scon_version: Option<String>,
    #[serde(default)]
    folder: Vec<FolderDef>,
    #[serde(default)]
    entity: Vec<EntityDef>,
    #[serde(default)]
    tag_list: Vec<TagDef>,
}

#[derive(Debug, Deserialize)]
struct TagDef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct FolderDef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    file: Vec<FileDef>,
}

#[derive(Debug, Deserialize)]
struct FileDef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    pivot_x: f32,
    #[serde(default = "default_one")]
    pivot_y: f32,
}

#[derive(Debug, Deserialize)]
struct EntityDef {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    obj_info: Vec<ObjInfoDef>,
    #[serde(default)]
    animation: Vec<AnimationDef>,
}

#[derive(Debug, Deserialize)]
struct ObjInfoDef {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    w: f32,
    #[serde(default)]
    h: f32,
    #[serde(default)]
    pivot_x: f32,
    #[serde(default)]
    pivot_y: f32,
}

#[derive(Debug, Deserialize)]
struct AnimationDef {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    length: f32,
    #[serde(default)]
    looping: Option<serde_json::Value>,
    #[serde(default)]
    mainline: MainlineDef,
    #[serde(default)]
    timeline: Vec<TimelineDef>,
    #[serde(default)]
    eventline: Vec<EventlineDef>,
    #[serde(default)]
    meta: Option<MetaDef>,
}

#[derive(Debug, Default, Deserialize)]
struct MainlineDef {
    #[serde(default)]
    key: Vec<MainlineKeyDef>,
}

#[derive(Debug, Deserialize)]
struct MainlineKeyDef {
    #[serde(default)]
    time: Option<serde_json::Value>,
    #[serde(default)]
    bone_ref: Vec<RefDef>,
    #[serde(default)]
    object_ref: Vec<RefDef>,
}

#[derive(Debug, Deserialize)]
struct RefDef {
    #[serde(default)]
    parent: Option<serde_json::Value>,
    #[serde(default)]
    timeline: Option<serde_json::Value>,
    #[serde(default)]
    key: Option<serde_json::Value>,
    #[serde(default)]
    z_index: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimelineDef {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    obj: Option<serde_json::Value>,
    #[serde(default)]
    object_type: Option<String>,
    #[serde(default)]
    key: Vec<TimelineKeyDef>,
    #[serde(default)]
    meta: Option<MetaDef>,
}

#[derive(Debug, Deserialize)]
struct TimelineKeyDef {
    #[serde(default)]
    time: Option<serde_json::Value>,
    #[serde(default)]
    spin: Option<serde_json::Value>,
    #[serde(default)]
    bone: Option<TransformDef>,
    #[serde(default)]
    object: Option<ObjectDef>,
}

#[derive(Debug, Deserialize)]
struct TransformDef {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    angle: f32,
    #[serde(default = "default_one")]
    scale_x: f32,
    #[serde(default = "default_one")]
    scale_y: f32,
}

#[derive(Debug, Deserialize)]
struct ObjectDef {
    #[serde(flatten)]
    transform: TransformDef,
    #[serde(default = "default_one")]
    a: f32,
    #[serde(default)]
    file: Option<u32>,
    #[serde(default)]
    folder: Option<u32>,
    #[serde(default)]
    pivot_x: Option<f32>,
    #[serde(default)]
    pivot_y: Option<f32>,
    #[serde(default)]
    z_index: Option<serde_json::Value>,
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Default for ObjectDef {
    fn default() -> Self {
        Self {
            transform: TransformDef::default(),
            a: 1.0,
            file: None,
            folder: None,
            pivot_x: None,
            pivot_y: None,
            z_index: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventlineDef {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    obj: Option<serde_json::Value>,
    #[serde(default)]
    key: Vec<EventKeyDef>,
    #[serde(default)]
    meta: Option<MetaDef>,
}

#[derive(Debug, Deserialize)]
struct EventKeyDef {
    #[serde(default)]
    time: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MetaDef {
    #[serde(default)]
    tagline: Option<TaglineDef>,
}

#[derive(Debug, Deserialize)]
struct TaglineDef {
    #[serde(default)]
    key: Vec<TagKeyDef>,
}

#[derive(Debug, Deserialize)]
struct TagKeyDef {
    #[serde(default)]
    time: Option<serde_json::Value>,
    #[serde(default)]
    tag: Vec<TagRefDef>,
}

#[derive(Debug, Deserialize)]
struct TagRefDef {
    t: serde_json::Value,
}

fn default_one() -> f32 {
    1.0
}

/// Options applied while normalising a SCON file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Convert from Spriter's y-up space to a y-down host space: `y` and angles are negated and
    /// pivots are measured from the top edge.
    pub y_down: bool,
}

/// Everything loaded from one `.scon` file.
#[derive(Clone, Debug)]
pub struct SpriterData {
    pub scon_version: Option<String>,
    pub entities: Vec<Arc<Entity>>,
    pub folders: Vec<FolderData>,
    /// Tag names, indexed by tag id.
    pub tags: Vec<String>,
}

impl SpriterData {
    pub fn from_scon_str(input: &str) -> Result<Self, Error> {
        Self::from_scon_str_with_options(input, LoadOptions::default())
    }

    pub fn from_scon_str_with_options(input: &str, options: LoadOptions) -> Result<Self, Error> {
        let root: Root = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        if let Some(version) = root.scon_version.as_deref() {
            validate_scon_version(version)?;
        }

        let tags: Vec<String> = root.tag_list.into_iter().map(|t| t.name).collect();
        let loader = Loader {
            options,
            tags: &tags,
        };

        let folders = root
            .folder
            .into_iter()
            .map(|folder| FolderData {
                name: folder.name,
                files: folder
                    .file
                    .into_iter()
                    .map(|file| FileData {
                        name: file.name,
                        width: file.width,
                        height: file.height,
                        pivot_x: file.pivot_x,
                        pivot_y: loader.pivot_y(file.pivot_y),
                    })
                    .collect(),
            })
            .collect();

        let entities = root
            .entity
            .into_iter()
            .enumerate()
            .map(|(index, def)| {
                let entity = loader.entity(index, def)?;
                entity.validate()?;
                Ok(Arc::new(entity))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            scon_version: root.scon_version,
            entities,
            folders,
            tags,
        })
    }

    /// First entity with the given name.
    pub fn entity(&self, name: &str) -> Option<&Arc<Entity>> {
        self.entities.iter().find(|e| e.name == name)
    }
}

impl FileLookup for SpriterData {
    fn file(&self, folder: u32, file: u32) -> Option<&FileData> {
        self.folders.as_slice().file(folder, file)
    }
}

struct Loader<'a> {
    options: LoadOptions,
    tags: &'a [String],
}

impl Loader<'_> {
    fn y(&self, y: f32) -> f32 {
        if self.options.y_down { -y } else { y }
    }

    fn angle(&self, angle: f32) -> f32 {
        if !self.options.y_down {
            return angle;
        }
        let flipped = wrap(-angle, -180.0, 180.0);
        if flipped == -180.0 { 180.0 } else { flipped }
    }

    // Flipping the y axis reverses the direction of rotation.
    fn spin(&self, spin: i64) -> i32 {
        let spin = spin.signum() as i32;
        if self.options.y_down { -spin } else { spin }
    }

    fn pivot_y(&self, pivot_y: f32) -> f32 {
        if self.options.y_down {
            1.0 - pivot_y
        } else {
            pivot_y
        }
    }

    fn transform(&self, def: &TransformDef) -> Transform {
        Transform {
            x: def.x,
            y: self.y(def.y),
            angle: self.angle(def.angle),
            scale_x: def.scale_x,
            scale_y: def.scale_y,
        }
    }

    fn entity(&self, index: usize, def: EntityDef) -> Result<Entity, Error> {
        let obj_info: Vec<ObjectInfo> = def
            .obj_info
            .into_iter()
            .map(|info| ObjectInfo {
                name: info.name,
                object_type: parse_object_type(info.kind.as_deref()),
                width: info.w,
                height: info.h,
                pivot_x: info.pivot_x,
                pivot_y: self.pivot_y(info.pivot_y),
            })
            .collect();

        let animations = def
            .animation
            .into_iter()
            .enumerate()
            .map(|(anim_index, anim)| self.animation(&def.name, anim_index, anim, obj_info.len()))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Entity {
            id: def.id.unwrap_or(index as u32),
            name: def.name,
            animations,
            obj_info,
        })
    }

    fn animation(
        &self,
        entity: &str,
        index: usize,
        def: AnimationDef,
        obj_info_len: usize,
    ) -> Result<Animation, Error> {
        let name = def.name;

        let timelines = def
            .timeline
            .into_iter()
            .enumerate()
            .map(|(ti, timeline)| {
                let obj = value_index(timeline.obj.as_ref());
                if let Some(obj) = obj.filter(|&obj| obj >= obj_info_len) {
                    return Err(Error::JsonUnknownObjectInfo {
                        entity: entity.to_string(),
                        timeline: timeline.name,
                        obj,
                    });
                }
                let object_type = parse_object_type(timeline.object_type.as_deref());
                let keys = timeline
                    .key
                    .into_iter()
                    .map(|key| self.timeline_key(object_type, key))
                    .collect();
                Ok(Timeline {
                    id: timeline.id.unwrap_or(ti as u32),
                    name: timeline.name,
                    object_type,
                    obj,
                    keys,
                    tagline: self.tagline(&name, timeline.meta)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let mainline = def
            .mainline
            .key
            .into_iter()
            .map(|key| self.mainline_key(&name, timelines.len(), key))
            .collect::<Result<Vec<_>, Error>>()?;

        let eventlines = def
            .eventline
            .into_iter()
            .enumerate()
            .map(|(ei, line)| {
                Ok(Eventline {
                    id: line.id.unwrap_or(ei as u32),
                    name: line.name,
                    obj: value_index(line.obj.as_ref()),
                    keys: line
                        .key
                        .into_iter()
                        .map(|k| EventKey {
                            time: value_f32(k.time.as_ref()).unwrap_or(0.0),
                        })
                        .collect(),
                    tagline: self.tagline(&name, line.meta)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let tagline = self.tagline(&name, def.meta)?;

        Ok(Animation {
            id: def.id.unwrap_or(index as u32),
            looping: value_bool(def.looping.as_ref()).unwrap_or(true),
            name,
            length: def.length,
            mainline,
            timelines,
            eventlines,
            tagline,
        })
    }

    fn mainline_key(
        &self,
        animation: &str,
        timeline_count: usize,
        def: MainlineKeyDef,
    ) -> Result<MainlineKey, Error> {
        let timeline_of = |r: &RefDef| -> Result<usize, Error> {
            let timeline = value_index(r.timeline.as_ref()).unwrap_or(0);
            if timeline >= timeline_count {
                return Err(Error::JsonUnknownTimeline {
                    animation: animation.to_string(),
                    timeline,
                });
            }
            Ok(timeline)
        };

        let bone_refs = def
            .bone_ref
            .iter()
            .map(|r| {
                Ok(BoneRef {
                    timeline: timeline_of(r)?,
                    key: value_index(r.key.as_ref()).unwrap_or(0),
                    parent: value_index(r.parent.as_ref()),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let object_refs = def
            .object_ref
            .iter()
            .map(|r| {
                Ok(ObjectRef {
                    timeline: timeline_of(r)?,
                    key: value_index(r.key.as_ref()).unwrap_or(0),
                    parent: value_index(r.parent.as_ref()),
                    z_index: value_i64(r.z_index.as_ref()).map(|z| z as i32),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(MainlineKey {
            time: value_f32(def.time.as_ref()).unwrap_or(0.0),
            bone_refs,
            object_refs,
        })
    }

    fn timeline_key(&self, object_type: ObjectType, def: TimelineKeyDef) -> TimelineKey {
        let payload = if object_type == ObjectType::Bone {
            KeyPayload::Bone(self.transform(&def.bone.unwrap_or_default()))
        } else {
            let object = def.object.unwrap_or_default();
            KeyPayload::Object(ObjectTransform {
                transform: self.transform(&object.transform),
                alpha: object.a,
                file: object.file,
                folder: object.folder,
                pivot_x: object.pivot_x,
                pivot_y: object.pivot_y.map(|p| self.pivot_y(p)),
                z_index: value_i64(object.z_index.as_ref()).map(|z| z as i32),
            })
        };
        TimelineKey {
            time: value_f32(def.time.as_ref()).unwrap_or(0.0),
            spin: self.spin(value_i64(def.spin.as_ref()).unwrap_or(0)),
            payload,
        }
    }

    fn tagline(&self, animation: &str, meta: Option<MetaDef>) -> Result<Option<Tagline>, Error> {
        let Some(def) = meta.and_then(|m| m.tagline) else {
            return Ok(None);
        };
        let keys = def
            .key
            .into_iter()
            .map(|key| {
                let tags = key
                    .tag
                    .iter()
                    .map(|t| {
                        let id = value_index(Some(&t.t));
                        id.and_then(|id| self.tags.get(id)).cloned().ok_or_else(|| {
                            Error::JsonUnknownTag {
                                animation: animation.to_string(),
                                tag: id.unwrap_or(usize::MAX),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(TagKey {
                    time: value_f32(key.time.as_ref()).unwrap_or(0.0),
                    tags,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Some(Tagline { keys }))
    }
}

fn parse_object_type(value: Option<&str>) -> ObjectType {
    match value {
        Some("bone") => ObjectType::Bone,
        Some("point") => ObjectType::Point,
        Some("box") => ObjectType::Box,
        _ => ObjectType::Sprite,
    }
}

fn value_f32(value: Option<&serde_json::Value>) -> Option<f32> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_i64(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|v| v as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
        }
        _ => None,
    }
}

// Negative indices (`parent: -1`) mean "none".
fn value_index(value: Option<&serde_json::Value>) -> Option<usize> {
    value_i64(value).and_then(|v| usize::try_from(v).ok())
}

fn value_bool(value: Option<&serde_json::Value>) -> Option<bool> {
    match value? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

fn validate_scon_version(value: &str) -> Result<(), Error> {
    let major = value
        .split('.')
        .next()
        .and_then(|major| major.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::JsonSconVersion {
            value: value.to_string(),
        })?;
    if major != SCON_VERSION_MAJOR {
        return Err(Error::JsonSconVersion {
            value: value.to_string(),
        });
    }
    Ok(())
}
