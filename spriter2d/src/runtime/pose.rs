use super::keyframes::{Bracket, Track};
use crate::math::sign;
use crate::{
    AngleUnit, Animation, ObjectInfo, ObjectTransform, ObjectType, Timeline, Transform,
    interpolate_angle, lerp,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn mix(start: f32, end: f32, progress: f32) -> f32 {
    if start == end {
        start
    } else {
        lerp(start, end, progress)
    }
}

fn mix_opt(start: Option<f32>, end: Option<f32>, progress: f32) -> Option<f32> {
    match (start, end) {
        (Some(s), Some(e)) => Some(mix(s, e, progress)),
        (s, e) => s.or(e),
    }
}

impl Transform {
    /// Field-wise interpolation towards `end`; `spin` only affects the angle.
    pub fn interpolate(&self, end: &Transform, progress: f32, spin: i32) -> Transform {
        let angle = if self.angle == end.angle {
            self.angle
        } else {
            interpolate_angle(self.angle, end.angle, progress, spin, AngleUnit::Degrees)
        };
        Transform {
            x: mix(self.x, end.x, progress),
            y: mix(self.y, end.y, progress),
            angle,
            scale_x: mix(self.scale_x, end.scale_x, progress),
            scale_y: mix(self.scale_y, end.scale_y, progress),
        }
    }

    /// Maps this parent-relative transform into the parent's space.
    ///
    /// Reflection is carried by the signed parent scale: the local offset is scaled per axis
    /// before rotation, and the child's own rotation is mirrored when exactly one parent axis
    /// is negative.
    pub fn apply_parent(&mut self, parent: &Transform) {
        let x = self.x * parent.scale_x;
        let y = self.y * parent.scale_y;
        let (sin, cos) = parent.angle.to_radians().sin_cos();

        self.x = x * cos - y * sin + parent.x;
        self.y = x * sin + y * cos + parent.y;
        self.scale_x *= parent.scale_x;
        self.scale_y *= parent.scale_y;
        self.angle = (sign(parent.scale_x * parent.scale_y) * self.angle + parent.angle) % 360.0;
    }

    #[cfg(feature = "glam")]
    pub fn position(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }

    #[cfg(feature = "glam")]
    pub fn to_affine2(&self) -> glam::Affine2 {
        glam::Affine2::from_scale_angle_translation(
            glam::Vec2::new(self.scale_x, self.scale_y),
            self.angle.to_radians(),
            self.position(),
        )
    }
}

/// Resolved state of one bone.
///
/// `slot` and `parent` are positions inside the pose that produced this state and must not be
/// kept across updates; use `timeline` or `name` for stable lookups.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneState {
    slot: usize,
    parent: Option<usize>,
    pub timeline: usize,
    pub name: String,
    pub spin: i32,
    pub transform: Transform,
}

impl BoneState {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn parent_slot(&self) -> Option<usize> {
        self.parent
    }

    fn interpolate(&self, end: &BoneState, progress: f32) -> BoneState {
        BoneState {
            transform: self.transform.interpolate(&end.transform, progress, self.spin),
            ..self.clone()
        }
    }
}

/// Resolved state of a sprite, action point or collider.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectState {
    slot: usize,
    parent: Option<usize>,
    pub timeline: usize,
    pub name: String,
    pub object_type: ObjectType,
    pub spin: i32,
    pub transform: Transform,
    pub alpha: f32,
    pub file: Option<u32>,
    pub folder: Option<u32>,
    pub pivot_x: Option<f32>,
    pub pivot_y: Option<f32>,
    pub z_index: Option<i32>,
}

impl ObjectState {
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Slot of the parent bone within the same pose.
    pub fn parent_slot(&self) -> Option<usize> {
        self.parent
    }

    fn interpolate(&self, end: &ObjectState, progress: f32) -> ObjectState {
        ObjectState {
            transform: self.transform.interpolate(&end.transform, progress, self.spin),
            alpha: mix(self.alpha, end.alpha, progress),
            file: self.file.or(end.file),
            folder: self.folder.or(end.folder),
            pivot_x: mix_opt(self.pivot_x, end.pivot_x, progress),
            pivot_y: mix_opt(self.pivot_y, end.pivot_y, progress),
            z_index: self.z_index.or(end.z_index),
            ..self.clone()
        }
    }
}

/// A resolved box with its static shape. `pivot_x`/`pivot_y` are fractions of the size.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColliderState {
    pub object: ObjectState,
    pub width: f32,
    pub height: f32,
    pub pivot_x: f32,
    pub pivot_y: f32,
}

impl ColliderState {
    fn interpolate(&self, end: &ColliderState, progress: f32) -> ColliderState {
        ColliderState {
            object: self.object.interpolate(&end.object, progress),
            width: mix(self.width, end.width, progress),
            height: mix(self.height, end.height, progress),
            pivot_x: mix(self.pivot_x, end.pivot_x, progress),
            pivot_y: mix(self.pivot_y, end.pivot_y, progress),
        }
    }
}

/// A fully resolved snapshot of one animation (or a blend of two) at one time.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub bones: Vec<BoneState>,
    pub sprites: Vec<ObjectState>,
    pub points: Vec<ObjectState>,
    pub colliders: Vec<ColliderState>,
}

impl Pose {
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
            && self.sprites.is_empty()
            && self.points.is_empty()
            && self.colliders.is_empty()
    }

    pub fn bone(&self, name: &str) -> Option<&BoneState> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn sprite(&self, name: &str) -> Option<&ObjectState> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn point(&self, name: &str) -> Option<&ObjectState> {
        self.points.iter().find(|p| p.name == name)
    }

    pub fn collider(&self, name: &str) -> Option<&ColliderState> {
        self.colliders.iter().find(|c| c.object.name == name)
    }

    /// Whether two poses have the same shape, which blending requires.
    pub fn can_blend(&self, other: &Pose) -> bool {
        self.bones.len() == other.bones.len() && self.sprites.len() == other.sprites.len()
    }

    /// Blends component-wise towards `other`. Poses of different shape are not blended and
    /// `self` is returned unchanged.
    pub fn blend(&self, other: &Pose, progress: f32) -> Pose {
        if !self.can_blend(other) {
            return self.clone();
        }

        fn blend_list<T: Clone>(
            from: &[T],
            to: &[T],
            progress: f32,
            f: impl Fn(&T, &T, f32) -> T,
        ) -> Vec<T> {
            from.iter()
                .enumerate()
                .map(|(i, a)| match to.get(i) {
                    Some(b) => f(a, b, progress),
                    None => a.clone(),
                })
                .collect()
        }

        Pose {
            bones: blend_list(&self.bones, &other.bones, progress, BoneState::interpolate),
            sprites: blend_list(&self.sprites, &other.sprites, progress, ObjectState::interpolate),
            points: blend_list(&self.points, &other.points, progress, ObjectState::interpolate),
            colliders: blend_list(
                &self.colliders,
                &other.colliders,
                progress,
                ColliderState::interpolate,
            ),
        }
    }
}

/// Resolves the pose of `animation` at `time` from the mainline key `key`.
///
/// The fallback progress for single-key timelines runs to the next mainline key (or to the end
/// of the animation).
pub fn resolve_pose(animation: &Animation, key: usize, time: f32, obj_info: &[ObjectInfo]) -> Pose {
    let track = Track::new(&animation.mainline, animation.looping);
    let bracket = Bracket {
        start: key,
        end: track.next_index(key).filter(|&next| next != key),
    };
    let fallback = if key < track.len() {
        track.progress(bracket, time, animation.length)
    } else {
        0.0
    };
    resolve_internal(animation, key, time, fallback, obj_info)
}

/// Resolves the pose of `animation` at `time` between the mainline keys `start` and `end`.
pub fn resolve_pose_between(
    animation: &Animation,
    start: usize,
    end: usize,
    time: f32,
    obj_info: &[ObjectInfo],
) -> Pose {
    let track = Track::new(&animation.mainline, animation.looping);
    let fallback = if start < track.len() && end < track.len() && start != end {
        track.progress(
            Bracket {
                start,
                end: Some(end),
            },
            time,
            animation.length,
        )
    } else {
        0.0
    };
    resolve_internal(animation, start, time, fallback, obj_info)
}

/// Locates the mainline bracket for `time` and resolves it.
///
/// Returns the bracket so callers can keep it as a cursor.
pub fn resolve_pose_at(
    animation: &Animation,
    time: f32,
    cursor: Option<usize>,
    obj_info: &[ObjectInfo],
) -> (Pose, Option<Bracket>) {
    let track = Track::new(&animation.mainline, animation.looping);
    let Some(bracket) = track.locate(time, cursor) else {
        return (Pose::default(), None);
    };
    let pose = match bracket.end {
        Some(end) => resolve_pose_between(animation, bracket.start, end, time, obj_info),
        None => resolve_pose(animation, bracket.start, time, obj_info),
    };
    (pose, Some(bracket))
}

struct Sides<T> {
    start: T,
    end: T,
    progress: f32,
    spin: i32,
}

fn timeline_sides<'a>(
    animation: &'a Animation,
    timeline: &'a Timeline,
    key_hint: usize,
    time: f32,
    fallback: f32,
) -> Option<(Sides<Transform>, Option<&'a ObjectTransform>, Option<&'a ObjectTransform>)> {
    let track = Track::new(&timeline.keys, animation.looping);
    let bracket = track.locate(time, Some(key_hint))?;
    let start = &timeline.keys[bracket.start];
    let end = &timeline.keys[bracket.end.unwrap_or(bracket.start)];
    let progress = if bracket.end.is_some() {
        track.progress(bracket, time, animation.length)
    } else {
        fallback
    };
    Some((
        Sides {
            start: *start.transform(),
            end: *end.transform(),
            progress,
            spin: start.spin,
        },
        start.object(),
        end.object(),
    ))
}

fn resolve_internal(
    animation: &Animation,
    key: usize,
    time: f32,
    fallback: f32,
    obj_info: &[ObjectInfo],
) -> Pose {
    let Some(main) = animation.mainline.get(key) else {
        return Pose::default();
    };

    let mut pose = Pose::default();
    let mut bone_sides: Vec<Sides<Transform>> = Vec::with_capacity(main.bone_refs.len());

    for (slot, bone_ref) in main.bone_refs.iter().enumerate() {
        let timeline = animation.timelines.get(bone_ref.timeline);
        let resolved = timeline
            .and_then(|t| timeline_sides(animation, t, bone_ref.key, time, fallback));
        let mut sides = match resolved {
            Some((sides, _, _)) => sides,
            None => Sides {
                start: Transform::IDENTITY,
                end: Transform::IDENTITY,
                progress: fallback,
                spin: 0,
            },
        };

        // Parents always precede their children, so the parent's sides are already in world space.
        let parent = bone_ref.parent.filter(|&p| p < slot);
        if let Some(p) = parent {
            let (parent_start, parent_end) = (bone_sides[p].start, bone_sides[p].end);
            sides.start.apply_parent(&parent_start);
            sides.end.apply_parent(&parent_end);
        }

        pose.bones.push(BoneState {
            slot,
            parent,
            timeline: bone_ref.timeline,
            name: timeline.map(|t| t.name.clone()).unwrap_or_default(),
            spin: sides.spin,
            transform: sides.start.interpolate(&sides.end, sides.progress, sides.spin),
        });
        bone_sides.push(sides);
    }

    for object_ref in &main.object_refs {
        let Some(timeline) = animation.timelines.get(object_ref.timeline) else {
            continue;
        };
        let Some((mut sides, start_obj, end_obj)) =
            timeline_sides(animation, timeline, object_ref.key, time, fallback)
        else {
            continue;
        };

        let parent = object_ref.parent.filter(|&p| p < bone_sides.len());
        if let Some(p) = parent {
            sides.start.apply_parent(&bone_sides[p].start);
            sides.end.apply_parent(&bone_sides[p].end);
        }

        let default_object = ObjectTransform::default();
        let start_obj = start_obj.unwrap_or(&default_object);
        let end_obj = end_obj.unwrap_or(start_obj);
        let progress = sides.progress;

        let list_len = match timeline.object_type {
            ObjectType::Point => pose.points.len(),
            ObjectType::Box => pose.colliders.len(),
            _ => pose.sprites.len(),
        };

        let state = ObjectState {
            slot: list_len,
            parent,
            timeline: object_ref.timeline,
            name: timeline.name.clone(),
            object_type: timeline.object_type,
            spin: sides.spin,
            transform: sides.start.interpolate(&sides.end, progress, sides.spin),
            alpha: mix(start_obj.alpha, end_obj.alpha, progress),
            file: start_obj.file.or(end_obj.file),
            folder: start_obj.folder.or(end_obj.folder),
            pivot_x: mix_opt(start_obj.pivot_x, end_obj.pivot_x, progress),
            pivot_y: mix_opt(start_obj.pivot_y, end_obj.pivot_y, progress),
            z_index: object_ref.z_index.or(start_obj.z_index).or(end_obj.z_index),
        };

        match timeline.object_type {
            ObjectType::Point => pose.points.push(state),
            ObjectType::Box => {
                let info = timeline.obj.and_then(|i| obj_info.get(i));
                pose.colliders.push(ColliderState {
                    object: state,
                    width: info.map(|i| i.width).unwrap_or(0.0),
                    height: info.map(|i| i.height).unwrap_or(0.0),
                    pivot_x: info.map(|i| i.pivot_x).unwrap_or(0.0),
                    pivot_y: info.map(|i| i.pivot_y).unwrap_or(0.0),
                });
            }
            // Bone timelines are rejected by validation; treat a stray one as a sprite.
            ObjectType::Sprite | ObjectType::Bone => pose.sprites.push(state),
        }
    }

    pose
}
