use super::animator::AnimatorState;
use super::keyframes::Track;
use super::pose::ObjectState;
use crate::{Animation, Tagline};

/// Selects one resolved component, by source timeline index or by name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ComponentRef {
    Timeline(usize),
    Name(String),
}

impl ComponentRef {
    fn matches(&self, timeline: usize, name: &str) -> bool {
        match self {
            Self::Timeline(t) => *t == timeline,
            Self::Name(n) => n == name,
        }
    }
}

impl From<usize> for ComponentRef {
    fn from(timeline: usize) -> Self {
        Self::Timeline(timeline)
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Whether `tag` is active on `tagline` at `time`.
///
/// The active set is the one of the last tag key at or before `time`. On a looping track a
/// time before the first key sees the last key's set.
pub fn check_tagline(tagline: &Tagline, looping: bool, tag: &str, time: f32) -> bool {
    let Some(first) = tagline.keys.first() else {
        return false;
    };
    if !looping && time < first.time {
        return false;
    }
    Track::new(&tagline.keys, looping)
        .locate(time, None)
        .and_then(|bracket| tagline.keys.get(bracket.start))
        .is_some_and(|key| key.has_tag(tag))
}

/// Tag queries against an animator's last resolved state.
///
/// Component checks only consider components present in that pose, so a component that is
/// not keyed at the current time never reports a tag.
#[derive(Copy, Clone, Debug)]
pub struct TagChecker<'a> {
    animation: Option<&'a Animation>,
    state: Option<&'a AnimatorState>,
    time: f32,
}

impl<'a> TagChecker<'a> {
    pub fn new(animation: Option<&'a Animation>, state: Option<&'a AnimatorState>, time: f32) -> Self {
        Self {
            animation,
            state,
            time,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Animation-level tags or the tags of any resolved component.
    pub fn check(&self, tag: &str) -> bool {
        self.check_animation(tag) || self.check_components(tag, None)
    }

    /// Tags of one component, searching bones, sprites, points and colliders.
    pub fn check_target(&self, tag: &str, target: impl Into<ComponentRef>) -> bool {
        self.check_components(tag, Some(&target.into()))
    }

    pub fn check_animation(&self, tag: &str) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        animation
            .tagline
            .as_ref()
            .is_some_and(|t| check_tagline(t, animation.looping, tag, self.time))
    }

    /// Tags of a sprite.
    pub fn check_component(&self, tag: &str, target: impl Into<ComponentRef>) -> bool {
        let Some(state) = self.state else {
            return false;
        };
        self.check_objects(&state.pose.sprites, tag, Some(&target.into()))
    }

    pub fn check_collider(&self, tag: &str, target: impl Into<ComponentRef>) -> bool {
        let Some(state) = self.state else {
            return false;
        };
        let target = target.into();
        state
            .pose
            .colliders
            .iter()
            .filter(|c| target.matches(c.object.timeline, &c.object.name))
            .any(|c| self.timeline_has_tag(c.object.timeline, tag))
    }

    /// Tags on the eventline of an event that fired during the last update.
    pub fn check_event(&self, tag: &str, event: &str) -> bool {
        let (Some(animation), Some(state)) = (self.animation, self.state) else {
            return false;
        };
        state
            .events
            .iter()
            .find(|e| e.name == event)
            .and_then(|e| animation.eventlines.get(e.eventline))
            .and_then(|line| line.tagline.as_ref())
            .is_some_and(|t| check_tagline(t, animation.looping, tag, self.time))
    }

    fn check_components(&self, tag: &str, target: Option<&ComponentRef>) -> bool {
        let Some(state) = self.state else {
            return false;
        };
        let pose = &state.pose;

        let bones = pose
            .bones
            .iter()
            .filter(|b| target.is_none_or(|t| t.matches(b.timeline, &b.name)))
            .any(|b| self.timeline_has_tag(b.timeline, tag));

        bones
            || self.check_objects(&pose.sprites, tag, target)
            || self.check_objects(&pose.points, tag, target)
            || pose
                .colliders
                .iter()
                .filter(|c| target.is_none_or(|t| t.matches(c.object.timeline, &c.object.name)))
                .any(|c| self.timeline_has_tag(c.object.timeline, tag))
    }

    fn check_objects(&self, objects: &[ObjectState], tag: &str, target: Option<&ComponentRef>) -> bool {
        objects
            .iter()
            .filter(|o| target.is_none_or(|t| t.matches(o.timeline, &o.name)))
            .any(|o| self.timeline_has_tag(o.timeline, tag))
    }

    fn timeline_has_tag(&self, timeline: usize, tag: &str) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        animation
            .timelines
            .get(timeline)
            .and_then(|t| t.tagline.as_ref())
            .is_some_and(|t| check_tagline(t, animation.looping, tag, self.time))
    }
}
