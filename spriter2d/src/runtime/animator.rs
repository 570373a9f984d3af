use super::pose::{Pose, resolve_pose_at};
use super::tags::TagChecker;
use crate::{Animation, Entity, Error, clamp, wrap};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of an animation inside the entity an [`Animator`] is bound to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AnimationHandle(pub usize);

impl Entity {
    pub fn animation_handle(&self, name: &str) -> Option<AnimationHandle> {
        self.animation(name).map(|(index, _)| AnimationHandle(index))
    }
}

/// How an animation is selected for playback.
///
/// `Id` indexes the entity's animation list directly, `Name` picks the first animation with
/// that name in source order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnimationRef<'a> {
    Id(u32),
    Name(&'a str),
    Handle(AnimationHandle),
}

impl From<u32> for AnimationRef<'_> {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for AnimationRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for AnimationRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl From<AnimationHandle> for AnimationRef<'_> {
    fn from(handle: AnimationHandle) -> Self {
        Self::Handle(handle)
    }
}

impl std::fmt::Display for AnimationRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
            Self::Handle(handle) => write!(f, "@{}", handle.0),
        }
    }
}

/// An eventline that fired during the last update.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriggeredEvent {
    pub name: String,
    /// Index into [`Animation::eventlines`] of the animation that fired it.
    pub eventline: usize,
    /// Index into [`Entity::obj_info`].
    pub obj: Option<usize>,
}

/// Output of one [`Animator::update`] call.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimatorState {
    pub pose: Pose,
    pub events: Vec<TriggeredEvent>,
    /// The animation stopped at its end or wrapped around during this update.
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnimatorEvent {
    Complete,
    Event(TriggeredEvent),
}

pub trait AnimatorListener {
    fn on_event(&mut self, event: &AnimatorEvent);
}

/// Coarse playback state derived from the animator's fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Stopped,
    Transitioning,
}

#[derive(Copy, Clone, Debug)]
struct Transition {
    target: usize,
    duration: f32,
    elapsed: f32,
    scale: f32,
}

/// Drives playback of one entity's animations.
///
/// The entity is shared read-only; each animated instance owns its own animator.
pub struct Animator {
    entity: Arc<Entity>,
    current: Option<usize>,
    transition: Option<Transition>,
    time: f32,
    speed: f32,
    playing: bool,
    cursor: Option<usize>,
    triggered: HashSet<String>,
    state: Option<AnimatorState>,
    listener: Option<Box<dyn AnimatorListener>>,
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("entity", &self.entity.name)
            .field("current", &self.current)
            .field("transition", &self.transition)
            .field("time", &self.time)
            .field("speed", &self.speed)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

impl Animator {
    pub fn new(entity: Arc<Entity>) -> Self {
        Self {
            entity,
            current: None,
            transition: None,
            time: 0.0,
            speed: 1.0,
            playing: false,
            cursor: None,
            triggered: HashSet::new(),
            state: None,
            listener: None,
        }
    }

    pub fn set_listener<L: AnimatorListener + 'static>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    /// Rebinds to another entity, keeping the current and target animations by id.
    ///
    /// Animations whose id does not exist in `entity` are dropped. The last resolved state is
    /// discarded, so tag queries see nothing until the next update.
    pub fn set_entity(&mut self, entity: Arc<Entity>) {
        let current = self.current.and_then(|i| self.entity.animations.get(i)).map(|a| a.id);
        let target = self
            .transition
            .and_then(|t| self.entity.animations.get(t.target))
            .map(|a| a.id);

        self.entity = entity;
        self.cursor = None;
        self.state = None;
        self.triggered.clear();

        self.current = current.and_then(|id| self.rebind_index(id));
        if self.current.is_none() {
            self.playing = false;
            self.transition = None;
            self.time = 0.0;
            return;
        }

        match (self.transition, target.and_then(|id| self.rebind_index(id))) {
            (Some(t), Some(index)) => self.transition = Some(Transition { target: index, ..t }),
            _ => self.transition = None,
        }
        if let Some(length) = self.animation().map(|a| a.length) {
            self.time = clamp(self.time, 0.0, length);
        }
    }

    fn rebind_index(&self, id: u32) -> Option<usize> {
        let index = id as usize;
        if index < self.entity.animations.len() {
            Some(index)
        } else {
            log::debug!(
                "entity '{}' has no animation #{id}, dropping it from the animator",
                self.entity.name
            );
            None
        }
    }

    /// The animation being played (the source side while transitioning).
    pub fn animation(&self) -> Option<&Animation> {
        self.current.and_then(|i| self.entity.animations.get(i))
    }

    /// The animation being transitioned to, if any.
    pub fn next_animation(&self) -> Option<&Animation> {
        self.transition
            .and_then(|t| self.entity.animations.get(t.target))
    }

    pub fn playback_state(&self) -> PlaybackState {
        match (self.current, self.playing, self.transition) {
            (None, _, _) => PlaybackState::Idle,
            (Some(_), false, _) => PlaybackState::Stopped,
            (Some(_), true, Some(_)) => PlaybackState::Transitioning,
            (Some(_), true, None) => PlaybackState::Playing,
        }
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Playback rate multiplier; negative values play backwards, zero pauses advancement.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Playback position as a fraction of the current animation's length.
    pub fn progress(&self) -> f32 {
        match self.animation() {
            Some(a) if a.length > 0.0 => self.time / a.length,
            _ => 0.0,
        }
    }

    pub fn set_progress(&mut self, progress: f32) {
        let Some(length) = self.animation().map(|a| a.length) else {
            return;
        };
        self.time = if length > 0.0 {
            clamp(progress * length, 0.0, length)
        } else {
            0.0
        };
        self.cursor = None;
    }

    /// The state produced by the last update.
    pub fn state(&self) -> Option<&AnimatorState> {
        self.state.as_ref()
    }

    pub fn tags(&self) -> TagChecker<'_> {
        TagChecker::new(self.animation(), self.state.as_ref(), self.time)
    }

    fn find(&self, animation: AnimationRef<'_>) -> Option<usize> {
        let animations = &self.entity.animations;
        let index = match animation {
            AnimationRef::Id(id) => Some(id as usize).filter(|&i| i < animations.len()),
            AnimationRef::Name(name) => self.entity.animation(name).map(|(i, _)| i),
            AnimationRef::Handle(handle) => Some(handle.0).filter(|&i| i < animations.len()),
        };
        if index.is_none() {
            log::debug!(
                "entity '{}' has no animation {animation}, ignoring request",
                self.entity.name
            );
        }
        index
    }

    /// Starts playing `animation` from the beginning, or resumes it when it is already current.
    ///
    /// Unknown animations are ignored.
    pub fn play<'a>(&mut self, animation: impl Into<AnimationRef<'a>>) {
        if let Some(index) = self.find(animation.into()) {
            self.set_animation(index);
        }
    }

    /// Like [`Animator::play`], but reports unknown animations.
    pub fn try_play<'a>(&mut self, animation: impl Into<AnimationRef<'a>>) -> Result<(), Error> {
        let animation = animation.into();
        let index = self.find(animation).ok_or_else(|| Error::UnknownAnimation {
            name: animation.to_string(),
        })?;
        self.set_animation(index);
        Ok(())
    }

    /// Resumes a stopped animator. Does nothing while idle.
    pub fn resume(&mut self) {
        if self.current.is_some() {
            self.playing = true;
        }
    }

    /// Halts advancement; time and animation are retained.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Cross-fades into `animation` over `duration`.
    ///
    /// A request made while another transition is in flight is rejected. A zero duration, the
    /// current animation as target, or an idle animator start the target immediately.
    pub fn transition<'a>(&mut self, animation: impl Into<AnimationRef<'a>>, duration: f32) {
        let animation = animation.into();
        if let Some(active) = self.transition {
            log::warn!(
                "cannot transition to {animation}: already transitioning from '{}' to '{}'",
                self.animation().map(|a| a.name.as_str()).unwrap_or_default(),
                self.entity
                    .animations
                    .get(active.target)
                    .map(|a| a.name.as_str())
                    .unwrap_or_default(),
            );
            return;
        }

        let Some(target) = self.find(animation) else {
            return;
        };

        if self.current.is_none()
            || self.current == Some(target)
            || duration == 0.0
            || !duration.is_finite()
        {
            self.set_animation(target);
            return;
        }

        self.transition = Some(Transition {
            target,
            duration: duration.abs(),
            elapsed: 0.0,
            scale: 0.0,
        });
    }

    fn set_animation(&mut self, index: usize) {
        if self.current == Some(index) {
            self.playing = true;
            return;
        }

        self.current = Some(index);
        self.transition = None;
        self.cursor = None;
        self.triggered.clear();
        self.time = 0.0;
        self.playing = true;
    }

    /// Advances playback by `delta` (scaled by [`Animator::speed`]) and resolves the pose.
    ///
    /// Returns `None` without touching any state when idle, stopped or paused by a zero speed.
    pub fn update(&mut self, delta: f32) -> Option<&AnimatorState> {
        if !self.playing || self.speed == 0.0 {
            return None;
        }
        let entity = Arc::clone(&self.entity);
        let mut index = self.current?;
        let mut delta = delta * self.speed;

        if let Some(mut transition) = self.transition {
            let ratio = match (entity.animations.get(index), entity.animations.get(transition.target)) {
                (Some(current), Some(target)) if target.length > 0.0 => {
                    current.length / target.length
                }
                _ => 1.0,
            };
            delta += delta * transition.scale * ratio;
            transition.elapsed += delta.abs();

            if transition.elapsed >= transition.duration {
                let progress = self.progress();
                log::trace!(
                    "transition to animation {} complete at progress {progress}",
                    transition.target
                );
                self.set_animation(transition.target);
                self.set_progress(progress);
                index = transition.target;
            } else {
                transition.scale = transition.elapsed / transition.duration;
                self.transition = Some(transition);
            }
        }

        let animation = entity.animations.get(index)?;
        let previous = self.time;
        let unwrapped = previous + delta;
        let forward = delta >= 0.0;
        let mut stopped = false;

        if animation.looping {
            self.time = wrap(unwrapped, 0.0, animation.length);
        } else {
            self.time = clamp(unwrapped, 0.0, animation.length);
            stopped = if forward {
                delta > 0.0 && self.time >= animation.length
            } else {
                self.time <= 0.0
            };
            if stopped {
                self.playing = false;
            }
        }

        // Crossing the loop boundary in the direction of travel, including whole-loop steps.
        let wrapped = animation.looping
            && animation.length > 0.0
            && if forward {
                delta > 0.0 && unwrapped >= animation.length
            } else {
                unwrapped < 0.0
            };

        let (pose, bracket) =
            resolve_pose_at(animation, self.time, self.cursor, &entity.obj_info);
        self.cursor = bracket.map(|b| b.start);

        let pose = match self.transition {
            Some(transition) => match entity.animations.get(transition.target) {
                Some(target) => {
                    let target_time = if animation.length > 0.0 {
                        self.time / animation.length * target.length
                    } else {
                        0.0
                    };
                    let (target_pose, _) =
                        resolve_pose_at(target, target_time, None, &entity.obj_info);
                    pose.blend(&target_pose, transition.scale)
                }
                None => pose,
            },
            None => pose,
        };

        let window = EventWindow {
            from: previous,
            to: self.time,
            forward,
            wrapped,
            moved: delta != 0.0,
        };
        let events = self.triggered_events(animation, window);

        self.state = Some(AnimatorState {
            pose,
            events,
            completed: stopped || wrapped,
        });
        self.notify();
        self.state.as_ref()
    }

    fn triggered_events(&mut self, animation: &Animation, window: EventWindow) -> Vec<TriggeredEvent> {
        let mut events = Vec::new();
        for (index, eventline) in animation.eventlines.iter().enumerate() {
            let fired = window.moved && eventline.keys.iter().any(|k| window.contains(k.time));
            if !fired {
                self.triggered.remove(&eventline.name);
                continue;
            }
            if !self.triggered.insert(eventline.name.clone()) {
                continue;
            }
            events.push(TriggeredEvent {
                name: eventline.name.clone(),
                eventline: index,
                obj: eventline.obj,
            });
        }
        events
    }

    fn notify(&mut self) {
        let (Some(listener), Some(state)) = (self.listener.as_mut(), self.state.as_ref()) else {
            return;
        };
        for event in &state.events {
            listener.on_event(&AnimatorEvent::Event(event.clone()));
        }
        if state.completed {
            listener.on_event(&AnimatorEvent::Complete);
        }
    }
}

/// The span of playback time covered by one update.
///
/// Forward windows are `(from, to]`; backward ones `[to, from)`. A wrapped window covers the
/// remainder of the loop on one side and the start of the next loop on the other.
#[derive(Copy, Clone, Debug)]
struct EventWindow {
    from: f32,
    to: f32,
    forward: bool,
    wrapped: bool,
    moved: bool,
}

impl EventWindow {
    fn contains(&self, time: f32) -> bool {
        match (self.forward, self.wrapped) {
            (true, false) => self.from < time && time <= self.to,
            (true, true) => self.from < time || time <= self.to,
            (false, false) => self.to <= time && time < self.from,
            (false, true) => time < self.from || self.to <= time,
        }
    }
}
