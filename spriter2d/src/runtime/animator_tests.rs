use super::animator::{
    AnimationHandle, Animator, AnimatorEvent, AnimatorListener, PlaybackState,
};
use crate::test_fixtures::{assert_approx, entity, eventline, rotating_bone, still_bone};
use crate::{Error, Entity};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn walk_idle_run() -> Arc<Entity> {
    entity(vec![
        rotating_bone(0, "walk", 1000.0, 0.0, 90.0),
        still_bone(1, "idle", 2000.0, 90.0),
        still_bone(2, "run", 500.0, 0.0),
    ])
}

fn non_looping(length: f32) -> Arc<Entity> {
    let mut once = rotating_bone(0, "once", length, 0.0, 90.0);
    once.looping = false;
    entity(vec![once])
}

#[derive(Clone, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<AnimatorEvent>>>,
}

impl AnimatorListener for Recorder {
    fn on_event(&mut self, event: &AnimatorEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[test]
fn idle_animator_does_nothing() {
    let mut animator = Animator::new(walk_idle_run());
    assert_eq!(animator.playback_state(), PlaybackState::Idle);
    assert!(animator.update(100.0).is_none());
    assert!(animator.animation().is_none());
    assert!(animator.state().is_none());
    assert_approx(animator.time(), 0.0);
}

#[test]
fn walk_scenario_wraps_into_length() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    let state = animator.update(750.0).expect("state");
    assert_approx(state.pose.bones[0].transform.angle, 45.0);
    assert!(!state.completed);
    assert_approx(animator.time(), 750.0);

    let state = animator.update(500.0).expect("state");
    assert!(state.completed);
    assert_approx(state.pose.bones[0].transform.angle, 45.0);
    assert_approx(animator.time(), 250.0);
}

#[test]
fn overshooting_a_loop_matches_advancing_from_zero() {
    let mut a = Animator::new(walk_idle_run());
    a.play("walk");
    a.update(1300.0);

    let mut b = Animator::new(walk_idle_run());
    b.play("walk");
    b.update(300.0);

    assert_approx(a.time(), b.time());
    assert_eq!(
        a.state().expect("a").pose,
        b.state().expect("b").pose
    );
}

#[test]
fn play_by_id_name_and_handle() {
    let entity = walk_idle_run();
    let mut animator = Animator::new(Arc::clone(&entity));

    animator.play(1u32);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("idle"));

    let handle = entity.animation_handle("run").expect("run");
    assert_eq!(handle, AnimationHandle(2));
    animator.play(handle);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("run"));

    animator.play("walk");
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("walk"));
}

#[test]
fn unknown_animation_is_ignored() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.update(100.0);

    animator.play("swim");
    animator.play(42u32);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("walk"));
    assert_approx(animator.time(), 100.0);

    let err = animator.try_play("swim").unwrap_err();
    assert!(matches!(err, Error::UnknownAnimation { name } if name == "swim"));
    assert!(animator.try_play("idle").is_ok());
}

#[test]
fn replaying_current_animation_resumes_without_reset() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.update(300.0);
    animator.stop();
    animator.stop();
    assert_eq!(animator.playback_state(), PlaybackState::Stopped);
    assert!(animator.update(100.0).is_none());

    animator.play("walk");
    assert!(animator.playing());
    assert_approx(animator.time(), 300.0);

    animator.stop();
    animator.resume();
    assert_eq!(animator.playback_state(), PlaybackState::Playing);
}

#[test]
fn zero_speed_pauses_advancement() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.set_speed(0.0);
    assert!(animator.update(100.0).is_none());
    assert_approx(animator.time(), 0.0);
}

#[test]
fn non_looping_clamps_and_stops_at_end() {
    let mut animator = Animator::new(non_looping(1000.0));
    animator.play("once");

    let state = animator.update(0.0).expect("state");
    assert!(!state.completed);
    assert!(animator.playing());

    let state = animator.update(600.0).expect("state");
    assert!(!state.completed);

    let state = animator.update(600.0).expect("state");
    assert!(state.completed);
    assert_approx(animator.time(), 1000.0);
    assert!(!animator.playing());
    assert!(animator.update(10.0).is_none());
}

#[test]
fn backward_playback_stops_at_zero() {
    let mut animator = Animator::new(non_looping(1000.0));
    animator.play("once");
    animator.update(400.0);
    animator.set_speed(-2.0);

    let state = animator.update(100.0).expect("state");
    assert!(!state.completed);
    assert_approx(animator.time(), 200.0);

    let state = animator.update(150.0).expect("state");
    assert!(state.completed);
    assert_approx(animator.time(), 0.0);
    assert!(!animator.playing());
}

#[test]
fn backward_looping_wraps_and_completes_once() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.set_speed(-1.0);

    let state = animator.update(250.0).expect("state");
    assert!(state.completed);
    assert_approx(animator.time(), 750.0);

    let state = animator.update(250.0).expect("state");
    assert!(!state.completed);
    assert_approx(animator.time(), 500.0);
}

#[test]
fn transition_carries_progress_into_target() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.update(300.0);
    assert_approx(animator.progress(), 0.3);

    animator.transition("idle", 100.0);
    assert_eq!(animator.playback_state(), PlaybackState::Transitioning);

    animator.update(200.0);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("idle"));
    assert!(animator.next_animation().is_none());
    // 0.3 of idle's 2000 is 600, then this tick's 200.
    assert_approx(animator.time(), 800.0);
    assert_eq!(animator.playback_state(), PlaybackState::Playing);
}

#[test]
fn transition_blends_poses_while_in_flight() {
    let entity = entity(vec![
        still_bone(0, "a", 1000.0, 0.0),
        still_bone(1, "b", 1000.0, 90.0),
    ]);
    let mut animator = Animator::new(entity);
    animator.play("a");
    animator.transition("b", 1000.0);

    let state = animator.update(100.0).expect("state");
    assert_approx(state.pose.bones[0].transform.angle, 9.0);
    assert_eq!(animator.next_animation().map(|a| a.name.as_str()), Some("b"));
}

fn assert_near(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= 1.0e-2,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn transition_scales_blend_time_by_length_ratio() {
    let entity = entity(vec![
        still_bone(0, "long", 1000.0, 0.0),
        still_bone(1, "short", 500.0, 90.0),
    ]);
    let mut animator = Animator::new(entity);
    animator.play("long");
    animator.transition("short", 300.0);

    // No blend yet: the raw 100 counts, elapsed 100 of 300.
    let state = animator.update(100.0).expect("state");
    assert_near(state.pose.bones[0].transform.angle, 30.0);
    assert_near(animator.time(), 100.0);

    // 100 + 100 * (1/3) * (1000/500): elapsed 266.67.
    let state = animator.update(100.0).expect("state");
    assert_near(state.pose.bones[0].transform.angle, 80.0);
    assert_near(animator.time(), 266.67);
    assert_eq!(animator.playback_state(), PlaybackState::Transitioning);

    // 100 + 100 * (8/9) * 2 pushes elapsed past 300: promoted at progress 0.2667.
    animator.update(100.0);
    assert_eq!(animator.playback_state(), PlaybackState::Playing);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("short"));
    assert_near(animator.time(), 133.33 + 277.78);
}

#[test]
fn second_transition_is_rejected() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.transition("idle", 500.0);
    animator.transition("run", 500.0);
    assert_eq!(
        animator.next_animation().map(|a| a.name.as_str()),
        Some("idle")
    );
}

#[test]
fn degenerate_transitions_switch_immediately() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.update(300.0);

    animator.transition("walk", 500.0);
    assert!(animator.next_animation().is_none());
    assert_approx(animator.time(), 300.0);

    animator.transition("run", 0.0);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("run"));
    assert!(animator.next_animation().is_none());
    assert_approx(animator.time(), 0.0);

    let mut idle = Animator::new(walk_idle_run());
    idle.transition("idle", 500.0);
    assert_eq!(idle.animation().map(|a| a.name.as_str()), Some("idle"));
}

#[test]
fn events_are_edge_triggered() {
    let mut walk = rotating_bone(0, "walk", 1000.0, 0.0, 90.0);
    walk.eventlines.push(eventline("step", &[250.0, 260.0]));
    walk.eventlines.push(eventline("land", &[900.0]));
    let mut animator = Animator::new(entity(vec![walk]));
    animator.play("walk");

    let state = animator.update(200.0).expect("state");
    assert!(state.events.is_empty());

    let state = animator.update(55.0).expect("state");
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.events[0].name, "step");
    assert_eq!(state.events[0].eventline, 0);

    // Still inside the burst: suppressed.
    let state = animator.update(10.0).expect("state");
    assert!(state.events.is_empty());

    let state = animator.update(10.0).expect("state");
    assert!(state.events.is_empty());

    // Wrapping past the end crosses "land" and then "step" again.
    let state = animator.update(1000.0).expect("state");
    let names: Vec<_> = state.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["step", "land"]);
    assert!(state.completed);
}

#[test]
fn backward_event_windows_exclude_the_start_time() {
    let mut walk = rotating_bone(0, "walk", 1000.0, 0.0, 90.0);
    walk.eventlines.push(eventline("at_start", &[200.0]));
    walk.eventlines.push(eventline("early", &[150.0]));
    walk.eventlines.push(eventline("mid", &[500.0]));
    walk.eventlines.push(eventline("late", &[800.0]));
    walk.eventlines.push(eventline("at_end", &[900.0]));
    let mut animator = Animator::new(entity(vec![walk]));
    animator.play("walk");
    animator.set_progress(0.2);
    animator.set_speed(-1.0);

    // 200 -> 900 across the loop start: [0, 200) and [900, 1000).
    let state = animator.update(300.0).expect("state");
    let names: Vec<_> = state.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["early", "at_end"]);
    assert!(state.completed);

    // 900 -> 800: [800, 900).
    let state = animator.update(100.0).expect("state");
    let names: Vec<_> = state.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["late"]);
    assert!(!state.completed);
    assert_approx(animator.time(), 800.0);
}

#[test]
fn zero_delta_fires_no_events() {
    let mut walk = rotating_bone(0, "walk", 1000.0, 0.0, 90.0);
    walk.eventlines.push(eventline("start", &[0.0]));
    let mut animator = Animator::new(entity(vec![walk]));
    animator.play("walk");
    let state = animator.update(0.0).expect("state");
    assert!(state.events.is_empty());
    assert!(!state.completed);
}

#[test]
fn listener_receives_events_and_completion() {
    let mut walk = rotating_bone(0, "walk", 1000.0, 0.0, 90.0);
    walk.eventlines.push(eventline("step", &[500.0]));
    let mut animator = Animator::new(entity(vec![walk]));
    let recorder = Recorder::default();
    animator.set_listener(recorder.clone());
    animator.play("walk");

    animator.update(600.0);
    animator.update(600.0);

    let events = recorder.events.borrow();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], AnimatorEvent::Event(e) if e.name == "step"));
    assert_eq!(events[1], AnimatorEvent::Complete);
}

#[test]
fn progress_round_trips_through_length() {
    let mut animator = Animator::new(walk_idle_run());
    assert_approx(animator.progress(), 0.0);
    animator.play("idle");
    animator.set_progress(0.25);
    assert_approx(animator.time(), 500.0);
    assert_approx(animator.progress(), 0.25);
}

#[test]
fn rebinding_keeps_animations_by_id() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("idle");
    animator.update(400.0);

    let renamed = entity(vec![
        still_bone(0, "walk2", 1000.0, 0.0),
        still_bone(1, "idle2", 1000.0, 45.0),
    ]);
    animator.set_entity(renamed);
    assert_eq!(animator.animation().map(|a| a.name.as_str()), Some("idle2"));
    assert!(animator.state().is_none());
    assert!(!animator.tags().check("anything"));
    assert_approx(animator.time(), 400.0);

    let state = animator.update(0.0).expect("state");
    assert_approx(state.pose.bones[0].transform.angle, 45.0);

    let smaller = entity(vec![still_bone(0, "only", 1000.0, 0.0)]);
    animator.set_entity(smaller);
    assert_eq!(animator.playback_state(), PlaybackState::Idle);
}

#[test]
fn rebinding_drops_missing_transition_target() {
    let mut animator = Animator::new(walk_idle_run());
    animator.play("walk");
    animator.transition("run", 500.0);

    animator.set_entity(entity(vec![
        still_bone(0, "walk", 1000.0, 0.0),
        still_bone(1, "idle", 1000.0, 0.0),
    ]));
    assert_eq!(animator.playback_state(), PlaybackState::Playing);
    assert!(animator.next_animation().is_none());
}
