use super::pose::{Pose, resolve_pose};
use crate::test_fixtures::{animation, main_key, object_key, timeline};
use crate::{ObjectInfo, ObjectType, Transform};

fn collider_pose(transform: Transform, pivot_x: f32, pivot_y: f32) -> Pose {
    let mut hitbox = timeline("hitbox", ObjectType::Box, vec![object_key(0.0, transform)]);
    hitbox.obj = Some(0);
    let anim = animation(
        0,
        "guard",
        100.0,
        true,
        vec![main_key(0.0, &[], &[(0, 0, None)])],
        vec![hitbox],
    );
    let info = [ObjectInfo {
        name: "hitbox".to_string(),
        object_type: ObjectType::Box,
        width: 40.0,
        height: 20.0,
        pivot_x,
        pivot_y,
    }];
    resolve_pose(&anim, 0, 0.0, &info)
}

#[test]
fn axis_aligned_box_with_centered_pivot() {
    let pose = collider_pose(
        Transform {
            scale_x: 2.0,
            scale_y: 2.0,
            ..Transform::IDENTITY
        },
        0.5,
        0.5,
    );
    assert_eq!(pose.hit_test(39.0, 19.0).len(), 1);
    assert_eq!(pose.hit_test(-39.0, -19.0).len(), 1);
    assert!(pose.hit_test(41.0, 0.0).is_empty());
    assert!(pose.hit_test(0.0, 21.0).is_empty());
}

#[test]
fn rotated_box_is_tested_in_local_space() {
    let pose = collider_pose(
        Transform {
            x: 100.0,
            angle: 90.0,
            ..Transform::IDENTITY
        },
        0.0,
        0.0,
    );
    // Local x runs along world +y, local y along world -x.
    let hits = pose.hit_test(90.0, 30.0);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].object.name, "hitbox");
    assert!(pose.hit_test(110.0, 10.0).is_empty());
    assert!(pose.hit_test(90.0, -5.0).is_empty());
}

#[test]
fn mirrored_box_extends_the_other_way() {
    let pose = collider_pose(
        Transform {
            scale_x: -1.0,
            ..Transform::IDENTITY
        },
        0.0,
        0.0,
    );
    assert_eq!(pose.hit_test(-10.0, 5.0).len(), 1);
    assert!(pose.hit_test(10.0, 5.0).is_empty());
}

#[test]
fn collapsed_box_never_hits() {
    let pose = collider_pose(
        Transform {
            scale_y: 0.0,
            ..Transform::IDENTITY
        },
        0.0,
        0.0,
    );
    assert!(pose.hit_test(0.0, 0.0).is_empty());
}
