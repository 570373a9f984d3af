use serde_json::json;
use spriter2d::{Animator, LoadOptions, ObjectState, SpriterData, Transform};
use std::path::PathBuf;

fn transform_json(t: &Transform) -> serde_json::Value {
    json!({"x": t.x, "y": t.y, "angle": t.angle, "scaleX": t.scale_x, "scaleY": t.scale_y})
}

fn object_json(i: usize, o: &ObjectState) -> serde_json::Value {
    json!({
        "i": i,
        "name": o.name,
        "timeline": o.timeline,
        "parent": o.parent_slot(),
        "world": transform_json(&o.transform),
        "alpha": o.alpha,
        "folder": o.folder,
        "file": o.file,
        "pivot": [o.pivot_x, o.pivot_y],
        "zIndex": o.z_index,
    })
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut y_down = false;

    for arg in &args {
        match arg.as_str() {
            "--y-down" => y_down = true,
            other => positional.push(other.to_string()),
        }
    }

    let scon_path = positional
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./assets/player.scon"));
    let entity_name = positional.get(1).cloned();
    let animation = positional
        .get(2)
        .cloned()
        .unwrap_or_else(|| "idle".to_string());
    let time: f32 = positional
        .get(3)
        .cloned()
        .unwrap_or_else(|| "0".to_string())
        .parse()
        .unwrap_or(0.0);

    let scon = std::fs::read_to_string(&scon_path).expect("read scon");
    let options = LoadOptions { y_down };
    let data = SpriterData::from_scon_str_with_options(&scon, options).expect("parse scon");

    let entity = match entity_name.as_deref() {
        Some(name) => data.entity(name).expect("entity").clone(),
        None => data.entities.first().expect("scon has no entities").clone(),
    };

    let mut animator = Animator::new(entity);
    animator.try_play(animation.as_str()).expect("play animation");
    animator.update(0.0);
    animator.update(time.max(0.0));
    let state = animator.state().expect("animator state");

    let bones: Vec<_> = state
        .pose
        .bones
        .iter()
        .enumerate()
        .map(|(i, bone)| {
            json!({
                "i": i,
                "name": bone.name,
                "timeline": bone.timeline,
                "parent": bone.parent_slot(),
                "world": transform_json(&bone.transform),
            })
        })
        .collect();

    let sprites: Vec<_> = state
        .pose
        .sprites
        .iter()
        .enumerate()
        .map(|(i, o)| object_json(i, o))
        .collect();

    let points: Vec<_> = state
        .pose
        .points
        .iter()
        .enumerate()
        .map(|(i, o)| object_json(i, o))
        .collect();

    let colliders: Vec<_> = state
        .pose
        .colliders
        .iter()
        .enumerate()
        .map(|(i, c)| {
            json!({
                "i": i,
                "name": c.object.name,
                "world": transform_json(&c.object.transform),
                "size": [c.width, c.height],
                "pivot": [c.pivot_x, c.pivot_y],
            })
        })
        .collect();

    let events: Vec<_> = state.events.iter().map(|e| e.name.as_str()).collect();

    let out = json!({
        "animation": animation,
        "time": animator.time(),
        "completed": state.completed,
        "events": events,
        "bones": bones,
        "sprites": sprites,
        "points": points,
        "colliders": colliders,
    });
    println!("{}", serde_json::to_string_pretty(&out).expect("serialize pose"));
}
