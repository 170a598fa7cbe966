use crate::agent::Pose;

// Sprites face right, so no flip.
pub const SPRITE_TRANSFORM: &str = "scale(1, 1)";

pub fn css_transform(pose: &Pose) -> String {
    format!(
        "translate({}vw, {}vh) rotate({}rad)",
        pose.x, pose.y, pose.heading
    )
}

pub fn pack_poses(poses: &[Pose], buffer: &mut Vec<f32>) {
    buffer.clear();
    buffer.reserve(poses.len() * 3);
    for pose in poses {
        buffer.extend_from_slice(&[pose.x, pose.y, pose.heading]);
    }
}
