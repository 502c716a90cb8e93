//! Impact behaviors: what a conjured body does after it strikes something.

use std::fmt;

use bevy::prelude::*;

use super::motion::{Attachment, BodyState};

/// A conjured body touching a combat target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionInfo {
    pub entity: Entity,
    pub entity_position: Vec3,
    pub entity_rotation: Quat,
    /// Point of contact (the body's position at the time of the hit)
    pub point: Vec3,
}

pub trait ImpactBehavior: Send + Sync + fmt::Debug {
    fn type_key(&self) -> &'static str;

    fn on_collision(&mut self, body: &mut BodyState, hit: &CollisionInfo);

    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn ImpactBehavior>;
}

impl Clone for Box<dyn ImpactBehavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Despawns on the first contact.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DestroyImpact;

impl ImpactBehavior for DestroyImpact {
    fn type_key(&self) -> &'static str {
        "destroy"
    }

    fn on_collision(&mut self, body: &mut BodyState, _hit: &CollisionInfo) {
        body.despawn_requested = true;
    }

    fn description(&self) -> String {
        "Shatters on impact".to_string()
    }

    fn clone_box(&self) -> Box<dyn ImpactBehavior> {
        Box::new(self.clone())
    }
}

/// Passes through targets, striking each one once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PierceImpact;

impl ImpactBehavior for PierceImpact {
    fn type_key(&self) -> &'static str {
        "pierce"
    }

    // The body keeps its course; the struck list keeps it from hitting twice
    fn on_collision(&mut self, _body: &mut BodyState, _hit: &CollisionInfo) {}

    fn description(&self) -> String {
        "Pierces through targets".to_string()
    }

    fn clone_box(&self) -> Box<dyn ImpactBehavior> {
        Box::new(self.clone())
    }
}

/// Embeds in the first thing it hits and rides along with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StickImpact;

impl ImpactBehavior for StickImpact {
    fn type_key(&self) -> &'static str {
        "stick"
    }

    fn on_collision(&mut self, body: &mut BodyState, hit: &CollisionInfo) {
        body.velocity = Vec3::ZERO;
        body.frozen = true;
        body.delivers_effects = false;
        body.attachment = Some(Attachment::capture(
            hit.entity,
            hit.entity_position,
            hit.entity_rotation,
            body.position,
            body.rotation,
        ));
    }

    fn description(&self) -> String {
        "Sticks to what it hits".to_string()
    }

    fn clone_box(&self) -> Box<dyn ImpactBehavior> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(position: Vec3) -> CollisionInfo {
        CollisionInfo {
            entity: Entity::from_raw(9),
            entity_position: position,
            entity_rotation: Quat::IDENTITY,
            point: position,
        }
    }

    fn moving_body() -> BodyState {
        let mut body = BodyState::at(Vec3::new(0.0, 0.0, -4.5), Quat::IDENTITY);
        body.velocity = Vec3::NEG_Z * 20.0;
        body
    }

    #[test]
    fn test_destroy_requests_despawn() {
        let mut body = moving_body();
        DestroyImpact.on_collision(&mut body, &hit_at(Vec3::new(0.0, 0.0, -5.0)));
        assert!(body.despawn_requested);
    }

    #[test]
    fn test_pierce_keeps_flying() {
        let mut body = moving_body();
        PierceImpact.on_collision(&mut body, &hit_at(Vec3::new(0.0, 0.0, -5.0)));
        assert!(!body.despawn_requested);
        assert!(body.delivers_effects);
        assert_eq!(body.velocity, Vec3::NEG_Z * 20.0);
    }

    #[test]
    fn test_stick_freezes_and_attaches() {
        let mut body = moving_body();
        StickImpact.on_collision(&mut body, &hit_at(Vec3::new(0.0, 0.0, -5.0)));

        assert_eq!(body.velocity, Vec3::ZERO);
        assert!(body.frozen);
        assert!(!body.delivers_effects);
        let attachment = body.attachment.unwrap();
        assert_eq!(attachment.entity, Entity::from_raw(9));
        assert!((attachment.local_offset - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
    }
}
