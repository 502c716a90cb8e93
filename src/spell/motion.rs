//! Motion Behaviors
//!
//! Per-tick movement strategies for conjured bodies. A behavior is cloned
//! for every body it drives, so behaviors are free to keep per-flight state
//! (elapsed time, launch direction, anchor point).

use std::fmt;

use bevy::prelude::*;

use crate::combat::target::TargetSnapshot;

/// Kinematic state of a conjured body, owned by the body itself.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Frozen bodies no longer run their motion behavior
    pub frozen: bool,
    /// Whether contact with a new target still delivers the spell
    pub delivers_effects: bool,
    /// Rigid attachment to another entity's local frame
    pub attachment: Option<Attachment>,
    pub despawn_requested: bool,
}

impl BodyState {
    pub fn at(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            velocity: Vec3::ZERO,
            frozen: false,
            delivers_effects: true,
            attachment: None,
            despawn_requested: false,
        }
    }

    /// Move along the current velocity and face the direction of travel.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.face_velocity();
    }

    pub fn face_velocity(&mut self) {
        let direction = self.velocity.normalize_or_zero();
        if direction != Vec3::ZERO {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
        }
    }
}

/// Pose of a body expressed in another entity's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub entity: Entity,
    pub local_offset: Vec3,
    pub local_rotation: Quat,
}

impl Attachment {
    /// Capture `body`'s pose relative to an entity at `anchor_position`/`anchor_rotation`.
    pub fn capture(
        entity: Entity,
        anchor_position: Vec3,
        anchor_rotation: Quat,
        body_position: Vec3,
        body_rotation: Quat,
    ) -> Self {
        let inverse = anchor_rotation.inverse();
        Self {
            entity,
            local_offset: inverse * (body_position - anchor_position),
            local_rotation: inverse * body_rotation,
        }
    }

    /// World pose for the anchor's current pose.
    pub fn world_pose(&self, anchor_position: Vec3, anchor_rotation: Quat) -> (Vec3, Quat) {
        (
            anchor_position + anchor_rotation * self.local_offset,
            anchor_rotation * self.local_rotation,
        )
    }
}

/// Live positions a motion behavior may steer by.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tracking {
    pub source: Option<Vec3>,
    pub target: Option<Vec3>,
}

/// How a conjured body moves each tick.
pub trait MotionBehavior: Send + Sync + fmt::Debug {
    fn type_key(&self) -> &'static str;

    /// Default lifetime of a body driven by this behavior, in seconds.
    fn duration(&self) -> f32;

    /// Capture initial heading and position.
    fn initialize(
        &mut self,
        body: &mut BodyState,
        source: &TargetSnapshot,
        target: Option<&TargetSnapshot>,
    );

    fn update_movement(&mut self, body: &mut BodyState, tracking: &Tracking, dt: f32);

    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn MotionBehavior>;
}

impl Clone for Box<dyn MotionBehavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Rotate `current` toward `desired` by at most `max_angle` radians.
///
/// Both directions are returned normalized; a zero `current` snaps straight
/// to `desired`.
pub fn steer_towards(current: Vec3, desired: Vec3, max_angle: f32) -> Vec3 {
    let current = current.normalize_or_zero();
    let desired = desired.normalize_or_zero();
    if current == Vec3::ZERO {
        return desired;
    }
    if desired == Vec3::ZERO {
        return current;
    }

    let angle = current.angle_between(desired);
    if angle <= max_angle || angle <= f32::EPSILON {
        return desired;
    }

    let full = Quat::from_rotation_arc(current, desired);
    let partial = Quat::IDENTITY.slerp(full, max_angle / angle);
    (partial * current).normalize_or_zero()
}

// ============================================================================
// Stationary
// ============================================================================

/// Stays where it was conjured.
#[derive(Clone, Debug, PartialEq)]
pub struct StationaryMotion {
    pub duration: f32,
}

impl Default for StationaryMotion {
    fn default() -> Self {
        Self { duration: 15.0 }
    }
}

impl MotionBehavior for StationaryMotion {
    fn type_key(&self) -> &'static str {
        "stationary"
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn initialize(&mut self, body: &mut BodyState, _source: &TargetSnapshot, _target: Option<&TargetSnapshot>) {
        body.velocity = Vec3::ZERO;
    }

    fn update_movement(&mut self, _body: &mut BodyState, _tracking: &Tracking, _dt: f32) {}

    fn description(&self) -> String {
        "Hangs in place".to_string()
    }

    fn clone_box(&self) -> Box<dyn MotionBehavior> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Straight
// ============================================================================

/// Flies along the caster's look direction at constant speed.
#[derive(Clone, Debug, PartialEq)]
pub struct StraightMotion {
    pub speed: f32,
    pub duration: f32,
}

impl Default for StraightMotion {
    fn default() -> Self {
        Self {
            speed: 20.0,
            duration: 5.0,
        }
    }
}

impl MotionBehavior for StraightMotion {
    fn type_key(&self) -> &'static str {
        "straight"
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn initialize(&mut self, body: &mut BodyState, source: &TargetSnapshot, _target: Option<&TargetSnapshot>) {
        body.velocity = source.forward() * self.speed;
        body.face_velocity();
    }

    fn update_movement(&mut self, body: &mut BodyState, _tracking: &Tracking, dt: f32) {
        body.integrate(dt);
    }

    fn description(&self) -> String {
        format!("Flies straight at {:.0} m/s", self.speed)
    }

    fn clone_box(&self) -> Box<dyn MotionBehavior> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Homing
// ============================================================================

/// Steers toward the live target position with a bounded turn rate.
#[derive(Clone, Debug, PartialEq)]
pub struct HomingMotion {
    pub speed: f32,
    /// Maximum turn rate in degrees per second
    pub turn_rate_degrees: f32,
    pub duration: f32,
}

impl Default for HomingMotion {
    fn default() -> Self {
        Self {
            speed: 12.0,
            turn_rate_degrees: 180.0,
            duration: 8.0,
        }
    }
}

impl MotionBehavior for HomingMotion {
    fn type_key(&self) -> &'static str {
        "homing"
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn initialize(&mut self, body: &mut BodyState, source: &TargetSnapshot, _target: Option<&TargetSnapshot>) {
        body.velocity = source.forward() * self.speed;
        body.face_velocity();
    }

    fn update_movement(&mut self, body: &mut BodyState, tracking: &Tracking, dt: f32) {
        // Without a live target it keeps flying along its current heading
        if let Some(target) = tracking.target {
            let desired = target - body.position;
            let max_turn = self.turn_rate_degrees.to_radians() * dt;
            body.velocity = steer_towards(body.velocity, desired, max_turn) * self.speed;
        }
        body.integrate(dt);
    }

    fn description(&self) -> String {
        format!("Homes in at {:.0} m/s", self.speed)
    }

    fn clone_box(&self) -> Box<dyn MotionBehavior> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Boomerang
// ============================================================================

/// Flies outward, then curves back toward the caster.
#[derive(Clone, Debug, PartialEq)]
pub struct BoomerangMotion {
    pub speed: f32,
    pub return_after_in_seconds: f32,
    /// Turn rate while returning, in degrees per second
    pub return_turn_rate_degrees: f32,
    pub duration: f32,
    elapsed: f32,
}

impl Default for BoomerangMotion {
    fn default() -> Self {
        Self {
            speed: 15.0,
            return_after_in_seconds: 1.0,
            return_turn_rate_degrees: 360.0,
            duration: 4.0,
            elapsed: 0.0,
        }
    }
}

impl BoomerangMotion {
    pub fn is_returning(&self) -> bool {
        self.elapsed >= self.return_after_in_seconds
    }
}

impl MotionBehavior for BoomerangMotion {
    fn type_key(&self) -> &'static str {
        "boomerang"
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn initialize(&mut self, body: &mut BodyState, source: &TargetSnapshot, _target: Option<&TargetSnapshot>) {
        self.elapsed = 0.0;
        body.velocity = source.forward() * self.speed;
        body.face_velocity();
    }

    fn update_movement(&mut self, body: &mut BodyState, tracking: &Tracking, dt: f32) {
        self.elapsed += dt;
        if self.is_returning() {
            if let Some(source) = tracking.source {
                let max_turn = self.return_turn_rate_degrees.to_radians() * dt;
                body.velocity = steer_towards(body.velocity, source - body.position, max_turn) * self.speed;
            }
        }
        body.integrate(dt);
    }

    fn description(&self) -> String {
        format!("Returns to the caster after {:.1}s", self.return_after_in_seconds)
    }

    fn clone_box(&self) -> Box<dyn MotionBehavior> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Primed
// ============================================================================

/// Vibrates in place while priming, then launches straight ahead.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimedMotion {
    pub prime_time: f32,
    pub speed: f32,
    pub vibration_amplitude: f32,
    /// Vibration frequency in Hz
    pub vibration_frequency: f32,
    pub duration: f32,
    elapsed: f32,
    anchor: Vec3,
    launch_direction: Vec3,
}

impl Default for PrimedMotion {
    fn default() -> Self {
        Self {
            prime_time: 1.0,
            speed: 25.0,
            vibration_amplitude: 0.05,
            vibration_frequency: 30.0,
            duration: 6.0,
            elapsed: 0.0,
            anchor: Vec3::ZERO,
            launch_direction: Vec3::NEG_Z,
        }
    }
}

impl PrimedMotion {
    pub fn is_launched(&self) -> bool {
        self.elapsed >= self.prime_time
    }

    fn jitter(&self) -> Vec3 {
        let phase = self.elapsed * self.vibration_frequency * std::f32::consts::TAU;
        Vec3::new(phase.sin(), (phase * 1.3).cos(), (phase * 0.7).sin()) * self.vibration_amplitude
    }
}

impl MotionBehavior for PrimedMotion {
    fn type_key(&self) -> &'static str {
        "primed"
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn initialize(&mut self, body: &mut BodyState, source: &TargetSnapshot, _target: Option<&TargetSnapshot>) {
        self.elapsed = 0.0;
        self.anchor = body.position;
        self.launch_direction = source.forward();
        body.velocity = Vec3::ZERO;
    }

    fn update_movement(&mut self, body: &mut BodyState, _tracking: &Tracking, dt: f32) {
        let was_launched = self.is_launched();
        self.elapsed += dt;

        if !self.is_launched() {
            body.position = self.anchor + self.jitter();
            return;
        }

        if !was_launched {
            body.position = self.anchor;
            body.velocity = self.launch_direction * self.speed;
        }
        body.integrate(dt);
    }

    fn description(&self) -> String {
        format!("Primes for {:.1}s, then launches", self.prime_time)
    }

    fn clone_box(&self) -> Box<dyn MotionBehavior> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caster_facing(direction: Vec3) -> TargetSnapshot {
        TargetSnapshot {
            entity: Entity::from_raw(1),
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_arc(Vec3::NEG_Z, direction.normalize()),
        }
    }

    fn launch(motion: &mut dyn MotionBehavior, facing: Vec3) -> BodyState {
        let mut body = BodyState::at(Vec3::ZERO, Quat::IDENTITY);
        motion.initialize(&mut body, &caster_facing(facing), None);
        body
    }

    #[test]
    fn test_stationary_never_moves() {
        let mut motion = StationaryMotion::default();
        let mut body = launch(&mut motion, Vec3::X);
        for _ in 0..10 {
            motion.update_movement(&mut body, &Tracking::default(), 0.1);
        }
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(motion.duration(), 15.0);
    }

    #[test]
    fn test_straight_follows_cast_direction() {
        let mut motion = StraightMotion::default();
        let mut body = launch(&mut motion, Vec3::X);

        motion.update_movement(&mut body, &Tracking::default(), 0.5);

        assert!((body.position - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_homing_turn_rate_is_bounded() {
        let mut motion = HomingMotion::default();
        let mut body = launch(&mut motion, Vec3::NEG_Z);
        let tracking = Tracking {
            source: None,
            target: Some(Vec3::new(100.0, 0.0, 0.0)),
        };

        motion.update_movement(&mut body, &tracking, 0.1);

        // 180 deg/s for 0.1s: at most 18 degrees away from the original heading
        let turned = Vec3::NEG_Z.angle_between(body.velocity);
        assert!((turned - 18f32.to_radians()).abs() < 1e-3, "turned {}", turned.to_degrees());
        assert!((body.velocity.length() - motion.speed).abs() < 1e-3);
    }

    #[test]
    fn test_homing_reaches_target_heading() {
        let mut motion = HomingMotion::default();
        let mut body = launch(&mut motion, Vec3::NEG_Z);
        let tracking = Tracking {
            source: None,
            target: Some(Vec3::new(50.0, 0.0, 0.0)),
        };

        for _ in 0..20 {
            motion.update_movement(&mut body, &tracking, 0.1);
        }

        let desired = (Vec3::new(50.0, 0.0, 0.0) - body.position).normalize();
        assert!(body.velocity.normalize().angle_between(desired) < 0.2);
    }

    #[test]
    fn test_boomerang_comes_back() {
        let mut motion = BoomerangMotion::default();
        let mut body = launch(&mut motion, Vec3::NEG_Z);
        let tracking = Tracking {
            source: Some(Vec3::ZERO),
            target: None,
        };

        for _ in 0..11 {
            motion.update_movement(&mut body, &tracking, 0.1);
        }
        assert!(motion.is_returning());
        let farthest = body.position.length();

        for _ in 0..10 {
            motion.update_movement(&mut body, &tracking, 0.1);
        }
        assert!(body.position.length() < farthest);
    }

    #[test]
    fn test_primed_vibrates_then_launches() {
        let mut motion = PrimedMotion::default();
        let mut body = launch(&mut motion, Vec3::X);

        for _ in 0..5 {
            motion.update_movement(&mut body, &Tracking::default(), 0.1);
            assert!(body.position.length() <= motion.vibration_amplitude * 2.0);
        }
        assert!(!motion.is_launched());

        for _ in 0..10 {
            motion.update_movement(&mut body, &Tracking::default(), 0.1);
        }
        assert!(motion.is_launched());
        assert!(body.position.x > 1.0);
    }

    #[test]
    fn test_attachment_follows_anchor() {
        let anchor_rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let attachment = Attachment::capture(
            Entity::from_raw(3),
            Vec3::new(1.0, 0.0, 0.0),
            anchor_rotation,
            Vec3::new(1.0, 1.0, 0.0),
            Quat::IDENTITY,
        );

        let (position, _) = attachment.world_pose(Vec3::new(5.0, 0.0, 0.0), anchor_rotation);
        assert!((position - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
    }
}
